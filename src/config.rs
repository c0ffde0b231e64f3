use serde::Deserialize;

/// Argon2id work factor. Stored hashes embed their own parameters, so these
/// only affect newly hashed passwords.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordHashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub token_ttl_hours: i64,
    pub password_hash: PasswordHashConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub auth: AuthConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let auth = AuthConfig {
            token_ttl_hours: env_or("AUTH_TOKEN_TTL_HOURS", 24),
            password_hash: PasswordHashConfig {
                memory_kib: env_or("PASSWORD_HASH_MEMORY_KIB", 19 * 1024),
                iterations: env_or("PASSWORD_HASH_ITERATIONS", 2),
                parallelism: env_or("PASSWORD_HASH_PARALLELISM", 1),
            },
        };
        Ok(Self {
            database_url,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            auth,
        })
    }

    pub fn token_ttl(&self) -> time::Duration {
        time::Duration::hours(self.auth.token_ttl_hours)
    }
}
