use std::{fmt, sync::Arc};

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{repo::TokenStore, repo_types::User};
use crate::error::AppError;

/// Random bytes behind every plaintext token.
const TOKEN_BYTES: usize = 32;

/// Purpose a token was issued for. A token only resolves under the scope it
/// was issued with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Authentication,
    #[cfg(test)]
    Activation,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Authentication => "authentication",
            #[cfg(test)]
            Scope::Activation => "activation",
        }
    }
}

/// An issued bearer token. Only `hash` is ever persisted.
#[derive(Clone, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub hash: Vec<u8>,
    #[serde(skip)]
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry: OffsetDateTime,
    #[serde(skip)]
    pub scope: Scope,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("plaintext", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Deterministic digest used for storage and lookup.
pub fn hash_token(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

pub fn generate_token(user_id: Uuid, ttl: Duration, scope: Scope) -> Token {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let plaintext = Base64UrlUnpadded::encode_string(&bytes);
    let hash = hash_token(&plaintext);
    Token {
        plaintext,
        hash,
        user_id,
        expiry: OffsetDateTime::now_utc() + ttl,
        scope,
    }
}

#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// The returned plaintext cannot be recovered later.
    pub async fn issue(&self, user_id: Uuid, ttl: Duration, scope: Scope) -> Result<Token, AppError> {
        let token = generate_token(user_id, ttl, scope);
        self.store.insert(&token).await?;
        debug!(%user_id, scope = scope.as_str(), expiry = %token.expiry, "token issued");
        Ok(token)
    }

    /// Expired, unknown and wrong-scope tokens all come back as `None`.
    pub async fn resolve(&self, scope: Scope, plaintext: &str) -> Result<Option<User>, AppError> {
        let hash = hash_token(plaintext);
        self.store
            .find_user(&hash, scope, OffsetDateTime::now_utc())
            .await
    }

    pub async fn invalidate_all(&self, user_id: Uuid, scope: Scope) -> Result<(), AppError> {
        self.store.delete_all_for_user(user_id, scope).await?;
        debug!(%user_id, scope = scope.as_str(), "tokens invalidated");
        Ok(())
    }
}
