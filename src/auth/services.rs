use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::{
    dto::{LoginRequest, PublicUser, RegisterRequest, UpdateProfileRequest},
    extractors::Identity,
    guard::require_authenticated,
    repo_types::NewUser,
    tokens::{Scope, Token},
};
use crate::error::AppError;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_username(username: &str) -> Result<(), AppError> {
    if username.is_empty() {
        return Err(AppError::MalformedInput("username is required".into()));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() {
        return Err(AppError::MalformedInput("email is required".into()));
    }
    if !is_valid_email(email) {
        return Err(AppError::MalformedInput("invalid email format".into()));
    }
    Ok(())
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::MalformedInput("password too short".into()));
    }
    Ok(())
}

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<PublicUser, AppError> {
    let username = req.username.trim().to_string();
    let email = normalize_email(&req.email);
    check_username(&username)?;
    check_email(&email)?;
    check_password(&req.password)?;

    let password_hash = state.passwords.hash(&req.password)?;
    let user = state
        .users
        .create(NewUser {
            username,
            email,
            password_hash,
            bio: req.bio,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user.into())
}

/// Unknown username and wrong password produce the same `LoginFailed`.
pub async fn login(state: &AppState, req: LoginRequest) -> Result<Token, AppError> {
    let username = req.username.trim();
    let Some(user) = state.users.find_by_username(username).await? else {
        // keeps response time independent of whether the username exists
        state.passwords.verify_dummy(&req.password)?;
        warn!(%username, "login unknown username");
        return Err(AppError::LoginFailed);
    };

    if !state.passwords.verify(&user.password_hash, &req.password)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::LoginFailed);
    }

    let token = state
        .tokens
        .issue(user.id, state.config.token_ttl(), Scope::Authentication)
        .await?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

pub async fn logout_all(state: &AppState, identity: &Identity) -> Result<(), AppError> {
    let user = require_authenticated(identity)?;
    state
        .tokens
        .invalidate_all(user.id, Scope::Authentication)
        .await?;
    info!(user_id = %user.id, "all authentication tokens revoked");
    Ok(())
}

pub fn current_user(identity: &Identity) -> Result<PublicUser, AppError> {
    require_authenticated(identity).map(|u| u.clone().into())
}

pub async fn update_profile(
    state: &AppState,
    identity: &Identity,
    req: UpdateProfileRequest,
) -> Result<PublicUser, AppError> {
    let mut user = require_authenticated(identity)?.clone();

    if let Some(username) = req.username {
        let username = username.trim().to_string();
        check_username(&username)?;
        user.username = username;
    }
    if let Some(email) = req.email {
        let email = normalize_email(&email);
        check_email(&email)?;
        user.email = email;
    }
    if let Some(bio) = req.bio {
        user.bio = bio;
    }
    if let Some(password) = req.password {
        check_password(&password)?;
        user.password_hash = state.passwords.hash(&password)?;
    }

    let updated = state.users.update(&user).await?;
    info!(user_id = %updated.id, "profile updated");
    Ok(updated.into())
}
