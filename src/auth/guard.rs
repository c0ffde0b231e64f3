use uuid::Uuid;

use crate::auth::{extractors::Identity, repo_types::User};
use crate::error::AppError;

pub fn require_authenticated(identity: &Identity) -> Result<&User, AppError> {
    match identity {
        Identity::Authenticated(user) => Ok(user),
        Identity::Anonymous => Err(AppError::Unauthenticated),
    }
}

/// Anonymous callers get `Unauthenticated` rather than `Forbidden`.
pub fn require_ownership(identity: &Identity, owner_id: Uuid) -> Result<&User, AppError> {
    let user = require_authenticated(identity)?;
    if user.id != owner_id {
        return Err(AppError::Forbidden);
    }
    Ok(user)
}
