use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

use crate::auth::repo_types::User;
use crate::error::AppError;

/// Principal behind the current request.
#[derive(Debug, Clone)]
pub enum Identity {
    Authenticated(User),
    Anonymous,
}

/// Reads the identity stored by the authentication middleware. A route
/// mounted without the middleware is a wiring bug and answers 500.
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("identity missing from request")))
    }
}
