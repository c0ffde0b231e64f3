use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::auth::{
    extractors::Identity,
    tokens::{Scope, TokenService},
};
use crate::error::AppError;
use crate::state::AppState;

/// Splits `Bearer <token>`; anything else is a malformed credential.
pub fn parse_bearer(value: &HeaderValue) -> Result<&str, AppError> {
    let raw = value.to_str().map_err(|_| AppError::MalformedCredential)?;
    let (scheme, token) = raw.split_once(' ').ok_or(AppError::MalformedCredential)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return Err(AppError::MalformedCredential);
    }
    Ok(token)
}

/// No header means anonymous; a header that does not resolve is an error.
pub async fn identify(
    tokens: &TokenService,
    header: Option<&HeaderValue>,
) -> Result<Identity, AppError> {
    let Some(value) = header else {
        return Ok(Identity::Anonymous);
    };
    let token = parse_bearer(value)?;
    match tokens.resolve(Scope::Authentication, token).await? {
        Some(user) => {
            debug!(user_id = %user.id, "request authenticated");
            Ok(Identity::Authenticated(user))
        }
        None => Err(AppError::InvalidCredential),
    }
}

/// Attaches an `Identity` to the request extensions, or short-circuits with 401.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match identify(&state.tokens, req.headers().get(AUTHORIZATION)).await {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(e) => {
            warn!(error = %e, "authentication rejected");
            e.into_response()
        }
    }
}
