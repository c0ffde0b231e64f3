use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod tokens;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::user_routes())
        .merge(handlers::token_routes())
}
