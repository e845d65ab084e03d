use crate::state::AppState;
use axum::Router;

mod dto;
pub mod gate;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
mod services;
pub mod session;

/// Sign-up and sign-in.
pub fn public_router() -> Router<AppState> {
    handlers::public_routes()
}

/// Account routes; mount behind [`gate::require_session`].
pub fn account_router() -> Router<AppState> {
    handlers::account_routes()
}
