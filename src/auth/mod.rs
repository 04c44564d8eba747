use crate::state::AppState;
use axum::Router;

mod dto;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod session;
mod views;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
