use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod lifecycle;
pub mod scoring;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::debate_routes()
}
