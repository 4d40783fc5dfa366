mod dto;
pub mod handlers;
pub mod phrase;
pub mod resolve;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::food_routes())
}
