mod dto;
pub mod handlers;
pub mod matching;
pub mod repo;

pub use repo::MenuItem;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::menu_routes())
}
