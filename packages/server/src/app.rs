use crate::models::config::ServerConfig;
use crate::routes;
use axum::Router;

pub fn create_app(config: ServerConfig) -> Router {
    let state = crate::state::AppState::new(config);
    routes::create_routes(state)
}
