mod handlers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;

pub fn create_router(db: Database) -> Router {
    let api = Router::new()
        // Tasks
        .route("/tasks", get(handlers::list_tasks))
        .route("/tasks", post(handlers::create_task))
        .route("/tasks/{id}", get(handlers::get_task))
        .route("/tasks/{id}", put(handlers::update_task))
        .route("/tasks/{id}", delete(handlers::delete_task))
        .route("/tasks/{id}/status", post(handlers::change_status))
        .route("/tasks/{id}/sprint", post(handlers::toggle_sprint))
        // Sprint
        .route("/sprint", get(handlers::sprint_status))
        .route("/sprint/start", post(handlers::start_sprint))
        .route("/sprint/close", post(handlers::close_sprint))
        // Search
        .route("/search", get(handlers::search_tasks))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
