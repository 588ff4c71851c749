pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::fleet::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Roster
        .route(
            "/api/v1/vehicles",
            get(handlers::handle_list_vehicles).post(handlers::handle_create_vehicle),
        )
        .route(
            "/api/v1/vehicles/:id",
            put(handlers::handle_update_vehicle).delete(handlers::handle_delete_vehicle),
        )
        // Per-day view
        .route(
            "/api/v1/days/:date/statuses",
            get(handlers::handle_daily_statuses).delete(handlers::handle_clear_day),
        )
        .route(
            "/api/v1/days/:date/statuses/:vehicle_id",
            put(handlers::handle_record_status),
        )
        .route(
            "/api/v1/days/:date/copy-previous",
            post(handlers::handle_copy_previous_day),
        )
        .route("/api/v1/days/:date/summary", get(handlers::handle_day_summary))
        .route(
            "/api/v1/days/:date/observation",
            get(handlers::handle_get_observation).put(handlers::handle_save_observation),
        )
        .route(
            "/api/v1/observations",
            get(handlers::handle_observation_history),
        )
        // Monthly view
        .route("/api/v1/timeline/:month", get(handlers::handle_timeline))
        .with_state(state)
}
