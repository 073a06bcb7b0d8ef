use axum::{
    Router,
    routing::{delete, get, post, put},
};

use super::handlers::{
    create_event, delete_event, get_current_event, get_event, list_events, update_event,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events))
        .route("/", post(create_event))
        .route("/current", get(get_current_event))
        .route("/:id", get(get_event))
        .route("/:id", put(update_event))
        .route("/:id", delete(delete_event))
}
