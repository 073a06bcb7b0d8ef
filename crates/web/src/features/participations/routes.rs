use axum::{Router, routing::get};

use super::handlers::{
    delete_participation, get_participation, list_participations, update_participation,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_participations))
        .route(
            "/:id",
            get(get_participation)
                .put(update_participation)
                .delete(delete_participation),
        )
}
