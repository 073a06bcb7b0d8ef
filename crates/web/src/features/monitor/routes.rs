use axum::{Router, routing::get};

use super::handlers::{check_participation, get_summary, register_participation};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/summary", get(get_summary)).route(
        "/participation/:team_id/:test_id",
        get(check_participation).post(register_participation),
    )
}
