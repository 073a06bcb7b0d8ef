use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use storage::{
    dto::monitor::{ObstacleQuery, ParticipationBody, SummaryResponse},
    services::error::ServiceError,
};

use crate::error::WebError;
use crate::state::AppState;

use super::services;

/// A malformed obstacle code is reported like an unknown one.
fn obstacle_code(query: Result<Query<ObstacleQuery>, QueryRejection>) -> Result<Option<i32>, WebError> {
    let Query(query) = query.map_err(|_| ServiceError::InvalidObstacle)?;
    Ok(query.obstacle)
}

#[utoipa::path(
    get,
    path = "/api/monitor/summary",
    responses(
        (status = 200, description = "Current event and its tests", body = SummaryResponse),
        (status = 412, description = "No event is running")
    ),
    tag = "monitor"
)]
pub async fn get_summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>, WebError> {
    let summary = services::get_summary(&state.participation).await?;

    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/monitor/participation/{team_id}/{test_id}",
    params(
        ("team_id" = i32, Path, description = "Team dorsal"),
        ("test_id" = i32, Path, description = "Test ID"),
        ObstacleQuery
    ),
    responses(
        (status = 200, description = "The team may attempt the test"),
        (status = 400, description = "Malformed request for this kind of test"),
        (status = 402, description = "No paid booking for today"),
        (status = 403, description = "No attempts left today"),
        (status = 404, description = "Team, test or obstacle not found"),
        (status = 409, description = "Illegal race step"),
        (status = 412, description = "No event is running"),
        (status = 422, description = "Test or obstacle not part of the event")
    ),
    tag = "monitor"
)]
pub async fn check_participation(
    State(state): State<AppState>,
    Path((team_id, test_id)): Path<(i32, i32)>,
    query: Result<Query<ObstacleQuery>, QueryRejection>,
) -> Result<StatusCode, WebError> {
    let obstacle = obstacle_code(query)?;

    services::check_participation(&state.participation, team_id, test_id, obstacle).await?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/monitor/participation/{team_id}/{test_id}",
    params(
        ("team_id" = i32, Path, description = "Team dorsal"),
        ("test_id" = i32, Path, description = "Test ID"),
        ObstacleQuery
    ),
    request_body(content = ParticipationBody, description = "Score, required except for race start and finish"),
    responses(
        (status = 201, description = "Participation registered"),
        (status = 400, description = "Malformed request for this kind of test"),
        (status = 402, description = "No paid booking for today"),
        (status = 403, description = "No attempts left today"),
        (status = 404, description = "Team, test or obstacle not found"),
        (status = 409, description = "Illegal race step"),
        (status = 412, description = "No event is running"),
        (status = 422, description = "Test or obstacle not part of the event")
    ),
    tag = "monitor"
)]
pub async fn register_participation(
    State(state): State<AppState>,
    Path((team_id, test_id)): Path<(i32, i32)>,
    query: Result<Query<ObstacleQuery>, QueryRejection>,
    body: Option<Json<ParticipationBody>>,
) -> Result<StatusCode, WebError> {
    let obstacle = obstacle_code(query)?;
    let score = body.and_then(|Json(body)| body.score);

    services::register_participation(&state.participation, team_id, test_id, obstacle, score)
        .await?;

    Ok(StatusCode::CREATED)
}
