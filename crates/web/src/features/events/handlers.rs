use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::event::{CreateEventRequest, EventResponse, UpdateEventRequest};
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/events",
    responses(
        (status = 200, description = "List all events successfully", body = Vec<EventResponse>)
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventResponse>>, WebError> {
    let events = services::list_events(&state).await?;

    let response: Vec<EventResponse> = events.into_iter().map(EventResponse::from).collect();

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/events/current",
    responses(
        (status = 200, description = "The running event, or null", body = Option<EventResponse>)
    ),
    tag = "events"
)]
pub async fn get_current_event(
    State(state): State<AppState>,
) -> Result<Json<Option<EventResponse>>, WebError> {
    let event = services::get_current_event(&state).await?;

    Ok(Json(event.map(EventResponse::from)))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(
        ("id" = i32, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event found", body = EventResponse),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventResponse>, WebError> {
    let event = services::get_event(&state, id).await?;

    Ok(Json(EventResponse::from(event)))
}

#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created successfully", body = EventResponse),
        (status = 400, description = "Validation error"),
        (status = 422, description = "Dates overlap another event")
    ),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let event = services::create_event(&state, &req).await?;

    Ok((StatusCode::CREATED, Json(EventResponse::from(event))).into_response())
}

#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(
        ("id" = i32, Path, description = "Event ID")
    ),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated successfully", body = EventResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Event not found"),
        (status = 422, description = "Dates overlap another event")
    ),
    tag = "events"
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(update_req): Json<UpdateEventRequest>,
) -> Result<Response, WebError> {
    update_req.validate()?;

    let updated = services::update_event(&state, id, &update_req).await?;

    Ok(Json(EventResponse::from(updated)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(
        ("id" = i32, Path, description = "Event ID")
    ),
    responses(
        (status = 204, description = "Event deleted successfully"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event still has bookings or attempts")
    ),
    tag = "events"
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, WebError> {
    services::delete_event(&state, id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
