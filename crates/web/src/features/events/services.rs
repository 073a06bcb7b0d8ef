use storage::{
    dto::event::{CreateEventRequest, UpdateEventRequest},
    models::Event,
    repository::event::EventRepository,
};
use validator::Validate;

use crate::error::{WebError, WebResult};
use crate::state::AppState;

/// List all events
pub async fn list_events(state: &AppState) -> WebResult<Vec<Event>> {
    Ok(state.participation.directory.list_events().await?)
}

/// The event running right now, if any
pub async fn get_current_event(state: &AppState) -> WebResult<Option<Event>> {
    let now = state.participation.clock.now();
    Ok(state.participation.directory.current_event(now).await?)
}

/// Get event by ID
pub async fn get_event(state: &AppState, id: i32) -> WebResult<Event> {
    let repo = EventRepository::new(state.db.pool());
    Ok(repo.find_by_id(id).await?)
}

/// Create a new event, refusing dates that collide with another event
pub async fn create_event(state: &AppState, request: &CreateEventRequest) -> WebResult<Event> {
    request
        .validate_dates()
        .map_err(|e| WebError::BadRequest(e.to_string()))?;

    let event = state.events.create(request).await?;
    tracing::info!(event_id = event.event_id, name = %event.name, "Created event");

    Ok(event)
}

/// Update an event; its own dates never count as an overlap
pub async fn update_event(
    state: &AppState,
    id: i32,
    request: &UpdateEventRequest,
) -> WebResult<Event> {
    let existing = state.events.find(id).await?;

    let merged = request.merge_into(&existing);
    merged.validate()?;
    merged
        .validate_dates()
        .map_err(|e| WebError::BadRequest(e.to_string()))?;

    let event = state.events.update(id, &merged).await?;
    tracing::info!(event_id = event.event_id, "Updated event");

    Ok(event)
}

/// Delete an event
pub async fn delete_event(state: &AppState, id: i32) -> WebResult<()> {
    let repo = EventRepository::new(state.db.pool());
    repo.delete(id).await?;
    tracing::info!(event_id = id, "Deleted event");

    Ok(())
}
