use storage::{
    cache::{PARTICIPATIONS_TTL_SECS, ParticipationsCache},
    dto::participation::{AttemptResponse, UpdateAttemptRequest},
    models::AttemptChanges,
    services::participation::ParticipationContext,
};
use uuid::Uuid;

use crate::error::WebResult;

/// Attempts of an event, served from the cache when possible.
///
/// Cache failures only cost a recompute; they are logged and never surfaced.
pub async fn list_participations(
    ctx: &ParticipationContext,
    event_id: i32,
    bypass_cache: bool,
) -> WebResult<Vec<AttemptResponse>> {
    let lists = ParticipationsCache::new(ctx.cache.as_ref());
    let key = match lists.current_key(event_id).await {
        Ok(key) => Some(key),
        Err(e) => {
            tracing::warn!(error = %e, event_id, "Failed to resolve cached participations");
            None
        }
    };

    if let Some(key) = &key {
        if bypass_cache {
            if let Err(e) = ctx.cache.delete(key).await {
                tracing::warn!(error = %e, key, "Failed to drop cached participations");
            }
        } else {
            match ctx.cache.get(key).await {
                Ok(Some(cached)) => match serde_json::from_str(&cached) {
                    Ok(attempts) => return Ok(attempts),
                    Err(e) => tracing::warn!(error = %e, key, "Discarding unreadable cache entry"),
                },
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, key, "Failed to read cached participations"),
            }
        }
    }

    let attempts: Vec<AttemptResponse> = ctx
        .attempts
        .list_for_event(event_id)
        .await?
        .into_iter()
        .map(AttemptResponse::from)
        .collect();

    // Stored under the key resolved before the read; a write in between has
    // already moved readers to a newer one.
    if let Some(key) = &key {
        match serde_json::to_string(&attempts) {
            Ok(payload) => {
                if let Err(e) = ctx.cache.set(key, &payload, PARTICIPATIONS_TTL_SECS).await {
                    tracing::warn!(error = %e, key, "Failed to cache participations");
                }
            }
            Err(e) => tracing::warn!(error = %e, key, "Failed to serialize participations"),
        }
    }

    Ok(attempts)
}

/// Get one attempt by ID
pub async fn get_participation(
    ctx: &ParticipationContext,
    attempt_id: Uuid,
) -> WebResult<AttemptResponse> {
    let attempt = ctx.attempts.find_by_id(attempt_id).await?;
    Ok(AttemptResponse::from(attempt))
}

/// Correct an attempt, dropping the cached lists of its old and new event
pub async fn update_participation(
    ctx: &ParticipationContext,
    attempt_id: Uuid,
    request: UpdateAttemptRequest,
) -> WebResult<AttemptResponse> {
    let previous = ctx.attempts.find_by_id(attempt_id).await?;
    let changes = AttemptChanges::from(request);

    let updated = ctx.attempts.update(attempt_id, &changes).await;
    invalidate(ctx, previous.event_id).await;
    let updated = updated?;

    if updated.event_id != previous.event_id {
        invalidate(ctx, updated.event_id).await;
    }
    tracing::info!(%attempt_id, event_id = updated.event_id, "Updated participation");

    Ok(AttemptResponse::from(updated))
}

/// Delete an attempt
pub async fn delete_participation(ctx: &ParticipationContext, attempt_id: Uuid) -> WebResult<()> {
    let deleted = ctx.attempts.delete(attempt_id).await?;
    invalidate(ctx, deleted.event_id).await;
    tracing::info!(%attempt_id, event_id = deleted.event_id, "Deleted participation");

    Ok(())
}

async fn invalidate(ctx: &ParticipationContext, event_id: i32) {
    if let Err(e) = ParticipationsCache::new(ctx.cache.as_ref())
        .invalidate(event_id)
        .await
    {
        tracing::warn!(error = %e, event_id, "Failed to invalidate cached participations");
    }
}
