use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::Mutex;

use crate::dto::event::CreateEventRequest;
use crate::error::{Result, StorageError};
use crate::models::Event;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::participation::EventDirectory;

/// Event writes. Stores must refuse overlapping dates with an exclusion
/// violation, whatever the caller checked before.
#[async_trait]
pub trait EventWriter: Send + Sync {
    async fn find_event(&self, event_id: i32) -> Result<Event>;

    async fn insert_event(&self, event: &CreateEventRequest) -> Result<Event>;

    async fn update_event(&self, event_id: i32, event: &CreateEventRequest) -> Result<Event>;
}

/// Closed intervals overlap, including when they only touch.
pub fn intervals_overlap<T: PartialOrd>(s1: T, e1: T, s2: T, e2: T) -> bool {
    s1 <= e2 && s2 <= e1
}

/// Whether `[start, end]` collides with any of `events`, skipping `exclude`.
pub fn overlaps(
    events: &[Event],
    start: NaiveDateTime,
    end: NaiveDateTime,
    exclude: Option<i32>,
) -> bool {
    events
        .iter()
        .filter(|e| Some(e.event_id) != exclude)
        .any(|e| intervals_overlap(start, end, e.start_at, e.end_at))
}

/// Fails with [`ServiceError::EventDateOverlap`] when the candidate dates
/// collide with a persisted event.
pub async fn ensure_no_overlap(
    directory: &dyn EventDirectory,
    start: NaiveDateTime,
    end: NaiveDateTime,
    exclude: Option<i32>,
) -> ServiceResult<()> {
    let events = directory.list_events().await?;

    if overlaps(&events, start, end, exclude) {
        tracing::debug!(%start, %end, ?exclude, "Event dates overlap");
        return Err(ServiceError::EventDateOverlap);
    }

    Ok(())
}

/// Creates and reschedules events one at a time.
///
/// The overlap check and the write run under one lock; the store's exclusion
/// constraint covers writers in other processes.
#[derive(Clone)]
pub struct EventScheduler {
    directory: Arc<dyn EventDirectory>,
    writer: Arc<dyn EventWriter>,
    lock: Arc<Mutex<()>>,
}

impl EventScheduler {
    pub fn new(directory: Arc<dyn EventDirectory>, writer: Arc<dyn EventWriter>) -> Self {
        Self {
            directory,
            writer,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn find(&self, event_id: i32) -> ServiceResult<Event> {
        Ok(self.writer.find_event(event_id).await?)
    }

    pub async fn create(&self, event: &CreateEventRequest) -> ServiceResult<Event> {
        let _guard = self.lock.lock().await;
        ensure_no_overlap(self.directory.as_ref(), event.start_at, event.end_at, None).await?;
        self.writer
            .insert_event(event)
            .await
            .map_err(overlap_conflict)
    }

    /// Stores the full row of `event_id`; its own dates never count as an overlap.
    pub async fn update(&self, event_id: i32, event: &CreateEventRequest) -> ServiceResult<Event> {
        let _guard = self.lock.lock().await;
        ensure_no_overlap(
            self.directory.as_ref(),
            event.start_at,
            event.end_at,
            Some(event_id),
        )
        .await?;
        self.writer
            .update_event(event_id, event)
            .await
            .map_err(overlap_conflict)
    }
}

fn overlap_conflict(e: StorageError) -> ServiceError {
    if e.is_exclusion_violation() {
        tracing::debug!(error = %e, "Event write refused by the store");
        return ServiceError::EventDateOverlap;
    }
    ServiceError::from(e)
}
