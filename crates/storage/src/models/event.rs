use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A time-boxed competition. At most one event may be running at any instant,
/// which is enforced when events are written, not when they are read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
    pub event_id: i32,
    pub name: String,
    pub venue: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl Event {
    /// Whether `instant` falls inside the event's closed interval.
    pub fn is_running_at(&self, instant: NaiveDateTime) -> bool {
        self.start_at <= instant && instant <= self.end_at
    }
}
