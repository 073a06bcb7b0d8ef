use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{Attempt, AttemptChanges, ObstacleTrail};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ParticipationsQuery {
    /// Event whose attempts are listed
    pub event: Option<i32>,
    /// Any of `1`/`true` recomputes the list instead of reading the cache
    pub nocache: Option<String>,
}

impl ParticipationsQuery {
    pub fn bypass_cache(&self) -> bool {
        matches!(self.nocache.as_deref(), Some("1" | "true"))
    }
}

/// A recorded attempt as shown to clients.
///
/// `result` is -1 while a race is running, elapsed milliseconds once
/// finished, and the submitted score for other tests.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttemptResponse {
    pub attempt_id: Uuid,
    pub event_id: i32,
    pub team_id: i32,
    pub test_id: i32,
    pub result: Decimal,
    pub in_progress: bool,
    /// Signed obstacle ids: positive when passed, negative when failed
    pub obstacles: Vec<i32>,
    pub created_at: NaiveDateTime,
}

impl From<Attempt> for AttemptResponse {
    fn from(attempt: Attempt) -> Self {
        Self {
            in_progress: attempt.is_in_progress(),
            obstacles: attempt.obstacle_trail.codes(),
            attempt_id: attempt.attempt_id,
            event_id: attempt.event_id,
            team_id: attempt.team_id,
            test_id: attempt.test_id,
            result: attempt.result,
            created_at: attempt.created_at,
        }
    }
}

/// Correction of a stored attempt; absent fields keep their value.
///
/// A new `result` closes the attempt if it was a running race.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateAttemptRequest {
    pub event_id: Option<i32>,
    pub team_id: Option<i32>,
    pub test_id: Option<i32>,
    #[schema(value_type = Option<f64>)]
    pub result: Option<Decimal>,
    /// Signed obstacle ids: positive when passed, negative when failed
    #[schema(value_type = Option<Vec<i32>>)]
    pub obstacles: Option<ObstacleTrail>,
}

impl From<UpdateAttemptRequest> for AttemptChanges {
    fn from(request: UpdateAttemptRequest) -> Self {
        Self {
            event_id: request.event_id,
            team_id: request.team_id,
            test_id: request.test_id,
            result: request.result,
            obstacle_trail: request.obstacles,
        }
    }
}
