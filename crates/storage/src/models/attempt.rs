use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One recorded attempt ("participación").
///
/// For race tests the same record is created at the start, flagged as
/// running with [`Attempt::IN_PROGRESS`] as result, collects obstacle passes
/// in its trail, and finally holds the elapsed milliseconds once the team
/// crosses the finish. Only `in_progress` marks a running race; a scored
/// test may store -1 as its result.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Attempt {
    pub attempt_id: Uuid,
    pub event_id: i32,
    pub team_id: i32,
    pub test_id: i32,
    pub result: Decimal,
    pub in_progress: bool,
    #[sqlx(json)]
    #[schema(value_type = Vec<i32>)]
    pub obstacle_trail: ObstacleTrail,
    pub created_at: NaiveDateTime,
}

impl Attempt {
    /// Result stored while a race is still running.
    pub const IN_PROGRESS: Decimal = Decimal::NEGATIVE_ONE;

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }
}

/// Fields of an attempt about to be inserted.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub event_id: i32,
    pub team_id: i32,
    pub test_id: i32,
    pub result: Decimal,
    pub in_progress: bool,
    pub obstacle_trail: ObstacleTrail,
    pub created_at: NaiveDateTime,
}

impl NewAttempt {
    /// A terminal attempt holding `result`.
    pub fn scored(
        event_id: i32,
        team_id: i32,
        test_id: i32,
        result: Decimal,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            event_id,
            team_id,
            test_id,
            result,
            in_progress: false,
            obstacle_trail: ObstacleTrail::new(),
            created_at,
        }
    }

    /// A race record opened at `created_at`.
    pub fn race_start(
        event_id: i32,
        team_id: i32,
        test_id: i32,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            event_id,
            team_id,
            test_id,
            result: Attempt::IN_PROGRESS,
            in_progress: true,
            obstacle_trail: ObstacleTrail::new(),
            created_at,
        }
    }
}

/// Corrections applied to a stored attempt; absent fields keep their value.
///
/// Setting a result closes a running race.
#[derive(Debug, Clone, Default)]
pub struct AttemptChanges {
    pub event_id: Option<i32>,
    pub team_id: Option<i32>,
    pub test_id: Option<i32>,
    pub result: Option<Decimal>,
    pub obstacle_trail: Option<ObstacleTrail>,
}

impl AttemptChanges {
    /// Applies the changes in place.
    pub fn apply_to(&self, attempt: &mut Attempt) {
        if let Some(event_id) = self.event_id {
            attempt.event_id = event_id;
        }
        if let Some(team_id) = self.team_id {
            attempt.team_id = team_id;
        }
        if let Some(test_id) = self.test_id {
            attempt.test_id = test_id;
        }
        if let Some(result) = self.result {
            attempt.result = result;
            attempt.in_progress = false;
        }
        if let Some(trail) = &self.obstacle_trail {
            attempt.obstacle_trail = trail.clone();
        }
    }
}

/// A single obstacle outcome inside a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailEntry {
    pub obstacle_id: i32,
    pub passed: bool,
}

impl TrailEntry {
    /// Signed wire encoding: positive when passed, negated when failed.
    pub fn code(self) -> i32 {
        if self.passed {
            self.obstacle_id
        } else {
            -self.obstacle_id
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => None,
            c if c > 0 => Some(Self {
                obstacle_id: c,
                passed: true,
            }),
            c => Some(Self {
                obstacle_id: c.checked_neg()?,
                passed: false,
            }),
        }
    }
}

/// Ordered obstacle outcomes of a race attempt, serialized as signed ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<i32>", try_from = "Vec<i32>")]
pub struct ObstacleTrail(Vec<TrailEntry>);

impl ObstacleTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TrailEntry] {
        &self.0
    }

    pub fn contains(&self, obstacle_id: i32) -> bool {
        self.0.iter().any(|e| e.obstacle_id == obstacle_id)
    }

    /// Appends an outcome; refuses an obstacle that is already recorded.
    pub fn record(&mut self, entry: TrailEntry) -> bool {
        if self.contains(entry.obstacle_id) {
            return false;
        }
        self.0.push(entry);
        true
    }

    pub fn codes(&self) -> Vec<i32> {
        self.0.iter().map(|e| e.code()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ObstacleTrail> for Vec<i32> {
    fn from(trail: ObstacleTrail) -> Self {
        trail.codes()
    }
}

impl TryFrom<Vec<i32>> for ObstacleTrail {
    type Error = String;

    fn try_from(codes: Vec<i32>) -> Result<Self, Self::Error> {
        let mut trail = ObstacleTrail::new();
        for code in codes {
            let entry = TrailEntry::from_code(code)
                .ok_or_else(|| format!("invalid obstacle trail entry {code}"))?;
            if !trail.record(entry) {
                return Err(format!("obstacle {} repeated in trail", entry.obstacle_id));
            }
        }
        Ok(trail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_entry_sign_encoding() {
        let passed = TrailEntry::from_code(4).unwrap();
        assert!(passed.passed);
        assert_eq!(passed.obstacle_id, 4);

        let failed = TrailEntry::from_code(-4).unwrap();
        assert!(!failed.passed);
        assert_eq!(failed.obstacle_id, 4);
        assert_eq!(failed.code(), -4);

        assert!(TrailEntry::from_code(0).is_none());
        assert!(TrailEntry::from_code(i32::MIN).is_none());
    }

    #[test]
    fn test_trail_rejects_repeated_obstacle() {
        let mut trail = ObstacleTrail::new();
        assert!(trail.record(TrailEntry {
            obstacle_id: 1,
            passed: true
        }));
        assert!(!trail.record(TrailEntry {
            obstacle_id: 1,
            passed: false
        }));
        assert_eq!(trail.codes(), vec![1]);
    }

    #[test]
    fn test_changes_with_result_close_running_race() {
        let mut attempt = Attempt {
            attempt_id: Uuid::new_v4(),
            event_id: 1,
            team_id: 7,
            test_id: 3,
            result: Attempt::IN_PROGRESS,
            in_progress: true,
            obstacle_trail: ObstacleTrail::new(),
            created_at: NaiveDateTime::default(),
        };

        AttemptChanges {
            event_id: Some(2),
            ..Default::default()
        }
        .apply_to(&mut attempt);
        assert!(attempt.is_in_progress());
        assert_eq!(attempt.event_id, 2);

        AttemptChanges {
            result: Some(Decimal::from(61_000)),
            ..Default::default()
        }
        .apply_to(&mut attempt);
        assert!(!attempt.is_in_progress());
        assert_eq!(attempt.result, Decimal::from(61_000));
    }

    #[test]
    fn test_trail_json_shape() {
        let trail = ObstacleTrail::try_from(vec![1, -2]).unwrap();
        assert_eq!(serde_json::to_string(&trail).unwrap(), "[1,-2]");

        let parsed: ObstacleTrail = serde_json::from_str("[3,-5]").unwrap();
        assert!(parsed.contains(5));
        assert!(serde_json::from_str::<ObstacleTrail>("[2,-2]").is_err());
    }
}
