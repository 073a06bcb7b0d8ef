use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::models::{Attempt, NewAttempt};
use crate::services::error::{ServiceError, ServiceResult};

use super::code::{ObstacleCode, RaceStep};
use super::ports::{AttemptKey, AttemptStore};

/// Start / obstacle / finish protocol of race tests.
///
/// A race lives in a single attempt record: created at the start with an
/// in-progress result, extended with each obstacle outcome, and closed at the
/// finish with the elapsed milliseconds.
pub struct RaceProgressTracker<'a> {
    attempts: &'a dyn AttemptStore,
}

impl<'a> RaceProgressTracker<'a> {
    pub fn new(attempts: &'a dyn AttemptStore) -> Self {
        Self { attempts }
    }

    /// Whether `code` is a legal next move for the race under `key`.
    pub async fn check_transition(&self, key: &AttemptKey, code: ObstacleCode) -> ServiceResult<()> {
        let running = self.attempts.find_in_progress(key).await?;

        match (code, running) {
            (ObstacleCode::Start, Some(_)) => Err(ServiceError::RaceAlreadyStarted),
            (ObstacleCode::Start, None) => Ok(()),
            (ObstacleCode::Finish, running) => running.map(|_| ()).ok_or(ServiceError::RaceNotStarted),
            (ObstacleCode::Obstacle(obstacle_id), running) => {
                let running = running.ok_or(ServiceError::RaceNotStarted)?;
                if running.obstacle_trail.contains(obstacle_id) {
                    return Err(ServiceError::ObstacleAlreadyPassed);
                }
                Ok(())
            }
        }
    }

    /// Records `step`, returning the created or updated race record.
    pub async fn apply_transition(
        &self,
        key: &AttemptKey,
        step: RaceStep,
        now: NaiveDateTime,
    ) -> ServiceResult<Attempt> {
        match step {
            RaceStep::Start => self.start(key, now).await,
            RaceStep::Finish => {
                let running = self.running(key).await?;
                let elapsed_ms = (now - running.created_at).num_milliseconds();
                // A finished race must never read as in progress
                let result = Decimal::from(elapsed_ms.max(0));
                let finished = self
                    .attempts
                    .finish_race(running.attempt_id, result)
                    .await?;
                Ok(finished)
            }
            RaceStep::ObstacleAttempt { .. } => {
                let running = self.running(key).await?;
                let mut trail = running.obstacle_trail.clone();
                if let Some(entry) = step.trail_entry()
                    && !trail.record(entry)
                {
                    return Err(ServiceError::ObstacleAlreadyPassed);
                }
                let updated = self
                    .attempts
                    .record_trail(running.attempt_id, &trail)
                    .await?;
                Ok(updated)
            }
        }
    }

    async fn start(&self, key: &AttemptKey, now: NaiveDateTime) -> ServiceResult<Attempt> {
        let attempt = NewAttempt::race_start(key.event_id, key.team_id, key.test_id, now);

        self.attempts.insert(attempt).await.map_err(|e| {
            if e.is_unique_violation() {
                ServiceError::RaceAlreadyStarted
            } else {
                ServiceError::from(e)
            }
        })
    }

    async fn running(&self, key: &AttemptKey) -> ServiceResult<Attempt> {
        self.attempts
            .find_in_progress(key)
            .await?
            .ok_or(ServiceError::RaceNotStarted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryAttemptStore;
    use chrono::{Duration, NaiveDate};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
    }

    fn key() -> AttemptKey {
        AttemptKey {
            team_id: 7,
            event_id: 1,
            test_id: 3,
            day: day(),
        }
    }

    fn at(hour: u32, minute: u32, second: u32, milli: u32) -> NaiveDateTime {
        day().and_hms_milli_opt(hour, minute, second, milli).unwrap()
    }

    #[tokio::test]
    async fn test_start_twice_is_refused() {
        let store = MemoryAttemptStore::new();
        let tracker = RaceProgressTracker::new(&store);

        tracker.check_transition(&key(), ObstacleCode::Start).await.unwrap();
        tracker.apply_transition(&key(), RaceStep::Start, at(10, 0, 0, 0)).await.unwrap();

        let check = tracker.check_transition(&key(), ObstacleCode::Start).await;
        assert!(matches!(check, Err(ServiceError::RaceAlreadyStarted)));

        // Bypassing the check still hits the store constraint
        let apply = tracker.apply_transition(&key(), RaceStep::Start, at(10, 0, 1, 0)).await;
        assert!(matches!(apply, Err(ServiceError::RaceAlreadyStarted)));
    }

    #[tokio::test]
    async fn test_finish_or_obstacle_without_start() {
        let store = MemoryAttemptStore::new();
        let tracker = RaceProgressTracker::new(&store);

        let finish = tracker.check_transition(&key(), ObstacleCode::Finish).await;
        assert!(matches!(finish, Err(ServiceError::RaceNotStarted)));

        let obstacle = tracker.check_transition(&key(), ObstacleCode::Obstacle(1)).await;
        assert!(matches!(obstacle, Err(ServiceError::RaceNotStarted)));

        let apply = tracker.apply_transition(&key(), RaceStep::Finish, at(10, 0, 0, 0)).await;
        assert!(matches!(apply, Err(ServiceError::RaceNotStarted)));
    }

    #[tokio::test]
    async fn test_finish_keeps_millisecond_precision() {
        let store = MemoryAttemptStore::new();
        let tracker = RaceProgressTracker::new(&store);
        let started = at(10, 0, 0, 250);

        let start = tracker.apply_transition(&key(), RaceStep::Start, started).await.unwrap();
        assert!(start.is_in_progress());

        let finished_at = started + Duration::milliseconds(83_517);
        let finished = tracker
            .apply_transition(&key(), RaceStep::Finish, finished_at)
            .await
            .unwrap();

        assert_eq!(finished.attempt_id, start.attempt_id);
        assert_eq!(finished.result, Decimal::from(83_517));
        assert!(store.all().iter().all(|a| !a.is_in_progress()));
    }

    #[tokio::test]
    async fn test_obstacles_extend_the_same_record() {
        let store = MemoryAttemptStore::new();
        let tracker = RaceProgressTracker::new(&store);
        tracker.apply_transition(&key(), RaceStep::Start, at(10, 0, 0, 0)).await.unwrap();

        let pass = RaceStep::ObstacleAttempt {
            obstacle_id: 1,
            passed: true,
        };
        let fail = RaceStep::ObstacleAttempt {
            obstacle_id: 2,
            passed: false,
        };
        tracker.apply_transition(&key(), pass, at(10, 1, 0, 0)).await.unwrap();
        let updated = tracker.apply_transition(&key(), fail, at(10, 2, 0, 0)).await.unwrap();

        assert!(updated.is_in_progress());
        assert_eq!(updated.obstacle_trail.codes(), vec![1, -2]);
        assert_eq!(store.all().len(), 1);

        let again = tracker.check_transition(&key(), ObstacleCode::Obstacle(2)).await;
        assert!(matches!(again, Err(ServiceError::ObstacleAlreadyPassed)));

        let repeated = tracker.apply_transition(&key(), pass, at(10, 3, 0, 0)).await;
        assert!(matches!(repeated, Err(ServiceError::ObstacleAlreadyPassed)));
    }

    #[tokio::test]
    async fn test_running_race_is_scoped_to_its_day() {
        let store = MemoryAttemptStore::new();
        let tracker = RaceProgressTracker::new(&store);
        tracker.apply_transition(&key(), RaceStep::Start, at(10, 0, 0, 0)).await.unwrap();

        let tomorrow = AttemptKey {
            day: day().succ_opt().unwrap(),
            ..key()
        };
        tracker.check_transition(&tomorrow, ObstacleCode::Start).await.unwrap();
        let finish = tracker.check_transition(&tomorrow, ObstacleCode::Finish).await;
        assert!(matches!(finish, Err(ServiceError::RaceNotStarted)));
    }
}
