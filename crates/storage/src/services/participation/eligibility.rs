use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::models::{Booking, Event, Team, Test};
use crate::services::error::{ServiceError, ServiceResult};

use super::ports::{AttemptKey, AttemptStore, EventDirectory};
use super::race::RaceProgressTracker;
use super::shape::{Intent, Mode, validate_shape};

/// An attempt request as received from the monitor app.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticipationRequest {
    pub team_id: i32,
    pub test_id: i32,
    /// Wire obstacle code, race tests only.
    pub obstacle: Option<i32>,
    pub score: Option<Decimal>,
}

/// Everything resolved while deciding that an attempt may go ahead.
#[derive(Debug, Clone)]
pub struct Eligibility {
    pub event: Event,
    pub team: Team,
    pub test: Test,
    pub booking: Booking,
    pub key: AttemptKey,
    pub intent: Intent,
}

/// Decides whether a team may attempt a test right now.
pub struct EligibilityEvaluator<'a> {
    directory: &'a dyn EventDirectory,
    attempts: &'a dyn AttemptStore,
}

impl<'a> EligibilityEvaluator<'a> {
    pub fn new(directory: &'a dyn EventDirectory, attempts: &'a dyn AttemptStore) -> Self {
        Self {
            directory,
            attempts,
        }
    }

    pub async fn evaluate(
        &self,
        request: &ParticipationRequest,
        mode: Mode,
        now: NaiveDateTime,
    ) -> ServiceResult<Eligibility> {
        let event = self
            .directory
            .current_event(now)
            .await?
            .ok_or(ServiceError::NoCurrentEvent)?;

        self.evaluate_for_event(event, request, mode, now).await
    }

    /// Runs every check after the current event has been resolved.
    ///
    /// Each check is a hard stop: team, test, test in event, request shape,
    /// paid booking for today, attempt ceiling, and finally the race protocol.
    pub async fn evaluate_for_event(
        &self,
        event: Event,
        request: &ParticipationRequest,
        mode: Mode,
        now: NaiveDateTime,
    ) -> ServiceResult<Eligibility> {
        let team = self
            .directory
            .find_team(request.team_id)
            .await?
            .ok_or(ServiceError::TeamNotFound)?;

        let test = self
            .directory
            .find_test(request.test_id)
            .await?
            .ok_or(ServiceError::TestNotFound)?;

        if !self
            .directory
            .test_belongs_to_event(test.test_id, event.event_id)
            .await?
        {
            return Err(ServiceError::TestNotInEvent);
        }

        let intent =
            validate_shape(self.directory, &test, request.obstacle, request.score, mode).await?;

        let today = now.date();
        let booking = self
            .directory
            .booking_for_team_on(team.team_id, event.event_id, today)
            .await?
            .filter(|b| b.payment_status.is_paid())
            .ok_or(ServiceError::TeamHasNotPaidToday)?;

        let key = AttemptKey {
            team_id: team.team_id,
            event_id: event.event_id,
            test_id: test.test_id,
            day: today,
        };

        let completed = self.attempts.count_completed(&key).await?;
        if completed >= i64::from(booking.max_attempts) {
            return Err(ServiceError::TeamMaxAttemptsReached);
        }

        if let Intent::Race {
            code: Some(code), ..
        } = intent
        {
            RaceProgressTracker::new(self.attempts)
                .check_transition(&key, code)
                .await?;
        }

        Ok(Eligibility {
            event,
            team,
            test,
            booking,
            key,
            intent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryAttemptStore, MemoryDirectory, fixtures};
    use crate::models::{NewAttempt, PaymentStatus, TestKind};
    use chrono::{Duration, NaiveDate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
    }

    fn now() -> NaiveDateTime {
        fixtures::instant(today(), 11, 30)
    }

    fn directory(payment_status: PaymentStatus) -> MemoryDirectory {
        let directory = MemoryDirectory::new();
        directory.add_event(fixtures::event(
            1,
            fixtures::instant(today(), 8, 0),
            fixtures::instant(today() + Duration::days(1), 20, 0),
        ));
        directory.add_team(fixtures::team(7));
        directory.add_test(fixtures::test(3, TestKind::Race), &[1]);
        directory.add_test(fixtures::test(4, TestKind::Speed), &[1]);
        directory.add_test(fixtures::test(5, TestKind::Points), &[]);
        directory.add_obstacle(fixtures::obstacle(1), &[3]);
        directory.add_booking(fixtures::booking(1, 7, 1, today(), payment_status, 2));
        directory
    }

    fn request(test_id: i32, obstacle: Option<i32>) -> ParticipationRequest {
        ParticipationRequest {
            team_id: 7,
            test_id,
            obstacle,
            score: None,
        }
    }

    async fn record(store: &MemoryAttemptStore, test_id: i32, result: Decimal) {
        let earlier = now() - Duration::minutes(30);
        store
            .insert(NewAttempt::scored(1, 7, test_id, result, earlier))
            .await
            .unwrap();
    }

    async fn start_race(store: &MemoryAttemptStore, test_id: i32) {
        let earlier = now() - Duration::minutes(30);
        store
            .insert(NewAttempt::race_start(1, 7, test_id, earlier))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_current_event() {
        let dir = directory(PaymentStatus::PaidOnline);
        let store = MemoryAttemptStore::new();
        let evaluator = EligibilityEvaluator::new(&dir, &store);

        let late = fixtures::instant(today() + Duration::days(3), 9, 0);
        let result = evaluator.evaluate(&request(4, None), Mode::Check, late).await;
        assert!(matches!(result, Err(ServiceError::NoCurrentEvent)));
    }

    #[tokio::test]
    async fn test_lookup_failures_in_order() {
        let dir = directory(PaymentStatus::PaidOnline);
        let store = MemoryAttemptStore::new();
        let evaluator = EligibilityEvaluator::new(&dir, &store);

        let mut req = request(99, None);
        req.team_id = 70;
        let result = evaluator.evaluate(&req, Mode::Check, now()).await;
        assert!(matches!(result, Err(ServiceError::TeamNotFound)));

        let result = evaluator.evaluate(&request(99, None), Mode::Check, now()).await;
        assert!(matches!(result, Err(ServiceError::TestNotFound)));

        let result = evaluator.evaluate(&request(5, None), Mode::Check, now()).await;
        assert!(matches!(result, Err(ServiceError::TestNotInEvent)));
    }

    #[tokio::test]
    async fn test_unpaid_or_missing_booking() {
        let dir = directory(PaymentStatus::Unpaid);
        let store = MemoryAttemptStore::new();
        let evaluator = EligibilityEvaluator::new(&dir, &store);

        let result = evaluator.evaluate(&request(4, None), Mode::Check, now()).await;
        assert!(matches!(result, Err(ServiceError::TeamHasNotPaidToday)));

        let tomorrow = now() + Duration::days(1);
        let dir = directory(PaymentStatus::PaidOnsite);
        let evaluator = EligibilityEvaluator::new(&dir, &store);
        let result = evaluator.evaluate(&request(4, None), Mode::Check, tomorrow).await;
        assert!(matches!(result, Err(ServiceError::TeamHasNotPaidToday)));
    }

    #[tokio::test]
    async fn test_paid_booking_wins_over_unpaid_duplicate() {
        let dir = directory(PaymentStatus::Unpaid);
        dir.add_booking(fixtures::booking(2, 7, 1, today(), PaymentStatus::PaidOnsite, 1));
        let store = MemoryAttemptStore::new();
        let evaluator = EligibilityEvaluator::new(&dir, &store);

        let eligibility = evaluator
            .evaluate(&request(4, None), Mode::Check, now())
            .await
            .unwrap();
        assert_eq!(eligibility.booking.booking_id, 2);
    }

    #[tokio::test]
    async fn test_attempt_ceiling_counts_only_completed_attempts() {
        let dir = directory(PaymentStatus::PaidOnline);
        let store = MemoryAttemptStore::new();
        let evaluator = EligibilityEvaluator::new(&dir, &store);

        record(&store, 4, Decimal::new(125, 1)).await;
        assert!(evaluator.evaluate(&request(4, None), Mode::Check, now()).await.is_ok());

        record(&store, 4, Decimal::from(9)).await;
        let result = evaluator.evaluate(&request(4, None), Mode::Check, now()).await;
        assert!(matches!(result, Err(ServiceError::TeamMaxAttemptsReached)));

        // A running race is not a used attempt
        start_race(&store, 3).await;
        let eligibility = evaluator
            .evaluate(&request(3, Some(1)), Mode::Check, now())
            .await
            .unwrap();
        assert_eq!(eligibility.key.test_id, 3);
    }

    #[tokio::test]
    async fn test_race_protocol_is_consulted() {
        let dir = directory(PaymentStatus::PaidOnline);
        let store = MemoryAttemptStore::new();
        let evaluator = EligibilityEvaluator::new(&dir, &store);

        let result = evaluator.evaluate(&request(3, Some(-2)), Mode::Check, now()).await;
        assert!(matches!(result, Err(ServiceError::RaceNotStarted)));

        let eligibility = evaluator
            .evaluate(&request(3, Some(-1)), Mode::Check, now())
            .await
            .unwrap();
        assert_eq!(eligibility.team.team_id, 7);

        // Checking a race without a code only covers the general rules
        assert!(evaluator.evaluate(&request(3, None), Mode::Check, now()).await.is_ok());
    }

    #[tokio::test]
    async fn test_shape_is_checked_before_booking() {
        let dir = directory(PaymentStatus::Unpaid);
        let store = MemoryAttemptStore::new();
        let evaluator = EligibilityEvaluator::new(&dir, &store);

        let result = evaluator.evaluate(&request(4, Some(1)), Mode::Check, now()).await;
        assert!(matches!(result, Err(ServiceError::InvalidFields)));
    }
}
