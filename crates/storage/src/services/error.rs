use thiserror::Error;

use crate::error::StorageError;

/// Caller-visible failures of the participation and event services.
///
/// Every variant is terminal: nothing here is retried by the services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("There is no event running right now")]
    NoCurrentEvent,

    #[error("Team not found")]
    TeamNotFound,

    #[error("Test not found")]
    TestNotFound,

    #[error("Obstacle not found")]
    ObstacleNotFound,

    #[error("The test is not part of the current event")]
    TestNotInEvent,

    #[error("The obstacle is not part of the test")]
    ObstacleNotInTest,

    #[error("The team has no paid booking for today")]
    TeamHasNotPaidToday,

    #[error("The team has used all its attempts for this test today")]
    TeamMaxAttemptsReached,

    #[error("Invalid fields for this kind of test")]
    InvalidFields,

    #[error("Invalid obstacle code")]
    InvalidObstacle,

    #[error("Obstacle score must be 0 or 1")]
    InvalidObstacleScore,

    #[error("Missing score parameter")]
    MissingScoreParam,

    #[error("An obstacle code is required for race tests")]
    ObstacleIdExpectedForRace,

    #[error("The race has already been started today")]
    RaceAlreadyStarted,

    #[error("The race has not been started")]
    RaceNotStarted,

    #[error("The obstacle has already been attempted in this race")]
    ObstacleAlreadyPassed,

    #[error("The event dates overlap another event")]
    EventDateOverlap,

    #[error("Missing event parameter")]
    MissingEventParam,

    #[error("Database error")]
    Database(#[from] StorageError),
}

impl ServiceError {
    /// Stable numeric code sent to clients as `errno`.
    pub fn errno(&self) -> u16 {
        match self {
            Self::NoCurrentEvent => 1001,
            Self::TeamNotFound => 1002,
            Self::TestNotFound => 1003,
            Self::ObstacleNotFound => 1004,
            Self::TestNotInEvent => 1005,
            Self::ObstacleNotInTest => 1006,
            Self::TeamHasNotPaidToday => 1007,
            Self::TeamMaxAttemptsReached => 1008,
            Self::InvalidFields => 1009,
            Self::InvalidObstacle => 1010,
            Self::InvalidObstacleScore => 1011,
            Self::MissingScoreParam => 1012,
            Self::ObstacleIdExpectedForRace => 1013,
            Self::RaceAlreadyStarted => 1014,
            Self::RaceNotStarted => 1015,
            Self::ObstacleAlreadyPassed => 1016,
            Self::EventDateOverlap => 1017,
            Self::MissingEventParam => 1018,
            Self::Database(_) => 1500,
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
