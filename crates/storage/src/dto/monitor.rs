use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::{Event, Obstacle, Test, TestKind};

/// What the monitor app needs to drive the current event
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryResponse {
    pub event: SummaryEvent,
    pub tests: Vec<SummaryTest>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryEvent {
    pub event_id: i32,
    pub name: String,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
}

/// A test of the event; only race tests list their obstacles
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryTest {
    pub test_id: i32,
    pub name: String,
    pub kind: TestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obstacles: Option<Vec<SummaryObstacle>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryObstacle {
    pub obstacle_id: i32,
    pub name: String,
    pub points: i32,
}

impl From<Event> for SummaryEvent {
    fn from(event: Event) -> Self {
        Self {
            event_id: event.event_id,
            name: event.name,
            start_at: event.start_at,
            end_at: event.end_at,
        }
    }
}

impl From<Obstacle> for SummaryObstacle {
    fn from(obstacle: Obstacle) -> Self {
        Self {
            obstacle_id: obstacle.obstacle_id,
            name: obstacle.name,
            points: obstacle.points,
        }
    }
}

impl SummaryTest {
    /// `obstacles` is ignored unless the test is a race.
    pub fn new(test: Test, obstacles: Vec<Obstacle>) -> Self {
        let obstacles = test
            .is_race()
            .then(|| obstacles.into_iter().map(SummaryObstacle::from).collect());

        Self {
            test_id: test.test_id,
            name: test.name,
            kind: test.kind,
            obstacles,
        }
    }
}

/// Query string of the participation endpoints
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ObstacleQuery {
    /// Race obstacle code: -1 start, -2 finish, otherwise an obstacle id
    pub obstacle: Option<i32>,
}

/// Optional body of a registration
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ParticipationBody {
    #[schema(value_type = Option<f64>)]
    pub score: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test(kind: TestKind) -> Test {
        Test {
            test_id: 3,
            name: "Muro".to_string(),
            kind,
            info: None,
            created_at: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn obstacles() -> Vec<Obstacle> {
        vec![Obstacle {
            obstacle_id: 1,
            name: "Cuerda".to_string(),
            points: 10,
        }]
    }

    #[test]
    fn test_only_races_expose_obstacles() {
        let race = serde_json::to_value(SummaryTest::new(test(TestKind::Race), obstacles())).unwrap();
        assert_eq!(race["obstacles"][0]["obstacle_id"], 1);
        assert_eq!(race["obstacles"][0]["points"], 10);
        assert_eq!(race["kind"], "race");

        let speed = serde_json::to_value(SummaryTest::new(test(TestKind::Speed), obstacles())).unwrap();
        assert!(speed.get("obstacles").is_none());
    }

    #[test]
    fn test_body_score_is_optional() {
        let body: ParticipationBody = serde_json::from_str("{}").unwrap();
        assert!(body.score.is_none());

        let body: ParticipationBody = serde_json::from_str(r#"{"score": 12.5}"#).unwrap();
        assert_eq!(body.score, Some(Decimal::new(125, 1)));
    }
}
