use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Event;

/// Request payload for creating a new event
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEventRequest {
    #[validate(length(min = 3, max = 50, message = "Name must be between 3 and 50 characters"))]
    pub name: String,

    #[validate(length(
        min = 5,
        max = 100,
        message = "Venue must be between 5 and 100 characters"
    ))]
    pub venue: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    pub start_at: NaiveDateTime,

    pub end_at: NaiveDateTime,
}

/// Request payload for updating an existing event; absent fields keep their value
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateEventRequest {
    #[validate(length(min = 3, max = 50, message = "Name must be between 3 and 50 characters"))]
    pub name: Option<String>,

    #[validate(length(
        min = 5,
        max = 100,
        message = "Venue must be between 5 and 100 characters"
    ))]
    pub venue: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    pub start_at: Option<NaiveDateTime>,

    pub end_at: Option<NaiveDateTime>,
}

/// Response containing event details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub event_id: i32,
    pub name: String,
    pub venue: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
}

fn check_interval(start_at: NaiveDateTime, end_at: NaiveDateTime) -> Result<(), &'static str> {
    if end_at < start_at {
        return Err("End date must be on or after start date");
    }
    Ok(())
}

impl CreateEventRequest {
    /// Additional validation that requires multiple fields
    pub fn validate_dates(&self) -> Result<(), &'static str> {
        check_interval(self.start_at, self.end_at)
    }
}

impl UpdateEventRequest {
    /// Applies the update on top of `existing`, producing the full row to store.
    pub fn merge_into(&self, existing: &Event) -> CreateEventRequest {
        CreateEventRequest {
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            venue: self.venue.clone().unwrap_or_else(|| existing.venue.clone()),
            latitude: self.latitude.or(existing.latitude),
            longitude: self.longitude.or(existing.longitude),
            start_at: self.start_at.unwrap_or(existing.start_at),
            end_at: self.end_at.unwrap_or(existing.end_at),
        }
    }
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            event_id: event.event_id,
            name: event.name,
            venue: event.venue,
            latitude: event.latitude,
            longitude: event.longitude,
            start_at: event.start_at,
            end_at: event.end_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn request(start_at: NaiveDateTime, end_at: NaiveDateTime) -> CreateEventRequest {
        CreateEventRequest {
            name: "Summer Mud Run".to_string(),
            venue: "Parque del Retiro".to_string(),
            latitude: None,
            longitude: None,
            start_at,
            end_at,
        }
    }

    #[test]
    fn test_validate_dates_rejects_reversed_interval() {
        assert!(request(at(10, 9), at(12, 20)).validate_dates().is_ok());
        assert!(request(at(10, 9), at(10, 9)).validate_dates().is_ok());
        assert!(request(at(12, 9), at(10, 20)).validate_dates().is_err());
    }

    #[test]
    fn test_field_lengths_are_validated() {
        let mut req = request(at(10, 9), at(12, 20));
        assert!(req.validate().is_ok());

        req.name = "5k".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_keeps_missing_fields() {
        let existing = Event {
            event_id: 4,
            name: "Spring Race".to_string(),
            venue: "Casa de Campo".to_string(),
            latitude: Some(40.41),
            longitude: Some(-3.75),
            start_at: at(1, 8),
            end_at: at(2, 20),
            created_at: at(1, 0),
        };
        let update = UpdateEventRequest {
            end_at: Some(at(3, 20)),
            ..Default::default()
        };

        let merged = update.merge_into(&existing);
        assert_eq!(merged.name, "Spring Race");
        assert_eq!(merged.start_at, at(1, 8));
        assert_eq!(merged.end_at, at(3, 20));
        assert_eq!(merged.latitude, Some(40.41));
    }
}
