use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status")]
pub enum PaymentStatus {
    #[sqlx(rename = "unpaid")]
    #[serde(rename = "unpaid")]
    Unpaid,
    #[sqlx(rename = "paid-onsite")]
    #[serde(rename = "paid-onsite")]
    PaidOnsite,
    #[sqlx(rename = "paid-online")]
    #[serde(rename = "paid-online")]
    PaidOnline,
}

impl PaymentStatus {
    pub fn is_paid(self) -> bool {
        !matches!(self, PaymentStatus::Unpaid)
    }
}

/// A team's booking ("reserva") for one day of an event, read together with
/// the attempt ceiling of its ticket type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub booking_id: i32,
    pub team_id: i32,
    pub event_id: i32,
    pub ticket_type_id: i32,
    pub day: NaiveDate,
    pub payment_status: PaymentStatus,
    pub max_attempts: i32,
}
