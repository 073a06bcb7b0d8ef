use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::Booking;

pub struct BookingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The team's booking for an event on `day`, joined with its ticket's
    /// attempt ceiling. A paid booking wins over an unpaid one.
    pub async fn find_for_team_on(
        &self,
        team_id: i32,
        event_id: i32,
        day: NaiveDate,
    ) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT b.booking_id, b.team_id, b.event_id, b.ticket_type_id, b.day,
                   b.payment_status, t.max_attempts
            FROM bookings b
            INNER JOIN ticket_types t ON t.ticket_type_id = b.ticket_type_id
            WHERE b.team_id = $1 AND b.event_id = $2 AND b.day = $3
            ORDER BY (b.payment_status <> 'unpaid') DESC, b.booking_id
            LIMIT 1
            "#,
        )
        .bind(team_id)
        .bind(event_id)
        .bind(day)
        .fetch_optional(self.pool)
        .await?;

        Ok(booking)
    }
}
