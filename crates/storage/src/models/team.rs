use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A participant unit; `team_id` is the dorsal (bib) number.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Team {
    pub team_id: i32,
    pub name: String,
    pub owner_id: Option<i32>,
    pub created_at: chrono::NaiveDateTime,
}
