use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Obstacle {
    pub obstacle_id: i32,
    pub name: String,
    pub points: i32,
}
