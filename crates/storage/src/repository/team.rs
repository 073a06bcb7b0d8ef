use sqlx::PgPool;

use crate::error::Result;
use crate::models::Team;

pub struct TeamRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TeamRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a team by its dorsal number
    pub async fn find_by_id(&self, id: i32) -> Result<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(
            "SELECT team_id, name, owner_id, created_at FROM teams WHERE team_id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(team)
    }
}
