use sqlx::PgPool;

use crate::error::Result;
use crate::models::Obstacle;

pub struct ObstacleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ObstacleRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Obstacle>> {
        let obstacle = sqlx::query_as::<_, Obstacle>(
            "SELECT obstacle_id, name, points FROM obstacles WHERE obstacle_id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(obstacle)
    }

    /// Obstacles of a race test, ordered by ID
    pub async fn list_for_test(&self, test_id: i32) -> Result<Vec<Obstacle>> {
        let obstacles = sqlx::query_as::<_, Obstacle>(
            r#"
            SELECT o.obstacle_id, o.name, o.points
            FROM obstacles o
            INNER JOIN test_obstacles t ON t.obstacle_id = o.obstacle_id
            WHERE t.test_id = $1
            ORDER BY o.obstacle_id
            "#,
        )
        .bind(test_id)
        .fetch_all(self.pool)
        .await?;

        Ok(obstacles)
    }

    pub async fn belongs_to_test(&self, obstacle_id: i32, test_id: i32) -> Result<bool> {
        let linked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM test_obstacles WHERE obstacle_id = $1 AND test_id = $2)",
        )
        .bind(obstacle_id)
        .bind(test_id)
        .fetch_one(self.pool)
        .await?;

        Ok(linked)
    }
}
