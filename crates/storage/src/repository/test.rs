use sqlx::PgPool;

use crate::error::Result;
use crate::models::Test;

pub struct TestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TestRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Test>> {
        let test = sqlx::query_as::<_, Test>(
            r#"
            SELECT test_id, name, kind, info, created_at
            FROM tests
            WHERE test_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(test)
    }

    /// Tests linked to an event, ordered by ID
    pub async fn list_for_event(&self, event_id: i32) -> Result<Vec<Test>> {
        let tests = sqlx::query_as::<_, Test>(
            r#"
            SELECT t.test_id, t.name, t.kind, t.info, t.created_at
            FROM tests t
            INNER JOIN event_tests et ON et.test_id = t.test_id
            WHERE et.event_id = $1
            ORDER BY t.test_id
            "#,
        )
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(tests)
    }

    pub async fn belongs_to_event(&self, test_id: i32, event_id: i32) -> Result<bool> {
        let linked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM event_tests WHERE test_id = $1 AND event_id = $2)",
        )
        .bind(test_id)
        .bind(event_id)
        .fetch_one(self.pool)
        .await?;

        Ok(linked)
    }
}
