use sqlx::PgPool;

use crate::models::centre::{DietInfo, DietRow};

pub struct DietService;

impl DietService {
    pub async fn list(pool: &PgPool) -> anyhow::Result<Vec<DietInfo>> {
        let rows = sqlx::query_as::<_, DietRow>(
            "SELECT id, name, description FROM diets ORDER BY id",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(DietInfo::from).collect())
    }

    pub async fn get(pool: &PgPool, id: &str) -> anyhow::Result<Option<DietInfo>> {
        let row = sqlx::query_as::<_, DietRow>(
            "SELECT id, name, description FROM diets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(DietInfo::from))
    }
}
