use sqlx::PgPool;

use crate::errors::AppError;
use crate::flow::{Flow, Step};

#[derive(sqlx::FromRow)]
struct FlowRow {
    id: i64,
    category_id: i64,
    initial_step_id: String,
    steps: String,
}

impl FlowRow {
    fn into_flow(self) -> Result<Flow, AppError> {
        let steps: Vec<Step> = serde_json::from_str(&self.steps)
            .map_err(|e| AppError::Db(sqlx::Error::Decode(Box::new(e))))?;
        Ok(Flow {
            id: self.id,
            category_id: self.category_id,
            initial_step_id: self.initial_step_id,
            steps,
        })
    }
}

/// Load the intake flow of a category. Steps are stored as one JSONB document.
pub async fn find_by_category(pool: &PgPool, category_id: i64) -> Result<Option<Flow>, AppError> {
    let row = sqlx::query_as::<_, FlowRow>(
        "SELECT id, category_id, initial_step_id, steps::text AS steps \
         FROM category_flows WHERE category_id = $1",
    )
    .bind(category_id)
    .fetch_optional(pool)
    .await?;

    row.map(FlowRow::into_flow).transpose()
}

/// Insert or replace the flow of `flow.category_id`; returns the stored flow with its id.
pub async fn save(pool: &PgPool, flow: &Flow) -> Result<Flow, AppError> {
    let steps = serde_json::to_string(&flow.steps)
        .map_err(|e| AppError::Db(sqlx::Error::Encode(Box::new(e))))?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO category_flows (category_id, initial_step_id, steps) \
         VALUES ($1, $2, $3::jsonb) \
         ON CONFLICT (category_id) DO UPDATE \
         SET initial_step_id = EXCLUDED.initial_step_id, \
             steps = EXCLUDED.steps, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(flow.category_id)
    .bind(&flow.initial_step_id)
    .bind(&steps)
    .fetch_one(pool)
    .await?;

    Ok(Flow { id, ..flow.clone() })
}
