use sqlx::PgPool;

use crate::errors::AppError;
use super::types::*;

const SELECT_CATEGORY: &str = "\
    SELECT id, name, description, icon, parent_id, is_popular \
    FROM categories";

/// All categories, top-level first, then by name.
pub async fn find_all(pool: &PgPool) -> Result<Vec<Category>, AppError> {
    let sql = format!("{SELECT_CATEGORY} ORDER BY parent_id NULLS FIRST, name, id");
    let rows = sqlx::query_as::<_, Category>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Category>, AppError> {
    let sql = format!("{SELECT_CATEGORY} WHERE id = $1");
    let row = sqlx::query_as::<_, Category>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Insert a category and return its id.
pub async fn create(pool: &PgPool, new: &NewCategory) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO categories (name, description, icon, parent_id, is_popular) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&new.name)
    .bind(&new.description)
    .bind(&new.icon)
    .bind(new.parent_id)
    .bind(new.is_popular)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn update(pool: &PgPool, id: i64, new: &NewCategory) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE categories \
         SET name = $1, description = $2, icon = $3, parent_id = $4, is_popular = $5, \
             updated_at = NOW() \
         WHERE id = $6",
    )
    .bind(&new.name)
    .bind(&new.description)
    .bind(&new.icon)
    .bind(new.parent_id)
    .bind(new.is_popular)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Delete a category; its flow goes with it. Returns false if it did not exist.
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
