use sqlx::PgPool;

use crate::errors::AppError;
use super::types::*;

const SELECT_SERVICE: &str = "\
    SELECT id, name, description, price_cents, duration_minutes, category_id, \
           provider_name, created_at \
    FROM services";

/// Services, newest first, optionally restricted to one category.
pub async fn find_all(pool: &PgPool, category_id: Option<i64>) -> Result<Vec<Service>, AppError> {
    let rows = match category_id {
        Some(cid) => {
            let sql = format!("{SELECT_SERVICE} WHERE category_id = $1 ORDER BY created_at DESC, id DESC");
            sqlx::query_as::<_, Service>(&sql)
                .bind(cid)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("{SELECT_SERVICE} ORDER BY created_at DESC, id DESC");
            sqlx::query_as::<_, Service>(&sql)
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Service>, AppError> {
    let sql = format!("{SELECT_SERVICE} WHERE id = $1");
    let row = sqlx::query_as::<_, Service>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &PgPool, new: &NewService) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO services (name, description, price_cents, duration_minutes, category_id, provider_name) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.price_cents)
    .bind(new.duration_minutes)
    .bind(new.category_id)
    .bind(&new.provider_name)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn update(pool: &PgPool, id: i64, new: &NewService) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE services \
         SET name = $1, description = $2, price_cents = $3, duration_minutes = $4, \
             category_id = $5, provider_name = $6 \
         WHERE id = $7",
    )
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.price_cents)
    .bind(new.duration_minutes)
    .bind(new.category_id)
    .bind(&new.provider_name)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM services WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
