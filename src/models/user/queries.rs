use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use super::types::*;

const SELECT_USER: &str = "\
    SELECT id, name, email, password_hash, role, phone, created_at \
    FROM users";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let role = Role::parse(&row.role).unwrap_or_else(|| {
            log::warn!("User {} has unknown role '{}', treating as user", row.id, row.role);
            Role::User
        });
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let sql = format!("{SELECT_USER} WHERE email = $1");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;
    Ok(row.map(User::from))
}

pub async fn find_all(pool: &PgPool) -> Result<Vec<User>, AppError> {
    let sql = format!("{SELECT_USER} ORDER BY created_at DESC, id DESC");
    let rows = sqlx::query_as::<_, UserRow>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(User::from).collect())
}

pub async fn create(pool: &PgPool, new: &NewUser) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password_hash, role, phone) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&new.name)
    .bind(normalize_email(&new.email))
    .bind(&new.password_hash)
    .bind(new.role.as_str())
    .bind(&new.phone)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn set_role(pool: &PgPool, id: i64, role: Role) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
        .bind(role.as_str())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_admins(pool: &PgPool) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Create the account or promote it to admin with a new password.
pub async fn upsert_admin(pool: &PgPool, name: &str, email: &str, password_hash: &str) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password_hash, role) \
         VALUES ($1, $2, $3, 'admin') \
         ON CONFLICT (email) DO UPDATE \
         SET role = 'admin', password_hash = EXCLUDED.password_hash \
         RETURNING id",
    )
    .bind(name)
    .bind(normalize_email(email))
    .bind(password_hash)
    .fetch_one(pool)
    .await?;
    Ok(id)
}
