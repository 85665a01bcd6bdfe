use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::flow::Flow;
use crate::models::category::{self, Category, NewCategory};
use crate::models::flow;
use crate::models::service::{self, NewService, Service};
use crate::models::user::{self, NewUser, Role, User};
use super::{CatalogStore, UserStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        category::queries::find_all(&self.pool).await
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        category::queries::find_by_id(&self.pool, id).await
    }

    async fn create_category(&self, new: &NewCategory) -> Result<i64, AppError> {
        category::queries::create(&self.pool, new)
            .await
            .map_err(|e| conflict(e, || format!("A category named '{}' already exists", new.name)))
    }

    async fn update_category(&self, id: i64, new: &NewCategory) -> Result<(), AppError> {
        category::queries::update(&self.pool, id, new)
            .await
            .map_err(|e| conflict(e, || format!("A category named '{}' already exists", new.name)))
    }

    async fn delete_category(&self, id: i64) -> Result<bool, AppError> {
        category::queries::delete(&self.pool, id)
            .await
            .map_err(|e| conflict(e, || "Category still has services".to_string()))
    }

    async fn find_flow(&self, category_id: i64) -> Result<Option<Flow>, AppError> {
        flow::queries::find_by_category(&self.pool, category_id).await
    }

    async fn save_flow(&self, flow: &Flow) -> Result<Flow, AppError> {
        flow::queries::save(&self.pool, flow).await
    }

    async fn list_services(&self, category_id: Option<i64>) -> Result<Vec<Service>, AppError> {
        service::queries::find_all(&self.pool, category_id).await
    }

    async fn find_service(&self, id: i64) -> Result<Option<Service>, AppError> {
        service::queries::find_by_id(&self.pool, id).await
    }

    async fn create_service(&self, new: &NewService) -> Result<i64, AppError> {
        service::queries::create(&self.pool, new).await
    }

    async fn update_service(&self, id: i64, new: &NewService) -> Result<(), AppError> {
        service::queries::update(&self.pool, id, new).await
    }

    async fn delete_service(&self, id: i64) -> Result<bool, AppError> {
        service::queries::delete(&self.pool, id).await
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        user::queries::find_by_email(&self.pool, email).await
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        user::queries::find_all(&self.pool).await
    }

    async fn create_user(&self, new: &NewUser) -> Result<i64, AppError> {
        user::queries::create(&self.pool, new)
            .await
            .map_err(|e| conflict(e, || format!("Email '{}' is already registered", new.email)))
    }

    async fn set_role(&self, id: i64, role: Role) -> Result<bool, AppError> {
        user::queries::set_role(&self.pool, id, role).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        user::queries::delete(&self.pool, id).await
    }

    async fn count_admins(&self) -> Result<i64, AppError> {
        user::queries::count_admins(&self.pool).await
    }

    async fn upsert_admin(&self, name: &str, email: &str, password_hash: &str) -> Result<i64, AppError> {
        user::queries::upsert_admin(&self.pool, name, email, password_hash).await
    }
}

/// Turn unique and foreign key violations into a user-facing conflict.
fn conflict(e: AppError, message: impl FnOnce() -> String) -> AppError {
    match e {
        AppError::Db(sqlx::Error::Database(db))
            if db.is_unique_violation() || db.is_foreign_key_violation() =>
        {
            AppError::Conflict(message())
        }
        other => other,
    }
}
