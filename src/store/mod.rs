//! Repository traits the handlers depend on. [`PgStore`] backs them with
//! PostgreSQL; [`MemoryStore`] keeps everything in process for tests and
//! database-less runs.

pub mod memory;
pub mod pg;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::flow::Flow;
use crate::models::category::{Category, NewCategory};
use crate::models::service::{NewService, Service};
use crate::models::user::{NewUser, Role, User};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Categories, their intake flows and the services offered in them.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;
    async fn find_category(&self, id: i64) -> Result<Option<Category>, AppError>;
    async fn create_category(&self, new: &NewCategory) -> Result<i64, AppError>;
    async fn update_category(&self, id: i64, new: &NewCategory) -> Result<(), AppError>;
    async fn delete_category(&self, id: i64) -> Result<bool, AppError>;

    async fn find_flow(&self, category_id: i64) -> Result<Option<Flow>, AppError>;
    /// Insert or replace the flow for `flow.category_id`.
    async fn save_flow(&self, flow: &Flow) -> Result<Flow, AppError>;

    async fn list_services(&self, category_id: Option<i64>) -> Result<Vec<Service>, AppError>;
    async fn find_service(&self, id: i64) -> Result<Option<Service>, AppError>;
    async fn create_service(&self, new: &NewService) -> Result<i64, AppError>;
    async fn update_service(&self, id: i64, new: &NewService) -> Result<(), AppError>;
    async fn delete_service(&self, id: i64) -> Result<bool, AppError>;
}

/// Accounts for sign-in and the admin user list.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn create_user(&self, new: &NewUser) -> Result<i64, AppError>;
    async fn set_role(&self, id: i64, role: Role) -> Result<bool, AppError>;
    async fn delete_user(&self, id: i64) -> Result<bool, AppError>;
    async fn count_admins(&self) -> Result<i64, AppError>;
    async fn upsert_admin(&self, name: &str, email: &str, password_hash: &str) -> Result<i64, AppError>;
}
