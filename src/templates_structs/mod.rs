// Template context structures for Askama templates, organized by area.

use actix_session::Session;

use crate::auth::csrf;
use crate::auth::session::{CurrentUser, current_user, take_flash};
use crate::config::AppConfig;
use crate::models::category::Category;

/// Context shared by every page. Templates access these as `ctx.app_name`, etc.
pub struct PageContext {
    pub app_name: String,
    pub user: Option<CurrentUser>,
    pub flash: Option<String>,
    pub csrf_token: String,
    pub current_path: String,
}

impl PageContext {
    pub fn build(session: &Session, config: &AppConfig, current_path: &str) -> Self {
        PageContext {
            app_name: config.app_name.clone(),
            user: current_user(session),
            flash: take_flash(session),
            csrf_token: csrf::get_or_create_token(session),
            current_path: current_path.to_string(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(CurrentUser::is_admin)
    }

    pub fn user_name(&self) -> &str {
        self.user.as_ref().map(|u| u.name.as_str()).unwrap_or("")
    }

    /// Whether a nav link should be highlighted for `prefix`.
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/admin" {
            return self.current_path == prefix;
        }
        self.current_path.starts_with(prefix)
    }
}

/// One entry of a `<select>`.
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        SelectOption { value: value.into(), label: label.into(), selected }
    }
}

/// Category with its optional fields flattened for display.
pub struct CategoryCard {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub is_popular: bool,
}

impl From<&Category> for CategoryCard {
    fn from(c: &Category) -> Self {
        CategoryCard {
            id: c.id,
            name: c.name.clone(),
            description: c.description.clone().unwrap_or_default(),
            icon: c.icon.clone().unwrap_or_else(|| "🏠".to_string()),
            is_popular: c.is_popular,
        }
    }
}

mod admin;
mod auth;
mod public;
mod wizard;

pub use admin::*;
pub use auth::*;
pub use public::*;
pub use wizard::*;
