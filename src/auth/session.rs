use actix_session::Session;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::user::{Role, User};

const USER_KEY: &str = "current_user";
const FLASH_KEY: &str = "flash";

/// Identity exposed to handlers: who is signed in and with which role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Start an authenticated session for `user`.
pub fn sign_in(session: &Session, user: &User) -> Result<(), AppError> {
    session.renew();
    let current = CurrentUser { id: user.id, name: user.name.clone(), role: user.role };
    session
        .insert(USER_KEY, &current)
        .map_err(|e| AppError::Session(e.to_string()))
}

pub fn current_user(session: &Session) -> Option<CurrentUser> {
    session.get::<CurrentUser>(USER_KEY).unwrap_or(None)
}

pub fn require_admin(session: &Session) -> Result<CurrentUser, AppError> {
    match current_user(session) {
        Some(user) if user.is_admin() => Ok(user),
        Some(user) => Err(AppError::PermissionDenied(format!("user {} is not an admin", user.id))),
        None => Err(AppError::Session("Not signed in".to_string())),
    }
}

pub fn set_flash(session: &Session, message: impl Into<String>) {
    let _ = session.insert(FLASH_KEY, message.into());
}

pub fn take_flash(session: &Session) -> Option<String> {
    let flash = session.get::<String>(FLASH_KEY).unwrap_or(None);
    if flash.is_some() {
        session.remove(FLASH_KEY);
    }
    flash
}
