use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::validate::{validate_email, validate_optional, validate_password, validate_required};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Provider,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Provider, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Provider => "provider",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Role::ALL.into_iter().find(|r| r.as_str() == s.trim().to_lowercase())
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::User => "Customer",
            Role::Provider => "Service provider",
            Role::Admin => "Administrator",
        }
    }
}

/// Account record, including the password hash. Never handed to templates as-is.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New account data; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub phone: String,
    pub csrf_token: String,
}

impl RegisterForm {
    pub fn errors(&self) -> Vec<String> {
        let mut errors = vec![];
        errors.extend(validate_required(&self.name, "Name", 100));
        errors.extend(validate_email(&self.email));
        errors.extend(validate_password(&self.password));
        if self.password != self.password_confirm {
            errors.push("Passwords do not match".to_string());
        }
        errors.extend(validate_optional(&self.phone, "Phone", 30));
        errors
    }
}

/// Emails are compared case-insensitively; stored lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
