use serde::{Deserialize, Serialize};

use crate::auth::validate;

/// Contact details collected on the terminal step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

impl ContactInfo {
    pub fn new(full_name: &str, email: &str, phone: &str) -> Self {
        ContactInfo {
            full_name: full_name.trim().to_string(),
            email: email.trim().to_string(),
            phone: phone.trim().to_string(),
        }
    }

    /// Validation messages; empty when the form can be submitted.
    pub fn errors(&self) -> Vec<String> {
        let mut errors = vec![];
        if self.full_name.trim().is_empty() {
            errors.push("Full name is required".to_string());
        }
        if !validate::is_email(&self.email) {
            errors.push("Enter a valid email address".to_string());
        }
        if self.phone.trim().is_empty() {
            errors.push("Phone number is required".to_string());
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }
}
