use std::env;

use actix_web::cookie::Key;

/// EmailJS identifiers; all three must be present for email delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

/// Runtime settings read from the environment (and `.env`, when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Absent: the app runs on the in-memory store with demo data.
    pub database_url: Option<String>,
    pub session_key: Option<String>,
    pub app_name: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub emailjs: Option<EmailJsConfig>,
    /// Inbox that receives new service requests.
    pub request_inbox: String,
    /// Number used for click-to-chat links, digits only with country code.
    pub chat_phone: String,
    pub success_redirect_secs: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_addr: "127.0.0.1:8080".to_string(),
            database_url: None,
            session_key: None,
            app_name: "HomeServe".to_string(),
            admin_email: None,
            admin_password: None,
            emailjs: None,
            request_inbox: "requests@homeserve.local".to_string(),
            chat_phone: "905313553274".to_string(),
            success_redirect_secs: 10,
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => log::info!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => log::warn!("Ignoring unreadable .env file: {e}"),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = AppConfig::default();

        let emailjs = match (
            get("EMAILJS_SERVICE_ID"),
            get("EMAILJS_TEMPLATE_ID"),
            get("EMAILJS_PUBLIC_KEY"),
        ) {
            (Some(service_id), Some(template_id), Some(public_key)) => {
                Some(EmailJsConfig { service_id, template_id, public_key })
            }
            (None, None, None) => None,
            _ => {
                log::warn!("EmailJS configuration is incomplete; email delivery disabled");
                None
            }
        };

        let success_redirect_secs = match get("SUCCESS_REDIRECT_SECS") {
            Some(v) => v.parse().unwrap_or_else(|_| {
                log::warn!("SUCCESS_REDIRECT_SECS '{v}' is not a number, using default");
                defaults.success_redirect_secs
            }),
            None => defaults.success_redirect_secs,
        };

        AppConfig {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: get("DATABASE_URL"),
            session_key: get("SESSION_KEY"),
            app_name: get("APP_NAME").unwrap_or(defaults.app_name),
            admin_email: get("ADMIN_EMAIL"),
            admin_password: get("ADMIN_PASSWORD"),
            emailjs,
            request_inbox: get("REQUEST_INBOX_EMAIL").unwrap_or(defaults.request_inbox),
            chat_phone: get("CHAT_PHONE")
                .map(|p| p.chars().filter(char::is_ascii_digit).collect())
                .unwrap_or(defaults.chat_phone),
            success_redirect_secs,
        }
    }

    /// Cookie signing key. Falls back to a random key (sessions lost on restart).
    pub fn cookie_key(&self) -> Key {
        match &self.session_key {
            Some(val) if val.len() >= 64 => {
                log::info!("Using SESSION_KEY from environment");
                Key::from(val.as_bytes())
            }
            Some(val) => {
                log::warn!("SESSION_KEY too short ({} bytes, need 64+); generating random key", val.len());
                Key::generate()
            }
            None => {
                log::warn!("No SESSION_KEY set; generating random key (sessions lost on restart)");
                Key::generate()
            }
        }
    }
}
