use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::EmailJsConfig;

const EMAILJS_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";
const EMAILJS_TIMEOUT: Duration = Duration::from_secs(15);
const EMAILJS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Template parameters of the request notification email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailParams {
    pub to_email: String,
    pub from_name: String,
    pub from_email: String,
    pub from_phone: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug)]
pub enum SendError {
    /// No email provider is configured.
    Disabled,
    Transport(String),
    Rejected { status: u16, body: String },
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Disabled => write!(f, "email delivery is not configured"),
            SendError::Transport(e) => write!(f, "email request failed: {e}"),
            SendError::Rejected { status, body } => {
                write!(f, "email provider rejected the request ({status}): {body}")
            }
        }
    }
}

impl std::error::Error for SendError {}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, params: &EmailParams) -> Result<(), SendError>;
}

/// Sends through the EmailJS REST API.
pub struct EmailJsSender {
    client: reqwest::Client,
    config: EmailJsConfig,
}

impl EmailJsSender {
    pub fn new(config: EmailJsConfig) -> Result<Self, SendError> {
        let client = reqwest::Client::builder()
            .timeout(EMAILJS_TIMEOUT)
            .connect_timeout(EMAILJS_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| SendError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[derive(Serialize)]
struct EmailJsRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a EmailParams,
}

#[async_trait]
impl EmailSender for EmailJsSender {
    async fn send(&self, params: &EmailParams) -> Result<(), SendError> {
        let body = EmailJsRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.public_key,
            template_params: params,
        };

        let resp = self
            .client
            .post(EMAILJS_SEND_URL)
            .json(&body)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(SendError::Rejected { status: status.as_u16(), body })
    }
}

/// Used when EmailJS is not configured; every send fails with [`SendError::Disabled`].
pub struct DisabledSender;

#[async_trait]
impl EmailSender for DisabledSender {
    async fn send(&self, _params: &EmailParams) -> Result<(), SendError> {
        Err(SendError::Disabled)
    }
}
