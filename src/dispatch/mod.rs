//! Hands a completed wizard to the outside world: a notification email and a
//! click-to-chat link for the respondent.

pub mod chat;
pub mod email;
pub mod guard;
pub mod summary;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::flow::{Flow, FlowError, Submission};

pub use chat::chat_link;
pub use email::{DisabledSender, EmailJsSender, EmailParams, EmailSender, SendError};
pub use guard::SubmitGuard;
pub use summary::{RequestSummary, build_summary, chat_text};

pub const RECEIVED_MESSAGE: &str = "Your request has been received. We will get back to you as soon as possible.";
pub const DEGRADED_MESSAGE: &str = "There was a problem sending the email, but your request has been received.";

/// Result of one dispatch. The request counts as received even when the email failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub email_delivered: bool,
    pub chat_link: Option<String>,
    pub message: String,
}

#[derive(Clone)]
pub struct Dispatcher {
    sender: Arc<dyn EmailSender>,
    to_email: String,
    chat_phone: String,
    guard: SubmitGuard,
}

impl Dispatcher {
    pub fn new(sender: Arc<dyn EmailSender>, to_email: impl Into<String>, chat_phone: impl Into<String>) -> Self {
        Dispatcher {
            sender,
            to_email: to_email.into(),
            chat_phone: chat_phone.into(),
            guard: SubmitGuard::default(),
        }
    }

    /// EmailJS when configured, otherwise a sender that always fails.
    pub fn from_config(config: &AppConfig) -> Self {
        let sender: Arc<dyn EmailSender> = match &config.emailjs {
            Some(emailjs) => match EmailJsSender::new(emailjs.clone()) {
                Ok(sender) => Arc::new(sender),
                Err(e) => {
                    log::error!("EmailJS client could not be built ({e}); request emails will not be sent");
                    Arc::new(DisabledSender)
                }
            },
            None => {
                log::warn!("EmailJS not configured; request emails will not be sent");
                Arc::new(DisabledSender)
            }
        };
        Dispatcher::new(sender, config.request_inbox.clone(), config.chat_phone.clone())
    }

    /// Whether a dispatch for the wizard with this nonce is running.
    pub fn is_in_flight(&self, nonce: &str) -> bool {
        self.guard.is_in_flight(nonce)
    }

    /// Send the request. Each wizard nonce is dispatched at most once; a
    /// replay fails with `AlreadySubmitting` or `AlreadySubmitted`.
    pub async fn dispatch(
        &self,
        submission: &Submission,
        flow: &Flow,
        category_name: &str,
    ) -> Result<DispatchOutcome, FlowError> {
        let claim = self.guard.begin(submission.nonce())?;

        let summary = build_summary(submission, flow, category_name);
        let contact = submission.contact();
        let params = EmailParams {
            to_email: self.to_email.clone(),
            from_name: contact.full_name.clone(),
            from_email: contact.email.clone(),
            from_phone: contact.phone.clone(),
            subject: summary.subject,
            message: summary.message,
        };

        let email_delivered = match self.sender.send(&params).await {
            Ok(()) => {
                log::info!("Request email for category {} sent to {}", submission.category_id(), self.to_email);
                true
            }
            Err(e) => {
                log::error!("Request email for category {} failed: {e}", submission.category_id());
                false
            }
        };

        claim.finish();
        Ok(DispatchOutcome {
            email_delivered,
            chat_link: chat_link(&self.chat_phone, &chat_text(contact, category_name)),
            message: if email_delivered { RECEIVED_MESSAGE } else { DEGRADED_MESSAGE }.to_string(),
        })
    }
}
