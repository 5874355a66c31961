//! Notification gateway: transactional email for the delegation flow
//!
//! Sends are fire-and-forget from the caller's point of view; a failed send
//! is logged, never retried here, and never fails the operation that
//! triggered it.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};

/// A rendered transactional email
#[derive(Debug, Clone, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Dispatches transactional email
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send(&self, email: Email) -> Result<()>;
}

/// HTTP client for the mail relay service
pub struct MailRelayClient {
    client: Client,
    base_url: String,
    from: String,
}

impl MailRelayClient {
    pub fn new(base_url: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            from: from.into(),
        }
    }
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[async_trait]
impl NotificationGateway for MailRelayClient {
    async fn send(&self, email: Email) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&RelayMessage {
                from: &self.from,
                to: &email.to,
                subject: &email.subject,
                html: &email.html,
            })
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Mail relay rejected message: {} - {}",
                status, text
            )));
        }

        Ok(())
    }
}

/// Invitation email carrying the invite link.
pub fn invite_email(
    to: &str,
    executor_name: &str,
    principal_name: &str,
    invite_link: &str,
) -> Email {
    Email {
        to: to.to_string(),
        subject: "Executor Invitation - Placerly".to_string(),
        html: format!(
            "<div style=\"font-family: Arial, sans-serif; color: #333\">\
             <h2>Hello {executor_name},</h2>\
             <p>{principal_name} has added you as their <strong>Executor</strong> on <b>Placerly</b>.</p>\
             <p>To accept the invitation and gain access, please click the link below:</p>\
             <p><a href=\"{invite_link}\">Accept Invitation</a></p>\
             <p>This link will expire in 7 days.</p>\
             <p>Thank you,<br/><strong>Placerly Team</strong></p>\
             </div>"
        ),
    }
}

/// Tells the principal their invitation was accepted.
pub fn acceptance_email(to: &str, principal_name: &str, executor_name: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Executor Invitation Accepted - Placerly".to_string(),
        html: format!(
            "<div style=\"font-family: Arial, sans-serif; color: #333\">\
             <h2>Hello {principal_name},</h2>\
             <p>{executor_name} has accepted your executor invitation and can now \
             access your records on <b>Placerly</b>.</p>\
             <p>Thank you,<br/><strong>Placerly Team</strong></p>\
             </div>"
        ),
    }
}

/// Carries the generated credential for a freshly provisioned executor account.
pub fn credentials_email(to: &str, executor_name: &str, password: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Your Placerly Executor Account".to_string(),
        html: format!(
            "<div style=\"font-family: Arial, sans-serif; color: #333\">\
             <h2>Hello {executor_name},</h2>\
             <p>An executor account has been created for you on <b>Placerly</b>.</p>\
             <p>Sign in with this email address and the temporary password \
             <strong>{password}</strong>, then change it right away.</p>\
             <p>Thank you,<br/><strong>Placerly Team</strong></p>\
             </div>"
        ),
    }
}
