//! Email gateway: one send operation per message kind over a single transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use herald_common::error::AppError;

use crate::templates;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Who an email goes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

impl Recipient {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Renders and transmits emails.
///
/// Implementors provide the transport (`send_email`); the per-kind methods
/// render their template and hand it over. Each call either fully succeeds
/// or returns an error.
#[async_trait]
pub trait EmailGateway: Send + Sync {
    async fn send_email(&self, to: &Recipient, message: EmailMessage) -> Result<(), AppError>;

    async fn send_welcome(&self, to: &Recipient) -> Result<(), AppError> {
        self.send_email(to, templates::welcome(&to.name)).await
    }

    async fn send_reminder(
        &self,
        to: &Recipient,
        event_title: &str,
        event_date: &str,
    ) -> Result<(), AppError> {
        self.send_email(to, templates::reminder(&to.name, event_title, event_date))
            .await
    }

    async fn send_registration_confirmation(
        &self,
        to: &Recipient,
        event_title: &str,
        event_date: &str,
        event_location: &str,
    ) -> Result<(), AppError> {
        let message =
            templates::registration_confirmation(&to.name, event_title, event_date, event_location);
        self.send_email(to, message).await
    }

    async fn send_cancellation(&self, to: &Recipient, event_title: &str) -> Result<(), AppError> {
        self.send_email(to, templates::cancellation(&to.name, event_title))
            .await
    }

    async fn send_update(
        &self,
        to: &Recipient,
        event_title: &str,
        update_message: &str,
    ) -> Result<(), AppError> {
        self.send_email(to, templates::update(&to.name, event_title, update_message))
            .await
    }
}

/// Format an address as `"Display Name" <email>`.
///
/// The display name is always quoted so commas and angle brackets in it
/// stay inside the name; backslashes, quotes and line breaks are escaped or
/// dropped. An empty name yields the bare address.
fn mailbox(name: &str, email: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return email.to_string();
    }

    let mut quoted = String::with_capacity(name.len() + 2);
    for c in name.chars() {
        match c {
            '\\' | '"' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\r' | '\n' => {}
            _ => quoted.push(c),
        }
    }
    format!("\"{}\" <{}>", quoted, email)
}

/// Writes each message to the log and keeps nothing.
///
/// Used when no mail provider is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl EmailGateway for LogMailer {
    async fn send_email(&self, to: &Recipient, message: EmailMessage) -> Result<(), AppError> {
        tracing::info!(
            to = %to.email,
            subject = %message.subject,
            "Email not sent, no mail provider configured"
        );
        Ok(())
    }
}

/// Delivers through the Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
    endpoint: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from_email: &str, from_name: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from: mailbox(from_name, from_email),
            endpoint: RESEND_API_URL.to_string(),
        }
    }

    /// Point the mailer at a different API base (e.g. a local mock).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl EmailGateway for ResendMailer {
    async fn send_email(&self, to: &Recipient, message: EmailMessage) -> Result<(), AppError> {
        let body = json!({
            "from": self.from,
            "to": [mailbox(&to.name, &to.email)],
            "subject": message.subject,
            "html": message.html,
            "text": message.text,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Email(format!("failed to send email: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Email(format!(
                "mail provider returned {}: {}",
                status, detail
            )));
        }

        tracing::debug!(to = %to.email, "Email accepted by provider");
        Ok(())
    }
}
