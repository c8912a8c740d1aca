//! Email transport that keeps messages in memory.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use herald_common::error::AppError;

use crate::email::{EmailGateway, EmailMessage, Recipient};

/// A message accepted by [`InMemoryMailer`].
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: Recipient,
    pub message: EmailMessage,
}

/// Records every message instead of delivering it. Addresses registered
/// with [`InMemoryMailer::fail_for`] are rejected with an `Email` error.
///
/// Nothing is ever evicted, so this is for tests only; a server without a
/// mail provider uses [`crate::email::LogMailer`].
#[derive(Default)]
pub struct InMemoryMailer {
    sent: Mutex<Vec<SentEmail>>,
    failing: Mutex<HashSet<String>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_for(&self, email: &str) {
        self.failing.lock().await.insert(email.to_string());
    }

    pub async fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailGateway for InMemoryMailer {
    async fn send_email(&self, to: &Recipient, message: EmailMessage) -> Result<(), AppError> {
        if self.failing.lock().await.contains(&to.email) {
            return Err(AppError::Email(format!("mailbox {} rejected the message", to.email)));
        }

        tracing::debug!(to = %to.email, subject = %message.subject, "Email recorded in memory");
        self.sent.lock().await.push(SentEmail {
            to: to.clone(),
            message,
        });
        Ok(())
    }
}
