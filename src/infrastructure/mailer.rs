//! Outbound mail

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::domain::DomainError;

/// Template used for the account activation mail
pub const USER_WELCOME_TEMPLATE: &str = "user_welcome";

/// Sends templated messages to users
#[async_trait]
pub trait Mailer: Send + Sync + Debug {
    async fn send(&self, recipient: &str, template: &str, data: Value) -> Result<(), DomainError>;
}

/// Mailer that writes each message to the log instead of delivering it
#[derive(Debug, Clone)]
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, recipient: &str, template: &str, data: Value) -> Result<(), DomainError> {
        info!(
            sender = %self.sender,
            recipient,
            template,
            data = %data,
            "Mail message"
        );
        Ok(())
    }
}
