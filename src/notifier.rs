use std::time::Duration;

use aws_config::environment::credentials::EnvironmentVariableCredentialsProvider;
use aws_config::BehaviorVersion;
use aws_sdk_sesv2::config::Region;
use aws_sdk_sesv2::error::{BuildError, DisplayErrorContext};
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client;
use thiserror::Error;
use tracing::info;

use crate::models::Alert;

const CHARSET: &str = "UTF-8";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to build email: {0}")]
    Build(#[from] BuildError),
    #[error("email provider rejected send: {0}")]
    Send(String),
    #[error("email send timed out after {0:?}")]
    Timeout(Duration),
}

pub trait AlertNotifier {
    /// Dispatches one alert, returning the provider's message id.
    async fn send(&self, alert: &Alert) -> Result<String, NotifyError>;
}

pub struct SesNotifier {
    client: Client,
    timeout: Duration,
}

impl SesNotifier {
    /// Credentials come from `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` only.
    pub async fn new(region: &str, timeout: Duration) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(EnvironmentVariableCredentialsProvider::new())
            .load()
            .await;

        info!(region, "SES client configured");

        Self {
            client: Client::new(&sdk_config),
            timeout,
        }
    }
}

impl AlertNotifier for SesNotifier {
    async fn send(&self, alert: &Alert) -> Result<String, NotifyError> {
        let destination = Destination::builder()
            .set_to_addresses(Some(alert.recipients.clone()))
            .build();

        let subject = Content::builder().data(&alert.subject).charset(CHARSET).build()?;
        let text = Content::builder().data(&alert.body).charset(CHARSET).build()?;
        let message = Message::builder()
            .subject(subject)
            .body(Body::builder().text(text).build())
            .build();

        let request = self
            .client
            .send_email()
            .from_email_address(&alert.source)
            .destination(destination)
            .content(EmailContent::builder().simple(message).build())
            .send();

        let output = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| NotifyError::Timeout(self.timeout))?
            .map_err(|e| NotifyError::Send(DisplayErrorContext(e).to_string()))?;

        Ok(output.message_id().unwrap_or_default().to_string())
    }
}
