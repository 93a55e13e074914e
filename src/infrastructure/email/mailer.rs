use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;
use zeroize::Zeroizing;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// A rendered email ready for a transport.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Object-safe transport abstraction: `ResendMailer` in production,
/// `LogMailer` when no API key is configured, `FakeMailer` in tests.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<()>;

    /// Short transport label surfaced by the health endpoint.
    fn kind(&self) -> &'static str;
}

pub struct ResendMailer {
    client: reqwest::Client,
    api_key: Zeroizing<String>,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        ResendMailer {
            client: reqwest::Client::new(),
            api_key: Zeroizing::new(api_key.into()),
            from: from.into(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        let body = serde_json::json!({
            "from": self.from,
            "to": message.to,
            "subject": message.subject,
            "html": message.html,
            "text": message.text,
        });

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(self.api_key.as_str())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Resend API error {}: {}", status, body));
        }

        info!(to = %message.to, subject = %message.subject, "email sent via Resend");
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "resend"
    }
}

/// Logs instead of sending. Keeps local development working without
/// credentials.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "would send email:\n{}",
            message.text,
        );
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "log"
    }
}

/// Captures messages in memory for assertions. Recipients registered through
/// [`FakeMailer::fail_for`] make `send` return an error instead.
#[derive(Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, recipient: impl Into<String>) {
        self.failing.lock().insert(recipient.into());
    }

    pub fn sent_messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn last_message(&self) -> Option<EmailMessage> {
        self.sent.lock().last().cloned()
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        if self.failing.lock().contains(&message.to) {
            return Err(anyhow::anyhow!("simulated delivery failure to {}", message.to));
        }
        self.sent.lock().push(message);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_to(to: &str) -> EmailMessage {
        EmailMessage {
            to: to.into(),
            subject: "Hello".into(),
            html: "<p>Hello</p>".into(),
            text: "Hello".into(),
        }
    }

    #[tokio::test]
    async fn fake_mailer_captures_messages_in_order() {
        let mailer = FakeMailer::new();
        mailer.send(message_to("first@example.com")).await.unwrap();
        mailer.send(message_to("second@example.com")).await.unwrap();

        let sent = mailer.sent_messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "first@example.com");
        assert_eq!(sent[1].to, "second@example.com");
    }

    #[tokio::test]
    async fn fake_mailer_fails_only_for_registered_recipients() {
        let mailer = FakeMailer::new();
        mailer.fail_for("broken@example.com");

        assert!(mailer.send(message_to("broken@example.com")).await.is_err());
        assert!(mailer.send(message_to("fine@example.com")).await.is_ok());
        assert_eq!(mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn log_mailer_accepts_anything() {
        LogMailer.send(message_to("anyone@example.com")).await.unwrap();
        assert_eq!(LogMailer.kind(), "log");
    }
}
