//! Notification delivery.
//!
//! Email delivery is best-effort by design: a failure here is logged and
//! recorded as `emailSent = false`, never escalated into the run's
//! status. The production driver posts to an HTTP mail relay; tests swap
//! in a recording fake through the [`Notifier`] trait.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::MailerConfig;

/// Narrow interface over the notification backend.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one result notification.
    async fn send(&self, recipient: &str, prompt: &str, response: &str) -> anyhow::Result<()>;
}

/// HTTP mail-relay driver.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: Client,
    config: MailerConfig,
}

impl HttpMailer {
    /// Create a new mailer from configuration.
    #[must_use]
    pub fn new(config: MailerConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send(&self, recipient: &str, prompt: &str, response: &str) -> anyhow::Result<()> {
        let Some(ref endpoint) = self.config.endpoint else {
            anyhow::bail!("mail relay endpoint not configured");
        };
        let Some(ref from) = self.config.from_address else {
            anyhow::bail!("mail sender address not configured");
        };

        let subject = format!(
            "Sundial Scheduled Report - {}",
            chrono::Utc::now().format("%Y-%m-%d")
        );
        let body = serde_json::json!({
            "from": from,
            "to": [recipient],
            "subject": subject,
            "html": html_body(prompt, response),
            "text": text_body(prompt, response),
        });

        let mut request = self.client.post(endpoint).json(&body);
        if let Some(ref api_key) = self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let reply = request.send().await?;
        if !reply.status().is_success() {
            let status = reply.status();
            let text = reply.text().await.unwrap_or_default();
            anyhow::bail!("mail relay error ({status}): {text}");
        }

        Ok(())
    }
}

fn html_body(prompt: &str, response: &str) -> String {
    format!(
        "<html><body>\
         <h1>Sundial</h1><p>Scheduled AI Report</p>\
         <h2>Your Prompt</h2><blockquote>{}</blockquote>\
         <h2>AI Response</h2><div style=\"white-space: pre-wrap\">{}</div>\
         <hr><p>This is an automated report from your Sundial scheduled prompt.</p>\
         </body></html>",
        escape_html(prompt),
        escape_html(response)
    )
}

fn text_body(prompt: &str, response: &str) -> String {
    format!(
        "Sundial Scheduled Report\n\n\
         Your Prompt:\n{prompt}\n\n\
         AI Response:\n{response}\n\n\
         ---\n\
         This is an automated report from your Sundial scheduled prompt."
    )
}

/// Escape text for inclusion in the HTML body.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
