//! HTTP mail relay transport.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use pricewatch_core::MailConfig;

use super::mail::{AlertMail, MailTransport};
use super::NotifyFuture;
use crate::error::NotifyError;

/// Longest relay error body kept in [`NotifyError::Rejected`].
const MAX_ERROR_BODY: usize = 512;

/// Posts rendered alerts as JSON to a mail relay endpoint.
#[derive(Debug)]
pub struct HttpMailRelay {
    client: Client,
    config: MailConfig,
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl HttpMailRelay {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: MailConfig, timeout_secs: u64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("pricewatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    async fn post(&self, mail: &AlertMail) -> Result<(), NotifyError> {
        let message = RelayMessage {
            from: &self.config.from,
            to: &self.config.to,
            subject: &mail.subject,
            html: &mail.html,
            text: &mail.text,
        };

        let mut request = self.client.post(&self.config.relay_url).json(&message);
        if let Some(token) = &self.config.relay_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(
                status = status.as_u16(),
                recipients = self.config.to.len(),
                "mail relay accepted message"
            );
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|&i| body.is_char_boundary(i))
                .unwrap_or(0);
            body.truncate(cut);
        }
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

impl MailTransport for HttpMailRelay {
    fn send<'a>(&'a self, mail: &'a AlertMail) -> NotifyFuture<'a> {
        Box::pin(self.post(mail))
    }
}
