//! Mailgun HTTP API transport.
//!
//! `POST {base_url}/v3/{domain}/messages` with basic auth `api:{key}` and the
//! message as form fields. Any non-2xx answer is a rejection.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use pharmacie_reorder::{Notifier, NotifyError};

pub const DEFAULT_BASE_URL: &str = "https://api.mailgun.net";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct MailgunResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MailgunNotifier {
    client: reqwest::Client,
    api_key: String,
    from_email: String,
    endpoint: String,
}

impl MailgunNotifier {
    pub fn new(
        base_url: &str,
        domain: &str,
        api_key: impl Into<String>,
        from_email: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            from_email: from_email.into(),
            endpoint: messages_endpoint(base_url, domain),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn send_async(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(to, subject, "sending mail via Mailgun");

        let form = [
            ("from", self.from_email.as_str()),
            ("to", to),
            ("subject", subject),
            ("text", body),
        ];
        let res = self
            .client
            .post(&self.endpoint)
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!(to, error = %e, "Mailgun request failed");
                NotifyError::Transport(e.to_string())
            })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!(to, status = status.as_u16(), body = %body, "Mailgun rejected the message");
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        match res.json::<MailgunResponse>().await {
            Ok(r) => info!(to, id = ?r.id, message = ?r.message, "Mailgun accepted the message"),
            Err(e) => info!(to, error = %e, "Mailgun accepted the message (unreadable body)"),
        }
        Ok(())
    }
}

impl Notifier for MailgunNotifier {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            NotifyError::Transport(
                "MailgunNotifier requires a tokio runtime; call it from spawn_blocking".to_string(),
            )
        })?;
        handle.block_on(self.send_async(to, subject, body))
    }
}

fn messages_endpoint(base_url: &str, domain: &str) -> String {
    format!("{}/v3/{}/messages", base_url.trim_end_matches('/'), domain)
}
