//! Mail transports implementing the `Notifier` port.

pub mod mailgun;

use std::sync::Mutex;

use tracing::info;

use pharmacie_reorder::{Notifier, NotifyError};

pub use mailgun::MailgunNotifier;

/// Logs each message instead of sending it (dev default).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(to, subject, body, "mail not sent (log notifier)");
        Ok(())
    }
}

/// A message captured by [`OutboxNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// In-memory notifier for tests/dev: keeps every message, optionally refusing
/// some recipients.
#[derive(Debug, Default)]
pub struct OutboxNotifier {
    outbox: Mutex<Vec<OutboundMessage>>,
    refused: Vec<String>,
}

impl OutboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every send to one of `recipients`.
    pub fn refusing(recipients: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            outbox: Mutex::new(Vec::new()),
            refused: recipients.into_iter().map(Into::into).collect(),
        }
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        match self.outbox.lock() {
            Ok(outbox) => outbox.clone(),
            Err(_) => vec![],
        }
    }
}

impl Notifier for OutboxNotifier {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        if self.refused.iter().any(|r| r == to) {
            return Err(NotifyError::Rejected {
                status: 550,
                body: format!("mailbox unavailable: {to}"),
            });
        }
        let mut outbox = self
            .outbox
            .lock()
            .map_err(|_| NotifyError::Transport("outbox lock poisoned".to_string()))?;
        outbox.push(OutboundMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
