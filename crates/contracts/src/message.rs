//! Outbound message and delivery metadata built on every flush

use serde::{Deserialize, Serialize};

/// Subject used when the decision callback does not set one
pub const DEFAULT_SUBJECT: &str = "Log Transcript";

/// Port used when the decision callback does not set one
pub const DEFAULT_PORT: u16 = 25;

/// The message handed to the delivery client.
///
/// The body is plain text only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(default)]
    pub from: Vec<String>,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl OutboundMessage {
    /// Message with the given subject and body and no recipients
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// All recipient addresses (to, cc, bcc)
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(String::as_str)
    }

    pub fn has_recipients(&self) -> bool {
        self.recipients().next().is_some()
    }
}

/// Transport security mode requested from the delivery client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// Plain connection
    None,
    /// Let the client pick (opportunistic)
    #[default]
    Auto,
    /// TLS from the first byte
    SslOnConnect,
    /// Upgrade with STARTTLS, fail if unsupported
    StartTls,
    /// Upgrade with STARTTLS when the server offers it
    StartTlsWhenAvailable,
}

/// Where and how to deliver; the decision callback may override every field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryMetadata {
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub security: SecurityMode,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for DeliveryMetadata {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            security: SecurityMode::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metadata() {
        let meta = DeliveryMetadata::default();
        assert_eq!(meta.host, "");
        assert_eq!(meta.port, 25);
        assert_eq!(meta.security, SecurityMode::Auto);
    }

    #[test]
    fn test_recipients_chain() {
        let mut msg = OutboundMessage::new(DEFAULT_SUBJECT, "body");
        assert!(!msg.has_recipients());
        msg.to.push("ops@example.com".into());
        msg.bcc.push("audit@example.com".into());
        let all: Vec<_> = msg.recipients().collect();
        assert_eq!(all, vec!["ops@example.com", "audit@example.com"]);
    }
}
