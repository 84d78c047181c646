//! LogClient - "delivers" transcripts via tracing

use std::any::Any;

use contracts::{DeliveryClient, OutboundMessage, SecurityMode, TranscriptError};
use tracing::{debug, info, instrument};

/// Client that logs each transcript instead of transmitting it
#[derive(Debug, Default)]
pub struct LogClient {
    name: String,
    endpoint: Option<String>,
}

impl LogClient {
    /// Create a new LogClient with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
        }
    }
}

impl DeliveryClient for LogClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_client_connect", skip(self), fields(client = %self.name))]
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        security: SecurityMode,
    ) -> Result<(), TranscriptError> {
        self.endpoint = Some(format!("{host}:{port}"));
        debug!(client = %self.name, host, port, ?security, "LogClient connected");
        Ok(())
    }

    #[instrument(
        name = "log_client_send",
        skip(self, message),
        fields(client = %self.name, subject = %message.subject)
    )]
    fn send(&mut self, message: &OutboundMessage) -> Result<(), TranscriptError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| TranscriptError::send(&self.name, "not connected"))?;

        info!(
            target: "transcript::delivery",
            client = %self.name,
            endpoint,
            to = ?message.to,
            subject = %message.subject,
            body_len = message.body.len(),
            body = %message.body,
            "Transcript delivered"
        );
        Ok(())
    }

    fn disconnect(&mut self) {
        self.endpoint = None;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_client_send_requires_connect() {
        let mut client = LogClient::new("test_log");
        let msg = OutboundMessage::new("Log Transcript", "line");
        assert!(client.send(&msg).is_err());

        client.connect("localhost", 25, SecurityMode::None).unwrap();
        assert!(client.send(&msg).is_ok());
    }

    #[test]
    fn test_log_client_name() {
        let client = LogClient::new("my_logger");
        assert_eq!(client.name(), "my_logger");
    }
}
