//! RecordingClient - in-memory delivery client
//!
//! Records every connect and send; failures can be injected.
//! Clones share state, so a test can keep one clone while the sink consumes another.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use contracts::{DeliveryClient, DeliveryMetadata, OutboundMessage, SecurityMode, TranscriptError};

/// Failure injection for RecordingClient
#[derive(Debug, Default, Clone)]
pub struct RecordingConfig {
    /// Fail every connect
    pub fail_connect: bool,
    /// Fail every send
    pub fail_send: bool,
}

#[derive(Debug, Default)]
struct Recorded {
    connects: Vec<DeliveryMetadata>,
    send_attempts: usize,
    sent: Vec<OutboundMessage>,
}

#[derive(Debug, Default)]
struct Shared {
    fail_connect: AtomicBool,
    fail_send: AtomicBool,
    recorded: Mutex<Recorded>,
}

/// In-memory delivery client
#[derive(Debug, Clone, Default)]
pub struct RecordingClient {
    shared: Arc<Shared>,
    connected: bool,
}

impl RecordingClient {
    /// Create a client that always succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client with injected failures
    pub fn with_config(config: RecordingConfig) -> Self {
        let client = Self::new();
        client.set_fail_connect(config.fail_connect);
        client.set_fail_send(config.fail_send);
        client
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.shared.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.shared.fail_send.store(fail, Ordering::SeqCst);
    }

    /// Endpoints passed to `connect`, in call order
    pub fn connects(&self) -> Vec<DeliveryMetadata> {
        self.recorded(|r| r.connects.clone())
    }

    /// Number of `send` calls, successful or not
    pub fn send_attempts(&self) -> usize {
        self.recorded(|r| r.send_attempts)
    }

    /// Successfully sent messages, in order
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.recorded(|r| r.sent.clone())
    }

    fn recorded<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut guard = self
            .shared
            .recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl DeliveryClient for RecordingClient {
    fn name(&self) -> &str {
        "recording"
    }

    fn connect(
        &mut self,
        host: &str,
        port: u16,
        security: SecurityMode,
    ) -> Result<(), TranscriptError> {
        self.recorded(|r| {
            r.connects.push(DeliveryMetadata {
                host: host.to_string(),
                port,
                security,
            })
        });
        if self.shared.fail_connect.load(Ordering::SeqCst) {
            return Err(TranscriptError::connect(
                self.name(),
                format!("injected connect failure for {host}:{port}"),
            ));
        }
        self.connected = true;
        Ok(())
    }

    fn send(&mut self, message: &OutboundMessage) -> Result<(), TranscriptError> {
        self.recorded(|r| r.send_attempts += 1);
        if !self.connected {
            return Err(TranscriptError::send(self.name(), "not connected"));
        }
        if self.shared.fail_send.load(Ordering::SeqCst) {
            return Err(TranscriptError::send(self.name(), "injected send failure"));
        }
        let message = message.clone();
        self.recorded(move |r| r.sent.push(message));
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
