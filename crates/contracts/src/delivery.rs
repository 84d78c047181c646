//! DeliveryClient trait - the transport collaborator

use std::any::Any;

use crate::{OutboundMessage, SecurityMode, TranscriptError};

/// Delivery client trait
///
/// Abstracts the transport that physically delivers a transcript so the sink
/// never depends on a concrete protocol. A fresh client is created for every
/// flush; both operations may block on I/O.
pub trait DeliveryClient: Send {
    /// Client name (used for logging and error context)
    fn name(&self) -> &str;

    /// Connect to the delivery endpoint
    ///
    /// # Errors
    /// Returns a delivery error at the connect stage
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        security: SecurityMode,
    ) -> Result<(), TranscriptError>;

    /// Send one message over the established connection
    ///
    /// # Errors
    /// Returns a delivery error at the send stage
    fn send(&mut self, message: &OutboundMessage) -> Result<(), TranscriptError>;

    /// Close the connection. Errors here are not delivery failures.
    fn disconnect(&mut self) {}

    /// Concrete access for decision callbacks that configure a known client type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
