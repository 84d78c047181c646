//! # Contracts
//!
//! Shared interface contracts for the transcript workspace.
//! Every other crate depends on this one; it depends on none of them.
//!
//! ## Flow
//! - a producer hands immutable [`LogEvent`]s to the sink
//! - the sink renders them, buffers the lines and on flush builds an [`OutboundMessage`]
//! - an injected decision callback finalises the message and [`DeliveryMetadata`]
//! - a [`DeliveryClient`] performs the actual delivery
//! - failures are reported to a [`Diagnostics`] channel, never to the caller

mod config;
mod delivery;
mod diagnostics;
mod error;
mod event;
mod message;

pub use config::*;
pub use delivery::DeliveryClient;
pub use diagnostics::{DiagnosticRecord, Diagnostics};
pub use error::*;
pub use event::*;
pub use message::*;
