//! Delivery client implementations
//!
//! Contains LogClient, PickupDirectoryClient and RecordingClient.

mod log;
mod pickup;
mod recording;

pub use self::log::LogClient;
pub use self::pickup::{PickupDirectoryClient, PickupDirectoryConfig};
pub use self::recording::{RecordingClient, RecordingConfig};
