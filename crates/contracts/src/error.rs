//! Layered error definitions
//!
//! Categorized by source: configuration / formatting / delivery

use std::fmt;

use thiserror::Error;

/// Delivery stage that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStage {
    Connect,
    Send,
}

impl fmt::Display for DeliveryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => f.write_str("connect"),
            Self::Send => f.write_str("send"),
        }
    }
}

/// Unified error type
#[derive(Debug, Error)]
pub enum TranscriptError {
    // ===== Configuration Errors =====
    /// Invalid configuration, surfaced at construction time only
    #[error("configuration error at '{field}': {message}")]
    Configuration { field: String, message: String },

    /// Configuration file could not be parsed
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== Formatting Errors =====
    /// Rendering one event failed (recovered locally with a fallback line)
    #[error("formatting error: {message}")]
    Formatting { message: String },

    // ===== Delivery Errors =====
    /// Connecting to or sending through the delivery client failed
    #[error("delivery {stage} error via '{client}': {message}")]
    Delivery {
        client: String,
        stage: DeliveryStage,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl TranscriptError {
    /// Create configuration error
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create formatting error
    pub fn formatting(message: impl Into<String>) -> Self {
        Self::Formatting {
            message: message.into(),
        }
    }

    /// Create connect-stage delivery error
    pub fn connect(client: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delivery {
            client: client.into(),
            stage: DeliveryStage::Connect,
            message: message.into(),
            source: None,
        }
    }

    /// Create send-stage delivery error
    pub fn send(client: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delivery {
            client: client.into(),
            stage: DeliveryStage::Send,
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying cause to a delivery or parse error
    pub fn with_source(self, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        match self {
            Self::Delivery {
                client,
                stage,
                message,
                ..
            } => Self::Delivery {
                client,
                stage,
                message,
                source: Some(Box::new(err)),
            },
            Self::ConfigParse { message, .. } => Self::ConfigParse {
                message,
                source: Some(Box::new(err)),
            },
            other => other,
        }
    }

    /// Whether this error belongs to the configuration class
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::ConfigParse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_delivery_error_display() {
        let err = TranscriptError::connect("smtp", "connection refused");
        assert_eq!(
            err.to_string(),
            "delivery connect error via 'smtp': connection refused"
        );
    }

    #[test]
    fn test_with_source_keeps_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = TranscriptError::send("pickup", "write failed").with_source(io);
        let source = err.source().expect("source attached");
        assert_eq!(source.to_string(), "timed out");
    }

    #[test]
    fn test_configuration_class() {
        assert!(TranscriptError::configuration("port", "must be > 0").is_configuration());
        assert!(!TranscriptError::formatting("bad").is_configuration());
    }
}
