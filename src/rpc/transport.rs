//! Transport interface for remote procedure calls
//!
//! The envelope layer only needs a single `call(method, args)` primitive;
//! connection handling and wire serialization live behind this trait.

use async_trait::async_trait;
use serde_json::Value;

/// Failures reported by a transport
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server answered with HTTP status {status}")]
    Status { status: u16 },

    #[error("Remote fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },
}

impl TransportError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        TransportError::Protocol {
            message: message.into(),
        }
    }
}

/// Trait for invoking remote procedures
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `method` with positional `args` and return the decoded reply
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError>;
}
