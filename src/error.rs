//! Error types for the SLDB client
//!
//! Every failure a public client operation can produce is a variant of
//! [`SldbError`]. Application plumbing (config loading, the CLI) uses anyhow.

use crate::rpc::transport::TransportError;
use crate::types::GameType;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, SldbError>;

/// Errors surfaced by the SLDB client
#[derive(Debug, thiserror::Error)]
pub enum SldbError {
    #[error("SLDB transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("SLDB authentication error for user: {username}")]
    Authentication { username: String },

    #[error("SLDB invalid parameters for method: {method}")]
    InvalidParameters { method: String },

    #[error("Malformed skill value {value:?}: {reason}")]
    MalformedSkill { value: String, reason: String },

    #[error("Incomplete player stats, missing game types: {}", join_game_types(.missing))]
    IncompleteStats { missing: Vec<GameType> },

    #[error("Malformed reply from {method}: {reason}")]
    MalformedReply { method: String, reason: String },
}

impl SldbError {
    pub(crate) fn malformed_reply(method: &str, reason: impl Into<String>) -> Self {
        SldbError::MalformedReply {
            method: method.to_string(),
            reason: reason.into(),
        }
    }
}

fn join_game_types(types: &[GameType]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
