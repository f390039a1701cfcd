//! SLDB Client - typed access to the SLDB skill-rating service
//!
//! This crate provides an XML-RPC client for SLDB with authenticated call
//! envelopes, skill string decoding, and per-game-type stats aggregation.

pub mod client;
pub mod config;
pub mod error;
pub mod rating;
pub mod rpc;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, SldbError};
pub use types::*;

// Re-export key components
pub use client::SldbClient;
pub use config::{ClientConfig, Credentials};
pub use rpc::{Transport, TransportError, XmlRpcTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
