//! Configuration management for the SLDB client
//!
//! This module handles client options, loading from environment variables and
//! TOML files, and validation.

pub mod app;
pub mod client;

// Re-export commonly used types
pub use app::{require_credentials, validate_config, AppConfig, ServiceSettings};
pub use client::{ClientConfig, Credentials};
