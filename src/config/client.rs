//! SLDB client configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Connection and authentication options of a client
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// SLDB host name or address
    pub host: String,
    /// SLDB XML-RPC port
    pub port: u16,
    /// Login sent as the first parameter of every call
    pub username: String,
    /// Password sent as the second parameter of every call
    pub password: String,
    /// Trace every request and reply at INFO level
    pub verbose: bool,
    /// HTTP path of the XML-RPC endpoint
    pub rpc_path: String,
    /// Transport-level request timeout in seconds
    pub request_timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8300,
            username: String::new(),
            password: String::new(),
            verbose: false,
            rpc_path: "/".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &crate::utils::REDACTED)
            .field("verbose", &self.verbose)
            .field("rpc_path", &self.rpc_path)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16, credentials: Credentials) -> Self {
        Self {
            host: host.into(),
            port,
            username: credentials.username,
            password: credentials.password,
            ..Self::default()
        }
    }

    /// Full URL of the XML-RPC endpoint
    pub fn endpoint_url(&self) -> String {
        let path = if self.rpc_path.starts_with('/') {
            self.rpc_path.clone()
        } else {
            format!("/{}", self.rpc_path)
        };
        format!("http://{}:{}{}", self.host, self.port, path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}

/// Login and password injected into every call
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &crate::utils::REDACTED)
            .finish()
    }
}
