//! Remote procedure call plumbing
//!
//! This module holds the transport abstraction, the XML-RPC/HTTP transport
//! used against a live SLDB instance, and the authenticated call envelope.

pub mod envelope;
pub mod transport;
pub mod xmlrpc;

// Re-export commonly used types
pub use envelope::CallEnvelope;
pub use transport::{Transport, TransportError};
pub use xmlrpc::XmlRpcTransport;
