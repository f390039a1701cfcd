//! Test fixtures and scripted transports for integration testing

use async_trait::async_trait;
use serde_json::{json, Value};
use sldb_client::rating::{encode_skill, rating_from_parts};
use sldb_client::{Credentials, SldbClient, Transport, TransportError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_USERNAME: &str = "spads_test";
pub const TEST_PASSWORD: &str = "s3cr3t";

/// A call observed by a scripted transport
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub args: Vec<Value>,
}

/// Transport replying with canned values per method and recording every call
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, Value>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    delay_ms: u64,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `method` with `reply`
    pub fn with_reply(self, method: &str, reply: Value) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.insert(method.to_string(), reply);
        }
        self
    }

    /// Reply to every given method with `reply`
    pub fn with_reply_for_all(self, methods: &[&str], reply: Value) -> Self {
        methods
            .iter()
            .fold(self, |transport, method| transport.with_reply(method, reply.clone()))
    }

    /// Simulate network latency on every call
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Get all recorded calls (for testing)
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                method: method.to_string(),
                args,
            });
        }

        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|replies| replies.get(method).cloned());

        reply.ok_or_else(|| TransportError::Fault {
            code: -32601,
            message: format!("no scripted reply for {}", method),
        })
    }
}

/// Transport whose every call fails at the HTTP level
pub struct UnreachableTransport;

#[async_trait]
impl Transport for UnreachableTransport {
    async fn call(&self, _method: &str, _args: Vec<Value>) -> Result<Value, TransportError> {
        Err(TransportError::Status { status: 503 })
    }
}

pub fn test_credentials() -> Credentials {
    Credentials::new(TEST_USERNAME, TEST_PASSWORD)
}

/// Build a client over a scripted transport, keeping a handle for assertions
pub fn scripted_client(transport: ScriptedTransport) -> (SldbClient, Arc<ScriptedTransport>) {
    let transport = Arc::new(transport);
    let client = SldbClient::with_transport(transport.clone(), &test_credentials(), false);
    (client, transport)
}

/// Wire skill strings for `(estimated, uncertainty)` pairs
pub fn wire_skills(pairs: &[(f64, f64)]) -> Vec<String> {
    pairs
        .iter()
        .map(|&(estimated, uncertainty)| encode_skill(&rating_from_parts(estimated, uncertainty)))
        .collect()
}

/// Bulk skills reply for a single account
pub fn skills_reply() -> Value {
    json!({
        "status": 0,
        "results": [{
            "accountId": 7,
            "privacyMode": 0,
            "skills": wire_skills(&[(30.0, 5.0), (20.0, 4.0), (25.0, 3.0), (0.0, 0.0), (28.0, 4.5)])
        }]
    })
}

/// Per-type `[losses, wins, undecided]` triples
pub fn stats_payload() -> Value {
    json!({
        "Duel": [1, 2, 0],
        "FFA": [0, 1, 1],
        "Team": [3, 0, 0],
        "TeamFFA": [0, 0, 2]
    })
}
