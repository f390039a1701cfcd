//! Authenticated call envelope
//!
//! Every SLDB procedure takes the login and password as its first two
//! parameters and answers with a `{status, result?, results?}` structure.
//! [`CallEnvelope`] owns both conventions so the client facade only deals with
//! payloads.

use crate::config::Credentials;
use crate::error::{Result, SldbError};
use crate::rpc::transport::Transport;
use crate::utils::redacted_args;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, trace};

/// Number of credential values prepended to every call
const CREDENTIAL_COUNT: usize = 2;

/// Reply status codes
pub const STATUS_OK: i64 = 0;
pub const STATUS_AUTHENTICATION_FAILED: i64 = 1;
pub const STATUS_INVALID_PARAMETERS: i64 = 2;

/// Dispatches authenticated calls and interprets the reply status
#[derive(Clone)]
pub struct CallEnvelope {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    verbose: bool,
}

impl CallEnvelope {
    pub fn new(transport: Arc<dyn Transport>, credentials: &Credentials, verbose: bool) -> Self {
        Self {
            transport,
            credentials: credentials.clone(),
            verbose,
        }
    }

    /// Invoke `method`, returning the reply payload
    ///
    /// The payload is `results` when present, else `result`, else the whole
    /// reply.
    pub async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let args = self.authenticated_args(args);
        self.trace_request(method, &args);

        let reply = self.transport.call(method, args).await?;
        self.trace_reply(method, &reply);

        self.interpret(method, reply)
    }

    /// Prepend the credentials to the caller's arguments
    fn authenticated_args(&self, args: Vec<Value>) -> Vec<Value> {
        let mut full = Vec::with_capacity(args.len() + CREDENTIAL_COUNT);
        full.push(Value::String(self.credentials.username.clone()));
        full.push(Value::String(self.credentials.password().to_string()));
        full.extend(args);
        full
    }

    fn interpret(&self, method: &str, reply: Value) -> Result<Value> {
        match reply_status(&reply) {
            Some(STATUS_AUTHENTICATION_FAILED) => Err(SldbError::Authentication {
                username: self.credentials.username.clone(),
            }),
            Some(STATUS_INVALID_PARAMETERS) => Err(SldbError::InvalidParameters {
                method: method.to_string(),
            }),
            Some(STATUS_OK) | None => Ok(extract_payload(reply)),
            Some(other) => Err(SldbError::malformed_reply(
                method,
                format!("unexpected status {}", other),
            )),
        }
    }

    fn trace_request(&self, method: &str, args: &[Value]) {
        let rendered = redacted_args(args, CREDENTIAL_COUNT);
        if self.verbose {
            info!("Request: {} {}", method, rendered);
        } else {
            trace!("Request: {} {}", method, rendered);
        }
    }

    fn trace_reply(&self, method: &str, reply: &Value) {
        if self.verbose {
            info!("Response from {}: {}", method, reply);
        } else {
            trace!("Response from {}: {}", method, reply);
        }
    }
}

fn reply_status(reply: &Value) -> Option<i64> {
    match reply.get("status")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn extract_payload(reply: Value) -> Value {
    match reply {
        Value::Object(mut map) => {
            for key in ["results", "result"] {
                if map.get(key).is_some_and(|v| !v.is_null()) {
                    return map.remove(key).unwrap_or_default();
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::transport::{MockTransport, TransportError};
    use serde_json::json;

    fn credentials() -> Credentials {
        Credentials::new("spads", "secret")
    }

    fn envelope_replying(reply: Value) -> CallEnvelope {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .times(1)
            .returning(move |_, _| Ok(reply.clone()));
        CallEnvelope::new(Arc::new(transport), &credentials(), false)
    }

    #[tokio::test]
    async fn test_credentials_are_prepended() {
        let mut transport = MockTransport::new();
        transport.expect_call().times(1).returning(|method, args| {
            assert_eq!(method, "getPref");
            assert_eq!(
                args,
                vec![json!("spads"), json!("secret"), json!(7), json!("skillMode")]
            );
            Ok(json!({"status": 0, "result": "1"}))
        });

        let envelope = CallEnvelope::new(Arc::new(transport), &credentials(), false);
        let payload = envelope
            .invoke("getPref", vec![json!(7), json!("skillMode")])
            .await
            .unwrap();
        assert_eq!(payload, json!("1"));
    }

    #[tokio::test]
    async fn test_status_one_is_authentication_error() {
        let envelope = envelope_replying(json!({"status": 1, "results": [1, 2, 3]}));
        match envelope.invoke("getSkills", vec![]).await {
            Err(SldbError::Authentication { username }) => assert_eq!(username, "spads"),
            other => panic!("expected authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_two_is_invalid_parameters() {
        let envelope = envelope_replying(json!({"status": 2}));
        match envelope.invoke("getPlayerStats", vec![]).await {
            Err(SldbError::InvalidParameters { method }) => assert_eq!(method, "getPlayerStats"),
            other => panic!("expected invalid parameters, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_status_is_rejected() {
        let envelope = envelope_replying(json!({"status": 9, "result": "x"}));
        assert!(matches!(
            envelope.invoke("getPref", vec![]).await,
            Err(SldbError::MalformedReply { .. })
        ));
    }

    #[tokio::test]
    async fn test_payload_selection() {
        let envelope = envelope_replying(json!({"status": 0, "results": [1], "result": 2}));
        assert_eq!(envelope.invoke("m", vec![]).await.unwrap(), json!([1]));

        let envelope = envelope_replying(json!({"status": 0, "result": {"a": 1}}));
        assert_eq!(envelope.invoke("m", vec![]).await.unwrap(), json!({"a": 1}));

        let envelope = envelope_replying(json!({"status": 0, "results": null, "result": 2}));
        assert_eq!(envelope.invoke("m", vec![]).await.unwrap(), json!(2));

        let envelope = envelope_replying(json!({"status": 0, "results": []}));
        assert_eq!(envelope.invoke("m", vec![]).await.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_bare_payload_is_returned_whole() {
        let reply = json!({"Duel": [1, 2, 0], "FFA": [0, 1, 1]});
        let envelope = envelope_replying(reply.clone());
        assert_eq!(envelope.invoke("getPlayerStats", vec![]).await.unwrap(), reply);

        let envelope = envelope_replying(json!({"status": "0", "graph": []}));
        assert_eq!(
            envelope.invoke("getPlayerSkillGraphs", vec![]).await.unwrap(),
            json!({"status": "0", "graph": []})
        );

        let envelope = envelope_replying(json!("plain"));
        assert_eq!(envelope.invoke("m", vec![]).await.unwrap(), json!("plain"));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mut transport = MockTransport::new();
        transport.expect_call().times(1).returning(|_, _| {
            Err(TransportError::Fault {
                code: 4,
                message: "down".to_string(),
            })
        });

        let envelope = CallEnvelope::new(Arc::new(transport), &credentials(), false);
        match envelope.invoke("getPref", vec![]).await {
            Err(SldbError::Transport(TransportError::Fault { code, .. })) => assert_eq!(code, 4),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_verbose_does_not_change_result() {
        let mut transport = MockTransport::new();
        transport
            .expect_call()
            .times(1)
            .returning(|_, _| Ok(json!({"status": 0, "result": "on"})));

        let envelope = CallEnvelope::new(Arc::new(transport), &credentials(), true);
        assert_eq!(envelope.invoke("getPref", vec![]).await.unwrap(), json!("on"));
    }
}
