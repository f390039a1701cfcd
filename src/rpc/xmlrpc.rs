//! XML-RPC over HTTP transport
//!
//! Requests are encoded as `<methodCall>` documents and POSTed to the SLDB
//! endpoint; `<methodResponse>` documents are decoded into JSON values so the
//! envelope layer can work with a single value model.

use crate::config::ClientConfig;
use crate::rpc::transport::{Transport, TransportError};
use async_trait::async_trait;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::{Map, Number, Value};
use tracing::debug;

/// XML-RPC transport backed by a pooled HTTP client
pub struct XmlRpcTransport {
    client: Client,
    url: String,
}

impl XmlRpcTransport {
    /// Create a transport for the endpoint described by `config`
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            url: config.endpoint_url(),
        })
    }

    /// Endpoint URL requests are sent to
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for XmlRpcTransport {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        let body = encode_method_call(method, &args)?;
        debug!("POST {} {} ({} bytes)", self.url, method, body.len());

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        parse_method_response(&text)
    }
}

/// Encode a `<methodCall>` document
///
/// Integers beyond the signed 64-bit range have no XML-RPC representation and
/// are rejected as [`TransportError::Protocol`].
pub fn encode_method_call(method: &str, args: &[Value]) -> Result<String, TransportError> {
    let mut xml = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    xml.push_str(&escape(method));
    xml.push_str("</methodName><params>");
    for arg in args {
        xml.push_str("<param>");
        encode_value(arg, &mut xml)?;
        xml.push_str("</param>");
    }
    xml.push_str("</params></methodCall>");
    Ok(xml)
}

fn encode_value(value: &Value, xml: &mut String) -> Result<(), TransportError> {
    xml.push_str("<value>");
    match value {
        Value::Null => xml.push_str("<nil/>"),
        Value::Bool(b) => xml.push_str(&format!("<boolean>{}</boolean>", u8::from(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                // <int> is 32-bit; wider values use the common i8 extension
                if i32::try_from(i).is_ok() {
                    xml.push_str(&format!("<int>{}</int>", i));
                } else {
                    xml.push_str(&format!("<i8>{}</i8>", i));
                }
            } else if n.is_u64() {
                return Err(TransportError::protocol(format!(
                    "integer {} does not fit in <i8>",
                    n
                )));
            } else if let Some(f) = n.as_f64() {
                xml.push_str(&format!("<double>{}</double>", f));
            }
        }
        Value::String(s) => {
            xml.push_str("<string>");
            xml.push_str(&escape(s.as_str()));
            xml.push_str("</string>");
        }
        Value::Array(items) => {
            xml.push_str("<array><data>");
            for item in items {
                encode_value(item, xml)?;
            }
            xml.push_str("</data></array>");
        }
        Value::Object(members) => {
            xml.push_str("<struct>");
            for (name, member) in members {
                xml.push_str("<member><name>");
                xml.push_str(&escape(name.as_str()));
                xml.push_str("</name>");
                encode_value(member, xml)?;
                xml.push_str("</member>");
            }
            xml.push_str("</struct>");
        }
    }
    xml.push_str("</value>");
    Ok(())
}

/// Decode a `<methodResponse>` document
///
/// A `<fault>` response is returned as [`TransportError::Fault`].
pub fn parse_method_response(xml: &str) -> Result<Value, TransportError> {
    ResponseParser::new(xml).parse_response()
}

struct ResponseParser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> ResponseParser<'a> {
    fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().expand_empty_elements = true;
        Self { reader }
    }

    fn parse_response(&mut self) -> Result<Value, TransportError> {
        self.expect_start("methodResponse")?;

        let outcome = match self.next_tag()? {
            Event::Start(e) if e.name().as_ref() == b"params" => {
                self.expect_start("param")?;
                let value = self.parse_value()?;
                self.expect_end("param")?;
                self.expect_end("params")?;
                Ok(value)
            }
            Event::Start(e) if e.name().as_ref() == b"fault" => {
                let fault = self.parse_value()?;
                self.expect_end("fault")?;
                Err(fault_error(&fault))
            }
            other => return Err(unexpected("<params> or <fault>", &other)),
        };

        self.expect_end("methodResponse")?;
        outcome
    }

    fn parse_value(&mut self) -> Result<Value, TransportError> {
        self.expect_start("value")?;
        self.parse_value_body()
    }

    /// Parse the content of a `<value>` whose start tag was already consumed
    fn parse_value_body(&mut self) -> Result<Value, TransportError> {
        let mut text = String::new();
        loop {
            match self.next_raw()? {
                Event::Text(t) => text.push_str(&unescape_text(&t)?),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c[..])),
                // Untyped values are strings
                Event::End(e) if e.name().as_ref() == b"value" => return Ok(Value::String(text)),
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let value = self.parse_typed(&name)?;
                    self.expect_end("value")?;
                    return Ok(value);
                }
                other => return Err(unexpected("value content", &other)),
            }
        }
    }

    fn parse_typed(&mut self, name: &str) -> Result<Value, TransportError> {
        match name {
            "string" | "dateTime.iso8601" | "base64" => Ok(Value::String(self.read_text(name)?)),
            "int" | "i4" | "i8" => {
                let text = self.read_text(name)?;
                text.trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| TransportError::protocol(format!("invalid <{}> {:?}", name, text)))
            }
            "double" => {
                let text = self.read_text(name)?;
                text.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        TransportError::protocol(format!("invalid <double> {:?}", text))
                    })
            }
            "boolean" => match self.read_text(name)?.trim() {
                "1" => Ok(Value::Bool(true)),
                "0" => Ok(Value::Bool(false)),
                other => Err(TransportError::protocol(format!(
                    "invalid <boolean> {:?}",
                    other
                ))),
            },
            "nil" => {
                self.expect_end("nil")?;
                Ok(Value::Null)
            }
            "array" => self.parse_array(),
            "struct" => self.parse_struct(),
            other => Err(TransportError::protocol(format!(
                "unsupported value type <{}>",
                other
            ))),
        }
    }

    fn parse_array(&mut self) -> Result<Value, TransportError> {
        self.expect_start("data")?;

        let mut items = Vec::new();
        loop {
            match self.next_tag()? {
                Event::Start(e) if e.name().as_ref() == b"value" => {
                    items.push(self.parse_value_body()?)
                }
                Event::End(e) if e.name().as_ref() == b"data" => break,
                other => return Err(unexpected("<value> or </data>", &other)),
            }
        }

        self.expect_end("array")?;
        Ok(Value::Array(items))
    }

    fn parse_struct(&mut self) -> Result<Value, TransportError> {
        let mut members = Map::new();
        loop {
            match self.next_tag()? {
                Event::Start(e) if e.name().as_ref() == b"member" => {
                    self.expect_start("name")?;
                    let name = self.read_text("name")?;
                    let value = self.parse_value()?;
                    self.expect_end("member")?;
                    members.insert(name, value);
                }
                Event::End(e) if e.name().as_ref() == b"struct" => break,
                other => return Err(unexpected("<member> or </struct>", &other)),
            }
        }
        Ok(Value::Object(members))
    }

    /// Collect character data up to the closing `</name>`
    fn read_text(&mut self, name: &str) -> Result<String, TransportError> {
        let mut text = String::new();
        loop {
            match self.next_raw()? {
                Event::Text(t) => text.push_str(&unescape_text(&t)?),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c[..])),
                Event::End(e) if e.name().as_ref() == name.as_bytes() => return Ok(text),
                other => return Err(unexpected(&format!("text of <{}>", name), &other)),
            }
        }
    }

    fn expect_start(&mut self, name: &str) -> Result<(), TransportError> {
        match self.next_tag()? {
            Event::Start(e) if e.name().as_ref() == name.as_bytes() => Ok(()),
            other => Err(unexpected(&format!("<{}>", name), &other)),
        }
    }

    fn expect_end(&mut self, name: &str) -> Result<(), TransportError> {
        match self.next_tag()? {
            Event::End(e) if e.name().as_ref() == name.as_bytes() => Ok(()),
            other => Err(unexpected(&format!("</{}>", name), &other)),
        }
    }

    /// Next structural event, skipping whitespace between tags
    fn next_tag(&mut self) -> Result<Event<'a>, TransportError> {
        loop {
            let event = self.next_raw()?;
            if let Event::Text(t) = &event {
                if t.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
            }
            return Ok(event);
        }
    }

    fn next_raw(&mut self) -> Result<Event<'a>, TransportError> {
        loop {
            let event = self
                .reader
                .read_event()
                .map_err(|e| TransportError::protocol(format!("invalid XML: {}", e)))?;
            match event {
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
                Event::Eof => return Err(TransportError::protocol("unexpected end of document")),
                event => return Ok(event),
            }
        }
    }
}

fn unescape_text(text: &quick_xml::events::BytesText<'_>) -> Result<String, TransportError> {
    text.unescape()
        .map(|s| s.into_owned())
        .map_err(|e| TransportError::protocol(format!("invalid text: {}", e)))
}

fn unexpected(expected: &str, found: &Event<'_>) -> TransportError {
    let found = match found {
        Event::Start(e) => format!("<{}>", String::from_utf8_lossy(e.name().as_ref())),
        Event::End(e) => format!("</{}>", String::from_utf8_lossy(e.name().as_ref())),
        Event::Text(_) | Event::CData(_) => "text".to_string(),
        other => format!("{:?}", other),
    };
    TransportError::protocol(format!("expected {}, found {}", expected, found))
}

/// A fault must carry an integer `faultCode` and a string `faultString`
fn fault_error(fault: &Value) -> TransportError {
    match (fault["faultCode"].as_i64(), fault["faultString"].as_str()) {
        (Some(code), Some(message)) => TransportError::Fault {
            code,
            message: message.to_string(),
        },
        _ => TransportError::protocol(format!("malformed fault {}", fault)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn response(value_xml: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<methodResponse>\n  <params>\n    <param>\n      {}\n    </param>\n  </params>\n</methodResponse>\n",
            value_xml
        )
    }

    #[test]
    fn test_encode_method_call() {
        let xml = encode_method_call(
            "getSkills",
            &[json!("user"), json!("p<w&d"), json!("BA"), json!([7, 8])],
        )
        .unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\"?><methodCall><methodName>getSkills</methodName>"));
        assert!(xml.contains("<param><value><string>user</string></value></param>"));
        assert!(xml.contains("<string>p&lt;w&amp;d</string>"));
        assert!(xml.contains(
            "<value><array><data><value><int>7</int></value><value><int>8</int></value></data></array></value>"
        ));
        assert!(xml.ends_with("</params></methodCall>"));
    }

    #[test]
    fn test_encode_scalars() {
        let xml = encode_method_call(
            "m",
            &[json!(null), json!(true), json!(2.5), json!(5_000_000_000i64), json!({"k": 1})],
        )
        .unwrap();
        assert!(xml.contains("<value><nil/></value>"));
        assert!(xml.contains("<boolean>1</boolean>"));
        assert!(xml.contains("<double>2.5</double>"));
        assert!(xml.contains("<i8>5000000000</i8>"));
        assert!(xml.contains("<struct><member><name>k</name><value><int>1</int></value></member></struct>"));
    }

    #[test]
    fn test_encode_unsigned_boundary() {
        let xml = encode_method_call("getPref", &[json!(i64::MAX as u64)]).unwrap();
        assert!(xml.contains("<value><i8>9223372036854775807</i8></value>"));

        for too_wide in [json!(i64::MAX as u64 + 1), json!(u64::MAX), json!([u64::MAX])] {
            assert!(
                matches!(
                    encode_method_call("getPref", &[too_wide.clone()]),
                    Err(TransportError::Protocol { .. })
                ),
                "{} should be rejected",
                too_wide
            );
        }
    }

    #[test]
    fn test_parse_struct_reply() {
        let xml = response(
            r#"<value><struct>
                <member><name>status</name><value><i4>0</i4></value></member>
                <member><name>results</name><value><array><data>
                    <value><struct>
                        <member><name>accountId</name><value><int>7</int></value></member>
                        <member><name>skills</name><value><array><data>
                            <value><string>30|5</string></value>
                            <value>20|4</value>
                        </data></array></value></member>
                    </struct></value>
                </data></array></value></member>
            </struct></value>"#,
        );

        let value = parse_method_response(&xml).unwrap();
        assert_eq!(
            value,
            json!({
                "status": 0,
                "results": [{"accountId": 7, "skills": ["30|5", "20|4"]}]
            })
        );
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(
            parse_method_response(&response("<value><double>-1.25</double></value>")).unwrap(),
            json!(-1.25)
        );
        assert_eq!(
            parse_method_response(&response("<value><boolean>1</boolean></value>")).unwrap(),
            json!(true)
        );
        assert_eq!(
            parse_method_response(&response("<value><nil/></value>")).unwrap(),
            json!(null)
        );
        assert_eq!(
            parse_method_response(&response("<value><string/></value>")).unwrap(),
            json!("")
        );
        assert_eq!(
            parse_method_response(&response("<value>a &amp; b</value>")).unwrap(),
            json!("a & b")
        );
        assert_eq!(
            parse_method_response(&response("<value><string>  padded </string></value>")).unwrap(),
            json!("  padded ")
        );
    }

    #[test]
    fn test_parse_fault() {
        let xml = r#"<?xml version="1.0"?>
            <methodResponse><fault><value><struct>
                <member><name>faultCode</name><value><int>-32601</int></value></member>
                <member><name>faultString</name><value><string>unknown method</string></value></member>
            </struct></value></fault></methodResponse>"#;

        match parse_method_response(xml) {
            Err(TransportError::Fault { code, message }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "unknown method");
            }
            other => panic!("expected fault, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_incomplete_fault() {
        let fault = |members: &str| {
            format!(
                "<methodResponse><fault><value><struct>{}</struct></value></fault></methodResponse>",
                members
            )
        };

        for members in [
            "<member><name>faultString</name><value>no code</value></member>",
            "<member><name>faultCode</name><value><int>4</int></value></member>",
            "<member><name>faultCode</name><value>oops</value></member><member><name>faultString</name><value>x</value></member>",
            "<member><name>faultCode</name><value><int>4</int></value></member><member><name>faultString</name><value><int>5</int></value></member>",
        ] {
            assert!(
                matches!(parse_method_response(&fault(members)), Err(TransportError::Protocol { .. })),
                "{members:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_malformed_documents() {
        for xml in [
            "",
            "<methodResponse></methodResponse>",
            "<methodResponse><params><param><value><int>x</int></value></param></params></methodResponse>",
            "<methodResponse><params><param><value><blob>1</blob></value></param></params></methodResponse>",
            "<methodResponse><params><param><value><int>1</int></value>",
        ] {
            assert!(
                matches!(parse_method_response(xml), Err(TransportError::Protocol { .. })),
                "{xml:?} should be rejected"
            );
        }
    }

    fn config_for(server: &MockServer) -> ClientConfig {
        ClientConfig {
            host: server.host(),
            port: server.port(),
            rpc_path: "/RPC2".to_string(),
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn test_call_over_http() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/RPC2");
            then.status(200)
                .header("content-type", "text/xml")
                .body(response(
                    "<value><struct><member><name>status</name><value><int>0</int></value></member><member><name>result</name><value><string>1</string></value></member></struct></value>",
                ));
        });

        let transport = XmlRpcTransport::new(&config_for(&server)).unwrap();
        let reply = transport
            .call("getPref", vec![json!("user"), json!("pass"), json!(7), json!("skillMode")])
            .await
            .unwrap();

        mock.assert();
        assert_eq!(reply, json!({"status": 0, "result": "1"}));
    }

    #[tokio::test]
    async fn test_call_reports_http_status() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(POST).path("/RPC2");
            then.status(500).body("boom");
        });

        let transport = XmlRpcTransport::new(&config_for(&server)).unwrap();
        let err = transport.call("getPref", vec![]).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 500 }));
    }
}
