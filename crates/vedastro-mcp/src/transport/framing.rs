//! Message framing: JSON-RPC bodies in, event-stream records out.

use axum::response::sse::Event;

use crate::types::{JsonRpcMessage, McpError, McpResult};

/// Event announcing where follow-up messages must be POSTed.
pub const ENDPOINT_EVENT: &str = "endpoint";

/// Event carrying one serialized JSON-RPC message.
pub const MESSAGE_EVENT: &str = "message";

/// Parse a request body as exactly one JSON-RPC message.
///
/// Bytes go straight to the JSON parser, so invalid UTF-8 is a parse error.
pub fn parse_message(body: &[u8]) -> McpResult<JsonRpcMessage> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(McpError::ParseError("Empty message".to_string()));
    }

    serde_json::from_slice(body).map_err(|e| McpError::ParseError(e.to_string()))
}

/// A request body: one message, or a batch.
#[derive(Debug, Clone)]
pub struct Incoming {
    pub messages: Vec<JsonRpcMessage>,
    pub batch: bool,
}

impl Incoming {
    pub fn has_requests(&self) -> bool {
        self.messages.iter().any(JsonRpcMessage::expects_reply)
    }
}

/// Parse a POST body. Invalid JSON is a parse error; JSON that is not a
/// message (or an empty batch) is an invalid request.
pub fn parse_body(body: &[u8]) -> McpResult<Incoming> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| McpError::ParseError(e.to_string()))?;

    let (values, batch) = match value {
        serde_json::Value::Array(items) => {
            if items.is_empty() {
                return Err(McpError::InvalidRequest("Empty batch".to_string()));
            }
            (items, true)
        }
        single => (vec![single], false),
    };

    let messages = values
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<JsonRpcMessage>, _>>()
        .map_err(|e| McpError::InvalidRequest(e.to_string()))?;

    Ok(Incoming { messages, batch })
}

/// Encode one event-stream record as text.
pub fn encode_event(event: &str, data: &str) -> String {
    let mut out = format!("event: {event}\n");
    for line in data.split('\n') {
        out.push_str("data: ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out
}

/// Text record for a JSON-RPC message.
pub fn encode_message(message: &JsonRpcMessage) -> McpResult<String> {
    let data = serde_json::to_string(message)?;
    Ok(encode_event(MESSAGE_EVENT, &data))
}

/// Streamed endpoint announcement.
pub fn endpoint_event(endpoint: &str) -> Event {
    Event::default().event(ENDPOINT_EVENT).data(endpoint)
}

/// Streamed JSON-RPC message.
pub fn message_event(message: &JsonRpcMessage) -> McpResult<Event> {
    let data = serde_json::to_string(message)?;
    Ok(Event::default().event(MESSAGE_EVENT).data(data))
}

/// One decoded event-stream record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Decode event-stream text into records.
///
/// Only `event:` and `data:` fields are kept; comment lines (keep-alives) are
/// skipped. Multi-line data is joined with `\n`.
pub fn decode_events(buf: &str) -> Vec<SseFrame> {
    let mut out = Vec::new();
    let mut event: Option<String> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in buf.split('\n') {
        let l = line.trim_end_matches('\r');

        if l.is_empty() {
            if !data_lines.is_empty() || event.is_some() {
                out.push(SseFrame {
                    event: event.take(),
                    data: data_lines.join("\n"),
                });
                data_lines.clear();
            }
            continue;
        }

        if l.starts_with(':') {
            continue;
        }

        if let Some(rest) = l.strip_prefix("event:") {
            event = Some(rest.trim_start().to_string());
        } else if let Some(rest) = l.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }

    if !data_lines.is_empty() {
        out.push(SseFrame {
            event,
            data: data_lines.join("\n"),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_rejects_empty() {
        let err = parse_message(b"   ").unwrap_err();
        assert_eq!(err.code(), -32700);
    }

    #[test]
    fn test_parse_message_rejects_invalid_utf8() {
        let err = parse_message(b"{\"jsonrpc\":\"2.0\",\"method\":\"\xff\"}").unwrap_err();
        assert_eq!(err.code(), -32700);
    }

    #[test]
    fn test_parse_body_single_and_batch() {
        let single = parse_body(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).unwrap();
        assert!(!single.batch);
        assert!(single.has_requests());

        let batch = parse_body(
            br#"[{"jsonrpc":"2.0","method":"notifications/initialized"},{"jsonrpc":"2.0","id":"a","method":"ping"}]"#,
        )
        .unwrap();
        assert!(batch.batch);
        assert_eq!(batch.messages.len(), 2);
    }

    #[test]
    fn test_parse_body_error_codes() {
        assert_eq!(parse_body(b"{not json").unwrap_err().code(), -32700);
        assert_eq!(parse_body(b"[]").unwrap_err().code(), -32600);
        assert_eq!(parse_body(b"42").unwrap_err().code(), -32600);
    }

    #[test]
    fn test_encode_event_layout() {
        assert_eq!(
            encode_event("endpoint", "/api/messages"),
            "event: endpoint\ndata: /api/messages\n\n"
        );
    }

    #[test]
    fn test_decode_skips_comments_and_keeps_names() {
        let text = ": keep-alive\n\nevent: endpoint\ndata: /api/messages\n\nevent: message\ndata: {\"id\":1}\n\n";
        let frames = decode_events(text);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event.as_deref(), Some("endpoint"));
        assert_eq!(frames[0].data, "/api/messages");
        assert_eq!(frames[1].event.as_deref(), Some("message"));
        assert_eq!(frames[1].data, "{\"id\":1}");
    }

    #[test]
    fn test_decode_joins_multiline_data() {
        let frames = decode_events("data: a\ndata: b\n\n");
        assert_eq!(frames, vec![SseFrame { event: None, data: "a\nb".to_string() }]);
    }
}
