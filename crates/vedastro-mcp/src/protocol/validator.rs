//! Shape checks applied to every request before dispatch.

use serde_json::Value;

use crate::types::{JsonRpcRequest, McpError, McpResult, JSONRPC_VERSION};

/// Reject envelopes and params this server can never act on.
///
/// Envelope problems are invalid requests; params of the wrong shape for a
/// known method are invalid params. Method lookup itself happens later.
pub fn validate_request(request: &JsonRpcRequest) -> McpResult<()> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "jsonrpc must be \"{JSONRPC_VERSION}\", got \"{}\"",
            request.jsonrpc
        )));
    }

    if request.method.trim().is_empty() {
        return Err(McpError::InvalidRequest("Empty method".to_string()));
    }

    match request.method.as_str() {
        "initialize" => validate_initialize(request.params.as_ref()),
        "tools/call" => validate_tool_call(request.params.as_ref()),
        _ => match &request.params {
            None | Some(Value::Object(_)) | Some(Value::Null) => Ok(()),
            Some(_) => Err(McpError::InvalidParams(format!(
                "{} params must be an object",
                request.method
            ))),
        },
    }
}

fn validate_initialize(params: Option<&Value>) -> McpResult<()> {
    let params = require_object(params, "initialize")?;
    match params.get("protocolVersion") {
        Some(Value::String(v)) if !v.is_empty() => Ok(()),
        _ => Err(McpError::InvalidParams(
            "initialize requires a protocolVersion string".to_string(),
        )),
    }
}

fn validate_tool_call(params: Option<&Value>) -> McpResult<()> {
    let params = require_object(params, "tools/call")?;
    match params.get("name") {
        Some(Value::String(name)) if !name.is_empty() => {}
        _ => {
            return Err(McpError::InvalidParams(
                "tools/call requires a tool name".to_string(),
            ))
        }
    }

    // `params` is the alias some clients send in place of `arguments`.
    for key in ["arguments", "params"] {
        match params.get(key) {
            None | Some(Value::Null) | Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(McpError::InvalidParams(format!(
                    "tools/call {key} must be an object"
                )))
            }
        }
    }

    Ok(())
}

fn require_object<'a>(
    params: Option<&'a Value>,
    method: &str,
) -> McpResult<&'a serde_json::Map<String, Value>> {
    params
        .and_then(Value::as_object)
        .ok_or_else(|| McpError::InvalidParams(format!("{method} params must be an object")))
}
