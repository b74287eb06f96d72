//! Protocol engine integration tests: handshake, catalog, and tool dispatch
//! against a mocked VedAstro API.

use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vedastro::VedAstroClient;
use vedastro_mcp::protocol::ProtocolHandler;
use vedastro_mcp::types::*;

// ─────────────────────── helpers ───────────────────────

fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

fn tool_call(id: i64, name: &str, arguments: Value) -> Value {
    mcp_request(id, "tools/call", json!({ "name": name, "arguments": arguments }))
}

fn chart_args() -> Value {
    json!({
        "latitude": "19.0760",
        "longitude": "72.8777",
        "birth_time": "14:30",
        "birth_date": "25/10/1992",
        "timezone": "+05:30"
    })
}

fn pass(payload: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "Status": "Pass", "Payload": payload }))
}

async fn send(handler: &ProtocolHandler, msg: Value) -> Value {
    let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
    let reply = handler.handle_message(parsed).await.expect("expected reply");
    serde_json::to_value(reply).unwrap()
}

/// Text of the first content block, parsed as JSON.
fn tool_payload(reply: &Value) -> Value {
    let text = reply["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

/// Engine whose downstream is never reached.
fn offline_handler() -> ProtocolHandler {
    ProtocolHandler::new(VedAstroClient::new(vedastro::DEFAULT_BASE_URL, None).unwrap())
}

fn handler_for(server: &MockServer) -> ProtocolHandler {
    ProtocolHandler::new(VedAstroClient::new(&server.uri(), None).unwrap())
}

// ─────────────────────── handshake ───────────────────────

#[tokio::test]
async fn initialize_echoes_supported_version() {
    let handler = offline_handler();
    let reply = send(
        &handler,
        mcp_request(
            0,
            "initialize",
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "1.0" }
            }),
        ),
    )
    .await;

    assert_eq!(reply["id"], 0);
    assert_eq!(reply["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(reply["result"]["serverInfo"]["name"], "VedAstro");
    assert!(reply["result"]["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn initialized_notification_has_no_reply() {
    let handler = offline_handler();
    let msg: JsonRpcMessage = serde_json::from_value(json!({
        "jsonrpc": "2.0",
        "method": "notifications/initialized"
    }))
    .unwrap();
    assert!(handler.handle_message(msg).await.is_none());
    assert!(handler.is_initialized().await);
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let handler = offline_handler();
    let reply = send(&handler, mcp_request(3, "resources/list", json!({}))).await;
    assert_eq!(reply["error"]["code"], -32601);
    assert_eq!(reply["id"], 3);
}

// ─────────────────────── catalog ───────────────────────

#[tokio::test]
async fn tools_list_has_six_tools() {
    let handler = offline_handler();
    let reply = send(&handler, mcp_request(1, "tools/list", json!({}))).await;

    let names: Vec<&str> = reply["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();

    assert_eq!(
        names,
        vec![
            "get_horoscope_predictions",
            "get_match_report",
            "get_numerology_prediction",
            "get_astrology_raw_data",
            "get_general_astro_data",
            "get_ashtakvarga_data",
        ]
    );
}

#[tokio::test]
async fn unknown_tool_is_invalid_params() {
    let handler = offline_handler();
    let reply = send(&handler, tool_call(9, "get_tarot", json!({}))).await;
    assert_eq!(reply["error"]["code"], -32602);
    assert_eq!(reply["error"]["message"], "Tool get_tarot not found");
}

// ─────────────────────── tools ───────────────────────

#[tokio::test]
async fn numerology_accepts_params_alias() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Calculate/NameNumberPrediction/FullName/Ada"))
        .respond_with(pass(json!({ "Number": 7, "Planet": "Ketu" })))
        .mount(&server)
        .await;

    let handler = handler_for(&server);
    let reply = send(
        &handler,
        mcp_request(
            1,
            "tools/call",
            json!({ "name": "get_numerology_prediction", "params": { "name": "Ada" } }),
        ),
    )
    .await;

    assert_eq!(reply["id"], 1);
    assert_eq!(tool_payload(&reply)["Planet"], "Ketu");
}

#[tokio::test]
async fn horoscope_path_carries_chart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/Calculate/HoroscopePredictions/Location/19.0760,72.8777/Time/14:30/25/10/1992/+05:30/Ayanamsa/RAMAN",
        ))
        .respond_with(pass(json!([{ "Name": "SunInAries" }])))
        .mount(&server)
        .await;

    let handler = handler_for(&server);
    let reply = send(&handler, tool_call(2, "get_horoscope_predictions", chart_args())).await;
    assert_eq!(tool_payload(&reply)[0]["Name"], "SunInAries");
}

#[tokio::test]
async fn downstream_failure_is_protocol_error_with_matching_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let handler = handler_for(&server);
    let reply = send(&handler, tool_call(42, "get_horoscope_predictions", chart_args())).await;

    assert_eq!(reply["id"], 42);
    assert!(reply.get("result").is_none());
    assert_eq!(reply["error"]["code"], -32603);
    assert_eq!(reply["error"]["message"], "VedAstro API error: 503");
}

#[tokio::test]
async fn raw_data_fails_when_one_table_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/Calculate/AllPlanetData/.*"))
        .respond_with(pass(json!({ "Sun": {} })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/Calculate/AllHouseData/.*"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let handler = handler_for(&server);
    let reply = send(&handler, tool_call(5, "get_astrology_raw_data", chart_args())).await;
    assert_eq!(reply["error"]["message"], "VedAstro API error (house): 500");
}

#[tokio::test]
async fn ashtakvarga_combines_both_charts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/Calculate/SarvashtakavargaChart/.*"))
        .respond_with(pass(json!({ "Aries": 28 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/Calculate/BhinnashtakavargaChart/.*"))
        .respond_with(pass(json!({ "Sun": { "Aries": 4 } })))
        .mount(&server)
        .await;

    let handler = handler_for(&server);
    let reply = send(&handler, tool_call(6, "get_ashtakvarga_data", chart_args())).await;
    let payload = tool_payload(&reply);
    assert_eq!(payload["SarvashtakavargaChart"]["Aries"], 28);
    assert_eq!(payload["BhinnashtakavargaChart"]["Sun"]["Aries"], 4);
}

#[tokio::test]
async fn general_data_drops_failed_properties() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/Calculate/LagnaSignName/.*"))
        .respond_with(pass(json!({ "LagnaSignName": "Leo" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/Calculate/MoonSignName/.*"))
        .respond_with(pass(json!({ "MoonSignName": "Cancer" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let handler = handler_for(&server);
    let reply = send(&handler, tool_call(7, "get_general_astro_data", chart_args())).await;
    let payload = tool_payload(&reply);

    assert_eq!(payload["LagnaSignName"], "Leo");
    assert_eq!(payload["MoonSignName"], "Cancer");
    assert_eq!(payload.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn missing_chart_field_is_invalid_params() {
    let handler = offline_handler();
    let reply = send(
        &handler,
        tool_call(8, "get_ashtakvarga_data", json!({ "latitude": "1" })),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32602);
}
