//! JSON-RPC dispatch for the MXP gateway
//!
//! Transports hand every decoded payload to [`handle_json_rpc_payload`]. Requests are
//! checked against the schema type for their method, then routed to the tool,
//! resource or prompt handlers. Each handled request leaves one audit line with
//! personal and secret arguments masked.

use rust_mcp_sdk::schema::{
    CallToolRequest, GetPromptRequest, Implementation, InitializeRequest, InitializeResult,
    JsonrpcMessage, JsonrpcRequest, ListPromptsRequest, ListPromptsResult, ListResourcesRequest,
    ListResourcesResult, ListToolsRequest, ListToolsResult, PingRequest, ProtocolVersion,
    ReadResourceRequest, ServerCapabilities, ServerCapabilitiesPrompts,
    ServerCapabilitiesResources, ServerCapabilitiesTools,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::domain::{
    prompts::{build_prompts_list, handle_prompts_get},
    resources::{build_resources_list, handle_resources_read},
    tools::{build_tools_list, handle_tools_call},
};
use crate::mcp::rpc::{
    app_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_result, request_id_to_value,
};
use crate::{errors::AppError, AppState};

pub const SUPPORTED_PROTOCOL_VERSION: &str = "2024-11-05";

const SERVER_INSTRUCTIONS: &str = "Read-only access to the MXP shipboard system. Use the \
get_*_info tools to look up accounts, folios, crew, documents, iCafe sessions, manifests, \
receipts and invoices by their integer identifiers.";

/// Argument keys masked in audit lines, matched exactly after lowercasing.
const MASKED_KEYS: [&str; 8] = [
    "authorization",
    "bearer",
    "credential",
    "credentials",
    "api_key",
    "apikey",
    "date_of_birth",
    "room_nr",
];

/// Substrings that mask any key containing them.
const MASKED_FRAGMENTS: [&str; 3] = ["token", "secret", "password"];

/// Handles one decoded payload, which may be a single message or a batch.
///
/// Returns `None` when nothing should be written back (notifications only).
pub async fn handle_json_rpc_payload(state: &AppState, payload: Value) -> Option<Value> {
    let Value::Array(batch) = payload else {
        return dispatch_message(state, payload).await;
    };

    if batch.is_empty() {
        return Some(Value::Array(vec![json_rpc_error(
            None,
            -32600,
            "Invalid Request",
        )]));
    }

    let mut responses = Vec::with_capacity(batch.len());
    for item in batch {
        responses.extend(dispatch_message(state, item).await);
    }

    (!responses.is_empty()).then_some(Value::Array(responses))
}

async fn dispatch_message(state: &AppState, payload: Value) -> Option<Value> {
    if !payload.is_object() {
        return Some(json_rpc_error(None, -32600, "Invalid Request"));
    }

    let raw_id = payload.get("id").cloned();
    let message = match serde_json::from_value::<JsonrpcMessage>(payload) {
        Ok(message) => message,
        Err(_) => return Some(json_rpc_error(raw_id, -32600, "Invalid Request")),
    };

    match message {
        JsonrpcMessage::Request(request) => {
            let id = Some(request_id_to_value(request.id.clone()));
            if request.method.trim().is_empty() {
                return Some(json_rpc_error(id, -32600, "Invalid Request"));
            }
            if !params_match_method(&request) {
                return Some(json_rpc_error(id, -32602, "Invalid params"));
            }

            let params = request.params.map(Value::Object);
            Some(handle_request(state, id, &request.method, params).await)
        }
        // Notifications never reach the backend.
        JsonrpcMessage::Notification(notification) => {
            debug!(method = %notification.method, "mcp notification ignored");
            None
        }
        JsonrpcMessage::ResultResponse(_) | JsonrpcMessage::ErrorResponse(_) => {
            Some(json_rpc_error(raw_id, -32600, "Invalid Request"))
        }
    }
}

fn parses_as<T: DeserializeOwned>(payload: Value) -> bool {
    serde_json::from_value::<T>(payload).is_ok()
}

/// Re-reads a request through the typed schema for its method. Unknown methods pass
/// so that they can be answered with `Method not found`.
fn params_match_method(request: &JsonrpcRequest) -> bool {
    let payload = serde_json::to_value(request).expect("jsonrpc request serialization");

    match request.method.as_str() {
        "initialize" => parses_as::<InitializeRequest>(payload),
        "ping" => parses_as::<PingRequest>(payload),
        "tools/list" => parses_as::<ListToolsRequest>(payload),
        "tools/call" => parses_as::<CallToolRequest>(payload),
        "resources/list" => parses_as::<ListResourcesRequest>(payload),
        "resources/read" => parses_as::<ReadResourceRequest>(payload),
        "prompts/list" => parses_as::<ListPromptsRequest>(payload),
        "prompts/get" => parses_as::<GetPromptRequest>(payload),
        _ => true,
    }
}

async fn handle_request(
    state: &AppState,
    id: Option<Value>,
    method: &str,
    params: Option<Value>,
) -> Value {
    let masked_params = params.as_ref().map_or(Value::Null, mask_sensitive);

    let response = match method {
        "initialize" => initialize(id, params.as_ref()),
        "ping" => json_rpc_result(id, json!({})),
        "tools/list" => json_rpc_result(
            id,
            serde_json::to_value(ListToolsResult {
                meta: None,
                next_cursor: None,
                tools: build_tools_list(),
            })
            .expect("tools list result serialization"),
        ),
        "tools/call" => handle_tools_call(state, id, params).await,
        "resources/list" => json_rpc_result(
            id,
            serde_json::to_value(ListResourcesResult {
                meta: None,
                next_cursor: None,
                resources: build_resources_list(),
            })
            .expect("resources list result serialization"),
        ),
        "resources/read" => handle_resources_read(id, params),
        "prompts/list" => json_rpc_result(
            id,
            serde_json::to_value(ListPromptsResult {
                meta: None,
                next_cursor: None,
                prompts: build_prompts_list(),
            })
            .expect("prompts list result serialization"),
        ),
        "prompts/get" => handle_prompts_get(id, params),
        _ => json_rpc_error(id, -32601, "Method not found"),
    };

    info!(
        method,
        params = %masked_params,
        failed = is_json_rpc_error(&response),
        "mcp request handled"
    );

    response
}

fn initialize(id: Option<Value>, params: Option<&Value>) -> Value {
    let protocol_version = match negotiate_protocol_version(params) {
        Ok(version) => version,
        Err(err) => return app_error_to_json_rpc(id, err),
    };

    let result = InitializeResult {
        server_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some("MXP Gateway".to_string()),
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools {
                list_changed: Some(false),
            }),
            resources: Some(ServerCapabilitiesResources {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
            prompts: Some(ServerCapabilitiesPrompts {
                list_changed: Some(false),
            }),
            ..Default::default()
        },
        protocol_version: protocol_version.into(),
        instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        meta: None,
    };

    json_rpc_result(
        id,
        serde_json::to_value(result).expect("initialize result serialization"),
    )
}

pub fn negotiate_protocol_version(params: Option<&Value>) -> Result<ProtocolVersion, AppError> {
    let requested = params
        .and_then(|params| params.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    match requested {
        "" => Err(AppError::bad_request(
            "invalid_protocol_version",
            "initialize params.protocolVersion is required",
        )),
        SUPPORTED_PROTOCOL_VERSION => Ok(ProtocolVersion::V2024_11_05),
        _ => Err(AppError::bad_request(
            "unsupported_protocol_version",
            "unsupported initialize protocolVersion",
        )),
    }
}

/// Copies `value` with every sensitive key's value replaced by `[REDACTED]`.
pub fn mask_sensitive(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    let masked = if is_sensitive_key(key) {
                        Value::String("[REDACTED]".to_string())
                    } else {
                        mask_sensitive(item)
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(mask_sensitive).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.trim().to_ascii_lowercase();
    MASKED_KEYS.contains(&key.as_str())
        || MASKED_FRAGMENTS
            .iter()
            .any(|fragment| key.contains(fragment))
}
