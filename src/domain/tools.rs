//! MXP lookups exposed as Model Context Protocol tools
//!
//! Each tool wraps exactly one catalog operation. Arguments are validated against
//! the operation descriptor, then forwarded once to the `UpstreamProvider`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rust_mcp_sdk::{
    macros,
    schema::{CallToolRequestParams, CallToolResult, ContentBlock, ImageContent, TextContent, Tool},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::operations::{Operation, OperationRequest};
use crate::mcp::rpc::{
    app_error_to_json_rpc, json_rpc_error, json_rpc_error_with_data, json_rpc_result,
};
use crate::{errors::AppError, mxp_client::UpstreamPayload, AppState};

#[macros::mcp_tool(
    name = "get_account_info",
    description = "Get account information by charge ID from the MXP system"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetAccountInfoTool {
    /// The charge ID to look up, e.g. 10000004
    pub charge_id: i64,
}

#[macros::mcp_tool(
    name = "get_crew_info",
    description = "Get crew information from the MXP system, optionally filtered by PIN"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetCrewInfoTool {
    /// PIN of a single crew member
    pub pin: Option<i64>,
}

#[macros::mcp_tool(
    name = "get_folio_info",
    description = "Get folio charges, payments and balance by folio ID from the MXP system"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetFolioInfoTool {
    pub folio_id: i64,
    /// Start date, YYYY-MM-DD
    pub date_from: Option<String>,
    /// End date, YYYY-MM-DD
    pub date_to: Option<String>,
}

#[macros::mcp_tool(
    name = "get_document_info",
    description = "Get document information by document ID from the MXP system"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetDocumentInfoTool {
    pub document_id: i64,
}

#[macros::mcp_tool(
    name = "get_icafe_info",
    description = "Get iCafe internet package information from the MXP system. Guests are \
                   found by room_nr and date_of_birth, crew by last_name and pin"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetIcafeInfoTool {
    /// Restrict to one iCafe session; omit to list all
    pub icafe_id: Option<i64>,
    /// Guest cabin number
    pub room_nr: Option<String>,
    /// Guest date of birth, YYYY-MM-DD
    pub date_of_birth: Option<String>,
    /// Crew member last name
    pub last_name: Option<String>,
    /// Crew member PIN
    pub pin: Option<i64>,
}

#[macros::mcp_tool(
    name = "get_person_image",
    description = "Get the photo of a person by MXP person ID"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetPersonImageTool {
    pub person_id: i64,
}

#[macros::mcp_tool(
    name = "get_quick_code_info",
    description = "Get quick code configuration from the MXP system"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetQuickCodeInfoTool {}

#[macros::mcp_tool(
    name = "get_manifest_info",
    description = "Get the sailor manifest from the MXP system, optionally narrowed to one voyage"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetManifestInfoTool {
    /// Ship or installation code
    pub installation_code: Option<String>,
    /// Voyage embark date, YYYY-MM-DD
    pub voyage_embark_date: Option<String>,
    /// Voyage debark date, YYYY-MM-DD
    pub voyage_debark_date: Option<String>,
}

#[macros::mcp_tool(
    name = "get_receipt_image_info",
    description = "Get a receipt image by receipt ID from the MXP system"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetReceiptImageInfoTool {
    pub receipt_id: i64,
}

#[macros::mcp_tool(
    name = "get_person_invoice_info",
    description = "Get the invoice of a person by MXP person ID"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetPersonInvoiceInfoTool {
    pub person_id: i64,
}

pub fn build_tools_list() -> Vec<Tool> {
    vec![
        GetAccountInfoTool::tool(),
        GetCrewInfoTool::tool(),
        GetFolioInfoTool::tool(),
        GetDocumentInfoTool::tool(),
        GetIcafeInfoTool::tool(),
        GetPersonImageTool::tool(),
        GetQuickCodeInfoTool::tool(),
        GetManifestInfoTool::tool(),
        GetReceiptImageInfoTool::tool(),
        GetPersonInvoiceInfoTool::tool(),
    ]
}

pub fn operation_for_tool(name: &str) -> Option<Operation> {
    let operation = match name {
        "get_account_info" => Operation::Account,
        "get_crew_info" => Operation::Crew,
        "get_folio_info" => Operation::Folio,
        "get_document_info" => Operation::Document,
        "get_icafe_info" => Operation::ICafe,
        "get_person_image" => Operation::PersonImage,
        "get_quick_code_info" => Operation::QuickCode,
        "get_manifest_info" => Operation::SailorManifest,
        "get_receipt_image_info" => Operation::ReceiptImage,
        "get_person_invoice_info" => Operation::PersonInvoice,
        _ => return None,
    };
    Some(operation)
}

pub async fn handle_tools_call(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    let Some(operation) = operation_for_tool(&tool_call.name) else {
        return json_rpc_error_with_data(
            id,
            -32601,
            "Method not found",
            Some(json!({
                "code": "tool_not_found",
                "message": "unknown tool name",
                "details": {
                    "name": tool_call.name,
                },
            })),
        );
    };

    let arguments = tool_call.arguments.unwrap_or_default();
    let request = match OperationRequest::from_arguments(operation, &arguments) {
        Ok(request) => request,
        Err(err) => return app_error_to_json_rpc(id, err),
    };

    let result = match state.upstream.fetch(&request).await {
        Ok(payload) => payload_tool_result(payload),
        Err(err) if err.is_upstream_failure() => upstream_failure_tool_result(&err),
        Err(err) => return app_error_to_json_rpc(id, err),
    };

    json_rpc_result(
        id,
        serde_json::to_value(result).expect("tool call result serialization"),
    )
}

pub fn payload_tool_result(payload: UpstreamPayload) -> CallToolResult {
    match payload {
        UpstreamPayload::Json(value) => {
            let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            CallToolResult {
                content: vec![ContentBlock::from(TextContent::new(text, None, None))],
                is_error: None,
                meta: None,
                structured_content: Some(Map::from_iter([("result".to_string(), value)])),
            }
        }
        UpstreamPayload::Image {
            content_type,
            bytes,
        } => {
            let size_bytes = bytes.len();
            CallToolResult {
                content: vec![
                    ContentBlock::from(ImageContent::new(
                        BASE64.encode(&bytes),
                        content_type.clone(),
                        None,
                        None,
                    )),
                    ContentBlock::from(TextContent::new(
                        format!("Returned {content_type} image ({size_bytes} bytes)"),
                        None,
                        None,
                    )),
                ],
                is_error: None,
                meta: None,
                structured_content: Some(Map::from_iter([
                    ("content_type".to_string(), json!(content_type)),
                    ("size_bytes".to_string(), json!(size_bytes)),
                ])),
            }
        }
    }
}

/// Backend failures are reported inside the tool result so the calling agent can
/// tell "not found" from "auth rejected" from "backend down".
pub fn upstream_failure_tool_result(err: &AppError) -> CallToolResult {
    let mut error = Map::from_iter([
        ("code".to_string(), json!(err.code())),
        ("message".to_string(), json!(err.public_message())),
    ]);
    if let AppError::Upstream { status, .. } = err {
        error.insert("status".to_string(), json!(status));
        error.insert("body".to_string(), err.details()["body"].clone());
    }

    CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(
            format!("MXP request failed: {}", err.public_message()),
            None,
            None,
        ))],
        is_error: Some(true),
        meta: None,
        structured_content: Some(Map::from_iter([("error".to_string(), Value::Object(error))])),
    }
}
