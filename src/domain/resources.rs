//! Static informational resources
//!
//! Both documents are compiled in and never touch the backend.

use rust_mcp_sdk::schema::{
    ReadResourceContent, ReadResourceRequestParams, ReadResourceResult, Resource,
    TextResourceContents,
};
use serde_json::{json, Value};

use crate::mcp::rpc::{json_rpc_error, json_rpc_error_with_data, json_rpc_result};

pub const CONFIG_INFO_RESOURCE_URI: &str = "mxp://config/info";
pub const TOOL_HELP_RESOURCE_URI: &str = "mxp://help/tools";

const CONFIG_INFO_TEXT: &str = "\
MXP Gateway

Read-only bridge to the MXP shipboard property management system.

Tools:
- get_account_info: account details by charge_id
- get_crew_info: crew list, optionally one member by pin
- get_folio_info: folio by folio_id, optional date_from/date_to
- get_document_info: document by document_id
- get_icafe_info: iCafe packages by icafe_id, guest room_nr/date_of_birth or crew last_name/pin
- get_person_image: person photo by person_id
- get_quick_code_info: quick codes
- get_manifest_info: sailor manifest, optional installation_code and voyage dates
- get_receipt_image_info: receipt image by receipt_id
- get_person_invoice_info: invoice by person_id
";

const TOOL_HELP_TEXT: &str = "\
MXP tool usage

Identifiers are integers. Dates use YYYY-MM-DD.

Accounts and folios
- get_account_info { \"charge_id\": 10000004 }
- get_folio_info { \"folio_id\": 55, \"date_from\": \"2024-01-01\", \"date_to\": \"2024-01-31\" }
  The date filters are optional; date_from must not be after date_to.

Documents and images
- get_document_info { \"document_id\": 42 }
- get_person_image { \"person_id\": 901 } returns an image block
- get_receipt_image_info { \"receipt_id\": 77 } returns an image block

People
- get_crew_info {} lists all crew; { \"pin\": 1234 } selects one member
- get_person_invoice_info { \"person_id\": 901 }

Guest services
- get_icafe_info {} lists sessions; { \"icafe_id\": 3 } selects one
  Guests: { \"room_nr\": \"8123\", \"date_of_birth\": \"1980-04-02\" }
  Crew: { \"last_name\": \"Doe\", \"pin\": 4711 }
- get_manifest_info { \"installation_code\": \"SC\", \"voyage_embark_date\": \"2024-03-01\",
  \"voyage_debark_date\": \"2024-03-08\" }
- get_quick_code_info {}

Failures from the backend come back with isError set. structuredContent.error.status
carries the backend HTTP status, e.g. 404 for an unknown identifier or 401 when the
gateway credentials were rejected.
";

pub fn build_resources_list() -> Vec<Resource> {
    vec![
        Resource {
            annotations: None,
            description: Some("Overview of the MXP gateway and its tools".to_string()),
            icons: vec![],
            meta: None,
            mime_type: Some("text/plain".to_string()),
            name: "MXP Configuration".to_string(),
            size: None,
            title: None,
            uri: CONFIG_INFO_RESOURCE_URI.to_string(),
        },
        Resource {
            annotations: None,
            description: Some("Usage guide with example arguments for every tool".to_string()),
            icons: vec![],
            meta: None,
            mime_type: Some("text/plain".to_string()),
            name: "MXP Tool Help".to_string(),
            size: None,
            title: None,
            uri: TOOL_HELP_RESOURCE_URI.to_string(),
        },
    ]
}

pub fn static_resource_text(uri: &str) -> Option<&'static str> {
    match uri {
        CONFIG_INFO_RESOURCE_URI => Some(CONFIG_INFO_TEXT),
        TOOL_HELP_RESOURCE_URI => Some(TOOL_HELP_TEXT),
        _ => None,
    }
}

pub fn handle_resources_read(id: Option<Value>, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let resource_read: ReadResourceRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    let Some(text) = static_resource_text(&resource_read.uri) else {
        return json_rpc_error_with_data(
            id,
            -32601,
            "Method not found",
            Some(json!({
                "code": "resource_not_found",
                "message": "unknown resource uri",
                "details": {
                    "uri": resource_read.uri,
                },
            })),
        );
    };

    let result = serde_json::to_value(ReadResourceResult {
        contents: vec![ReadResourceContent::from(TextResourceContents {
            meta: None,
            mime_type: Some("text/plain".to_string()),
            text: text.to_string(),
            uri: resource_read.uri,
        })],
        meta: None,
    })
    .expect("read resource result serialization");

    json_rpc_result(id, result)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        build_resources_list, handle_resources_read, static_resource_text,
        CONFIG_INFO_RESOURCE_URI, TOOL_HELP_RESOURCE_URI,
    };
    use crate::domain::{operations::Operation, tools::build_tools_list};

    #[test]
    fn lists_both_static_documents() {
        let uris: Vec<_> = build_resources_list()
            .into_iter()
            .map(|resource| resource.uri)
            .collect();
        assert_eq!(uris, vec![CONFIG_INFO_RESOURCE_URI, TOOL_HELP_RESOURCE_URI]);
    }

    #[test]
    fn documents_mention_every_tool() {
        for tool in build_tools_list() {
            for uri in [CONFIG_INFO_RESOURCE_URI, TOOL_HELP_RESOURCE_URI] {
                let text = static_resource_text(uri).expect("static text");
                assert!(text.contains(&tool.name), "{uri} does not mention {}", tool.name);
            }
        }
    }

    #[test]
    fn help_shows_every_parameter() {
        let help = static_resource_text(TOOL_HELP_RESOURCE_URI).expect("help text");
        for operation in Operation::ALL {
            for spec in operation.descriptor().params {
                assert!(help.contains(spec.name), "help does not show {}", spec.name);
            }
        }
    }

    #[test]
    fn read_returns_text_contents() {
        let response = handle_resources_read(
            Some(json!(9)),
            Some(json!({ "uri": TOOL_HELP_RESOURCE_URI })),
        );

        assert_eq!(response["id"], 9);
        assert_eq!(response["result"]["contents"][0]["uri"], TOOL_HELP_RESOURCE_URI);
        assert!(response["result"]["contents"][0]["text"]
            .as_str()
            .expect("text content")
            .contains("get_folio_info"));
    }

    #[test]
    fn read_without_params_is_invalid() {
        let response = handle_resources_read(Some(json!(10)), None);
        assert_eq!(response["error"]["code"], -32602);
    }
}
