//! Prompt templates for common MXP review tasks
//!
//! Rendering is pure string formatting over the supplied identifier; the backend is
//! never called here. The rendered text tells the model which tool to use.

use std::collections::HashMap;

use rust_mcp_sdk::schema::{
    ContentBlock, GetPromptRequestParams, GetPromptResult, Prompt, PromptArgument, PromptMessage,
    Role, TextContent,
};
use serde_json::{json, Value};

use crate::domain::utils::normalize_integer;
use crate::errors::AppError;
use crate::mcp::rpc::{
    app_error_to_json_rpc, json_rpc_error, json_rpc_error_with_data, json_rpc_result,
};

struct PromptTemplate {
    name: &'static str,
    description: &'static str,
    argument: &'static str,
    argument_description: &'static str,
    argument_required: bool,
}

const TEMPLATES: [PromptTemplate; 3] = [
    PromptTemplate {
        name: "analyze_account",
        description: "Analyze an account's status, balance and recent activity",
        argument: "charge_id",
        argument_description: "Charge ID of the account",
        argument_required: true,
    },
    PromptTemplate {
        name: "review_folio",
        description: "Review a folio's charges, payments and balance",
        argument: "folio_id",
        argument_description: "Folio ID to review",
        argument_required: true,
    },
    PromptTemplate {
        name: "crew_report",
        description: "Summarize crew data, optionally focused on one crew member",
        argument: "pin",
        argument_description: "PIN of a crew member to focus on",
        argument_required: false,
    },
];

pub fn build_prompts_list() -> Vec<Prompt> {
    TEMPLATES
        .iter()
        .map(|template| Prompt {
            arguments: vec![PromptArgument {
                name: template.argument.to_string(),
                title: None,
                description: Some(template.argument_description.to_string()),
                required: Some(template.argument_required),
            }],
            description: Some(template.description.to_string()),
            icons: vec![],
            meta: None,
            name: template.name.to_string(),
            title: None,
        })
        .collect()
}

/// Renders a prompt by name. `Ok(None)` means the prompt does not exist.
pub fn render_prompt(
    name: &str,
    arguments: &HashMap<String, String>,
) -> Result<Option<(&'static str, String)>, AppError> {
    let Some(template) = TEMPLATES.iter().find(|template| template.name == name) else {
        return Ok(None);
    };

    let identifier = match arguments
        .get(template.argument)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
    {
        Some(value) => Some(normalize_integer(
            template.argument,
            &Value::String(value.to_string()),
        )?),
        None if template.argument_required => {
            return Err(AppError::bad_request(
                "missing_parameter",
                format!("{} is required", template.argument),
            ))
        }
        None => None,
    };

    let text = match (template.name, identifier) {
        ("analyze_account", Some(charge_id)) => format!(
            "Please analyze the account with charge ID {charge_id}.\n\n\
             Use the get_account_info tool to retrieve the account, then provide:\n\
             1. Account status summary\n\
             2. Outstanding balance, if any\n\
             3. Recent transaction patterns\n\
             4. Potential issues or concerns\n\
             5. Recommendations for managing the account"
        ),
        ("review_folio", Some(folio_id)) => format!(
            "Please review folio {folio_id}.\n\n\
             Use the get_folio_info tool to retrieve the folio, then provide:\n\
             1. Breakdown of total charges\n\
             2. Payment history\n\
             3. Current balance\n\
             4. Unusual or noteworthy items\n\
             5. Suggestions for the guest"
        ),
        ("crew_report", Some(pin)) => format!(
            "Please prepare a report on the crew member with PIN {pin}.\n\n\
             Use the get_crew_info tool with pin {pin}, then provide:\n\
             1. Role and department\n\
             2. Current assignment\n\
             3. Any concerns worth raising\n\
             4. Recommendations"
        ),
        _ => "Please generate a comprehensive crew report.\n\n\
              Use the get_crew_info tool to retrieve crew data, then provide:\n\
              1. Crew count by department\n\
              2. Role distribution\n\
              3. Staffing gaps or concerns\n\
              4. Recommendations for crew management"
            .to_string(),
    };

    Ok(Some((template.description, text)))
}

pub fn handle_prompts_get(id: Option<Value>, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let prompt_get: GetPromptRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    let arguments = prompt_get.arguments.unwrap_or_default();
    match render_prompt(&prompt_get.name, &arguments) {
        Ok(Some((description, text))) => json_rpc_result(
            id,
            serde_json::to_value(GetPromptResult {
                description: Some(description.to_string()),
                messages: vec![PromptMessage {
                    content: ContentBlock::from(TextContent::new(text, None, None)),
                    role: Role::User,
                }],
                meta: None,
            })
            .expect("get prompt result serialization"),
        ),
        Ok(None) => json_rpc_error_with_data(
            id,
            -32601,
            "Method not found",
            Some(json!({
                "code": "prompt_not_found",
                "message": "unknown prompt name",
                "details": {
                    "name": prompt_get.name,
                },
            })),
        ),
        Err(err) => app_error_to_json_rpc(id, err),
    }
}
