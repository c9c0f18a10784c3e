//! Tool definitions for stages that read source documents.

use crate::documents::DocumentSource;
use crate::error::{FortellError, Result};
use serde::{Deserialize, Serialize};

/// Tools available to the fetch stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Read one allow-listed source document.
    FetchDocument { filename: String },
}

impl ToolCall {
    /// Execute a tool call against the document source.
    ///
    /// Document errors come back as result text, never as `Err`; the stage is
    /// expected to read them and decide how to proceed.
    pub fn execute(&self, documents: &DocumentSource) -> String {
        match self {
            ToolCall::FetchDocument { filename } => documents.fetch(filename),
        }
    }
}

/// OpenAI function/tool definitions offered to the fetch stage.
pub fn fetch_tool_definitions(
    documents: &DocumentSource,
) -> Vec<async_openai::types::ChatCompletionTool> {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    vec![ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: "fetch_document".to_string(),
            description: Some(format!(
                "Fetch the text content of one source document. Content is truncated \
                 if it exceeds the size ceiling. Valid filenames are {:?}.",
                documents.allowed_files()
            )),
            parameters: Some(serde_json::json!({
                "type": "object",
                "properties": {
                    "filename": {
                        "type": "string",
                        "description": "Name of the document to fetch"
                    }
                },
                "required": ["filename"]
            })),
            strict: None,
        },
    }]
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| FortellError::Stage("fetch".to_string(), format!("Invalid tool arguments: {}", e)))?;

    match name {
        "fetch_document" => {
            let filename = args["filename"]
                .as_str()
                .ok_or_else(|| {
                    FortellError::Stage("fetch".to_string(), "Missing 'filename' argument".to_string())
                })?
                .to_string();
            Ok(ToolCall::FetchDocument { filename })
        }
        _ => Err(FortellError::Stage(
            "fetch".to_string(),
            format!("Unknown tool: {}", name),
        )),
    }
}
