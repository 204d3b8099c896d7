//! Content blocks and tool-output normalization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tags a content block may carry in its `type` field.
pub const CONTENT_BLOCK_TYPES: &[&str] = &["text", "image", "audio", "resource", "resource_link"];

/// Contents of an embedded resource: either text or a base64 blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    /// Resource URI.
    pub uri: String,
    /// MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Binary content (base64).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

/// One unit of message or tool-result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Value>,
    },
    /// Base64-encoded image.
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Value>,
    },
    /// Base64-encoded audio.
    Audio {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Value>,
    },
    /// Resource embedded inline.
    Resource {
        resource: ResourceContents,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Value>,
    },
    /// Link to a resource the App may read later.
    ResourceLink {
        uri: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Value>,
    },
}

impl ContentBlock {
    /// A plain text block.
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text {
            text: text.into(),
            annotations: None,
        }
    }

    /// The text of a text block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Result of a `tools/call`, also the params of `ui/notifications/tool-result`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Content returned by the tool.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// Machine-readable result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    /// Whether the tool call errored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    /// Opaque metadata.
    #[serde(default, rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl CallToolResult {
    /// Create a successful text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            ..Self::default()
        }
    }

    /// Create an error result.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(message)],
            is_error: Some(true),
            ..Self::default()
        }
    }
}

/// The closed set of shapes an upstream tool output can take.
///
/// Built from an opaque value by [`ToolOutput::classify`]; every value maps
/// to exactly one variant, `Structured` being the catch-all.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// No result yet (`null` or missing). Nothing is delivered.
    Absent,
    /// An array, taken as an already-normalized list of blocks.
    Blocks(Vec<Value>),
    /// A single object carrying a known content-block tag.
    Block(ContentBlock),
    /// An object with a string `text` field and no tag.
    Text(String),
    /// An object already shaped like a tool result.
    Result {
        content: Option<Vec<Value>>,
        structured_content: Option<Value>,
        is_error: Option<bool>,
        meta: Option<Value>,
    },
    /// Anything else. Rendered as JSON text and kept as structured content.
    Structured(Value),
}

impl ToolOutput {
    /// Classify an optional opaque value.
    pub fn classify(value: Option<Value>) -> Self {
        let Some(value) = value else {
            return ToolOutput::Absent;
        };

        match value {
            Value::Null => ToolOutput::Absent,
            Value::Array(items) => ToolOutput::Blocks(items),
            Value::Object(obj) => Self::classify_object(obj),
            scalar => ToolOutput::Structured(scalar),
        }
    }

    fn classify_object(obj: Map<String, Value>) -> Self {
        if let Some(tag) = obj.get("type").and_then(Value::as_str) {
            if CONTENT_BLOCK_TYPES.contains(&tag) {
                if let Ok(block) = serde_json::from_value::<ContentBlock>(Value::Object(obj.clone()))
                {
                    return ToolOutput::Block(block);
                }
            }
            return ToolOutput::Structured(Value::Object(obj));
        }

        if let Some(Value::String(text)) = obj.get("text") {
            return ToolOutput::Text(text.clone());
        }

        let content = match obj.get("content") {
            Some(Value::Array(items)) => Some(items.clone()),
            _ => None,
        };
        if content.is_some() || obj.contains_key("structuredContent") {
            return ToolOutput::Result {
                content,
                structured_content: obj.get("structuredContent").cloned(),
                is_error: obj.get("isError").and_then(Value::as_bool),
                meta: obj.get("_meta").cloned(),
            };
        }

        ToolOutput::Structured(Value::Object(obj))
    }

    /// True when nothing should be delivered.
    pub fn is_absent(&self) -> bool {
        matches!(self, ToolOutput::Absent)
    }

    /// Normalize into a tool result. `None` only for [`ToolOutput::Absent`].
    pub fn into_result(self) -> Option<CallToolResult> {
        let result = match self {
            ToolOutput::Absent => return None,
            ToolOutput::Blocks(items) => CallToolResult {
                content: blocks_from_values(items),
                ..CallToolResult::default()
            },
            ToolOutput::Block(block) => CallToolResult {
                content: vec![block],
                ..CallToolResult::default()
            },
            ToolOutput::Text(text) => CallToolResult::text(text),
            ToolOutput::Result {
                content,
                structured_content,
                is_error,
                meta,
            } => {
                let content = match (content, &structured_content) {
                    (Some(items), _) => blocks_from_values(items),
                    (None, Some(structured)) => vec![ContentBlock::text(json_text(structured))],
                    (None, None) => Vec::new(),
                };
                CallToolResult {
                    content,
                    structured_content,
                    is_error,
                    meta,
                }
            }
            ToolOutput::Structured(value) => {
                let structured_content = value.is_object().then(|| value.clone());
                CallToolResult {
                    content: vec![ContentBlock::text(json_text(&value))],
                    structured_content,
                    ..CallToolResult::default()
                }
            }
        };
        Some(result)
    }
}

/// Normalize arbitrary tool output into a tool result.
///
/// Returns `None` for `null` or missing output, so "no result yet" is never
/// confused with an empty result.
pub fn normalize_tool_output(value: Option<Value>) -> Option<CallToolResult> {
    ToolOutput::classify(value).into_result()
}

fn blocks_from_values(items: Vec<Value>) -> Vec<ContentBlock> {
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<ContentBlock>(item.clone())
                .unwrap_or_else(|_| ContentBlock::text(json_text(&item)))
        })
        .collect()
}

fn json_text(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
