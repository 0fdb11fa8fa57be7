//! Tool definitions, tool calls and tool results.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::Content;

/// MCP tool definition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Unique name for the tool.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: ToolInputSchema,
}

impl Tool {
    /// Create a new tool taking no arguments.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema: ToolInputSchema::object(),
        }
    }

    /// Set the input schema.
    pub fn with_schema(mut self, schema: ToolInputSchema) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Object schema describing a tool's arguments.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolInputSchema {
    /// Schema type, always "object".
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Property definitions, ordered by name.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
    /// Required property names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Whether unknown properties are accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
}

impl ToolInputSchema {
    /// Create an empty object schema.
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
            additional_properties: Some(false),
        }
    }

    /// Add a property.
    pub fn property(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Set required properties.
    pub fn required(mut self, required: Vec<impl Into<String>>) -> Self {
        self.required = required.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for ToolInputSchema {
    fn default() -> Self {
        Self::object()
    }
}

/// JSON Schema for a single scalar property.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PropertySchema {
    /// Property type.
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Property description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Minimum value (for numbers).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
}

impl PropertySchema {
    fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: schema_type.to_string(),
            description: None,
            default: None,
            minimum: None,
        }
    }

    /// Create a string property.
    pub fn string() -> Self {
        Self::of_type("string")
    }

    /// Create an integer property.
    pub fn integer() -> Self {
        Self::of_type("integer")
    }

    /// Add a description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Set default value.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Set minimum (for numbers).
    pub fn min(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }
}

/// `tools/list` result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    /// Available tools.
    pub tools: Vec<Tool>,
    /// Next page cursor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl ListToolsResult {
    /// Create a single-page result.
    pub fn new(tools: Vec<Tool>) -> Self {
        Self {
            tools,
            next_cursor: None,
        }
    }
}

/// `tools/call` parameters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CallToolParams {
    /// Tool name to call.
    pub name: String,
    /// Tool arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// `tools/call` result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Result content.
    pub content: Vec<Content>,
    /// Whether the result is an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    /// Create a success result with text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_content(vec![Content::text(text)])
    }

    /// Create an error result.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            is_error: Some(true),
        }
    }

    /// Create a result with multiple content items.
    pub fn with_content(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: None,
        }
    }

    /// Check if result is an error.
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}
