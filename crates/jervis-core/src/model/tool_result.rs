use serde::{Deserialize, Serialize};

/// The single contract produced by every tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Name of the tool that produced this result
    pub tool_name: String,
    /// Whether the invocation succeeded
    pub success: bool,
    /// Short, user-facing summary
    pub summary: String,
    /// Full structured content, fed back into the plan's context
    pub content: serde_json::Value,
    /// Error message, set only when `success` is false
    pub error_message: Option<String>,
}

impl ToolResult {
    /// Build a successful result.
    #[must_use]
    pub fn success(tool_name: impl Into<String>, summary: impl Into<String>, content: serde_json::Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            summary: summary.into(),
            content,
            error_message: None,
        }
    }

    /// Build a failed result.
    #[must_use]
    pub fn failure(tool_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            summary: String::new(),
            content: serde_json::Value::Null,
            error_message: Some(error_message.into()),
        }
    }
}
