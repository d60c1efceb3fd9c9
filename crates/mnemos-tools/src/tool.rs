// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait, registry, and the uniform result envelope.
//!
//! The [`ToolRegistry`] manages lookup by name, publishes OpenAI-style
//! function definitions for the assistant request, and owns error
//! translation: a tool returns `Result<Value, MnemosError>`, the registry
//! hands back a [`ToolEnvelope`] no matter what happened.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mnemos_core::MnemosError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Result of a dispatched tool call, as the assistant sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEnvelope {
    pub success: bool,
    pub error: Option<String>,
    pub data: Option<serde_json::Value>,
}

impl ToolEnvelope {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: None,
        }
    }

    /// Compact JSON for feeding back into the assistant conversation.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"error":"unserializable tool result: {e}","data":null}}"#)
        })
    }
}

/// A named operation the assistant may call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name, used for lookup and in the published definition.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Runs the tool on already-parsed JSON arguments.
    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, MnemosError>;
}

/// Deserializes tool arguments, reporting any mismatch as a validation error.
pub fn parse_args<T: DeserializeOwned>(tool: &str, input: serde_json::Value) -> Result<T, MnemosError> {
    serde_json::from_value(input)
        .map_err(|e| MnemosError::Validation(format!("invalid arguments for `{tool}`: {e}")))
}

/// Registry of available tools, indexed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool under its `name()`, replacing any previous one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Returns (name, description) pairs for all registered tools, sorted by name.
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .tools
            .values()
            .map(|t| (t.name(), t.description()))
            .collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }

    /// Function definitions for every registered tool, sorted by name.
    ///
    /// Each definition has the shape:
    /// ```json
    /// {
    ///   "type": "function",
    ///   "function": { "name": "...", "description": "...", "parameters": { ... } }
    /// }
    /// ```
    pub fn tool_definitions(&self) -> Vec<serde_json::Value> {
        let mut tools: Vec<&Arc<dyn Tool>> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.parameters_schema(),
                    }
                })
            })
            .collect()
    }

    /// Dispatches a call whose arguments arrive as a JSON string.
    ///
    /// Blank arguments are treated as `{}`. Malformed JSON yields a failure
    /// envelope without invoking anything.
    pub async fn dispatch(&self, name: &str, arguments: &str) -> ToolEnvelope {
        let input = if arguments.trim().is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            match serde_json::from_str(arguments) {
                Ok(value) => value,
                Err(e) => {
                    warn!(tool = name, error = %e, "tool arguments are not valid JSON");
                    return ToolEnvelope::failure(format!("invalid JSON arguments: {e}"));
                }
            }
        };
        self.dispatch_value(name, input).await
    }

    /// Dispatches a call with already-parsed arguments.
    pub async fn dispatch_value(&self, name: &str, input: serde_json::Value) -> ToolEnvelope {
        let Some(tool) = self.get(name) else {
            warn!(tool = name, "unknown tool requested");
            return ToolEnvelope::failure(format!("unknown tool: {name}"));
        };

        match tool.invoke(input).await {
            Ok(data) => {
                debug!(tool = name, "tool call succeeded");
                ToolEnvelope::ok(data)
            }
            Err(e) => {
                warn!(tool = name, error = %e, "tool call failed");
                ToolEnvelope::failure(e.to_string())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct EchoArgs {
        message: String,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the input back"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string" }
                },
                "required": ["message"],
                "additionalProperties": false
            })
        }

        async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value, MnemosError> {
            let args: EchoArgs = parse_args(self.name(), input)?;
            Ok(serde_json::json!({ "message": args.message }))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "fail"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object", "properties": {} })
        }

        async fn invoke(&self, _input: serde_json::Value) -> Result<serde_json::Value, MnemosError> {
            Err(MnemosError::storage(std::io::Error::other("disk full")))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(FailingTool));
        registry
    }

    #[test]
    fn list_and_definitions_are_sorted() {
        let registry = registry();
        assert_eq!(registry.list()[0], ("echo", "Echoes the input back"));

        let defs = registry.tool_definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0]["type"], "function");
        assert_eq!(defs[0]["function"]["name"], "echo");
        assert_eq!(defs[1]["function"]["name"], "fail");
        assert_eq!(defs[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn len_and_is_empty() {
        let mut registry = ToolRegistry::default();
        assert!(registry.is_empty());
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(EchoTool));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn dispatch_wraps_success() {
        let envelope = registry().dispatch("echo", r#"{"message":"hi"}"#).await;
        assert!(envelope.success);
        assert_eq!(envelope.error, None);
        assert_eq!(envelope.data.unwrap()["message"], "hi");
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn dispatch_reports_unknown_tool() {
        let envelope = registry().dispatch("nope", "{}").await;
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("unknown tool: nope"));
        assert!(envelope.data.is_none());
        assert!(logs_contain("unknown tool requested"));
    }

    #[tokio::test]
    async fn dispatch_reports_malformed_json() {
        let envelope = registry().dispatch("echo", "{not json").await;
        assert!(!envelope.success);
        assert!(envelope.error.unwrap().starts_with("invalid JSON arguments"));
    }

    #[tokio::test]
    async fn dispatch_rejects_unknown_fields() {
        let envelope = registry()
            .dispatch("echo", r#"{"message":"hi","extra":1}"#)
            .await;
        assert!(!envelope.success);
        let error = envelope.error.unwrap();
        assert!(error.contains("invalid arguments for `echo`"), "{error}");
    }

    #[tokio::test]
    async fn dispatch_translates_tool_errors() {
        let envelope = registry().dispatch("fail", "").await;
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("storage error: disk full"));
    }

    #[test]
    fn envelope_serializes_with_all_fields() {
        let json = ToolEnvelope::failure("boom").to_json_string();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "boom");
        assert!(value["data"].is_null());
    }
}
