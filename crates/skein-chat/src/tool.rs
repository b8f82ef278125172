//! Caller-supplied tools and their dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use skein_ai::{ToolCall, ToolDefinition};

use crate::logger::ActionLogger;

/// Error type tools use for unexpected infrastructure failures (I/O, broken
/// connections, ...). Domain failures should instead be reported as a
/// normal result the model can read and react to.
pub type ToolError = Box<dyn std::error::Error + Send + Sync>;

/// Everything a tool execution receives from the orchestrator.
pub struct ToolContext {
    /// Cancellation for the enclosing chat call; tools are expected to
    /// honor it.
    pub cancel: CancellationToken,
    /// Destination for domain-level action records.
    pub logger: Arc<dyn ActionLogger>,
}

/// A single tool invocation as requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    pub name: String,
    /// Provider-minted call id, echoed on the result.
    pub call_id: String,
    /// Opaque JSON text holding the arguments.
    pub arguments: String,
}

impl ToolRequest {
    pub(crate) fn from_call(call: &ToolCall) -> Self {
        Self {
            name: call.name.clone(),
            call_id: call.id.clone(),
            arguments: call.arguments.clone(),
        }
    }

    /// A successful result answering this request.
    pub fn result(&self, result: impl Into<String>) -> ToolResult {
        ToolResult {
            call_id: self.call_id.clone(),
            result: result.into(),
        }
    }

    /// An in-band error result answering this request.
    pub fn error_result(&self, error: impl std::fmt::Display) -> ToolResult {
        ToolResult {
            call_id: self.call_id.clone(),
            result: format!("Error: {error}"),
        }
    }
}

/// What a tool hands back to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// Echoes the request's call id.
    pub call_id: String,
    /// Text placed in the tool message's content.
    pub result: String,
}

/// An executable tool offered to the model for one call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name, matched against incoming tool calls.
    fn name(&self) -> &str;

    /// Short description shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema for the arguments. Opaque to this library; forwarded to
    /// the backend verbatim so the model can plan calls.
    fn parameters(&self) -> serde_json::Value;

    /// Execute the tool. The error path is reserved for infrastructure
    /// failures; the orchestrator turns those into an in-band result and
    /// keeps the loop alive.
    async fn execute(
        &self,
        ctx: &ToolContext,
        request: &ToolRequest,
    ) -> Result<ToolResult, ToolError>;
}

/// Type alias for a shared tool
pub type BoxedTool = Arc<dyn Tool>;

/// A flat, ordered collection of tools for one chat call.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<BoxedTool>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, builder style.
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn push(&mut self, tool: BoxedTool) {
        self.tools.push(tool);
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Wire-facing definitions for the backend.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition::new(tool.name(), tool.description(), tool.parameters()))
            .collect()
    }

    // Linear search beats a map at the expected cardinality (under 20 tools).
    fn get(&self, name: &str) -> Option<&BoxedTool> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    /// Resolve and run one tool call. A missing tool produces an in-band
    /// error result rather than a failure, so the model can recover.
    pub(crate) async fn dispatch(
        &self,
        ctx: &ToolContext,
        request: &ToolRequest,
    ) -> Result<ToolResult, ToolError> {
        match self.get(&request.name) {
            Some(tool) => tool.execute(ctx, request).await,
            None => Ok(request.error_result("tool not found")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NullActionLogger;

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercases its input"
        }

        fn parameters(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": { "input": { "type": "string" } },
                "required": ["input"]
            })
        }

        async fn execute(
            &self,
            _ctx: &ToolContext,
            request: &ToolRequest,
        ) -> Result<ToolResult, ToolError> {
            let args: serde_json::Value = serde_json::from_str(&request.arguments)?;
            let input = args.get("input").and_then(|v| v.as_str()).unwrap_or_default();
            Ok(request.result(input.to_uppercase()))
        }
    }

    fn test_ctx() -> ToolContext {
        ToolContext {
            cancel: CancellationToken::new(),
            logger: Arc::new(NullActionLogger),
        }
    }

    fn request(name: &str, call_id: &str, arguments: &str) -> ToolRequest {
        ToolRequest {
            name: name.to_string(),
            call_id: call_id.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_runs_matching_tool() {
        let tools = ToolSet::new().with(UpperTool);
        let result = tools
            .dispatch(&test_ctx(), &request("upper", "c1", r#"{"input":"abc"}"#))
            .await
            .unwrap();
        assert_eq!(result.call_id, "c1");
        assert_eq!(result.result, "ABC");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_is_in_band() {
        let tools = ToolSet::new().with(UpperTool);
        let result = tools
            .dispatch(&test_ctx(), &request("missing", "c2", "{}"))
            .await
            .unwrap();
        assert_eq!(result.call_id, "c2");
        assert_eq!(result.result, "Error: tool not found");
    }

    #[tokio::test]
    async fn test_dispatch_surfaces_infrastructure_error() {
        let tools = ToolSet::new().with(UpperTool);
        // Unparseable arguments hit the tool's error path.
        let err = tools
            .dispatch(&test_ctx(), &request("upper", "c3", "not json"))
            .await
            .unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_definitions_reflect_tools() {
        let tools = ToolSet::new().with(UpperTool);
        let defs = tools.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "upper");
        assert_eq!(defs[0].description, "Uppercases its input");
        assert!(defs[0].parameters.get("properties").is_some());
    }

    #[test]
    fn test_error_result_rendering() {
        let req = request("upper", "c4", "{}");
        let result = req.error_result("disk on fire");
        assert_eq!(result.result, "Error: disk on fire");
        assert_eq!(result.call_id, "c4");
    }
}
