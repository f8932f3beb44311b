//! MCP Tool definitions and handlers
//!
//! Exposes prompt analysis, optimization and quality metrics as tools.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::McpError;
use crate::mcp::types::{CallToolResult, Tool};
use crate::models::{OptimizationFocus, OptimizationLevel};
use crate::service::PromptService;

/// Tool handler
pub struct ToolHandler {
    service: Arc<PromptService>,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(service: Arc<PromptService>) -> Self {
        Self { service }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![
            tool_def(
                "analyze_prompt",
                "Analyze a prompt for quality issues like vagueness, missing context, and ambiguity. Returns detailed analysis with issues and quality score.",
                analyze_prompt_schema(),
            ),
            tool_def(
                "optimize_prompt",
                "Optimize a prompt using AI to improve clarity, specificity, and effectiveness. Returns the optimized version with improvements.",
                optimize_prompt_schema(),
            ),
            tool_def(
                "get_quality_metrics",
                "Get detailed quality metrics for a prompt including token count, word count, and quality score.",
                quality_metrics_schema(),
            ),
        ]
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        match name {
            "analyze_prompt" => self.handle_analyze_prompt(args).await,
            "optimize_prompt" => self.handle_optimize_prompt(args).await,
            "get_quality_metrics" => self.handle_quality_metrics(args).await,
            _ => CallToolResult::error(
                McpError::UnknownTool {
                    name: name.to_string(),
                }
                .to_string(),
            ),
        }
    }

    // ==================== Tool Handlers ====================

    async fn handle_analyze_prompt(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            text: String,
            #[serde(default)]
            use_llm: bool,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return invalid_arguments(e),
        };

        tracing::info!("MCP: Analyzing prompt (LLM: {})", args.use_llm);
        let result = self.service.analyze_text(&args.text, args.use_llm).await;

        CallToolResult::json(&json!({
            "issues": result.issues,
            "quality_score": result.quality_score,
            "token_count": result.token_count,
            "estimated_improvement": result.estimated_improvement,
        }))
    }

    async fn handle_optimize_prompt(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            text: String,
            #[serde(default)]
            focus: OptimizationFocus,
            #[serde(default)]
            level: OptimizationLevel,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return invalid_arguments(e),
        };

        tracing::info!(
            "MCP: Optimizing prompt (focus={}, level={})",
            args.focus.as_str(),
            args.level.as_str()
        );

        match self
            .service
            .optimize_text(&args.text, args.focus, args.level)
            .await
        {
            Ok(result) => CallToolResult::json(&json!({
                "optimized_prompt": result.optimized_prompt,
                "improvements": result.improvements,
                "token_savings": result.token_savings,
                "quality_improvement": result.quality_improvement,
                "before_score": result.before_score,
                "after_score": result.after_score,
            })),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }

    async fn handle_quality_metrics(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            text: String,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return invalid_arguments(e),
        };

        tracing::info!("MCP: Getting quality metrics");
        let metrics = self.service.quality_metrics(&args.text).await;

        match serde_json::to_value(&metrics) {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }
}

fn invalid_arguments(err: serde_json::Error) -> CallToolResult {
    CallToolResult::error(
        McpError::InvalidArguments {
            message: err.to_string(),
        }
        .to_string(),
    )
}

// ==================== Schema Helpers ====================

fn tool_def(name: &str, description: &str, schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: schema,
    }
}

fn analyze_prompt_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": {
                "type": "string",
                "description": "The prompt text to analyze"
            },
            "use_llm": {
                "type": "boolean",
                "description": "Whether to use LLM for deeper analysis (slower but more accurate)",
                "default": false
            }
        },
        "required": ["text"]
    })
}

fn optimize_prompt_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": {
                "type": "string",
                "description": "The prompt text to optimize"
            },
            "focus": {
                "type": "string",
                "enum": ["clarity", "efficiency", "specificity", "all"],
                "description": "What aspect to focus optimization on",
                "default": "all"
            },
            "level": {
                "type": "string",
                "enum": ["basic", "balanced", "advanced"],
                "description": "How aggressively to optimize",
                "default": "balanced"
            }
        },
        "required": ["text"]
    })
}

fn quality_metrics_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": {
                "type": "string",
                "description": "The prompt text to evaluate"
            }
        },
        "required": ["text"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::analysis::TokenCounter;
    use crate::cache::CacheManager;
    use crate::config::Config;
    use crate::mcp::types::ToolResultContent;

    fn handler() -> ToolHandler {
        let service = PromptService::new(
            Config::default(),
            None,
            CacheManager::disabled(),
            TokenCounter::approximate(),
        )
        .unwrap();
        ToolHandler::new(Arc::new(service))
    }

    fn text_of(result: &CallToolResult) -> &str {
        let ToolResultContent::Text { text } = &result.content[0];
        text
    }

    #[test]
    fn test_list_tools() {
        let tools = handler().list_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["analyze_prompt", "optimize_prompt", "get_quality_metrics"]);
        for tool in &tools {
            assert_eq!(tool.input_schema["required"], json!(["text"]));
        }
    }

    #[tokio::test]
    async fn test_analyze_prompt_tool() {
        let result = handler()
            .call_tool("analyze_prompt", json!({"text": "analyze data"}))
            .await;
        assert!(!result.is_error);

        let body: Value = serde_json::from_str(text_of(&result)).unwrap();
        assert_eq!(body["quality_score"], 60);
        assert_eq!(body["issues"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_optimize_without_model() {
        let result = handler()
            .call_tool("optimize_prompt", json!({"text": "analyze data", "level": "basic"}))
            .await;
        assert!(result.is_error);
        assert!(text_of(&result).contains("disabled"));
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let handler = handler();

        let result = handler.call_tool("get_quality_metrics", json!({})).await;
        assert!(result.is_error);
        assert!(text_of(&result).starts_with("Error: Invalid tool arguments"));

        let result = handler
            .call_tool("optimize_prompt", json!({"text": "x", "focus": "speed"}))
            .await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = handler().call_tool("rewrite_everything", json!({})).await;
        assert!(result.is_error);
        assert_eq!(text_of(&result), "Error: Unknown tool: rewrite_everything");
    }
}
