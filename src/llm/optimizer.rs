//! LLM-powered prompt analysis and optimization
//!
//! Both operations degrade gracefully: a failed or malformed model reply is
//! logged and replaced by an empty issue list or the unchanged prompt.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::analysis::rules::issue_id;
use crate::error::{LlmError, PromptAssistError, Result};
use crate::models::{
    Impact, Improvement, IssueType, OptimizationFocus, OptimizationLevel, PromptIssue, Severity,
};
use crate::llm::client::LanguageModel;

const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are an expert prompt engineer specializing in AI prompt optimization.

Analyze the given prompt and identify specific issues that could be improved.

Return a JSON object with this exact structure:
{
  "issues": [
    {
      "type": "vague" | "missing_context" | "inefficient" | "ambiguous" | "missing_role" | "missing_format",
      "severity": "critical" | "medium" | "low",
      "message": "Brief explanation of the issue (max 100 chars)",
      "suggestion": "Specific text to replace or add",
      "start": character_position_start,
      "end": character_position_end,
      "impact": "high" | "medium" | "low"
    }
  ]
}

Focus on:
1. Vague or unclear instructions
2. Missing role definitions or context
3. Unclear output format requirements
4. Ambiguous language or references
5. Inefficient token usage
6. Missing specificity in requirements

Be specific and actionable in your suggestions."#;

const OPTIMIZATION_GUIDELINES: &str = r#"Return a JSON object with this exact structure:
{
  "optimized_prompt": "The fully optimized prompt text",
  "improvements": [
    {
      "change": "Description of what was changed/added",
      "impact": "high" | "medium" | "low"
    }
  ]
}

Optimization guidelines:
1. Add clear role definition if missing
2. Structure requirements with numbered points
3. Specify expected output format
4. Add relevant constraints and context
5. Remove ambiguity and vague language
6. Optimize token usage
7. Ensure actionable and specific instructions

Maintain the original intent while maximizing clarity and effectiveness."#;

/// An issue as reported by the model
#[derive(Debug, Deserialize)]
struct ModelIssue {
    #[serde(rename = "type")]
    kind: IssueType,
    severity: Severity,
    message: String,
    suggestion: String,
    #[serde(default)]
    start: Option<i64>,
    #[serde(default)]
    end: Option<i64>,
    #[serde(default)]
    impact: Option<Impact>,
}

/// A rewritten prompt and the changes made
#[derive(Debug, Clone, PartialEq)]
pub struct Optimization {
    pub optimized_prompt: String,
    pub improvements: Vec<Improvement>,
}

/// LLM-powered prompt analyzer and optimizer
pub struct LlmOptimizer {
    model: Arc<dyn LanguageModel>,
}

impl LlmOptimizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        tracing::info!("LLM optimizer initialized with model: {}", model.model());
        Self { model }
    }

    /// Ask the model for issues; failures yield an empty list
    pub async fn analyze_with_llm(&self, text: &str) -> Vec<PromptIssue> {
        let user = format!("Analyze this prompt:\n\n{}", text);

        match self.request_issues(text, &user).await {
            Ok(issues) => {
                tracing::info!("LLM found {} issues", issues.len());
                issues
            }
            Err(e) => {
                tracing::error!("LLM analysis failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn request_issues(&self, text: &str, user: &str) -> Result<Vec<PromptIssue>> {
        let content = self.model.complete(ANALYSIS_SYSTEM_PROMPT, user).await?;
        tracing::debug!("LLM response: {}", content);

        let parsed = parse_json_object(&content)?;
        let entries = match parsed.get("issues") {
            Some(Value::Array(entries)) => entries.clone(),
            _ => Vec::new(),
        };

        let text_len = text.chars().count();
        let issues = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value::<ModelIssue>(entry) {
                Ok(raw) => to_prompt_issue(raw, index, text_len),
                Err(e) => {
                    tracing::warn!("Failed to parse issue: {}", e);
                    None
                }
            })
            .collect();

        Ok(issues)
    }

    /// Generate an optimized version of the prompt
    ///
    /// On any failure the original text is returned with no improvements.
    pub async fn optimize_prompt(
        &self,
        text: &str,
        focus: OptimizationFocus,
        level: OptimizationLevel,
    ) -> Optimization {
        match self.request_optimization(text, focus, level).await {
            Ok(optimization) => {
                tracing::info!("Prompt optimized successfully");
                optimization
            }
            Err(e) => {
                tracing::error!("Optimization failed: {}", e);
                Optimization {
                    optimized_prompt: text.to_string(),
                    improvements: Vec::new(),
                }
            }
        }
    }

    async fn request_optimization(
        &self,
        text: &str,
        focus: OptimizationFocus,
        level: OptimizationLevel,
    ) -> Result<Optimization> {
        let system = optimization_system_prompt(focus, level);
        let user = format!("Original prompt:\n\n{}", text);
        let content = self.model.complete(&system, &user).await?;

        let parsed = parse_json_object(&content)?;

        let optimized_prompt = parsed
            .get("optimized_prompt")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|prompt| !prompt.is_empty())
            .unwrap_or(text)
            .to_string();

        let improvements = match parsed.get("improvements") {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| serde_json::from_value::<Improvement>(entry.clone()).ok())
                .filter(|improvement| improvement.validate().is_ok())
                .collect(),
            _ => Vec::new(),
        };

        Ok(Optimization {
            optimized_prompt,
            improvements,
        })
    }
}

fn optimization_system_prompt(focus: OptimizationFocus, level: OptimizationLevel) -> String {
    format!(
        "You are an expert prompt engineer. Your task is to optimize prompts for better AI responses.\n\n{}\n{}\n\n{}",
        focus.instruction(),
        level.instruction(),
        OPTIMIZATION_GUIDELINES
    )
}

/// Extract the outermost JSON object, tolerating code fences and chatter
fn parse_json_object(content: &str) -> Result<Value> {
    let start = content.find('{');
    let end = content.rfind('}');

    let slice = match (start, end) {
        (Some(start), Some(end)) if end > start => &content[start..=end],
        _ => {
            return Err(PromptAssistError::Llm(LlmError::MalformedResponse {
                message: "no JSON object in response".to_string(),
            }))
        }
    };

    serde_json::from_str(slice).map_err(|e| {
        PromptAssistError::Llm(LlmError::MalformedResponse {
            message: e.to_string(),
        })
    })
}

/// Clamp model offsets into the text and validate text fields
fn to_prompt_issue(raw: ModelIssue, index: usize, text_len: usize) -> Option<PromptIssue> {
    let clamp = |value: i64| value.clamp(0, text_len as i64) as usize;
    let start = raw.start.map(clamp).unwrap_or(0);
    let end = raw.end.map(clamp).unwrap_or(text_len).max(start);

    let issue = PromptIssue {
        id: issue_id("llm", raw.kind, start, end, &format!("{}:{}", index, raw.message)),
        start,
        end,
        kind: raw.kind,
        severity: raw.severity,
        message: raw.message,
        suggestion: raw.suggestion,
        impact: Some(raw.impact.unwrap_or(Impact::Medium)),
    };

    match issue.validate() {
        Ok(()) => Some(issue),
        Err(e) => {
            tracing::warn!("Discarding invalid LLM issue: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedModel {
        reply: Option<String>,
    }

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            self.reply
                .clone()
                .ok_or(PromptAssistError::Llm(LlmError::EmptyCompletion))
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    fn optimizer(reply: Option<&str>) -> LlmOptimizer {
        LlmOptimizer::new(Arc::new(FixedModel {
            reply: reply.map(str::to_string),
        }))
    }

    #[tokio::test]
    async fn test_analyze_parses_and_clamps() {
        let reply = r#"```json
{"issues": [
  {"type": "vague", "severity": "critical", "message": "Too vague", "suggestion": "Be precise", "start": 0, "end": 400, "impact": "high"},
  {"type": "nonsense", "severity": "low", "message": "x", "suggestion": "y"},
  {"type": "ambiguous", "severity": "low", "message": "Unclear target", "suggestion": "Name it"}
]}
```"#;
        let issues = optimizer(Some(reply)).analyze_with_llm("analyze data").await;

        assert_eq!(issues.len(), 2);
        assert_eq!((issues[0].start, issues[0].end), (0, 12));
        assert!(issues[0].id.starts_with("llm-"));
        assert_eq!(issues[1].impact, Some(Impact::Medium));
        assert_eq!((issues[1].start, issues[1].end), (0, 12));
    }

    #[tokio::test]
    async fn test_analyze_failure_is_empty() {
        assert!(optimizer(None).analyze_with_llm("analyze data").await.is_empty());
        assert!(optimizer(Some("not json at all"))
            .analyze_with_llm("analyze data")
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_optimize_parses_reply() {
        let reply = r#"{"optimized_prompt": "You are a data analyst. Analyze the data.", "improvements": [{"change": "Added role", "impact": "high"}, {"change": "", "impact": "low"}, {"oops": true}]}"#;
        let result = optimizer(Some(reply))
            .optimize_prompt("analyze data", OptimizationFocus::All, OptimizationLevel::Balanced)
            .await;

        assert_eq!(result.optimized_prompt, "You are a data analyst. Analyze the data.");
        assert_eq!(result.improvements.len(), 1);
        assert_eq!(result.improvements[0].impact, Impact::High);
    }

    #[tokio::test]
    async fn test_optimize_failure_keeps_original() {
        let result = optimizer(None)
            .optimize_prompt("analyze data", OptimizationFocus::Clarity, OptimizationLevel::Basic)
            .await;
        assert_eq!(result.optimized_prompt, "analyze data");
        assert!(result.improvements.is_empty());
    }

    #[test]
    fn test_system_prompt_includes_instructions() {
        let prompt = optimization_system_prompt(OptimizationFocus::Efficiency, OptimizationLevel::Advanced);
        assert!(prompt.contains("reducing token usage"));
        assert!(prompt.contains("restructuring"));
        assert!(prompt.contains("\"optimized_prompt\""));
    }
}
