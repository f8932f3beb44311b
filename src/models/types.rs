//! Request and response payloads
//!
//! These are the wire types shared by the HTTP API, the live-analysis
//! socket and the MCP tools.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::enums::{Impact, IssueType, OptimizationFocus, OptimizationLevel, Severity};

/// A single issue found in a prompt
///
/// `start` and `end` are character offsets into the analysed text and
/// `end >= start` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
pub struct PromptIssue {
    /// Unique identifier for the issue
    pub id: String,

    /// Start position in text
    pub start: usize,

    /// End position in text
    pub end: usize,

    /// Type of issue
    #[serde(rename = "type")]
    pub kind: IssueType,

    pub severity: Severity,

    /// Human-readable message
    #[validate(length(min = 1, max = 500))]
    pub message: String,

    /// Suggested fix
    #[validate(length(min = 1, max = 1000))]
    pub suggestion: String,

    /// Expected impact of the fix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
}

/// Request model for prompt analysis
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct AnalysisRequest {
    /// The prompt text to analyze
    #[validate(custom = "not_blank")]
    pub text: String,

    /// Whether to use the LLM for deeper analysis
    #[serde(default)]
    pub use_llm: bool,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>, use_llm: bool) -> Self {
        Self {
            text: text.into(),
            use_llm,
        }
    }

    /// Validate and return the trimmed prompt text
    pub fn normalized_text(&self) -> Result<&str, validator::ValidationErrors> {
        self.validate()?;
        Ok(self.text.trim())
    }
}

/// Result of prompt analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    #[serde(default)]
    pub issues: Vec<PromptIssue>,

    /// Overall quality score (0-100)
    pub quality_score: u8,

    /// Estimated token count
    pub token_count: usize,

    /// Potential quality improvement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_improvement: Option<u8>,

    pub analyzed_at: DateTime<Utc>,
}

/// A single improvement made during optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
pub struct Improvement {
    /// Description of the change
    #[validate(length(min = 1, max = 500))]
    pub change: String,

    pub impact: Impact,
}

/// Request model for prompt optimization
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct OptimizationRequest {
    /// The prompt text to optimize
    #[validate(custom = "not_blank")]
    pub text: String,

    #[serde(default)]
    pub focus: OptimizationFocus,

    #[serde(default)]
    pub level: OptimizationLevel,
}

impl OptimizationRequest {
    pub fn new(text: impl Into<String>, focus: OptimizationFocus, level: OptimizationLevel) -> Self {
        Self {
            text: text.into(),
            focus,
            level,
        }
    }

    /// Validate and return the trimmed prompt text
    pub fn normalized_text(&self) -> Result<&str, validator::ValidationErrors> {
        self.validate()?;
        Ok(self.text.trim())
    }
}

/// Result of prompt optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OptimizationResult {
    pub optimized_prompt: String,

    #[serde(default)]
    pub improvements: Vec<Improvement>,

    /// Token difference (negative means more tokens)
    pub token_savings: i64,

    /// Quality score improvement
    pub quality_improvement: i32,

    pub before_score: u8,
    pub after_score: u8,

    pub optimized_at: DateTime<Utc>,
}

/// Detailed quality statistics for a prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QualityMetrics {
    pub overall_quality: u8,
    pub word_count: usize,
    pub character_count: usize,
    pub token_count: usize,

    /// Estimated input cost in USD
    pub estimated_cost: f64,

    pub issue_count: usize,
    pub severity_breakdown: BTreeMap<String, usize>,
    pub type_breakdown: BTreeMap<String, usize>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    /// Service status, `healthy` or `degraded`
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub redis_connected: bool,
}

fn not_blank(text: &str) -> Result<(), validator::ValidationError> {
    if text.trim().is_empty() {
        let mut error = validator::ValidationError::new("blank");
        error.message = Some("text cannot be empty or whitespace only".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_serializes_type_field() {
        let issue = PromptIssue {
            id: "issue-abc12345".to_string(),
            start: 0,
            end: 7,
            kind: IssueType::Vague,
            severity: Severity::Critical,
            message: "The instruction is too vague".to_string(),
            suggestion: "analyze specifically focusing on".to_string(),
            impact: Some(Impact::High),
        };

        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["type"], "vague");
        assert_eq!(value["severity"], "critical");
        assert_eq!(value["impact"], "high");
        assert!(issue.validate().is_ok());
    }

    #[test]
    fn test_issue_message_bounds() {
        let issue = PromptIssue {
            id: "issue-1".to_string(),
            start: 0,
            end: 0,
            kind: IssueType::Ambiguous,
            severity: Severity::Low,
            message: String::new(),
            suggestion: "x".repeat(1001),
            impact: None,
        };
        assert!(issue.validate().is_err());
    }

    #[test]
    fn test_analysis_request_defaults_and_trim() {
        let request: AnalysisRequest = serde_json::from_str(r#"{"text": "  analyze data  "}"#).unwrap();
        assert!(!request.use_llm);
        assert_eq!(request.normalized_text().unwrap(), "analyze data");
    }

    #[test]
    fn test_blank_text_rejected() {
        let request = AnalysisRequest::new("   \n\t", false);
        assert!(request.normalized_text().is_err());

        let request = OptimizationRequest::new("", OptimizationFocus::All, OptimizationLevel::Basic);
        assert!(request.normalized_text().is_err());
    }

    #[test]
    fn test_optimization_request_defaults() {
        let request: OptimizationRequest = serde_json::from_str(r#"{"text": "analyze data"}"#).unwrap();
        assert_eq!(request.focus, OptimizationFocus::All);
        assert_eq!(request.level, OptimizationLevel::Balanced);
    }
}
