//! Enumerations shared by analysis and optimization payloads

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind of problem found in a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Vague,
    MissingContext,
    Inefficient,
    Ambiguous,
    MissingRole,
    MissingFormat,
    TooShort,
    TooLong,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Vague => "vague",
            IssueType::MissingContext => "missing_context",
            IssueType::Inefficient => "inefficient",
            IssueType::Ambiguous => "ambiguous",
            IssueType::MissingRole => "missing_role",
            IssueType::MissingFormat => "missing_format",
            IssueType::TooShort => "too_short",
            IssueType::TooLong => "too_long",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Ordering weight, higher is more severe
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }

    /// Points deducted from the quality score
    pub fn penalty(&self) -> i32 {
        match self {
            Severity::Critical => 20,
            Severity::Medium => 10,
            Severity::Low => 5,
        }
    }
}

/// Expected impact of fixing an issue or applying an improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    High,
    Medium,
    Low,
}

/// Focus areas for optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationFocus {
    Clarity,
    Efficiency,
    Specificity,
    #[default]
    All,
}

impl OptimizationFocus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationFocus::Clarity => "clarity",
            OptimizationFocus::Efficiency => "efficiency",
            OptimizationFocus::Specificity => "specificity",
            OptimizationFocus::All => "all",
        }
    }

    /// Instruction line embedded in the optimization system prompt
    pub fn instruction(&self) -> &'static str {
        match self {
            OptimizationFocus::Clarity => {
                "Focus on making the prompt clearer and more understandable."
            }
            OptimizationFocus::Efficiency => {
                "Focus on reducing token usage while maintaining effectiveness."
            }
            OptimizationFocus::Specificity => "Focus on adding specific details and constraints.",
            OptimizationFocus::All => "Apply comprehensive improvements across all areas.",
        }
    }
}

/// Optimization intensity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationLevel {
    Basic,
    #[default]
    Balanced,
    Advanced,
}

impl OptimizationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationLevel::Basic => "basic",
            OptimizationLevel::Balanced => "balanced",
            OptimizationLevel::Advanced => "advanced",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            OptimizationLevel::Basic => "Make minimal, essential improvements only.",
            OptimizationLevel::Balanced => {
                "Balance between improvements and maintaining original intent."
            }
            OptimizationLevel::Advanced => {
                "Apply comprehensive optimizations and restructuring."
            }
        }
    }
}
