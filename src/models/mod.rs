//! Data model
//!
//! Enumerations and payload types used across the service.

pub mod enums;
pub mod types;

pub use enums::{Impact, IssueType, OptimizationFocus, OptimizationLevel, Severity};
pub use types::{
    AnalysisRequest, AnalysisResult, HealthResponse, Improvement, OptimizationRequest,
    OptimizationResult, PromptIssue, QualityMetrics,
};
