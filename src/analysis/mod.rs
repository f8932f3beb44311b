//! Prompt analysis
//!
//! Pattern rules, the rule-based and hybrid analyzers, and token counting.

pub mod hybrid;
pub mod patterns;
pub mod rules;
pub mod tokens;

pub use hybrid::HybridAnalyzer;
pub use rules::RuleBasedAnalyzer;
pub use tokens::TokenCounter;
