//! Language model integration
//!
//! Client abstraction plus the prompts used for analysis and optimization.

pub mod client;
pub mod optimizer;

pub use client::{LanguageModel, OpenAiClient};
pub use optimizer::{LlmOptimizer, Optimization};
