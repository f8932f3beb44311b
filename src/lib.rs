//! PromptAssist Library
//!
//! Prompt quality analysis and optimization. Rule-based checks flag vague
//! wording, missing role or format instructions, length problems and
//! ambiguous references; an optional language model adds deeper analysis and
//! rewrites prompts. Served over HTTP, WebSocket and the Model Context
//! Protocol.

pub mod analysis;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod mcp;
pub mod metrics;
pub mod models;
pub mod service;
pub mod telemetry;

pub use config::Config;
pub use error::{PromptAssistError, Result};
pub use service::PromptService;
