//! Configuration management for PromptAssist
//!
//! Settings come from environment variables (optionally seeded from a local
//! `.env` file) layered over built-in defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

/// Cache backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    Redis,
    Memory,
}

/// Configuration for PromptAssist
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API binds to
    pub api_host: String,

    /// Port the HTTP API listens on
    pub api_port: u16,

    /// Deployment environment name
    pub api_env: String,

    /// Expose error details in HTTP responses
    pub debug: bool,

    /// Allowed CORS origins
    pub cors_origins: Vec<String>,

    /// Redis connection URL
    pub redis_url: String,

    /// API key for the language model service
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    pub openai_base_url: String,

    /// Model used for analysis and optimization
    pub openai_model: String,

    pub openai_max_tokens: u32,
    pub openai_temperature: f32,

    /// Default cache entry lifetime
    pub cache_ttl: Duration,
    pub cache_enabled: bool,
    pub cache_backend: CacheBackendKind,

    pub log_level: String,
    pub log_format: LogFormat,

    /// Optional log file; `None` disables file logging
    pub log_file: Option<PathBuf>,

    /// Prompt length limits, in characters
    pub max_prompt_length: usize,
    pub min_prompt_length: usize,

    /// Whether LLM-backed analysis and optimization are allowed
    pub enable_llm_analysis: bool,

    /// Timeout for outbound language model requests
    pub request_timeout: Duration,
}

impl Config {
    /// Create a configuration from the environment, loading `.env` first
    pub fn new() -> Result<Self> {
        // Don't fail if .env doesn't exist
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_file = match lookup("LOG_FILE") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path)),
            None => defaults.log_file,
        };

        let openai_api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .or(defaults.openai_api_key);

        Ok(Self {
            api_host: lookup("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_var(&lookup, "API_PORT", defaults.api_port)?,
            api_env: lookup("API_ENV").unwrap_or(defaults.api_env),
            debug: parse_bool(&lookup, "DEBUG", defaults.debug)?,
            cors_origins: lookup("CORS_ORIGINS")
                .map(|origins| split_origins(&origins))
                .unwrap_or(defaults.cors_origins),
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            openai_api_key,
            openai_base_url: lookup("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_model: lookup("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_max_tokens: parse_var(&lookup, "OPENAI_MAX_TOKENS", defaults.openai_max_tokens)?,
            openai_temperature: parse_var(
                &lookup,
                "OPENAI_TEMPERATURE",
                defaults.openai_temperature,
            )?,
            cache_ttl: Duration::from_secs(parse_var(
                &lookup,
                "CACHE_TTL",
                defaults.cache_ttl.as_secs(),
            )?),
            cache_enabled: parse_bool(&lookup, "CACHE_ENABLED", defaults.cache_enabled)?,
            cache_backend: match lookup("CACHE_BACKEND") {
                Some(value) => parse_backend(&value)?,
                None => defaults.cache_backend,
            },
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: match lookup("LOG_FORMAT") {
                Some(value) => parse_log_format(&value)?,
                None => defaults.log_format,
            },
            log_file,
            max_prompt_length: parse_var(&lookup, "MAX_PROMPT_LENGTH", defaults.max_prompt_length)?,
            min_prompt_length: parse_var(&lookup, "MIN_PROMPT_LENGTH", defaults.min_prompt_length)?,
            enable_llm_analysis: parse_bool(
                &lookup,
                "ENABLE_LLM_ANALYSIS",
                defaults.enable_llm_analysis,
            )?,
            request_timeout: Duration::from_secs(parse_var(
                &lookup,
                "REQUEST_TIMEOUT",
                defaults.request_timeout.as_secs(),
            )?),
        })
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Whether a language model can be reached at all
    pub fn llm_configured(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            api_env: "development".to_string(),
            debug: true,
            cors_origins: split_origins(defaults::CORS_ORIGINS),
            redis_url: "redis://localhost:6379/0".to_string(),
            openai_api_key: None,
            openai_base_url: defaults::OPENAI_BASE_URL.to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            openai_max_tokens: 1000,
            openai_temperature: 0.3,
            cache_ttl: Duration::from_secs(3600),
            cache_enabled: true,
            cache_backend: CacheBackendKind::Redis,
            log_level: "INFO".to_string(),
            log_format: LogFormat::Json,
            log_file: Some(PathBuf::from("logs/app.log")),
            max_prompt_length: 5000,
            min_prompt_length: 5,
            enable_llm_analysis: true,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Default values that are awkward to inline
pub mod defaults {
    pub const CORS_ORIGINS: &str = "http://localhost:5174,http://127.0.0.1:5174";
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

    /// Lifetime of cached optimization results
    pub const OPTIMIZATION_TTL_SECS: u64 = 7200;
}

fn split_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

fn parse_var<F, T>(lookup: &F, var: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|_| {
            ConfigError::InvalidValue {
                var: var.to_string(),
                value,
            }
            .into()
        }),
        None => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, var: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                var: var.to_string(),
                value,
            }
            .into()),
        },
        None => Ok(default),
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat> {
    match value.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(LogFormat::Json),
        "text" | "plain" => Ok(LogFormat::Text),
        _ => Err(ConfigError::InvalidValue {
            var: "LOG_FORMAT".to_string(),
            value: value.to_string(),
        }
        .into()),
    }
}

fn parse_backend(value: &str) -> Result<CacheBackendKind> {
    match value.trim().to_ascii_lowercase().as_str() {
        "redis" => Ok(CacheBackendKind::Redis),
        "memory" => Ok(CacheBackendKind::Memory),
        _ => Err(ConfigError::InvalidValue {
            var: "CACHE_BACKEND".to_string(),
            value: value.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.max_prompt_length, 5000);
        assert!(!config.llm_configured());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("API_PORT", "9000"),
            ("CACHE_ENABLED", "false"),
            ("CORS_ORIGINS", "http://a.test, http://b.test ,"),
            ("LOG_FILE", ""),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();

        assert_eq!(config.api_port, 9000);
        assert!(!config.cache_enabled);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert!(config.log_file.is_none());
        assert!(config.llm_configured());
    }

    #[test]
    fn test_invalid_value() {
        let result = Config::from_lookup(lookup_from(&[("API_PORT", "eighty")]));
        assert!(result.is_err());

        let result = Config::from_lookup(lookup_from(&[("CACHE_BACKEND", "memcached")]));
        assert!(result.is_err());
    }
}
