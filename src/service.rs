//! Prompt service
//!
//! The analysis and optimization workflow shared by the HTTP API, the live
//! socket and the MCP tools.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::json;

use crate::analysis::{patterns, HybridAnalyzer, TokenCounter};
use crate::cache::CacheManager;
use crate::config::{defaults, Config};
use crate::error::{LlmError, PromptAssistError, Result, ValidationError};
use crate::llm::{LanguageModel, LlmOptimizer, OpenAiClient};
use crate::metrics::Metrics;
use crate::models::{
    AnalysisRequest, AnalysisResult, HealthResponse, OptimizationFocus, OptimizationLevel,
    OptimizationRequest, OptimizationResult, QualityMetrics, Severity,
};

/// Version reported by health checks and the MCP handshake
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prompt analysis and optimization service
pub struct PromptService {
    config: Config,
    analyzer: HybridAnalyzer,
    tokens: TokenCounter,
    cache: CacheManager,
    metrics: Metrics,
}

impl PromptService {
    /// Assemble a service from explicit parts
    pub fn new(
        config: Config,
        model: Option<Arc<dyn LanguageModel>>,
        cache: CacheManager,
        tokens: TokenCounter,
    ) -> Result<Self> {
        let analyzer = HybridAnalyzer::new(model.map(LlmOptimizer::new));
        tracing::info!("Hybrid analyzer initialized");

        Ok(Self {
            config,
            analyzer,
            tokens,
            cache,
            metrics: Metrics::new()?,
        })
    }

    /// Build the service from configuration, connecting the cache and model
    pub async fn from_config(config: Config) -> Result<Self> {
        let model = OpenAiClient::from_config(&config)?
            .map(|client| Arc::new(client) as Arc<dyn LanguageModel>);
        if model.is_none() {
            tracing::warn!("OPENAI_API_KEY not set; LLM analysis and optimization are unavailable");
        }

        let cache = CacheManager::connect(&config).await;
        Self::new(config, model, cache, TokenCounter::new())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Analyze a prompt with limits and caching applied
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        self.metrics.analysis_requests.inc();
        let started = Instant::now();

        let text = request.normalized_text()?;
        let length = text.chars().count();
        if length > self.config.max_prompt_length {
            return Err(ValidationError::PromptTooLong {
                max: self.config.max_prompt_length,
            }
            .into());
        }
        if length < self.config.min_prompt_length {
            return Err(ValidationError::PromptTooShort {
                min: self.config.min_prompt_length,
            }
            .into());
        }

        let params = BTreeMap::from([("use_llm", json!(request.use_llm))]);
        let cache_key = CacheManager::generate_key("analysis", text, &params);

        if let Some(cached) = self.cache.get::<AnalysisResult>(&cache_key).await {
            self.metrics.cache_hits.inc();
            tracing::info!("Returning cached analysis result");
            return Ok(cached);
        }
        self.metrics.cache_misses.inc();

        tracing::info!("Analyzing prompt (LLM: {})...", request.use_llm);
        let result = self.analyze_text(text, request.use_llm).await;

        self.cache.set(&cache_key, &result, None).await;

        let elapsed = started.elapsed();
        self.metrics.analysis_duration.observe(elapsed.as_secs_f64());
        tracing::info!(
            "Analysis complete: {} issues, quality={}, tokens={} ({:.3}s)",
            result.issues.len(),
            result.quality_score,
            result.token_count,
            elapsed.as_secs_f64()
        );

        Ok(result)
    }

    /// Analyze text directly, without limits or caching
    pub async fn analyze_text(&self, text: &str, use_llm: bool) -> AnalysisResult {
        let issues = self.analyzer.analyze(text, use_llm).await;
        let quality_score = self.analyzer.calculate_quality_score(text, &issues);

        AnalysisResult {
            issues,
            quality_score,
            token_count: self.tokens.count(text),
            estimated_improvement: Some(100 - quality_score),
            analyzed_at: Utc::now(),
        }
    }

    /// Optimize a prompt with limits and caching applied
    pub async fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationResult> {
        self.metrics.optimization_requests.inc();
        let started = Instant::now();

        let text = request.normalized_text()?;
        if text.chars().count() > self.config.max_prompt_length {
            return Err(ValidationError::PromptTooLong {
                max: self.config.max_prompt_length,
            }
            .into());
        }
        if !self.config.enable_llm_analysis {
            return Err(LlmError::Disabled.into());
        }

        let params = BTreeMap::from([
            ("focus", json!(request.focus.as_str())),
            ("level", json!(request.level.as_str())),
        ]);
        let cache_key = CacheManager::generate_key("optimization", text, &params);

        if let Some(cached) = self.cache.get::<OptimizationResult>(&cache_key).await {
            self.metrics.cache_hits.inc();
            tracing::info!("Returning cached optimization result");
            return Ok(cached);
        }
        self.metrics.cache_misses.inc();

        let result = self.optimize_text(text, request.focus, request.level).await?;

        self.cache
            .set(
                &cache_key,
                &result,
                Some(Duration::from_secs(defaults::OPTIMIZATION_TTL_SECS)),
            )
            .await;

        tracing::info!(
            "Optimization complete: {}->{} ({:.3}s)",
            result.before_score,
            result.after_score,
            started.elapsed().as_secs_f64()
        );
        Ok(result)
    }

    /// Optimize text directly, without limits or caching
    pub async fn optimize_text(
        &self,
        text: &str,
        focus: OptimizationFocus,
        level: OptimizationLevel,
    ) -> Result<OptimizationResult> {
        let llm = self
            .analyzer
            .llm()
            .ok_or(PromptAssistError::Llm(LlmError::Disabled))?;

        tracing::info!("Analyzing original prompt...");
        let before_issues = self.analyzer.analyze(text, false).await;
        let before_score = self.analyzer.calculate_quality_score(text, &before_issues);
        let before_tokens = self.tokens.count(text);

        tracing::info!(
            "Optimizing prompt (focus={}, level={})...",
            focus.as_str(),
            level.as_str()
        );
        let optimization = llm.optimize_prompt(text, focus, level).await;

        let optimized = optimization.optimized_prompt;
        let after_issues = self.analyzer.analyze(&optimized, false).await;
        let after_score = self.analyzer.calculate_quality_score(&optimized, &after_issues);
        let after_tokens = self.tokens.count(&optimized);

        tracing::info!("Tokens: {}->{}", before_tokens, after_tokens);

        Ok(OptimizationResult {
            optimized_prompt: optimized,
            improvements: optimization.improvements,
            token_savings: before_tokens as i64 - after_tokens as i64,
            quality_improvement: after_score as i32 - before_score as i32,
            before_score,
            after_score,
            optimized_at: Utc::now(),
        })
    }

    /// Detailed rule-based statistics for a prompt
    pub async fn quality_metrics(&self, text: &str) -> QualityMetrics {
        let issues = self.analyzer.analyze(text, false).await;
        let overall_quality = self.analyzer.calculate_quality_score(text, &issues);
        let token_count = self.tokens.count(text);

        let mut severity_breakdown: BTreeMap<String, usize> = [
            Severity::Critical,
            Severity::Medium,
            Severity::Low,
        ]
        .iter()
        .map(|severity| (severity.as_str().to_string(), 0))
        .collect();
        let mut type_breakdown: BTreeMap<String, usize> = BTreeMap::new();

        for issue in &issues {
            *severity_breakdown
                .entry(issue.severity.as_str().to_string())
                .or_default() += 1;
            *type_breakdown.entry(issue.kind.as_str().to_string()).or_default() += 1;
        }

        QualityMetrics {
            overall_quality,
            word_count: patterns::count_words(text),
            character_count: text.chars().count(),
            token_count,
            estimated_cost: self
                .tokens
                .estimate_cost(token_count, &self.config.openai_model),
            issue_count: issues.len(),
            severity_breakdown,
            type_breakdown,
        }
    }

    /// Clear cached results matching a glob pattern
    pub async fn clear_cache(&self, pattern: &str) -> usize {
        self.cache.clear_pattern(pattern).await
    }

    /// Service health; degraded when an enabled cache is unreachable
    pub async fn health(&self) -> HealthResponse {
        let redis_connected = self.cache.is_connected().await;
        let healthy = redis_connected || !self.config.cache_enabled;

        HealthResponse {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            version: VERSION.to_string(),
            timestamp: Utc::now(),
            redis_connected,
        }
    }
}
