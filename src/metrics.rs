//! Prometheus metrics

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

use crate::error::Result;

/// Request and cache counters for the service
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub analysis_requests: IntCounter,
    pub optimization_requests: IntCounter,
    pub analysis_duration: Histogram,
    pub cache_hits: IntCounter,
    pub cache_misses: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let analysis_requests =
            IntCounter::new("prompt_analysis_requests_total", "Total analysis requests")?;
        let optimization_requests = IntCounter::new(
            "prompt_optimization_requests_total",
            "Total optimization requests",
        )?;
        let analysis_duration = Histogram::with_opts(HistogramOpts::new(
            "prompt_analysis_duration_seconds",
            "Analysis duration",
        ))?;
        let cache_hits = IntCounter::new("cache_hits_total", "Cache hits")?;
        let cache_misses = IntCounter::new("cache_misses_total", "Cache misses")?;

        registry.register(Box::new(analysis_requests.clone()))?;
        registry.register(Box::new(optimization_requests.clone()))?;
        registry.register(Box::new(analysis_duration.clone()))?;
        registry.register(Box::new(cache_hits.clone()))?;
        registry.register(Box::new(cache_misses.clone()))?;

        Ok(Self {
            registry,
            analysis_requests,
            optimization_requests,
            analysis_duration,
            cache_hits,
            cache_misses,
        })
    }

    /// Render all metrics in the text exposition format
    pub fn render(&self) -> Result<(String, String)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok((
            encoder.format_type().to_string(),
            String::from_utf8_lossy(&buffer).into_owned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.analysis_requests.inc();
        metrics.cache_hits.inc_by(2);

        let (content_type, body) = metrics.render().unwrap();
        assert!(content_type.starts_with("text/plain"));
        assert!(body.contains("prompt_analysis_requests_total 1"));
        assert!(body.contains("cache_hits_total 2"));
        assert!(body.contains("prompt_analysis_duration_seconds_bucket"));
    }

    #[test]
    fn test_registries_are_independent() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.cache_misses.inc();
        assert_eq!(second.cache_misses.get(), 0);
    }
}
