//! Hybrid analyzer
//!
//! Combines the rule-based checks with optional LLM analysis and merges
//! overlapping findings.

use std::collections::HashMap;

use crate::analysis::rules::RuleBasedAnalyzer;
use crate::llm::LlmOptimizer;
use crate::models::PromptIssue;

/// Width of the position buckets used for deduplication
const POSITION_BUCKET: usize = 5;

/// Rule-based analysis with optional LLM enrichment
pub struct HybridAnalyzer {
    rules: RuleBasedAnalyzer,
    llm: Option<LlmOptimizer>,
}

impl HybridAnalyzer {
    pub fn new(llm: Option<LlmOptimizer>) -> Self {
        Self {
            rules: RuleBasedAnalyzer::new(),
            llm,
        }
    }

    /// The LLM optimizer, when one is configured
    pub fn llm(&self) -> Option<&LlmOptimizer> {
        self.llm.as_ref()
    }

    /// Analyze a prompt, adding LLM findings when requested and available
    pub async fn analyze(&self, text: &str, use_llm: bool) -> Vec<PromptIssue> {
        let rule_issues = self.rules.analyze(text);
        tracing::info!("Rule-based analysis found {} issues", rule_issues.len());

        if !use_llm {
            return rule_issues;
        }

        let llm = match &self.llm {
            Some(llm) => llm,
            None => {
                tracing::warn!("LLM analysis requested but no model is configured");
                return rule_issues;
            }
        };

        let llm_issues = llm.analyze_with_llm(text).await;
        tracing::info!("LLM analysis found {} issues", llm_issues.len());

        let mut all_issues = rule_issues;
        all_issues.extend(llm_issues);
        let deduplicated = deduplicate_issues(all_issues);

        tracing::info!(
            "Total unique issues after deduplication: {}",
            deduplicated.len()
        );
        deduplicated
    }

    /// Calculate the quality score (0-100)
    pub fn calculate_quality_score(&self, text: &str, issues: &[PromptIssue]) -> u8 {
        self.rules.calculate_quality_score(text, issues)
    }
}

/// Keep one issue per position bucket
///
/// Issues are grouped by start/end rounded down to a multiple of five. The
/// most severe issue of each group survives; on a tie LLM issues win. The
/// output is ordered by start position, buckets keeping first-seen order.
pub fn deduplicate_issues(issues: Vec<PromptIssue>) -> Vec<PromptIssue> {
    let mut index: HashMap<(usize, usize), usize> = HashMap::new();
    let mut groups: Vec<Vec<PromptIssue>> = Vec::new();

    for issue in issues {
        let key = (
            issue.start / POSITION_BUCKET * POSITION_BUCKET,
            issue.end / POSITION_BUCKET * POSITION_BUCKET,
        );
        match index.get(&key) {
            Some(&slot) => groups[slot].push(issue),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![issue]);
            }
        }
    }

    let mut deduplicated: Vec<PromptIssue> = groups
        .into_iter()
        .filter_map(|group| {
            // `max_by_key` returns the last maximum; reverse so the first wins ties.
            group
                .into_iter()
                .rev()
                .max_by_key(|issue| (issue.severity.rank(), issue.id.starts_with("llm-")))
        })
        .collect();

    deduplicated.sort_by_key(|issue| issue.start);
    deduplicated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Impact, IssueType, Severity};

    fn issue(id: &str, start: usize, end: usize, severity: Severity) -> PromptIssue {
        PromptIssue {
            id: id.to_string(),
            start,
            end,
            kind: IssueType::Vague,
            severity,
            message: "message".to_string(),
            suggestion: "suggestion".to_string(),
            impact: Some(Impact::Low),
        }
    }

    #[test]
    fn test_keeps_most_severe() {
        let result = deduplicate_issues(vec![
            issue("issue-a", 0, 7, Severity::Medium),
            issue("issue-b", 1, 8, Severity::Critical),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "issue-b");
    }

    #[test]
    fn test_prefers_llm_on_tie() {
        let result = deduplicate_issues(vec![
            issue("issue-a", 10, 14, Severity::Low),
            issue("llm-b", 12, 13, Severity::Low),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "llm-b");
    }

    #[test]
    fn test_first_wins_full_tie() {
        let result = deduplicate_issues(vec![
            issue("issue-a", 0, 0, Severity::Medium),
            issue("issue-b", 0, 0, Severity::Medium),
        ]);
        assert_eq!(result[0].id, "issue-a");
    }

    #[test]
    fn test_sorted_by_start() {
        let result = deduplicate_issues(vec![
            issue("issue-a", 20, 25, Severity::Low),
            issue("issue-b", 0, 3, Severity::Low),
            issue("issue-c", 0, 12, Severity::Low),
        ]);
        let ids: Vec<&str> = result.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["issue-b", "issue-c", "issue-a"]);
    }

    #[tokio::test]
    async fn test_without_llm_returns_rule_issues() {
        let analyzer = HybridAnalyzer::new(None);
        let issues = analyzer.analyze("analyze data", true).await;
        assert!(issues.iter().any(|i| i.kind == IssueType::Vague));
        assert_eq!(issues.len(), 3);
    }
}
