//! Rule-based prompt analyzer
//!
//! Fast, deterministic checks built on pattern matching and a light
//! word-boundary tokenizer.

use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::patterns::{
    self, char_offset, FORMAT_PATTERNS, OUTPUT_PATTERNS, ROLE_PATTERNS, VAGUE_PATTERNS,
};
use crate::models::{Impact, IssueType, PromptIssue, Severity};

/// Words that make a vague verb acceptable when they follow it closely
const SPECIFICITY_MARKERS: &[&str] = &[
    "specifically",
    "focusing",
    "particularly",
    "especially",
    "by analyzing",
    "with emphasis",
];

const AMBIGUOUS_PRONOUNS: &[&str] = &["it", "this", "that", "they", "them"];

/// Words after `this`/`that` that indicate pronoun (not determiner) usage
const PRONOUN_FOLLOWERS: &[&str] = &[
    "is", "was", "are", "were", "will", "would", "should", "can", "could", "may", "might",
    "must", "has", "had", "does", "did", "means", "seems", "looks", "'s", "'ll", "'d",
];

/// How far past a vague verb to look for specificity markers
const CONTEXT_WINDOW: usize = 50;

const SHORT_PROMPT_WORDS: usize = 5;
const LONG_PROMPT_WORDS: usize = 500;
const FORMAT_CHECK_WORDS: usize = 10;
const STRUCTURE_CHECK_WORDS: usize = 15;
const LENGTH_BONUS_WORDS: usize = 20;

/// Rule-based prompt analyzer
#[derive(Debug, Default, Clone)]
pub struct RuleBasedAnalyzer;

impl RuleBasedAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze prompt and return the issues found
    pub fn analyze(&self, text: &str) -> Vec<PromptIssue> {
        let mut issues = Vec::new();

        issues.extend(self.check_vague_instructions(text));
        issues.extend(self.check_role_definition(text));
        issues.extend(self.check_output_format(text));
        issues.extend(self.check_length(text));
        issues.extend(self.check_specificity(text));
        issues.extend(self.check_ambiguous_pronouns(text));

        tracing::debug!("Found {} issues in prompt", issues.len());
        issues
    }

    fn check_vague_instructions(&self, text: &str) -> Vec<PromptIssue> {
        patterns::find_matches(text, &VAGUE_PATTERNS)
            .into_iter()
            .filter(|m| {
                let context_after: String = text[m.end..]
                    .chars()
                    .take(CONTEXT_WINDOW)
                    .collect::<String>()
                    .to_lowercase();
                !SPECIFICITY_MARKERS
                    .iter()
                    .any(|marker| context_after.contains(marker))
            })
            .map(|m| {
                make_issue(
                    text,
                    IssueType::Vague,
                    Severity::Medium,
                    char_offset(text, m.start),
                    char_offset(text, m.end),
                    format!(
                        "The instruction '{}' is vague. Add specific details about what to {}.",
                        m.text,
                        m.text.to_lowercase()
                    ),
                    format!("{} specifically focusing on", m.text),
                    Impact::High,
                )
            })
            .collect()
    }

    fn check_role_definition(&self, text: &str) -> Option<PromptIssue> {
        if patterns::contains_pattern(text, &ROLE_PATTERNS) {
            return None;
        }

        Some(make_issue(
            text,
            IssueType::MissingRole,
            Severity::Medium,
            0,
            0,
            "Missing role definition. Adding a role helps the AI understand the expected expertise level."
                .to_string(),
            format!("You are an expert analyst. {}", text),
            Impact::Medium,
        ))
    }

    fn check_output_format(&self, text: &str) -> Option<PromptIssue> {
        let has_format = patterns::contains_pattern(text, &FORMAT_PATTERNS)
            || patterns::contains_pattern(text, &OUTPUT_PATTERNS);

        if has_format || patterns::count_words(text) <= FORMAT_CHECK_WORDS {
            return None;
        }

        let end = text.chars().count();
        Some(make_issue(
            text,
            IssueType::MissingFormat,
            Severity::Low,
            end,
            end,
            "No output format specified. Defining the format helps ensure consistent results."
                .to_string(),
            format!("{} Format the response as bullet points.", text),
            Impact::Medium,
        ))
    }

    fn check_length(&self, text: &str) -> Option<PromptIssue> {
        let word_count = patterns::count_words(text);
        let end = text.chars().count();

        if word_count < SHORT_PROMPT_WORDS {
            Some(make_issue(
                text,
                IssueType::TooShort,
                Severity::Critical,
                0,
                end,
                format!(
                    "Prompt is too short ({} words). Add more specific instructions and context.",
                    word_count
                ),
                format!(
                    "{} Please provide detailed analysis including key metrics, trends, and actionable insights.",
                    text
                ),
                Impact::High,
            ))
        } else if word_count > LONG_PROMPT_WORDS {
            Some(make_issue(
                text,
                IssueType::TooLong,
                Severity::Low,
                0,
                end,
                format!(
                    "Prompt is very long ({} words). Consider breaking it into smaller, focused prompts.",
                    word_count
                ),
                "Consider splitting this into multiple focused prompts for better results."
                    .to_string(),
                Impact::Low,
            ))
        } else {
            None
        }
    }

    fn check_specificity(&self, text: &str) -> Option<PromptIssue> {
        if patterns::count_words(text) <= STRUCTURE_CHECK_WORDS
            || patterns::has_specific_instructions(text)
        {
            return None;
        }

        Some(make_issue(
            text,
            IssueType::Inefficient,
            Severity::Low,
            0,
            text.chars().count(),
            "Consider structuring your requirements with numbered points for clarity.".to_string(),
            "Structure your prompt with numbered requirements:\n1. First requirement\n2. Second requirement\n3. Third requirement"
                .to_string(),
            Impact::Medium,
        ))
    }

    /// Flag pronouns in the first two tokens, where no antecedent can exist
    fn check_ambiguous_pronouns(&self, text: &str) -> Vec<PromptIssue> {
        let tokens: Vec<(usize, &str)> = text
            .split_word_bound_indices()
            .filter(|(_, token)| !token.trim().is_empty())
            .flat_map(|(start, token)| split_contraction(start, token))
            .collect();

        let mut issues = Vec::new();
        for (i, (start, token)) in tokens.iter().enumerate().take(2) {
            let lower = token.to_lowercase();
            if !AMBIGUOUS_PRONOUNS.contains(&lower.as_str()) {
                continue;
            }

            let next = tokens.get(i + 1).map(|(_, t)| *t);
            if !is_pronoun_use(&lower, next) {
                continue;
            }

            let char_start = char_offset(text, *start);
            issues.push(make_issue(
                text,
                IssueType::Ambiguous,
                Severity::Low,
                char_start,
                char_start + token.chars().count(),
                format!(
                    "The pronoun '{}' may be ambiguous. Consider being more explicit.",
                    token
                ),
                "[specify what you're referring to]".to_string(),
                Impact::Low,
            ));
        }
        issues
    }

    /// Calculate overall quality score (0-100)
    pub fn calculate_quality_score(&self, text: &str, issues: &[PromptIssue]) -> u8 {
        let mut score: i32 = 100;

        for issue in issues {
            score -= issue.severity.penalty();
        }

        if patterns::count_words(text) >= LENGTH_BONUS_WORDS {
            score = (score + 5).min(100);
        }
        if patterns::has_specific_instructions(text) {
            score = (score + 5).min(100);
        }
        if patterns::contains_pattern(text, &ROLE_PATTERNS) {
            score = (score + 5).min(100);
        }

        score.clamp(0, 100) as u8
    }
}

/// Split a clitic such as `'s` or `'ll` off its host word: `It's` becomes
/// `It` + `'s`.
fn split_contraction(start: usize, token: &str) -> Vec<(usize, &str)> {
    match token.find(|c: char| c == '\'' || c == '\u{2019}') {
        Some(pos) if pos > 0 => vec![(start, &token[..pos]), (start + pos, &token[pos..])],
        _ => vec![(start, token)],
    }
}

/// `it`, `they` and `them` are always pronouns; `this` and `that` only
/// when they do not introduce a noun.
fn is_pronoun_use(word: &str, next: Option<&str>) -> bool {
    match word {
        "this" | "that" => match next {
            None => true,
            Some(next) => {
                let next = next.to_lowercase().replace('\u{2019}', "'");
                !next.chars().any(char::is_alphanumeric)
                    || PRONOUN_FOLLOWERS.contains(&next.as_str())
            }
        },
        _ => true,
    }
}

/// Deterministic identifier derived from the issue's position and text
pub(crate) fn issue_id(prefix: &str, kind: IssueType, start: usize, end: usize, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:{}:", kind, start, end));
    hasher.update(salt.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}-{}", prefix, &digest[..8])
}

#[allow(clippy::too_many_arguments)]
fn make_issue(
    text: &str,
    kind: IssueType,
    severity: Severity,
    start: usize,
    end: usize,
    message: String,
    suggestion: String,
    impact: Impact,
) -> PromptIssue {
    PromptIssue {
        id: issue_id("issue", kind, start, end, text),
        start,
        end,
        kind,
        severity,
        message,
        suggestion,
        impact: Some(impact),
    }
}
