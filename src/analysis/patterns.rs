//! Pattern matching utilities
//!
//! Case-insensitive regular expression families used by the rule-based
//! analyzer. The `regex` crate has no lookaround, so patterns that must not
//! be followed by certain words carry a separate rejection expression that
//! is tested against the text right after the match.

use once_cell::sync::Lazy;
use regex::Regex;

/// A single pattern with an optional negative follow-up
pub struct Pattern {
    regex: Regex,
    reject_followed_by: Option<Regex>,
}

impl Pattern {
    fn new(pattern: &str) -> Self {
        Self {
            regex: compile(pattern),
            reject_followed_by: None,
        }
    }

    fn not_followed_by(pattern: &str, follow: &str) -> Self {
        Self {
            regex: compile(pattern),
            reject_followed_by: Some(compile(&format!("^(?:{})", follow))),
        }
    }

    fn accepts(&self, text: &str, end: usize) -> bool {
        match &self.reject_followed_by {
            Some(reject) => !reject.is_match(&text[end..]),
            None => true,
        }
    }
}

fn compile(pattern: &str) -> Regex {
    // Patterns are compile-time constants; a failure here is a programming error.
    Regex::new(&format!("(?i){}", pattern)).expect("invalid built-in pattern")
}

/// A match located in the source text (byte offsets)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Vague instruction patterns
pub static VAGUE_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        Pattern::not_followed_by(
            r"\b(analyze|check|look at|review|examine)\b",
            r"\s+(specifically|by|with|for|the|this)",
        ),
        Pattern::not_followed_by(r"\b(give|provide|show)\s+(me\s+)?insights?\b", r"\s+on"),
        Pattern::new(r"\b(do|make|create)\s+something\b"),
        Pattern::new(r"\btell me about\b"),
    ]
});

/// Role definition patterns
pub static ROLE_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        Pattern::new(r"\byou are\s+(a|an)\s+\w+"),
        Pattern::new(r"\bact as\s+(a|an)\s+\w+"),
        Pattern::new(r"\bas\s+(a|an)\s+\w+\s+(expert|specialist)"),
    ]
});

/// Format instruction patterns
pub static FORMAT_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        Pattern::new(r"\bformat\s+(as|the|your)\b"),
        Pattern::new(r"\bstructure\s+(as|the|your)\b"),
        Pattern::new(r"\bbullet\s+points?\b"),
        Pattern::new(r"\bnumbered\s+list\b"),
        Pattern::new(r"\btable\b"),
        Pattern::new(r"\bjson\b"),
        Pattern::new(r"\bmarkdown\b"),
    ]
});

/// Output requirement patterns
pub static OUTPUT_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        Pattern::new(r"\boutput\s+(format|structure)\b"),
        Pattern::new(r"\bprovide\s+(in|as)\s+\w+\s+format\b"),
        Pattern::new(r"\bresponse\s+format\b"),
    ]
});

static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| compile(r"[.!?]+"));
static NUMBERED_LIST: Lazy<Regex> = Lazy::new(|| compile(r"\d+[.)]\s+\w+"));
static BULLET_LIST: Lazy<Regex> = Lazy::new(|| compile(r"[-•*]\s+\w+"));

/// Find all matches of a pattern family, pattern by pattern
pub fn find_matches(text: &str, patterns: &[Pattern]) -> Vec<PatternMatch> {
    let mut matches = Vec::new();
    for pattern in patterns {
        for m in pattern.regex.find_iter(text) {
            if pattern.accepts(text, m.end()) {
                matches.push(PatternMatch {
                    start: m.start(),
                    end: m.end(),
                    text: m.as_str().to_string(),
                });
            }
        }
    }
    matches
}

/// Check if text contains any pattern of the family
pub fn contains_pattern(text: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| {
        pattern
            .regex
            .find_iter(text)
            .any(|m| pattern.accepts(text, m.end()))
    })
}

/// Count whitespace-separated words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Count non-blank sentences
pub fn count_sentences(text: &str) -> usize {
    SENTENCE_SPLIT
        .split(text)
        .filter(|sentence| !sentence.trim().is_empty())
        .count()
}

/// Check for numbered or bulleted structure
pub fn has_specific_instructions(text: &str) -> bool {
    NUMBERED_LIST.is_match(text) || BULLET_LIST.is_match(text)
}

/// Convert a byte offset into a character offset
pub fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vague_match() {
        let matches = find_matches("analyze data", &VAGUE_PATTERNS);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start, 0);
        assert_eq!(matches[0].end, 7);
        assert_eq!(matches[0].text, "analyze");
    }

    #[test]
    fn test_vague_rejected_by_followup() {
        assert!(find_matches("Analyze the sales numbers", &VAGUE_PATTERNS).is_empty());
        assert!(find_matches("check this", &VAGUE_PATTERNS).is_empty());
        assert!(find_matches("give me insights on churn", &VAGUE_PATTERNS).is_empty());
        assert_eq!(find_matches("give me insights", &VAGUE_PATTERNS).len(), 1);
    }

    #[test]
    fn test_other_vague_forms() {
        assert_eq!(find_matches("please do something", &VAGUE_PATTERNS).len(), 1);
        assert_eq!(find_matches("Tell me about Rome", &VAGUE_PATTERNS).len(), 1);
    }

    #[test]
    fn test_role_detection() {
        assert!(contains_pattern("You are a data analyst.", &ROLE_PATTERNS));
        assert!(contains_pattern("Act as an editor", &ROLE_PATTERNS));
        assert!(contains_pattern("answer as a security expert", &ROLE_PATTERNS));
        assert!(!contains_pattern("Summarize this report", &ROLE_PATTERNS));
    }

    #[test]
    fn test_format_detection() {
        assert!(contains_pattern("Format as bullet points", &FORMAT_PATTERNS));
        assert!(contains_pattern("return JSON", &FORMAT_PATTERNS));
        assert!(contains_pattern("use the response format below", &OUTPUT_PATTERNS));
        assert!(!contains_pattern("write a poem", &FORMAT_PATTERNS));
    }

    #[test]
    fn test_counts() {
        assert_eq!(count_words("  one two\tthree\n"), 3);
        assert_eq!(count_sentences("First. Second! Third?"), 3);
        assert_eq!(count_sentences("..."), 0);
    }

    #[test]
    fn test_structure() {
        assert!(has_specific_instructions("Do this: 1) first 2) second"));
        assert!(has_specific_instructions("- item one"));
        assert!(has_specific_instructions("• item"));
        assert!(!has_specific_instructions("plain prose only"));
    }

    #[test]
    fn test_char_offset() {
        let text = "héllo world";
        let byte = text.find("world").unwrap();
        assert_eq!(char_offset(text, byte), 6);
    }
}
