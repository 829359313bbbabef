//! Static metrics over generated snippets.
//!
//! Everything here is pure and infallible: arbitrary text, including code in
//! a language the complexity pass cannot parse, produces a result.

use crate::complexity::average_complexity;
use codesketch_types::{CodeAnalysis, PatternTag};
use once_cell::sync::Lazy;
use regex::Regex;

/// Identifier runs count as one token, every other non-blank char as its own.
static TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*|\S").unwrap());

/// Structural matchers, in reporting order.
static PATTERN_MATCHERS: Lazy<Vec<(PatternTag, Regex)>> = Lazy::new(|| {
    PatternTag::ALL
        .iter()
        .map(|&tag| (tag, Regex::new(pattern_source(tag)).unwrap()))
        .collect()
});

fn pattern_source(tag: PatternTag) -> &'static str {
    match tag {
        PatternTag::ClassDefinition => r"(?m)class\s+\w+",
        PatternTag::FunctionDefinition => r"(?m)def\s+\w+\s*\(",
        PatternTag::ForLoop => r"(?m)for\s+.+:\s*$",
        PatternTag::WhileLoop => r"(?m)while\s+.+:\s*$",
        PatternTag::TryBlock => r"(?m)try:\s*$",
        PatternTag::ExceptBlock => r"(?m)except\s+.+:\s*$",
        PatternTag::IfStatement => r"(?m)if\s+.+:\s*$",
    }
}

/// Split a snippet into naive lexical tokens.
pub fn tokenize(code: &str) -> Vec<&str> {
    TOKEN_REGEX.find_iter(code).map(|m| m.as_str()).collect()
}

/// Run every structural matcher once; matched tags come back in matcher order.
pub fn detect_patterns(code: &str) -> Vec<PatternTag> {
    PATTERN_MATCHERS
        .iter()
        .filter(|(_, re)| re.is_match(code))
        .map(|(tag, _)| *tag)
        .collect()
}

/// Compute token count, mean cyclomatic complexity and pattern tags.
///
/// `latency_ms` is left empty; the orchestrator fills it in.
pub fn analyze(code: &str) -> CodeAnalysis {
    let token_count = tokenize(code).len();
    let avg_cyclomatic_complexity = average_complexity(code);
    let patterns = detect_patterns(code);

    tracing::trace!(
        target: "codesketch::analyzer",
        token_count,
        avg_cyclomatic_complexity,
        patterns = patterns.len(),
        "Analyzed snippet"
    );

    CodeAnalysis {
        token_count,
        avg_cyclomatic_complexity,
        patterns,
        latency_ms: None,
    }
}
