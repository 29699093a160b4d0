//! A small heuristic matcher over free-text thinking/insight content,
//! looking for identity-affecting phrases. Heuristic, not a testable
//! invariant: it only needs to recognise its documented patterns, not be
//! exhaustive.

use regex_lite::Regex;

/// The documented patterns this heuristic recognises.
const PATTERNS: &[&str] = &[
    r"(?i)\bI am\b",
    r"(?i)\bmy name is\b",
    r"(?i)\bI realized\b",
    r"(?i)\bI've changed my mind about\b",
    r"(?i)\bI have changed my mind about\b",
];

/// True when `text` contains an identity-affecting phrase.
pub fn mentions_identity_shift(text: &str) -> bool {
    PATTERNS.iter().any(|pattern| {
        Regex::new(pattern)
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    })
}
