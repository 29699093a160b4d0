//! Complexity assessment from word count, sentence length, and
//! technical-term density.

/// A small dictionary of technical terms used as density signal: api,
/// database, server, async, kubernetes, and similar systems vocabulary.
const TECHNICAL_TERMS: &[&str] = &[
    "api", "database", "server", "async", "kubernetes", "docker", "microservice", "kernel",
    "algorithm", "concurrency", "latency", "throughput", "middleware", "protocol", "distributed",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
    HighlyComplex,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
            Complexity::HighlyComplex => "highly_complex",
        }
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn average_sentence_length(text: &str, words: usize) -> f64 {
    let sentence_count = text.chars().filter(|c| matches!(c, '.' | '!' | '?')).count().max(1);
    words as f64 / sentence_count as f64
}

fn technical_density(text: &str, words: usize) -> f64 {
    if words == 0 {
        return 0.0;
    }
    let lower = text.to_lowercase();
    let hits: usize = TECHNICAL_TERMS.iter().map(|term| lower.matches(term).count()).sum();
    hits as f64 / words as f64
}

/// Scores a composite signal from word count, average sentence length, and
/// technical-term density, then buckets it into one of four complexity
/// tiers. The thresholds are tuned, not contractual; only the four-way
/// output and monotonic relationship to input size are guaranteed.
pub fn assess_complexity(text: &str) -> Complexity {
    let words = word_count(text);
    if words == 0 {
        return Complexity::Simple;
    }
    let avg_sentence_len = average_sentence_length(text, words);
    let density = technical_density(text, words);

    let mut score = 0.0;
    score += (words as f64 / 500.0).min(1.0);
    score += (avg_sentence_len / 25.0).min(1.0);
    score += (density * 10.0).min(1.0);

    match score {
        s if s < 0.6 => Complexity::Simple,
        s if s < 1.2 => Complexity::Moderate,
        s if s < 2.0 => Complexity::Complex,
        _ => Complexity::HighlyComplex,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_simple() {
        assert_eq!(assess_complexity(""), Complexity::Simple);
    }

    #[test]
    fn short_plain_text_is_simple() {
        assert_eq!(assess_complexity("The cat sat on the mat."), Complexity::Simple);
    }

    #[test]
    fn long_technical_text_is_complex_or_higher() {
        let text = "The distributed database cluster exposes an async api over a kubernetes-managed microservice mesh. ".repeat(20);
        let complexity = assess_complexity(&text);
        assert!(matches!(complexity, Complexity::Complex | Complexity::HighlyComplex));
    }

    #[test]
    fn complexity_is_monotonic_in_technical_density() {
        let plain = "word ".repeat(100);
        let technical = "api database server async kubernetes ".repeat(20);
        let plain_score = assess_complexity(&plain);
        let technical_score = assess_complexity(&technical);
        assert!(technical_score as u8 >= plain_score as u8);
    }
}
