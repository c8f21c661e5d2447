use std::collections::HashSet;
use std::sync::OnceLock;

/// Characters treated as word separators in addition to whitespace.
const PUNCTUATION: &[char] = &['.', ',', '?', '!', '-', ':', ';', '"', '\'', '(', ')', '[', ']'];

/// Tokens at or below this length are dropped.
const MIN_TOKEN_LEN: usize = 3;

pub const STOP_WORDS: &[&str] = &[
    "the", "and", "to", "of", "a", "in", "is", "for", "that", "on", "with", "are", "it", "app",
    "be", "as", "this", "have", "or", "but", "not", "you", "my", "can", "if", "so", "me", "what",
    "would", "like", "just", "do", "apps", "there", "an", "at", "from", "software", "tool",
    "website", "service", "use", "how", "any", "does", "know", "has", "we", "need", "looking",
    "want", "find", "make", "one", "get", "some", "time", "help", "search", "way", "better",
    "best", "good", "something", "is_new_opportunity", "post", "createdutc", "desc", "users",
    "user", "people",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

pub fn is_stop_word(word: &str) -> bool {
    stop_words().contains(word)
}

/// Splits free text into lowercase keyword candidates.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(PUNCTUATION, " ")
        .split_whitespace()
        .filter(|token| token.chars().count() > MIN_TOKEN_LEN && !is_stop_word(token))
        .map(str::to_string)
        .collect()
}
