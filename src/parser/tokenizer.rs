//! Input normalization.

/// Punctuation removed from commands before splitting.
pub const STRIPPED_PUNCTUATION: [char; 5] = ['.', ',', ';', '!', '?'];

/// Split a raw command into lowercase word tokens.
///
/// Punctuation in [`STRIPPED_PUNCTUATION`] is deleted (so `p.m.` becomes
/// `pm`), then the text is split on whitespace runs. Never fails; empty input
/// yields no tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Tokenize and rejoin with single spaces.
pub fn normalize(text: &str) -> String {
    tokenize(text).join(" ")
}
