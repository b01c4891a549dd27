// trailing marks that never change which word a token is
const TRAILING_MARKS: &[char] = &['.', ',', '!', '?', '¡', '¿', ';', ':'];

/// Reduces a surface token to the key used for dictionary lookups and
/// distractor comparisons: lowercase, with any trailing run of
/// `. , ! ? ¡ ¿ ; :` removed.
pub fn normalize_token(token: &str) -> String {
    let lower = token.to_lowercase();
    lower.trim_end_matches(TRAILING_MARKS).to_string()
}

/// Splits text on any whitespace, dropping empty pieces.
pub fn split_tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

pub fn format_percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
