/// Lowercase, blank out everything that is not a letter, digit or
/// whitespace, split on whitespace and drop tokens shorter than `min_len`.
pub fn tokenize_with(text: &str, min_len: usize) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() >= min_len)
        .map(str::to_string)
        .collect()
}

/// Tokenizer used for both documents and queries (tokens of length <= 2 dropped).
pub fn tokenize(text: &str) -> Vec<String> { tokenize_with(text, 3) }
