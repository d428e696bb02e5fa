//! Identity normalization.

/// Folds a display name into its canonical id.
///
/// Lowercases the input, then keeps only alphanumeric characters. Rank
/// and status decoration (`+`, `@`, `%`, `☆`, a trailing `@!` away
/// marker, ...) and any spacing or punctuation inside the name all
/// disappear, so `"+Zarel"`, `" zarel "` and `"ZAREL"` share one id.
///
/// Lowercasing happens before filtering so the result is already made of
/// lowercase alphanumerics, which makes the function idempotent.
pub fn normalize_id(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}
