//! Fuzzy matching with typo tolerance
//!
//! Case-insensitive substring containment first, then a normalized
//! Levenshtein similarity against the threshold.

/// Default minimum similarity for a fuzzy match
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.7;

/// Clamp a similarity threshold into `[0, 1]`; NaN falls back to the default
pub fn clamp_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        DEFAULT_FUZZY_THRESHOLD
    } else {
        threshold.clamp(0.0, 1.0)
    }
}

/// Calculate Levenshtein distance between two strings
///
/// Keeps a single row sized by the shorter input.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    // Iterate over the longer string so the row follows the shorter one
    let (long, short) = if a_chars.len() >= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };

    if short.is_empty() {
        return long.len();
    }

    let mut row: Vec<usize> = (0..=short.len()).collect();

    for (i, lc) in long.iter().enumerate() {
        // row[0] before overwrite is the diagonal for j = 1
        let mut diagonal = row[0];
        row[0] = i + 1;

        for (j, sc) in short.iter().enumerate() {
            let cost = if lc == sc { 0 } else { 1 };
            let above = row[j + 1];

            row[j + 1] = (above + 1) // deletion
                .min(row[j] + 1) // insertion
                .min(diagonal + cost); // substitution

            diagonal = above;
        }
    }

    row[short.len()]
}

/// Normalized similarity in `[0, 1]`: `(max_len - distance) / max_len`
///
/// Compared case-insensitively. Two empty strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let max_len = a.chars().count().max(b.chars().count());

    if max_len == 0 {
        return 1.0;
    }

    let distance = levenshtein(&a, &b);
    (max_len - distance) as f64 / max_len as f64
}

/// Test whether `term` matches `text` closely enough
///
/// Returns true straight away when `text` contains `term` ignoring case.
/// Otherwise the two strings are compared whole by [`similarity`].
pub fn fuzzy_match(term: &str, text: &str, threshold: f64) -> bool {
    let term_lower = term.to_lowercase();
    let text_lower = text.to_lowercase();

    if text_lower.contains(&term_lower) {
        return true;
    }

    similarity(&term_lower, &text_lower) >= clamp_threshold(threshold)
}

/// True when any word of `text` fuzzy-matches `term`
///
/// Whole-text similarity against a long body is meaningless, so body text is
/// tested word by word after the substring fast path.
pub fn fuzzy_match_words(term: &str, text: &str, threshold: f64) -> bool {
    let term_lower = term.to_lowercase();
    let text_lower = text.to_lowercase();

    if text_lower.contains(&term_lower) {
        return true;
    }

    let threshold = clamp_threshold(threshold);
    let found = tokenize(&text_lower).any(|word| similarity(&term_lower, word) >= threshold);
    found
}

/// Split text into alphanumeric words
pub(crate) fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
}
