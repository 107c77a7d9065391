//! Description similarity for the duplicate-listing check.

/// Similarity of two descriptions as an integer percent.
///
/// Normalized Levenshtein distance over characters:
/// `round(100 * (1 - distance / max_len))`. Identical strings (including
/// two empty ones) score 100, strings with nothing in common score 0.
/// The measure is symmetric and case-sensitive.
pub fn similarity_percent(a: &str, b: &str) -> u8 {
    if a == b {
        return 100;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let max_len = a_chars.len().max(b_chars.len());
    let distance = levenshtein(&a_chars, &b_chars);

    (100.0 * (1.0 - distance as f64 / max_len as f64)).round() as u8
}

// 兩列滾動的標準動態規劃，記憶體用量與較短字串成正比
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1)
                .min(curr[j] + 1)
                .min(prev[j] + substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
