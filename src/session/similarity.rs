//! Prompt similarity: normalized Levenshtein distance over trimmed, lower-cased text.

/// Similarity in [0, 1]: `1 - distance / max(len)`, counted in Unicode scalar values.
pub fn prompt_similarity(typed: &str, prompt: &str) -> f64 {
    let a: Vec<char> = typed.trim().to_lowercase().chars().collect();
    let b: Vec<char> = prompt.trim().to_lowercase().chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

// Two-row dynamic programming
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            cur[j + 1] = substitution.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}
