use std::collections::HashMap;
use yui_core::fingerprint::normalize;

/// Character-bigram counts of the normalized text. Texts shorter than two
/// characters fall back to a single unigram entry.
pub fn bigram_profile(text: &str) -> HashMap<(char, char), u32> {
    let chars: Vec<char> = normalize(text).chars().collect();
    let mut profile = HashMap::new();
    if chars.len() == 1 {
        profile.insert((chars[0], '\0'), 1);
    }
    for pair in chars.windows(2) {
        *profile.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    profile
}

pub fn cosine_similarity(a: &HashMap<(char, char), u32>, b: &HashMap<(char, char), u32>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .filter_map(|(k, &x)| b.get(k).map(|&y| x as f64 * y as f64))
        .sum();
    let norm = |m: &HashMap<(char, char), u32>| m.values().map(|&v| (v as f64).powi(2)).sum::<f64>().sqrt();
    (dot / (norm(a) * norm(b))) as f32
}

/// Similarity of two title+body pairs in `[0, 1]`.
pub fn text_similarity(a_title: &str, a_body: &str, b_title: &str, b_body: &str) -> f32 {
    let a = bigram_profile(&format!("{}{}", a_title, a_body));
    let b = bigram_profile(&format!("{}{}", b_title, b_body));
    cosine_similarity(&a, &b)
}
