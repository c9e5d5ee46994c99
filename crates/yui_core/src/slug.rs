pub const MAX_SLUG_CHARS: usize = 60;
pub const FALLBACK_SLUG: &str = "love-question";

/// Keeps letters, digits (any script) and `_`, truncated to [`MAX_SLUG_CHARS`].
pub fn slugify(title: &str) -> String {
    let slug: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .take(MAX_SLUG_CHARS)
        .collect();
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// First of `base`, `base-2`, `base-3`, ... for which `taken` is false.
pub fn resolve_slug<F>(base: &str, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    if !taken(base) {
        return base.to_string();
    }
    (2u64..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
