//! Slug generation

/// Derive a URL-safe slug from a display name.
///
/// Alphanumerics are kept (lower-cased), every other run of characters
/// becomes a single `-`, and leading/trailing separators are dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Candidate slugs for collision resolution: `base`, `base-1`, `base-2`, ...
pub(crate) fn slug_candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string()).chain((1..).map(move |n| format!("{}-{}", base, n)))
}
