//! # Slugs
//!
//! Slugs are the URL-safe keys used for lookup and link generation. They are derived
//! from a record's human-readable title and must be identical for every entity type
//! and on both the create and the update path.
//!
//! ## Rules
//!
//! 1. Lower-case the title.
//! 2. Drop everything except ASCII word characters (`a-z`, `0-9`, `_`), whitespace and `-`.
//! 3. Replace each whitespace run with a single `-`.
//! 4. Collapse repeated `-`.
//! 5. Trim leading and trailing `-`.
//!
//! `slugify` is pure and idempotent: `slugify(&slugify(x)) == slugify(x)`.

/// Derives the slug for a title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.to_lowercase().chars() {
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        }
    }

    slug
}

/// Replaces characters that are unsafe in an asset file name.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}
