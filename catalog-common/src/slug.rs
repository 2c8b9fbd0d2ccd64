//! URL slug generation for categories and items

/// Convert a display name into a URL slug
///
/// Keeps ASCII letters, digits and underscores (lowercased). Whitespace and
/// hyphen runs collapse into a single `-`; every other character is dropped.
///
/// # Examples
/// ```
/// use catalog_common::slugify;
///
/// assert_eq!(slugify("Shiny New Item"), "shiny-new-item");
/// assert_eq!(slugify("  1 Rouble -- 1961  "), "1-rouble-1961");
/// ```
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch == '-' || ch.is_whitespace() {
            pending_dash = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}
