//! Markdown image reference detection.

use once_cell::sync::Lazy;
use regex::Regex;

/// `![alt](url)` with lazy alt and url captures, first match wins.
static IMAGE_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[.*?\]\((.*?)\)").expect("image pattern is valid"));

/// Whether the markdown embeds at least one image.
pub fn contains_image(markdown: &str) -> bool {
    IMAGE_REF.is_match(markdown)
}

/// URL of the first embedded image, if any and non-empty.
pub fn extract_image_link(markdown: &str) -> Option<&str> {
    IMAGE_REF
        .captures(markdown)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
}
