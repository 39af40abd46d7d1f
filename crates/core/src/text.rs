//! Plain-text helpers for user-supplied descriptions.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Maximum description length, in characters, after HTML stripping.
pub const MAX_DESCRIPTION_LEN: usize = 1_000;

/// Elements whose content is dropped together with the tags.
static DROPPED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("valid regex")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

/// Named and numeric entities decoded after tag removal.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&#x27;", "'"),
    // Must stay last so `&amp;lt;` decodes to the literal `&lt;`.
    ("&amp;", "&"),
];

/// Remove every HTML tag from `input`, keeping only text content.
///
/// `<script>` and `<style>` elements are removed along with their content.
/// A handful of common entities are decoded and the result is trimmed.
pub fn strip_html(input: &str) -> String {
    let without_blocks = DROPPED_BLOCK_RE.replace_all(input, "");
    let mut text = TAG_RE.replace_all(&without_blocks, "").into_owned();
    for (entity, replacement) in ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }
    text.trim().to_string()
}

/// Strip `raw` to plain text and enforce [`MAX_DESCRIPTION_LEN`].
///
/// Returns `Ok(None)` when nothing remains after stripping, so a blank
/// description clears the stored value instead of persisting `""`.
pub fn clean_description(raw: &str) -> Result<Option<String>, CoreError> {
    let text = strip_html(raw);
    let len = text.chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(CoreError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters (got {len})"
        )));
    }
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}
