//! Filename sanitization for the asset directory.
//!
//! Every filesystem operation driven by a stored URL goes through
//! [`safe_basename`] first, so a crafted URL can never address a path
//! outside the upload directory.

/// Reduce `input` to its final path segment and accept it only if it is made
/// entirely of `[a-zA-Z0-9._-]`.
///
/// Query strings and fragments are dropped before the segment is taken, so a
/// full URL such as `http://host/uploads/a.mp3?v=2` yields `a.mp3`. Returns
/// `None` for empty input, `.`/`..`, or any disallowed character (including
/// null bytes and whitespace).
pub fn safe_basename(input: &str) -> Option<String> {
    let without_query = input.split(['?', '#']).next().unwrap_or("");
    let segment = without_query.rsplit(['/', '\\']).next().unwrap_or("");

    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }

    if !segment.chars().all(is_allowed_char) {
        return None;
    }

    Some(segment.to_string())
}

#[cfg(test)]
pub(crate) fn is_safe_filename(name: &str) -> bool {
    safe_basename(name).as_deref() == Some(name)
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}
