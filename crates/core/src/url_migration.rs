//! Base-URL substitution for persisted asset URLs.
//!
//! When the serving host changes, absolute URLs stored in records are
//! rewritten by replacing the old base with the new one. Records are selected
//! by the old *host* so a second pass after a completed migration finds
//! nothing to change.

use crate::error::CoreError;

/// A validated old-base → new-base rewrite rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrlRewrite {
    old_base: String,
    new_base: String,
    old_host: String,
}

impl BaseUrlRewrite {
    /// Build a rewrite rule. Trailing slashes are trimmed from both bases.
    ///
    /// Fails if either base is blank, if the old base has no host, or if the
    /// two bases are identical.
    pub fn new(old_base: &str, new_base: &str) -> Result<Self, CoreError> {
        let old_base = old_base.trim().trim_end_matches('/');
        let new_base = new_base.trim().trim_end_matches('/');

        if old_base.is_empty() || new_base.is_empty() {
            return Err(CoreError::Validation(
                "Both the old and new base URL must be set".into(),
            ));
        }
        if old_base == new_base {
            return Err(CoreError::Validation(
                "Old and new base URL are identical".into(),
            ));
        }

        let old_host = host_of(old_base).ok_or_else(|| {
            CoreError::Validation(format!("Cannot determine host of base URL '{old_base}'"))
        })?;

        Ok(Self {
            old_host: old_host.to_string(),
            old_base: old_base.to_string(),
            new_base: new_base.to_string(),
        })
    }

    pub fn old_base(&self) -> &str {
        &self.old_base
    }

    pub fn new_base(&self) -> &str {
        &self.new_base
    }

    /// The hostname (with port, if any) used to select candidate records.
    pub fn old_host(&self) -> &str {
        &self.old_host
    }

    /// Returns the rewritten URL, or `None` if `url` does not contain the old
    /// base (nothing to change).
    pub fn rewrite(&self, url: &str) -> Option<String> {
        if !url.contains(&self.old_base) {
            return None;
        }
        let rewritten = url.replacen(&self.old_base, &self.new_base, 1);
        (rewritten != url).then_some(rewritten)
    }

    /// Rewrite an optional stored URL, returning `None` if it is absent or
    /// unchanged.
    pub fn rewrite_opt(&self, url: Option<&str>) -> Option<String> {
        url.and_then(|u| self.rewrite(u))
    }
}

/// Extract the authority (host and optional port) from a URL.
///
/// `http://old.example.com:8080/x` yields `old.example.com:8080`. A value
/// without a scheme is treated as starting with the host.
pub fn host_of(url: &str) -> Option<&str> {
    let rest = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    // Drop any `user:pass@` prefix.
    let host = authority.rsplit('@').next().unwrap_or(authority);
    (!host.is_empty()).then_some(host)
}
