//! Validation rules for music records.
//!
//! The HTTP layer receives every field as text (multipart form data); these
//! helpers turn that text into typed values and collect every problem so a
//! single response can enumerate all of them.

use chrono::NaiveDate;

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Field names (wire format)
// ---------------------------------------------------------------------------

pub const FIELD_TITLE: &str = "title";
pub const FIELD_ARTIST: &str = "artist";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_CATEGORY_TYPE: &str = "categoryType";
pub const FIELD_FILE: &str = "file";
pub const FIELD_THUMBNAIL: &str = "thumbnail";
pub const FIELD_DURATION: &str = "duration";
pub const FIELD_RELEASE_DATE: &str = "releaseDate";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_FILE_URL: &str = "fileUrl";
pub const FIELD_THUMBNAIL_URL: &str = "thumbnailUrl";

/// Fields required to create a record, in the order they are reported.
pub const REQUIRED_CREATE_FIELDS: &[&str] = &[
    FIELD_TITLE,
    FIELD_ARTIST,
    FIELD_CATEGORY,
    FIELD_CATEGORY_TYPE,
    FIELD_FILE,
    FIELD_DURATION,
    FIELD_RELEASE_DATE,
];

// ---------------------------------------------------------------------------
// Required fields
// ---------------------------------------------------------------------------

/// Returns `true` if a text value is absent or only whitespace.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Report every required field for which `is_present` returns `false`.
///
/// Fields are checked in [`REQUIRED_CREATE_FIELDS`] order and all of them are
/// reported, not just the first.
pub fn check_required<F>(is_present: F) -> Result<(), CoreError>
where
    F: Fn(&str) -> bool,
{
    let missing: Vec<String> = REQUIRED_CREATE_FIELDS
        .iter()
        .filter(|field| !is_present(field))
        .map(|field| (*field).to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::MissingFields(missing))
    }
}

// ---------------------------------------------------------------------------
// Value parsers
// ---------------------------------------------------------------------------

/// Parse a record or category identifier.
///
/// Identifiers are positive BIGSERIAL values; anything else is a validation
/// failure rather than a lookup miss.
pub fn parse_id(field: &str, raw: &str) -> Result<DbId, CoreError> {
    match raw.trim().parse::<DbId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(CoreError::Validation(format!(
            "{field} must be a valid id (got '{raw}')"
        ))),
    }
}

/// Parse a duration in seconds. Must be a finite, non-negative number.
pub fn parse_duration(raw: &str) -> Result<f64, CoreError> {
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        _ => Err(CoreError::Validation(format!(
            "{FIELD_DURATION} must be a non-negative number of seconds (got '{raw}')"
        ))),
    }
}

/// Parse a release date given as `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_release_date(raw: &str) -> Result<NaiveDate, CoreError> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    chrono::DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .map_err(|_| {
            CoreError::Validation(format!(
                "{FIELD_RELEASE_DATE} must be a date like 2024-01-31 (got '{raw}')"
            ))
        })
}

/// Ensure `category_type_id` is one of the types owned by the category.
pub fn ensure_type_belongs(
    category_id: DbId,
    category_type_id: DbId,
    owned_type_ids: &[DbId],
) -> Result<(), CoreError> {
    if owned_type_ids.contains(&category_type_id) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{FIELD_CATEGORY_TYPE} {category_type_id} does not belong to {FIELD_CATEGORY} {category_id}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Error accumulation
// ---------------------------------------------------------------------------

/// Collects validation failures so they can be reported together.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error from `result`, if any, and pass the value through.
    pub fn check<T>(&mut self, result: Result<T, CoreError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(CoreError::Validation(msg)) => {
                self.errors.push(msg);
                None
            }
            Err(CoreError::InvalidFields(msgs)) => {
                self.errors.extend(msgs);
                None
            }
            Err(other) => {
                self.errors.push(other.to_string());
                None
            }
        }
    }

    /// `Ok(())` if nothing was recorded, otherwise [`CoreError::InvalidFields`].
    pub fn finish(self) -> Result<(), CoreError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidFields(self.errors))
        }
    }
}
