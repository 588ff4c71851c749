//! Fleet status core: roster loading, the per-day and per-month status views,
//! Day-Copy, daily summaries and facility observations.
//!
//! Every operation takes the data-access capability as `&dyn FleetStore`;
//! writes additionally take the acting identity and refuse to run without it.

pub mod copy_day;
pub mod daily;
pub mod handlers;
pub mod observations;
pub mod roster;
pub mod summary;
pub mod timeline;

use crate::errors::AppError;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_TEXT_CHARS: usize = 2000;

/// Trims a required display name and enforces its length.
pub(crate) fn normalize_name(field: &str, raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "{field} must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(name.to_string())
}

/// Trims optional free text; blank input becomes `None`.
pub(crate) fn normalize_text(field: &str, raw: Option<String>) -> Result<Option<String>, AppError> {
    let Some(text) = raw else {
        return Ok(None);
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(AppError::Validation(format!(
            "{field} must be at most {MAX_TEXT_CHARS} characters"
        )));
    }
    Ok(Some(text.to_string()))
}
