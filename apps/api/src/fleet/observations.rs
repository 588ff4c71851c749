//! Facility-wide daily notes.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::identity::{require, Identity};
use crate::models::observation::DailyObservation;
use crate::store::FleetStore;

pub const DEFAULT_HISTORY_LIMIT: usize = 5;
pub const MAX_HISTORY_LIMIT: usize = 50;
pub const PREVIEW_CHARS: usize = 50;
pub const MAX_OBSERVATION_CHARS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationPreview {
    pub date: NaiveDate,
    pub preview: String,
    pub truncated: bool,
    pub content: String,
}

/// First `max_chars` characters, with `...` appended when cut.
pub fn preview(content: &str, max_chars: usize) -> (String, bool) {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => (format!("{}...", &content[..cut]), true),
        None => (content.to_string(), false),
    }
}

pub async fn get_observation(
    store: &dyn FleetStore,
    date: NaiveDate,
) -> Result<Option<DailyObservation>, AppError> {
    Ok(store.get_observation(date).await?)
}

/// Upserts the note for `date`. The content is stored as written.
pub async fn save_observation(
    store: &dyn FleetStore,
    identity: Option<&Identity>,
    date: NaiveDate,
    content: String,
) -> Result<DailyObservation, AppError> {
    let identity = require(identity)?;
    if content.chars().count() > MAX_OBSERVATION_CHARS {
        return Err(AppError::Validation(format!(
            "content must be at most {MAX_OBSERVATION_CHARS} characters"
        )));
    }
    let observation = store
        .upsert_observation(date, content, identity.user_id)
        .await?;
    info!("Saved daily observation for {date}");
    Ok(observation)
}

pub async fn observation_history(
    store: &dyn FleetStore,
    limit: Option<usize>,
) -> Result<Vec<ObservationPreview>, AppError> {
    let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if limit == 0 || limit > MAX_HISTORY_LIMIT {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_HISTORY_LIMIT}"
        )));
    }
    Ok(store
        .recent_observations(limit)
        .await?
        .into_iter()
        .map(|o| {
            let (preview, truncated) = preview(&o.content, PREVIEW_CHARS);
            ObservationPreview {
                date: o.date,
                preview,
                truncated,
                content: o.content,
            }
        })
        .collect())
}
