//! Per-day flat view: one row per roster vehicle for a single date.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::fleet::normalize_text;
use crate::fleet::roster::load_roster;
use crate::identity::{require, Identity};
use crate::models::calendar::DateRange;
use crate::models::status::{StatusRecord, VehicleStatus};
use crate::models::vehicle::Vehicle;
use crate::store::{FleetStore, NewStatus};

/// A vehicle paired with its status for one date.
///
/// `id` is `None` when nothing is stored for that date yet; the row then
/// carries the baseline status and is not persisted until edited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub id: Option<Uuid>,
    pub vehicle_id: Uuid,
    pub date: NaiveDate,
    pub status: VehicleStatus,
    pub observations: Option<String>,
    /// Per-day override if recorded, otherwise the vehicle's default driver.
    pub driver: Option<String>,
    pub vehicle: Vehicle,
}

/// Left-joins `roster` against `records` for `date`. Output follows roster order;
/// records for other dates or unknown vehicles are ignored.
pub fn build_daily_rows(
    roster: &[Vehicle],
    records: &[StatusRecord],
    date: NaiveDate,
) -> Vec<DailyRow> {
    let by_vehicle: HashMap<Uuid, &StatusRecord> = records
        .iter()
        .filter(|r| r.date == date)
        .map(|r| (r.vehicle_id, r))
        .collect();

    roster
        .iter()
        .map(|vehicle| match by_vehicle.get(&vehicle.id) {
            Some(record) => DailyRow {
                id: Some(record.id),
                vehicle_id: vehicle.id,
                date,
                status: record.status,
                observations: record.observations.clone(),
                driver: record.driver.clone().or_else(|| vehicle.driver.clone()),
                vehicle: vehicle.clone(),
            },
            None => DailyRow {
                id: None,
                vehicle_id: vehicle.id,
                date,
                status: VehicleStatus::BASELINE,
                observations: None,
                driver: vehicle.driver.clone(),
                vehicle: vehicle.clone(),
            },
        })
        .collect()
}

/// Case-insensitive substring match on the vehicle name. A blank term matches everything.
pub fn matches_search(row: &DailyRow, term: &str) -> bool {
    let term = term.trim();
    term.is_empty()
        || row
            .vehicle
            .name
            .to_lowercase()
            .contains(&term.to_lowercase())
}

pub async fn load_daily_rows(
    store: &dyn FleetStore,
    date: NaiveDate,
    search: Option<&str>,
) -> Result<Vec<DailyRow>, AppError> {
    let roster = load_roster(store).await?;
    let records = store.list_statuses(DateRange::day(date)).await?;
    let mut rows = build_daily_rows(&roster, &records, date);
    if let Some(term) = search {
        rows.retain(|row| matches_search(row, term));
    }
    debug!("Built {} daily rows for {date}", rows.len());
    Ok(rows)
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: VehicleStatus,
    #[serde(default)]
    pub observations: Option<String>,
    /// Absent keeps the day's current override; `null` or a blank string clears it.
    #[serde(default, deserialize_with = "present")]
    pub driver: Option<Option<String>>,
}

/// Maps a present field (including `null`) to `Some`, leaving `None` for an absent one.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Upserts the status of one vehicle on one date.
pub async fn record_status(
    store: &dyn FleetStore,
    identity: Option<&Identity>,
    vehicle_id: Uuid,
    date: NaiveDate,
    update: StatusUpdate,
) -> Result<StatusRecord, AppError> {
    let identity = require(identity)?;
    let observations = normalize_text("observations", update.observations)?;
    let requested_driver = update
        .driver
        .map(|driver| normalize_text("driver", driver))
        .transpose()?;

    if store.get_vehicle(vehicle_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Vehicle {vehicle_id} not found")));
    }

    let driver = match requested_driver {
        Some(driver) => driver,
        None => store
            .get_status(vehicle_id, date)
            .await?
            .and_then(|existing| existing.driver),
    };

    let record = store
        .upsert_status(NewStatus {
            vehicle_id,
            date,
            status: update.status,
            observations,
            driver,
            created_by: identity.user_id,
        })
        .await?;
    info!("Vehicle {vehicle_id} marked {} on {date}", record.status);
    Ok(record)
}

/// Deletes every status record stored for `date`.
pub async fn clear_day(
    store: &dyn FleetStore,
    identity: Option<&Identity>,
    date: NaiveDate,
) -> Result<u64, AppError> {
    let identity = require(identity)?;
    let deleted = store.delete_statuses(date).await?;
    info!("Cleared {deleted} status records on {date} ({})", identity.user_id);
    Ok(deleted)
}
