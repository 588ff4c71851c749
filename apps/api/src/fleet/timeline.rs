//! Monthly timeline: a dense vehicle × day grid.
//!
//! Algorithm:
//! 1. Month range is `[first day, last day]`, last day taken as the day before
//!    the first of the next month.
//! 2. Every roster vehicle gets an entry with every day of the month set to
//!    `DayCell::Empty` and the vehicle's default driver.
//! 3. Records are applied in ascending date order. A record fills its cell and,
//!    if it carries a driver, replaces the entry's driver (latest date wins).
//! 4. Records for vehicles missing from the roster are dropped.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::fleet::roster::load_roster;
use crate::models::calendar::YearMonth;
use crate::models::status::{StatusRecord, VehicleStatus};
use crate::models::vehicle::{Vehicle, VehicleCategory};
use crate::store::FleetStore;

/// One grid cell. Serializes as the status label, or `""` when nothing was recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayCell {
    #[default]
    Empty,
    Recorded(VehicleStatus),
}

impl DayCell {
    pub fn label(&self) -> &'static str {
        match self {
            DayCell::Empty => "",
            DayCell::Recorded(status) => status.label(),
        }
    }
}

impl Serialize for DayCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub vehicle_id: Uuid,
    pub vehicle_name: String,
    pub category: VehicleCategory,
    pub driver_name: String,
    /// Keyed by every date of the month, serialized as `YYYY-MM-DD`.
    pub daily_status: BTreeMap<NaiveDate, DayCell>,
}

impl TimelineEntry {
    fn blank(vehicle: &Vehicle, days: &[NaiveDate]) -> Self {
        Self {
            vehicle_id: vehicle.id,
            vehicle_name: vehicle.name.clone(),
            category: vehicle.category,
            driver_name: vehicle.driver.clone().unwrap_or_default(),
            daily_status: days.iter().map(|d| (*d, DayCell::Empty)).collect(),
        }
    }

    #[cfg(test)]
    fn cell(&self, date: NaiveDate) -> DayCell {
        self.daily_status.get(&date).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineView {
    pub month: YearMonth,
    pub days: Vec<NaiveDate>,
    pub vehicles: Vec<TimelineEntry>,
}

/// Builds the grid for `month`. Entries follow roster order.
pub fn build_timeline(
    month: YearMonth,
    roster: &[Vehicle],
    records: &[StatusRecord],
) -> TimelineView {
    let days = month.days();
    let range = month.range();

    let mut vehicles: Vec<TimelineEntry> = roster
        .iter()
        .map(|v| TimelineEntry::blank(v, &days))
        .collect();
    let index: HashMap<Uuid, usize> = roster
        .iter()
        .enumerate()
        .map(|(i, v)| (v.id, i))
        .collect();

    let mut ordered: Vec<&StatusRecord> = records.iter().filter(|r| range.contains(r.date)).collect();
    ordered.sort_by_key(|r| r.date);

    let mut orphaned = 0usize;
    for record in ordered {
        let Some(&i) = index.get(&record.vehicle_id) else {
            orphaned += 1;
            continue;
        };
        let entry = &mut vehicles[i];
        entry
            .daily_status
            .insert(record.date, DayCell::Recorded(record.status));
        if let Some(driver) = record.driver.as_deref().filter(|d| !d.is_empty()) {
            entry.driver_name = driver.to_string();
        }
    }

    if orphaned > 0 {
        debug!("Dropped {orphaned} status records for vehicles no longer in the roster ({month})");
    }

    TimelineView {
        month,
        days,
        vehicles,
    }
}

pub async fn load_timeline(
    store: &dyn FleetStore,
    month: YearMonth,
) -> Result<TimelineView, AppError> {
    let roster = load_roster(store).await?;
    let records = store.list_statuses(month.range()).await?;
    debug!(
        "Building {month} timeline from {} vehicles and {} records",
        roster.len(),
        records.len()
    );
    Ok(build_timeline(month, &roster, &records))
}
