//! Data-access capability for the fleet dashboard.
//!
//! Every core operation receives a `&dyn FleetStore` instead of reaching for a
//! shared client. `AppState` carries an `Arc<dyn FleetStore>`, chosen at
//! startup via `STORE_BACKEND`:
//! - `PgFleetStore`: Postgres through sqlx
//! - `MemoryFleetStore`: process-local maps, used by tests and local demos

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::calendar::DateRange;
use crate::models::observation::DailyObservation;
use crate::models::status::{StatusRecord, VehicleStatus};
use crate::models::vehicle::{Vehicle, VehicleCategory};
use crate::models::UnknownLabel;

pub mod memory;
pub mod postgres;

pub use memory::MemoryFleetStore;
pub use postgres::PgFleetStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<UnknownLabel> for StoreError {
    fn from(err: UnknownLabel) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub name: String,
    pub category: VehicleCategory,
    pub driver: Option<String>,
    pub created_by: Uuid,
}

/// Full replacement of a vehicle's mutable attributes.
#[derive(Debug, Clone)]
pub struct VehicleChanges {
    pub name: String,
    pub category: VehicleCategory,
    pub driver: Option<String>,
}

/// A status write keyed on (vehicle_id, date).
#[derive(Debug, Clone, PartialEq)]
pub struct NewStatus {
    pub vehicle_id: Uuid,
    pub date: NaiveDate,
    pub status: VehicleStatus,
    pub observations: Option<String>,
    pub driver: Option<String>,
    pub created_by: Uuid,
}

#[async_trait]
pub trait FleetStore: Send + Sync {
    /// Short backend name for logs and the health endpoint.
    fn backend(&self) -> &'static str;

    /// All vehicles, ordered by name ascending, ties broken by id.
    ///
    /// Names compare by code point (Postgres `COLLATE "C"`), so every backend
    /// yields the same order regardless of the database locale.
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError>;

    async fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, StoreError>;

    async fn insert_vehicle(&self, vehicle: NewVehicle) -> Result<Vehicle, StoreError>;

    /// Returns `None` when no vehicle has that id.
    async fn update_vehicle(
        &self,
        id: Uuid,
        changes: VehicleChanges,
    ) -> Result<Option<Vehicle>, StoreError>;

    /// Hard delete; the vehicle's status rows go with it. Returns whether a row existed.
    async fn delete_vehicle(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Status records whose date falls in `range`, ascending by date.
    async fn list_statuses(&self, range: DateRange) -> Result<Vec<StatusRecord>, StoreError>;

    async fn get_status(
        &self,
        vehicle_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<StatusRecord>, StoreError>;

    /// Insert-or-update on (vehicle_id, date). The record id survives updates.
    async fn upsert_status(&self, status: NewStatus) -> Result<StatusRecord, StoreError>;

    /// Removes every status record for `date`, returning how many went.
    async fn delete_statuses(&self, date: NaiveDate) -> Result<u64, StoreError>;

    /// Atomically replaces all records of `date` with `rows`.
    /// Either the whole replacement lands or `date` is left as it was.
    async fn replace_statuses(
        &self,
        date: NaiveDate,
        rows: Vec<NewStatus>,
    ) -> Result<Vec<StatusRecord>, StoreError>;

    async fn get_observation(&self, date: NaiveDate)
        -> Result<Option<DailyObservation>, StoreError>;

    /// Insert-or-update on date.
    async fn upsert_observation(
        &self,
        date: NaiveDate,
        content: String,
        created_by: Uuid,
    ) -> Result<DailyObservation, StoreError>;

    /// Most recent observations first.
    async fn recent_observations(&self, limit: usize)
        -> Result<Vec<DailyObservation>, StoreError>;
}
