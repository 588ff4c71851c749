//! Roster Loader plus roster maintenance (create, update, delete vehicles).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::fleet::{normalize_name, normalize_text};
use crate::identity::{require, Identity};
use crate::models::status::{StatusRecord, VehicleStatus};
use crate::models::vehicle::{Vehicle, VehicleCategory};
use crate::store::{FleetStore, NewStatus, NewVehicle, VehicleChanges};

/// Vehicle form as submitted by the dashboard. `status`, when present, is
/// written for `status.date` in the same request.
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleRequest {
    pub name: String,
    #[serde(default)]
    pub category: VehicleCategory,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub status: Option<DayStatusRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayStatusRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub status: VehicleStatus,
    #[serde(default)]
    pub observations: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleResponse {
    pub vehicle: Vehicle,
    pub status: Option<StatusRecord>,
}

/// All known vehicles, ordered by name. Fails as a whole; there is no partial roster.
pub async fn load_roster(store: &dyn FleetStore) -> Result<Vec<Vehicle>, AppError> {
    let vehicles = store.list_vehicles().await?;
    debug!("Loaded roster of {} vehicles", vehicles.len());
    Ok(vehicles)
}

pub async fn create_vehicle(
    store: &dyn FleetStore,
    identity: Option<&Identity>,
    request: VehicleRequest,
) -> Result<VehicleResponse, AppError> {
    let identity = require(identity)?;
    let name = normalize_name("name", &request.name)?;
    let driver = normalize_text("driver", request.driver)?;
    let day_status = request.status.map(validate_day_status).transpose()?;

    let vehicle = store
        .insert_vehicle(NewVehicle {
            name,
            category: request.category,
            driver,
            created_by: identity.user_id,
        })
        .await?;
    info!("Created vehicle {} ({})", vehicle.name, vehicle.id);

    let status = match day_status {
        Some(day) => Some(write_day_status(store, identity, vehicle.id, day).await?),
        None => None,
    };

    Ok(VehicleResponse { vehicle, status })
}

pub async fn update_vehicle(
    store: &dyn FleetStore,
    identity: Option<&Identity>,
    id: Uuid,
    request: VehicleRequest,
) -> Result<VehicleResponse, AppError> {
    let identity = require(identity)?;
    let changes = VehicleChanges {
        name: normalize_name("name", &request.name)?,
        category: request.category,
        driver: normalize_text("driver", request.driver)?,
    };
    let day_status = request.status.map(validate_day_status).transpose()?;

    let vehicle = store
        .update_vehicle(id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Vehicle {id} not found")))?;
    info!("Updated vehicle {} ({})", vehicle.name, vehicle.id);

    let status = match day_status {
        Some(day) => Some(write_day_status(store, identity, vehicle.id, day).await?),
        None => None,
    };

    Ok(VehicleResponse { vehicle, status })
}

/// Hard delete. Status rows for the vehicle go with it.
pub async fn delete_vehicle(
    store: &dyn FleetStore,
    identity: Option<&Identity>,
    id: Uuid,
) -> Result<(), AppError> {
    let identity = require(identity)?;
    if !store.delete_vehicle(id).await? {
        return Err(AppError::NotFound(format!("Vehicle {id} not found")));
    }
    info!("Vehicle {id} deleted by {}", identity.user_id);
    Ok(())
}

fn validate_day_status(day: DayStatusRequest) -> Result<DayStatusRequest, AppError> {
    Ok(DayStatusRequest {
        observations: normalize_text("observations", day.observations)?,
        ..day
    })
}

async fn write_day_status(
    store: &dyn FleetStore,
    identity: &Identity,
    vehicle_id: Uuid,
    day: DayStatusRequest,
) -> Result<StatusRecord, AppError> {
    // Keep a driver override already recorded for that day.
    let driver = store
        .get_status(vehicle_id, day.date)
        .await?
        .and_then(|existing| existing.driver);

    Ok(store
        .upsert_status(NewStatus {
            vehicle_id,
            date: day.date,
            status: day.status,
            observations: day.observations,
            driver,
            created_by: identity.user_id,
        })
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::testing::{date, operator, seed_vehicles};
    use crate::models::calendar::DateRange;
    use crate::store::MemoryFleetStore;

    fn request(name: &str) -> VehicleRequest {
        VehicleRequest {
            name: name.to_string(),
            category: VehicleCategory::Embasa,
            driver: Some("  João ".to_string()),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_roster_is_ordered_by_name() {
        let store = MemoryFleetStore::new();
        seed_vehicles(&store, &["Caminhão 2", "Caminhão 10", "Ambulância"]).await;

        let names: Vec<String> = load_roster(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, ["Ambulância", "Caminhão 10", "Caminhão 2"]);
    }

    #[tokio::test]
    async fn test_create_requires_identity() {
        let store = MemoryFleetStore::new();
        let err = create_vehicle(&store, None, request("Carro 001"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
        assert!(load_roster(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_initial_status() {
        let store = MemoryFleetStore::new();
        let who = operator();
        let mut req = request(" Carro 001 ");
        req.status = Some(DayStatusRequest {
            date: date(2024, 5, 10),
            status: VehicleStatus::Quebrado,
            observations: Some("  embreagem ".to_string()),
        });

        let created = create_vehicle(&store, Some(&who), req).await.unwrap();
        assert_eq!(created.vehicle.name, "Carro 001");
        assert_eq!(created.vehicle.driver.as_deref(), Some("João"));
        let status = created.status.unwrap();
        assert_eq!(status.status, VehicleStatus::Quebrado);
        assert_eq!(status.observations.as_deref(), Some("embreagem"));
        assert_eq!(status.created_by, who.user_id);
    }

    #[tokio::test]
    async fn test_blank_name_is_validation_error() {
        let store = MemoryFleetStore::new();
        let err = create_vehicle(&store, Some(&operator()), request("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_missing_vehicle_is_not_found() {
        let store = MemoryFleetStore::new();
        let err = update_vehicle(&store, Some(&operator()), Uuid::new_v4(), request("Carro"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_changes_attributes_and_upserts_status() {
        let store = MemoryFleetStore::new();
        let vehicle = seed_vehicles(&store, &["Carro 001"]).await.remove(0);
        let day = date(2024, 5, 10);
        let mut req = request("Carro 001A");
        req.status = Some(DayStatusRequest {
            date: day,
            status: VehicleStatus::Emprestado,
            observations: None,
        });

        let updated = update_vehicle(&store, Some(&operator()), vehicle.id, req)
            .await
            .unwrap();
        assert_eq!(updated.vehicle.id, vehicle.id);
        assert_eq!(updated.vehicle.name, "Carro 001A");
        assert_eq!(updated.vehicle.category, VehicleCategory::Embasa);
        assert_eq!(store.list_statuses(DateRange::day(day)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_vehicle() {
        let store = MemoryFleetStore::new();
        let vehicle = seed_vehicles(&store, &["Carro 001"]).await.remove(0);

        delete_vehicle(&store, Some(&operator()), vehicle.id)
            .await
            .unwrap();
        assert!(load_roster(&store).await.unwrap().is_empty());
        assert!(matches!(
            delete_vehicle(&store, Some(&operator()), vehicle.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
