use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::calendar::DateRange;
use crate::models::observation::DailyObservation;
use crate::models::status::StatusRecord;
use crate::models::vehicle::Vehicle;
use crate::store::{FleetStore, NewStatus, NewVehicle, StoreError, VehicleChanges};

#[derive(Default)]
struct Tables {
    vehicles: HashMap<Uuid, Vehicle>,
    statuses: HashMap<(Uuid, NaiveDate), StatusRecord>,
    observations: BTreeMap<NaiveDate, DailyObservation>,
}

/// In-process store with the same uniqueness, ordering and cascade rules as
/// the Postgres schema. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryFleetStore {
    tables: RwLock<Tables>,
}

impl MemoryFleetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_vehicle_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::Constraint(
            "vehicles.name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn check_vehicle_exists(tables: &Tables, vehicle_id: Uuid) -> Result<(), StoreError> {
    if tables.vehicles.contains_key(&vehicle_id) {
        Ok(())
    } else {
        Err(StoreError::Constraint(format!(
            "vehicle_status.vehicle_id references missing vehicle {vehicle_id}"
        )))
    }
}

fn new_record(row: NewStatus) -> StatusRecord {
    let now = Utc::now();
    StatusRecord {
        id: Uuid::new_v4(),
        vehicle_id: row.vehicle_id,
        date: row.date,
        status: row.status,
        observations: row.observations,
        driver: row.driver,
        created_by: row.created_by,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl FleetStore for MemoryFleetStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        let tables = self.tables.read().await;
        let mut vehicles: Vec<Vehicle> = tables.vehicles.values().cloned().collect();
        // Code-point order, same as `COLLATE "C"`.
        vehicles.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(vehicles)
    }

    async fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, StoreError> {
        Ok(self.tables.read().await.vehicles.get(&id).cloned())
    }

    async fn insert_vehicle(&self, vehicle: NewVehicle) -> Result<Vehicle, StoreError> {
        check_vehicle_name(&vehicle.name)?;
        let now = Utc::now();
        let row = Vehicle {
            id: Uuid::new_v4(),
            name: vehicle.name,
            category: vehicle.category,
            driver: vehicle.driver,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .vehicles
            .insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_vehicle(
        &self,
        id: Uuid,
        changes: VehicleChanges,
    ) -> Result<Option<Vehicle>, StoreError> {
        check_vehicle_name(&changes.name)?;
        let mut tables = self.tables.write().await;
        let Some(vehicle) = tables.vehicles.get_mut(&id) else {
            return Ok(None);
        };
        vehicle.name = changes.name;
        vehicle.category = changes.category;
        vehicle.driver = changes.driver;
        vehicle.updated_at = Utc::now();
        Ok(Some(vehicle.clone()))
    }

    async fn delete_vehicle(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.vehicles.remove(&id).is_none() {
            return Ok(false);
        }
        tables.statuses.retain(|(vehicle_id, _), _| *vehicle_id != id);
        Ok(true)
    }

    async fn list_statuses(&self, range: DateRange) -> Result<Vec<StatusRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut records: Vec<StatusRecord> = tables
            .statuses
            .values()
            .filter(|r| range.contains(r.date))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.date.cmp(&b.date).then(a.vehicle_id.cmp(&b.vehicle_id)));
        Ok(records)
    }

    async fn get_status(
        &self,
        vehicle_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<StatusRecord>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .statuses
            .get(&(vehicle_id, date))
            .cloned())
    }

    async fn upsert_status(&self, status: NewStatus) -> Result<StatusRecord, StoreError> {
        let mut tables = self.tables.write().await;
        check_vehicle_exists(&tables, status.vehicle_id)?;
        let key = (status.vehicle_id, status.date);
        let record = match tables.statuses.remove(&key) {
            Some(existing) => StatusRecord {
                status: status.status,
                observations: status.observations,
                driver: status.driver,
                created_by: status.created_by,
                updated_at: Utc::now(),
                ..existing
            },
            None => new_record(status),
        };
        tables.statuses.insert(key, record.clone());
        Ok(record)
    }

    async fn delete_statuses(&self, date: NaiveDate) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.statuses.len();
        tables.statuses.retain(|(_, d), _| *d != date);
        Ok((before - tables.statuses.len()) as u64)
    }

    async fn replace_statuses(
        &self,
        date: NaiveDate,
        rows: Vec<NewStatus>,
    ) -> Result<Vec<StatusRecord>, StoreError> {
        let mut tables = self.tables.write().await;

        // Validate everything before the first mutation so a bad row leaves `date` intact.
        let mut seen = HashSet::new();
        for row in &rows {
            if row.date != date {
                return Err(StoreError::Constraint(format!(
                    "replacement row dated {} does not belong to {date}",
                    row.date
                )));
            }
            check_vehicle_exists(&tables, row.vehicle_id)?;
            if !seen.insert(row.vehicle_id) {
                return Err(StoreError::Constraint(format!(
                    "duplicate (vehicle_id, date) = ({}, {date})",
                    row.vehicle_id
                )));
            }
        }

        tables.statuses.retain(|(_, d), _| *d != date);
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let record = new_record(row);
            tables
                .statuses
                .insert((record.vehicle_id, record.date), record.clone());
            inserted.push(record);
        }
        Ok(inserted)
    }

    async fn get_observation(
        &self,
        date: NaiveDate,
    ) -> Result<Option<DailyObservation>, StoreError> {
        Ok(self.tables.read().await.observations.get(&date).cloned())
    }

    async fn upsert_observation(
        &self,
        date: NaiveDate,
        content: String,
        created_by: Uuid,
    ) -> Result<DailyObservation, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let observation = match tables.observations.remove(&date) {
            Some(existing) => DailyObservation {
                content,
                created_by: Some(created_by),
                updated_at: now,
                ..existing
            },
            None => DailyObservation {
                id: Uuid::new_v4(),
                date,
                content,
                created_by: Some(created_by),
                created_at: now,
                updated_at: now,
            },
        };
        tables.observations.insert(date, observation.clone());
        Ok(observation)
    }

    async fn recent_observations(
        &self,
        limit: usize,
    ) -> Result<Vec<DailyObservation>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .observations
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::status::VehicleStatus;
    use crate::models::vehicle::VehicleCategory;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn add_vehicle(store: &MemoryFleetStore, name: &str) -> Vehicle {
        store
            .insert_vehicle(NewVehicle {
                name: name.to_string(),
                category: VehicleCategory::Outros,
                driver: None,
                created_by: Uuid::new_v4(),
            })
            .await
            .unwrap()
    }

    fn status(vehicle_id: Uuid, on: NaiveDate, status: VehicleStatus, obs: &str) -> NewStatus {
        NewStatus {
            vehicle_id,
            date: on,
            status,
            observations: Some(obs.to_string()),
            driver: None,
            created_by: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_vehicles_listed_by_name() {
        let store = MemoryFleetStore::new();
        add_vehicle(&store, "Carro 003").await;
        add_vehicle(&store, "Carro 001").await;
        add_vehicle(&store, "Carro 002").await;

        let names: Vec<String> = store
            .list_vehicles()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, ["Carro 001", "Carro 002", "Carro 003"]);
    }

    #[tokio::test]
    async fn test_vehicle_names_compare_by_code_point() {
        let store = MemoryFleetStore::new();
        for name in ["Ágil", "ambulância", "Bravo", "Caminhão"] {
            add_vehicle(&store, name).await;
        }

        let names: Vec<String> = store
            .list_vehicles()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, ["Bravo", "Caminhão", "ambulância", "Ágil"]);
    }

    #[tokio::test]
    async fn test_blank_vehicle_name_rejected() {
        let store = MemoryFleetStore::new();
        let err = store
            .insert_vehicle(NewVehicle {
                name: "   ".to_string(),
                category: VehicleCategory::Destack,
                driver: None,
                created_by: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_upsert_twice_keeps_one_record_with_second_values() {
        let store = MemoryFleetStore::new();
        let vehicle = add_vehicle(&store, "Carro 001").await;
        let day = date(2024, 5, 10);

        let first = store
            .upsert_status(status(vehicle.id, day, VehicleStatus::Quebrado, "pneu"))
            .await
            .unwrap();
        let second = store
            .upsert_status(status(vehicle.id, day, VehicleStatus::Emprestado, "para obra"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let stored = store.list_statuses(DateRange::day(day)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, VehicleStatus::Emprestado);
        assert_eq!(stored[0].observations.as_deref(), Some("para obra"));
    }

    #[tokio::test]
    async fn test_status_for_missing_vehicle_is_constraint_error() {
        let store = MemoryFleetStore::new();
        let err = store
            .upsert_status(status(Uuid::new_v4(), date(2024, 5, 10), VehicleStatus::Quebrado, ""))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_delete_vehicle_cascades_statuses() {
        let store = MemoryFleetStore::new();
        let vehicle = add_vehicle(&store, "Carro 001").await;
        let day = date(2024, 5, 10);
        store
            .upsert_status(status(vehicle.id, day, VehicleStatus::Quebrado, ""))
            .await
            .unwrap();

        assert!(store.delete_vehicle(vehicle.id).await.unwrap());
        assert!(!store.delete_vehicle(vehicle.id).await.unwrap());
        assert!(store.list_statuses(DateRange::day(day)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_statuses_rejects_bad_batch_without_touching_date() {
        let store = MemoryFleetStore::new();
        let vehicle = add_vehicle(&store, "Carro 001").await;
        let day = date(2024, 5, 10);
        store
            .upsert_status(status(vehicle.id, day, VehicleStatus::Quebrado, "original"))
            .await
            .unwrap();

        let batch = vec![
            status(vehicle.id, day, VehicleStatus::Funcionando, "novo"),
            status(Uuid::new_v4(), day, VehicleStatus::Funcionando, "orfao"),
        ];
        assert!(store.replace_statuses(day, batch).await.is_err());

        let stored = store.list_statuses(DateRange::day(day)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].observations.as_deref(), Some("original"));
    }

    #[tokio::test]
    async fn test_statuses_listed_in_date_order() {
        let store = MemoryFleetStore::new();
        let vehicle = add_vehicle(&store, "Carro 001").await;
        for d in [20, 3, 11] {
            store
                .upsert_status(status(vehicle.id, date(2024, 5, d), VehicleStatus::Quebrado, ""))
                .await
                .unwrap();
        }
        store
            .upsert_status(status(vehicle.id, date(2024, 6, 1), VehicleStatus::Quebrado, ""))
            .await
            .unwrap();

        let range = DateRange {
            start: date(2024, 5, 1),
            end: date(2024, 5, 31),
        };
        let days: Vec<NaiveDate> = store
            .list_statuses(range)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(days, [date(2024, 5, 3), date(2024, 5, 11), date(2024, 5, 20)]);
    }

    #[tokio::test]
    async fn test_observation_upsert_is_keyed_on_date() {
        let store = MemoryFleetStore::new();
        let author = Uuid::new_v4();
        let day = date(2024, 5, 10);

        let first = store
            .upsert_observation(day, "Chuva forte".to_string(), author)
            .await
            .unwrap();
        let second = store
            .upsert_observation(day, "Chuva forte, pátio alagado".to_string(), author)
            .await
            .unwrap();
        store
            .upsert_observation(date(2024, 5, 11), "Sem ocorrências".to_string(), author)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let recent = store.recent_observations(5).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].date, date(2024, 5, 11));
        assert_eq!(recent[1].content, "Chuva forte, pátio alagado");
    }
}
