//! Day-Copy: overwrite a date's statuses with the previous calendar day's.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::identity::{require, Identity};
use crate::models::calendar::{previous_day, DateRange};
use crate::store::{FleetStore, NewStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CopyReport {
    pub source_date: NaiveDate,
    pub target_date: NaiveDate,
    pub copied: usize,
}

/// Replaces every status record on `target` with copies of the records on the
/// day before. Status, observations and driver carry over; the creator becomes
/// the acting identity.
///
/// Nothing is written when the source day is empty (`EmptySource`). Otherwise
/// the target day is fully overwritten, not merged, in one store transaction.
pub async fn copy_previous_day(
    store: &dyn FleetStore,
    target: NaiveDate,
    identity: Option<&Identity>,
) -> Result<CopyReport, AppError> {
    let identity = require(identity)?;
    let source = previous_day(target)
        .ok_or_else(|| AppError::Validation(format!("{target} has no previous day")))?;

    let source_rows = store.list_statuses(DateRange::day(source)).await?;
    if source_rows.is_empty() {
        return Err(AppError::EmptySource { date: source });
    }

    let rows: Vec<NewStatus> = source_rows
        .into_iter()
        .map(|r| NewStatus {
            vehicle_id: r.vehicle_id,
            date: target,
            status: r.status,
            observations: r.observations,
            driver: r.driver,
            created_by: identity.user_id,
        })
        .collect();

    let inserted = store.replace_statuses(target, rows).await?;
    info!(
        "Copied {} status records from {source} to {target} for {}",
        inserted.len(),
        identity.user_id
    );

    Ok(CopyReport {
        source_date: source,
        target_date: target,
        copied: inserted.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::testing::{date, operator, seed_status, seed_vehicles};
    use crate::models::status::VehicleStatus;
    use crate::store::MemoryFleetStore;

    #[tokio::test]
    async fn test_requires_identity() {
        let store = MemoryFleetStore::new();
        let vehicle = seed_vehicles(&store, &["Carro 001"]).await.remove(0);
        seed_status(&store, vehicle.id, date(2024, 5, 9), VehicleStatus::Quebrado, None).await;

        let err = copy_previous_day(&store, date(2024, 5, 10), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
        assert!(store
            .list_statuses(DateRange::day(date(2024, 5, 10)))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_empty_source_writes_nothing() {
        let store = MemoryFleetStore::new();
        let vehicle = seed_vehicles(&store, &["Carro 001"]).await.remove(0);
        let target = date(2024, 5, 10);
        let existing =
            seed_status(&store, vehicle.id, target, VehicleStatus::Emprestado, Some("obra")).await;

        let err = copy_previous_day(&store, target, Some(&operator()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmptySource { date: source } if source == date(2024, 5, 9)));

        // Target untouched: no delete, no insert.
        let stored = store.list_statuses(DateRange::day(target)).await.unwrap();
        assert_eq!(stored, vec![existing]);
    }

    #[tokio::test]
    async fn test_source_resolves_across_leap_day() {
        let store = MemoryFleetStore::new();
        let vehicle = seed_vehicles(&store, &["Carro 001"]).await.remove(0);
        seed_status(&store, vehicle.id, date(2024, 2, 29), VehicleStatus::Manutencao, Some("revisão"))
            .await;

        let report = copy_previous_day(&store, date(2024, 3, 1), Some(&operator()))
            .await
            .unwrap();
        assert_eq!(report.source_date, date(2024, 2, 29));
        assert_eq!(report.target_date, date(2024, 3, 1));
        assert_eq!(report.copied, 1);
    }

    #[tokio::test]
    async fn test_source_resolves_across_year_boundary() {
        let store = MemoryFleetStore::new();
        let vehicle = seed_vehicles(&store, &["Carro 001"]).await.remove(0);
        seed_status(&store, vehicle.id, date(2024, 12, 31), VehicleStatus::Quebrado, None).await;

        let report = copy_previous_day(&store, date(2025, 1, 1), Some(&operator()))
            .await
            .unwrap();
        assert_eq!(report.source_date, date(2024, 12, 31));
        assert_eq!(report.copied, 1);
    }

    #[tokio::test]
    async fn test_copies_k_records_and_overwrites_target() {
        let store = MemoryFleetStore::new();
        let vehicles = seed_vehicles(&store, &["A", "B", "C", "D"]).await;
        let source = date(2024, 5, 9);
        let target = date(2024, 5, 10);

        seed_status(&store, vehicles[0].id, source, VehicleStatus::Quebrado, Some("pneu")).await;
        seed_status(&store, vehicles[1].id, source, VehicleStatus::Emprestado, None).await;
        seed_status(&store, vehicles[2].id, source, VehicleStatus::Indisponivel, Some("sem motorista"))
            .await;
        // Pre-existing target rows, including one for a vehicle absent from the source day.
        seed_status(&store, vehicles[0].id, target, VehicleStatus::Funcionando, Some("ok")).await;
        seed_status(&store, vehicles[3].id, target, VehicleStatus::Funcionando, None).await;

        let who = operator();
        let report = copy_previous_day(&store, target, Some(&who)).await.unwrap();
        assert_eq!(report.copied, 3);

        let source_rows = store.list_statuses(DateRange::day(source)).await.unwrap();
        let target_rows = store.list_statuses(DateRange::day(target)).await.unwrap();
        assert_eq!(target_rows.len(), 3);
        for copied in &target_rows {
            assert_eq!(copied.date, target);
            assert_eq!(copied.created_by, who.user_id);
            let original = source_rows
                .iter()
                .find(|r| r.vehicle_id == copied.vehicle_id)
                .unwrap();
            assert_eq!(copied.status, original.status);
            assert_eq!(copied.observations, original.observations);
        }
        assert!(target_rows.iter().all(|r| r.vehicle_id != vehicles[3].id));
        assert_eq!(source_rows.len(), 3);
    }
}
