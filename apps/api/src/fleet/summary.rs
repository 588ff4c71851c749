//! Status counts for one day, bucketed for the dashboard charts.

use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::AppError;
use crate::fleet::daily::{load_daily_rows, DailyRow};
use crate::models::status::VehicleStatus;
use crate::models::vehicle::VehicleCategory;
use crate::store::FleetStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: VehicleStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: VehicleCategory,
    pub total: usize,
    pub statuses: Vec<StatusCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total: usize,
    pub operational: usize,
    /// Every status in canonical order, zeros included.
    pub statuses: Vec<StatusCount>,
    pub categories: Vec<CategorySummary>,
}

fn count_statuses<'a>(rows: impl Iterator<Item = &'a DailyRow> + Clone) -> Vec<StatusCount> {
    VehicleStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: rows.clone().filter(|r| r.status == status).count(),
        })
        .collect()
}

/// Rows without a stored record count under the baseline status.
pub fn summarize(date: NaiveDate, rows: &[DailyRow]) -> DaySummary {
    let categories = VehicleCategory::ALL
        .into_iter()
        .map(|category| {
            let in_category = rows.iter().filter(move |r| r.vehicle.category == category);
            CategorySummary {
                category,
                total: in_category.clone().count(),
                statuses: count_statuses(in_category),
            }
        })
        .collect();

    DaySummary {
        date,
        total: rows.len(),
        operational: rows.iter().filter(|r| r.status.is_operational()).count(),
        statuses: count_statuses(rows.iter()),
        categories,
    }
}

pub async fn load_summary(store: &dyn FleetStore, date: NaiveDate) -> Result<DaySummary, AppError> {
    let rows = load_daily_rows(store, date, None).await?;
    Ok(summarize(date, &rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::daily::build_daily_rows;
    use crate::fleet::testing::{date, record, vehicle};

    fn count(counts: &[StatusCount], status: VehicleStatus) -> usize {
        counts.iter().find(|c| c.status == status).unwrap().count
    }

    #[test]
    fn test_summary_counts_baseline_and_recorded_rows() {
        let day = date(2024, 5, 10);
        let a = vehicle("A", VehicleCategory::Destack, None);
        let b = vehicle("B", VehicleCategory::Destack, None);
        let c = vehicle("C", VehicleCategory::Embasa, None);
        let records = vec![
            record(a.id, day, VehicleStatus::Quebrado),
            record(c.id, day, VehicleStatus::Emprestado),
        ];
        let rows = build_daily_rows(&[a, b, c], &records, day);

        let summary = summarize(day, &rows);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.operational, 1);
        assert_eq!(summary.statuses.len(), VehicleStatus::ALL.len());
        assert_eq!(count(&summary.statuses, VehicleStatus::Quebrado), 1);
        assert_eq!(count(&summary.statuses, VehicleStatus::Emprestado), 1);
        assert_eq!(count(&summary.statuses, VehicleStatus::Funcionando), 1);
        assert_eq!(count(&summary.statuses, VehicleStatus::Indisponivel), 0);

        let destack = &summary.categories[0];
        assert_eq!(destack.category, VehicleCategory::Destack);
        assert_eq!(destack.total, 2);
        assert_eq!(count(&destack.statuses, VehicleStatus::Quebrado), 1);
        let outros = &summary.categories[2];
        assert_eq!(outros.total, 0);
        assert!(outros.statuses.iter().all(|c| c.count == 0));
    }

    #[test]
    fn test_empty_roster() {
        let summary = summarize(date(2024, 5, 10), &[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.categories.len(), 3);
    }
}
