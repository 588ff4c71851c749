use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::error::ErrorKind;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::models::calendar::DateRange;
use crate::models::observation::DailyObservation;
use crate::models::status::StatusRecord;
use crate::models::vehicle::Vehicle;
use crate::store::{FleetStore, NewStatus, NewVehicle, StoreError, VehicleChanges};

const VEHICLE_COLUMNS: &str = "id, name, type, driver, created_at, updated_at";
const STATUS_COLUMNS: &str =
    "id, vehicle_id, date, status, observations, driver, created_by, created_at, updated_at";
const OBSERVATION_COLUMNS: &str = "id, date, content, created_by, created_at, updated_at";

#[derive(Debug, FromRow)]
struct VehicleRow {
    id: Uuid,
    name: String,
    #[sqlx(rename = "type")]
    category: String,
    driver: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = StoreError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        Ok(Vehicle {
            id: row.id,
            name: row.name,
            category: row.category.parse()?,
            driver: row.driver,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StatusRow {
    id: Uuid,
    vehicle_id: Uuid,
    date: NaiveDate,
    status: String,
    observations: Option<String>,
    driver: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StatusRow> for StatusRecord {
    type Error = StoreError;

    fn try_from(row: StatusRow) -> Result<Self, Self::Error> {
        Ok(StatusRecord {
            id: row.id,
            vehicle_id: row.vehicle_id,
            date: row.date,
            status: row.status.parse()?,
            observations: row.observations,
            driver: row.driver,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ObservationRow {
    id: Uuid,
    date: NaiveDate,
    content: String,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ObservationRow> for DailyObservation {
    fn from(row: ObservationRow) -> Self {
        DailyObservation {
            id: row.id,
            date: row.date,
            content: row.content,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Constraint violations become `StoreError::Constraint` so callers can tell
/// bad input apart from a failing database.
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if !matches!(db.kind(), ErrorKind::Other) {
            return StoreError::Constraint(db.message().to_string());
        }
    }
    StoreError::Database(err)
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[derive(Clone)]
pub struct PgFleetStore {
    pool: PgPool,
}

impl PgFleetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FleetStore for PgFleetStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        let rows = sqlx::query_as::<_, VehicleRow>(&format!(
            r#"SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY name COLLATE "C" ASC, id ASC"#
        ))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, StoreError> {
        sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Vehicle::try_from)
        .transpose()
    }

    async fn insert_vehicle(&self, vehicle: NewVehicle) -> Result<Vehicle, StoreError> {
        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            r#"
            INSERT INTO vehicles (id, name, type, driver, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {VEHICLE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&vehicle.name)
        .bind(vehicle.category.as_str())
        .bind(&vehicle.driver)
        .bind(vehicle.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        row.try_into()
    }

    async fn update_vehicle(
        &self,
        id: Uuid,
        changes: VehicleChanges,
    ) -> Result<Option<Vehicle>, StoreError> {
        sqlx::query_as::<_, VehicleRow>(&format!(
            r#"
            UPDATE vehicles
            SET name = $2, type = $3, driver = $4, updated_at = now()
            WHERE id = $1
            RETURNING {VEHICLE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(changes.category.as_str())
        .bind(&changes.driver)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .map(Vehicle::try_from)
        .transpose()
    }

    async fn delete_vehicle(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_statuses(&self, range: DateRange) -> Result<Vec<StatusRecord>, StoreError> {
        let rows = sqlx::query_as::<_, StatusRow>(&format!(
            r#"
            SELECT {STATUS_COLUMNS}
            FROM vehicle_status
            WHERE date BETWEEN $1 AND $2
            ORDER BY date ASC, vehicle_id ASC
            "#
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn get_status(
        &self,
        vehicle_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<StatusRecord>, StoreError> {
        sqlx::query_as::<_, StatusRow>(&format!(
            "SELECT {STATUS_COLUMNS} FROM vehicle_status WHERE vehicle_id = $1 AND date = $2"
        ))
        .bind(vehicle_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?
        .map(StatusRecord::try_from)
        .transpose()
    }

    async fn upsert_status(&self, status: NewStatus) -> Result<StatusRecord, StoreError> {
        let row = sqlx::query_as::<_, StatusRow>(&format!(
            r#"
            INSERT INTO vehicle_status
                (id, vehicle_id, date, status, observations, driver, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (vehicle_id, date) DO UPDATE
            SET status = EXCLUDED.status,
                observations = EXCLUDED.observations,
                driver = EXCLUDED.driver,
                created_by = EXCLUDED.created_by,
                updated_at = now()
            RETURNING {STATUS_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(status.vehicle_id)
        .bind(status.date)
        .bind(status.status.label())
        .bind(&status.observations)
        .bind(&status.driver)
        .bind(status.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        row.try_into()
    }

    async fn delete_statuses(&self, date: NaiveDate) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM vehicle_status WHERE date = $1")
            .bind(date)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn replace_statuses(
        &self,
        date: NaiveDate,
        rows: Vec<NewStatus>,
    ) -> Result<Vec<StatusRecord>, StoreError> {
        if let Some(stray) = rows.iter().find(|r| r.date != date) {
            return Err(StoreError::Constraint(format!(
                "replacement row dated {} does not belong to {date}",
                stray.date
            )));
        }

        // Dropping `tx` without commit rolls back, so a cancelled request
        // leaves the day as it was.
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM vehicle_status WHERE date = $1")
            .bind(date)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let insert = format!(
            r#"
            INSERT INTO vehicle_status
                (id, vehicle_id, date, status, observations, driver, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {STATUS_COLUMNS}
            "#
        );
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let record = sqlx::query_as::<_, StatusRow>(&insert)
                .bind(Uuid::new_v4())
                .bind(row.vehicle_id)
                .bind(row.date)
                .bind(row.status.label())
                .bind(&row.observations)
                .bind(&row.driver)
                .bind(row.created_by)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_db_error)?;
            inserted.push(StatusRecord::try_from(record)?);
        }

        tx.commit().await?;
        debug!(
            "Replaced {deleted} status rows on {date} with {}",
            inserted.len()
        );
        Ok(inserted)
    }

    async fn get_observation(
        &self,
        date: NaiveDate,
    ) -> Result<Option<DailyObservation>, StoreError> {
        Ok(sqlx::query_as::<_, ObservationRow>(&format!(
            "SELECT {OBSERVATION_COLUMNS} FROM daily_observations WHERE date = $1"
        ))
        .bind(date)
        .fetch_optional(&self.pool)
        .await?
        .map(DailyObservation::from))
    }

    async fn upsert_observation(
        &self,
        date: NaiveDate,
        content: String,
        created_by: Uuid,
    ) -> Result<DailyObservation, StoreError> {
        let row = sqlx::query_as::<_, ObservationRow>(&format!(
            r#"
            INSERT INTO daily_observations (id, date, content, created_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (date) DO UPDATE
            SET content = EXCLUDED.content,
                created_by = EXCLUDED.created_by,
                updated_at = now()
            RETURNING {OBSERVATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(date)
        .bind(&content)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(row.into())
    }

    async fn recent_observations(
        &self,
        limit: usize,
    ) -> Result<Vec<DailyObservation>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, ObservationRow>(&format!(
            "SELECT {OBSERVATION_COLUMNS} FROM daily_observations ORDER BY date DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(DailyObservation::from).collect())
    }
}
