use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UnknownLabel;

/// Operational status of a vehicle on one day.
///
/// Older rows may carry the split labels from the first timeline screen
/// ("Funcionando - Operando", "Manutenção - Equipamento", ...). Those are
/// accepted on read and folded into the canonical variant; writes always
/// use the canonical label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VehicleStatus {
    #[default]
    #[serde(
        rename = "Funcionando",
        alias = "Funcionando - Operando",
        alias = "Funcionando - Parado"
    )]
    Funcionando,
    #[serde(rename = "Quebrado")]
    Quebrado,
    #[serde(rename = "Emprestado")]
    Emprestado,
    #[serde(
        rename = "Manutenção",
        alias = "Manutenção - Veiculo",
        alias = "Manutenção - Equipamento"
    )]
    Manutencao,
    #[serde(rename = "Indisponível")]
    Indisponivel,
}

const LEGACY_LABELS: &[(&str, VehicleStatus)] = &[
    ("Funcionando - Operando", VehicleStatus::Funcionando),
    ("Funcionando - Parado", VehicleStatus::Funcionando),
    ("Manutenção - Veiculo", VehicleStatus::Manutencao),
    ("Manutenção - Equipamento", VehicleStatus::Manutencao),
];

impl VehicleStatus {
    /// Status assumed for a vehicle with no record on a given day.
    pub const BASELINE: VehicleStatus = VehicleStatus::Funcionando;

    pub const ALL: [VehicleStatus; 5] = [
        VehicleStatus::Funcionando,
        VehicleStatus::Quebrado,
        VehicleStatus::Emprestado,
        VehicleStatus::Manutencao,
        VehicleStatus::Indisponivel,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::Funcionando => "Funcionando",
            VehicleStatus::Quebrado => "Quebrado",
            VehicleStatus::Emprestado => "Emprestado",
            VehicleStatus::Manutencao => "Manutenção",
            VehicleStatus::Indisponivel => "Indisponível",
        }
    }

    pub fn is_operational(&self) -> bool {
        matches!(self, VehicleStatus::Funcionando)
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VehicleStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .or_else(|| {
                LEGACY_LABELS
                    .iter()
                    .find(|(legacy, _)| *legacy == s)
                    .map(|(_, status)| *status)
            })
            .ok_or_else(|| UnknownLabel::new("vehicle status", s))
    }
}

/// One vehicle's status on one calendar date. Unique per (vehicle_id, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub date: NaiveDate,
    pub status: VehicleStatus,
    pub observations: Option<String>,
    /// Per-day driver override; falls back to the vehicle's default driver.
    pub driver: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
