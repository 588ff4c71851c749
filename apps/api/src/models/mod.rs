pub mod calendar;
pub mod observation;
pub mod status;
pub mod vehicle;

use thiserror::Error;

/// A wire or database label that does not name any known variant.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("unknown {kind} '{label}'")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub label: String,
}

impl UnknownLabel {
    pub fn new(kind: &'static str, label: &str) -> Self {
        Self {
            kind,
            label: label.to_string(),
        }
    }
}
