//! Price table domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::CoverageType;

/// A single unit price, keyed by (coverage type, thickness label).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub coverage_type: CoverageType,
    pub thickness: String,
    /// Price per square meter. Non-negative.
    pub unit_price: Decimal,
}

impl PriceEntry {
    pub fn new(
        coverage_type: CoverageType,
        thickness: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            coverage_type,
            thickness: thickness.into(),
            unit_price,
        }
    }

    /// Numeric prefix of the thickness label, for deterministic ordering.
    ///
    /// Composite labels like `"20+10"` sort by the integer before the `+`;
    /// labels without a leading integer sort as 0.
    pub fn thickness_sort_key(&self) -> u32 {
        thickness_numeric_prefix(&self.thickness)
    }
}

/// Parses the leading integer of a thickness label.
pub(crate) fn thickness_numeric_prefix(label: &str) -> u32 {
    let head = label.split('+').next().unwrap_or_default();
    head.parse().unwrap_or(0)
}

/// The authoritative remote price record: a full entry set plus the version
/// assigned by the remote authority on each accepted write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDocument {
    pub entries: Vec<PriceEntry>,
    pub version: i64,
}

/// Result of an admin price save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Saved locally and accepted by the remote store at this version.
    Synced { version: i64 },
    /// Saved locally only: the service was offline or the remote was
    /// unreachable. The edit is not lost; a later sync reconciles it.
    LocalOnly { version: i64 },
}

impl SaveOutcome {
    pub fn version(&self) -> i64 {
        match self {
            SaveOutcome::Synced { version } | SaveOutcome::LocalOnly { version } => *version,
        }
    }
}
