//! Pricing domain models.
//!
//! `CoverageType` and `Region` are fixed product catalog enums carried over
//! from the source price lists. `Quote` is the immutable result of a pricing
//! run; out-of-policy requests become rejected quotes, never errors.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Constants
// =============================================================================

/// Stable coverage type identifiers, used as wire and cache keys.
pub const COVERAGE_RED_GREEN: &str = "RED_GREEN";
pub const COVERAGE_BLUE_YELLOW: &str = "BLUE_YELLOW";
pub const COVERAGE_EPDM: &str = "EPDM";

const RED_GREEN_THICKNESSES: &[&str] = &["10", "15", "20", "30", "40", "50"];
const BLUE_YELLOW_THICKNESSES: &[&str] = &["10", "15", "20", "30", "40", "50"];
const EPDM_THICKNESSES: &[&str] = &["10", "10+10", "20+10", "30+10", "40+10"];

// =============================================================================
// CoverageType
// =============================================================================

/// A category of rubber flooring product.
///
/// Each variant carries a fixed list of valid thickness labels. Composite
/// labels like `"20+10"` describe a two-layer build (base plus topping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageType {
    /// Standard granulate, red/green color mix.
    RedGreen,
    /// Standard granulate, blue/yellow color mix.
    BlueYellow,
    /// EPDM rubber, optionally with a granulate base layer.
    Epdm,
}

impl CoverageType {
    /// All coverage types in catalog order.
    pub const ALL: &'static [CoverageType] =
        &[CoverageType::RedGreen, CoverageType::BlueYellow, CoverageType::Epdm];

    /// Returns the stable string identifier for this coverage type.
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageType::RedGreen => COVERAGE_RED_GREEN,
            CoverageType::BlueYellow => COVERAGE_BLUE_YELLOW,
            CoverageType::Epdm => COVERAGE_EPDM,
        }
    }

    /// Localized catalog label, for display only.
    pub fn display_name(&self) -> &'static str {
        match self {
            CoverageType::RedGreen => "Обычное цвет красный/зеленый",
            CoverageType::BlueYellow => "Обычное цвет синий/желтый",
            CoverageType::Epdm => "ЕПДМ",
        }
    }

    /// Valid thickness labels for this coverage type, in catalog order.
    pub fn thicknesses(&self) -> &'static [&'static str] {
        match self {
            CoverageType::RedGreen => RED_GREEN_THICKNESSES,
            CoverageType::BlueYellow => BLUE_YELLOW_THICKNESSES,
            CoverageType::Epdm => EPDM_THICKNESSES,
        }
    }

    /// Whether `thickness` is a valid label for this coverage type.
    pub fn has_thickness(&self, thickness: &str) -> bool {
        self.thicknesses().contains(&thickness)
    }

    /// Parses a stable identifier. Returns None for unknown keys so callers
    /// can skip entries from newer catalogs instead of failing.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            COVERAGE_RED_GREEN => Some(CoverageType::RedGreen),
            COVERAGE_BLUE_YELLOW => Some(CoverageType::BlueYellow),
            COVERAGE_EPDM => Some(CoverageType::Epdm),
            _ => None,
        }
    }
}

impl std::fmt::Display for CoverageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Region
// =============================================================================

/// Delivery region of the job site. Only Moscow and Moscow Oblast are inside
/// the service area; everything else requires a manual estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Region {
    Moscow,
    MoscowOblast,
    Other,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Moscow => "MOSCOW",
            Region::MoscowOblast => "MOSCOW_OBLAST",
            Region::Other => "OTHER",
        }
    }

    /// Whether quotes for this region can be priced automatically.
    pub fn is_serviceable(&self) -> bool {
        matches!(self, Region::Moscow | Region::MoscowOblast)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// QuoteRequest
// =============================================================================

/// Transient input to a pricing run. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// Coverage area in square meters. Must be positive; bounds are enforced
    /// by the service before pricing runs.
    pub area: Decimal,
    pub thickness: String,
    pub coverage_type: CoverageType,
    pub region: Region,
}

// =============================================================================
// Quote
// =============================================================================

/// The result of applying the pricing rules to a request.
///
/// Invariant: `rejected == true` implies `final_cost == 0`, `unit_price == 0`
/// and a non-empty `rejection_reason`; `rejected == false` implies
/// `final_cost == area * unit_price * tier_coefficient(area)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Unique identity of this calculation, used as the history removal key.
    pub id: Uuid,
    pub area: Decimal,
    pub thickness: String,
    pub coverage_type: CoverageType,
    pub region: Region,
    /// Looked-up base unit price; zero when the quote was rejected.
    pub unit_price: Decimal,
    pub final_cost: Decimal,
    pub rejected: bool,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    /// Effective price per square meter including the tier coefficient.
    pub fn effective_unit_price(&self) -> Decimal {
        if self.area > Decimal::ZERO {
            self.final_cost / self.area
        } else {
            self.unit_price
        }
    }
}
