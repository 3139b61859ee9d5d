//! Pricing module - catalog enums, quote models, and the pure pricing rules.

mod model;
mod rules;

pub use model::{
    CoverageType, Quote, QuoteRequest, Region, COVERAGE_BLUE_YELLOW, COVERAGE_EPDM,
    COVERAGE_RED_GREEN,
};
pub use rules::{
    compute_quote, tier_coefficient, REASON_BELOW_MINIMUM_AREA, REASON_OUT_OF_SERVICE_AREA,
};
