//! Pure pricing rules: region gate, minimum-area gate, and the area tier
//! coefficient.
//!
//! Smaller jobs cost disproportionately more per unit to service
//! (mobilization overhead); this is modeled as a step function over the
//! total area, a product decision carried over from the source price lists.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::model::{Quote, QuoteRequest};
use crate::constants::MIN_SERVICEABLE_AREA;

/// Rejection reason for jobs outside the service area.
pub const REASON_OUT_OF_SERVICE_AREA: &str =
    "Selected region is outside the service area; a manual cost review is required";

/// Rejection reason for jobs below the minimum area.
pub const REASON_BELOW_MINIMUM_AREA: &str =
    "Coverage area is below the 50 m2 minimum; a manual cost review is required";

/// Returns the surcharge coefficient for the given coverage area.
///
/// Inclusive bands, evaluated highest threshold first; the first match wins,
/// coefficients never stack:
///
/// - area >= 120       -> 1.0
/// - 100 <= area < 120 -> 1.2
/// - 70 <= area < 100  -> 2.0
/// - 50 <= area < 70   -> 3.0
///
/// Areas below 50 never reach this function; they are rejected upstream.
pub fn tier_coefficient(area: Decimal) -> Decimal {
    debug_assert!(area >= MIN_SERVICEABLE_AREA);
    if area >= dec!(120) {
        Decimal::ONE
    } else if area >= dec!(100) {
        dec!(1.2)
    } else if area >= dec!(70) {
        dec!(2.0)
    } else {
        dec!(3.0)
    }
}

/// Computes a quote from a request and the looked-up base unit price.
///
/// Pure and deterministic apart from the generated id and timestamp; no I/O.
/// Out-of-policy inputs (region outside the service area, area below the
/// minimum) produce a rejected quote with a human-readable reason rather
/// than an error.
///
/// Precondition: `request.area > 0`. Non-positive areas are a caller error
/// and must be filtered by validation before pricing runs.
pub fn compute_quote(request: &QuoteRequest, unit_price: Decimal) -> Quote {
    debug_assert!(request.area > Decimal::ZERO, "area must be validated upstream");

    let (unit_price, final_cost, rejection_reason) = if !request.region.is_serviceable() {
        (Decimal::ZERO, Decimal::ZERO, Some(REASON_OUT_OF_SERVICE_AREA))
    } else if request.area < MIN_SERVICEABLE_AREA {
        (Decimal::ZERO, Decimal::ZERO, Some(REASON_BELOW_MINIMUM_AREA))
    } else {
        let base_cost = request.area * unit_price;
        let final_cost = base_cost * tier_coefficient(request.area);
        (unit_price, final_cost, None)
    };

    Quote {
        id: Uuid::new_v4(),
        area: request.area,
        thickness: request.thickness.clone(),
        coverage_type: request.coverage_type,
        region: request.region,
        unit_price,
        final_cost,
        rejected: rejection_reason.is_some(),
        rejection_reason: rejection_reason.map(str::to_string),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::model::{CoverageType, Region};

    fn request(area: Decimal, region: Region) -> QuoteRequest {
        QuoteRequest {
            area,
            thickness: "10".to_string(),
            coverage_type: CoverageType::RedGreen,
            region,
        }
    }

    #[test]
    fn tier_bands_inclusive_lower_bounds() {
        assert_eq!(tier_coefficient(dec!(50)), dec!(3.0));
        assert_eq!(tier_coefficient(dec!(69.99)), dec!(3.0));
        assert_eq!(tier_coefficient(dec!(70)), dec!(2.0));
        assert_eq!(tier_coefficient(dec!(99.99)), dec!(2.0));
        assert_eq!(tier_coefficient(dec!(100)), dec!(1.2));
        assert_eq!(tier_coefficient(dec!(119.999)), dec!(1.2));
        assert_eq!(tier_coefficient(dec!(120)), Decimal::ONE);
        assert_eq!(tier_coefficient(dec!(5000)), Decimal::ONE);
    }

    #[test]
    fn red_green_80_sqm_in_moscow() {
        // 80 m2 at 1650/m2: base 132000, x2.0 band -> 264000
        let quote = compute_quote(&request(dec!(80), Region::Moscow), dec!(1650));
        assert!(!quote.rejected);
        assert_eq!(quote.unit_price, dec!(1650));
        assert_eq!(quote.final_cost, dec!(264000));
    }

    #[test]
    fn area_below_minimum_is_rejected() {
        let quote = compute_quote(&request(dec!(30), Region::Moscow), dec!(1650));
        assert!(quote.rejected);
        assert_eq!(quote.final_cost, Decimal::ZERO);
        assert_eq!(quote.unit_price, Decimal::ZERO);
        assert_eq!(quote.rejection_reason.as_deref(), Some(REASON_BELOW_MINIMUM_AREA));
    }

    #[test]
    fn any_area_below_fifty_is_rejected() {
        for area in ["0.1", "1", "25", "49.99"] {
            let area: Decimal = area.parse().unwrap();
            let quote = compute_quote(&request(area, Region::Moscow), dec!(2400));
            assert!(quote.rejected, "area {} should be rejected", area);
        }
    }

    #[test]
    fn out_of_region_is_rejected_regardless_of_area() {
        let quote = compute_quote(&request(dec!(200), Region::Other), dec!(1650));
        assert!(quote.rejected);
        assert_eq!(quote.final_cost, Decimal::ZERO);
        assert_eq!(quote.rejection_reason.as_deref(), Some(REASON_OUT_OF_SERVICE_AREA));
    }

    #[test]
    fn region_gate_fires_before_area_gate() {
        // Both gates would fire; the region reason must win.
        let quote = compute_quote(&request(dec!(10), Region::Other), dec!(1650));
        assert_eq!(quote.rejection_reason.as_deref(), Some(REASON_OUT_OF_SERVICE_AREA));
    }

    #[test]
    fn moscow_oblast_is_serviceable() {
        let quote = compute_quote(&request(dec!(120), Region::MoscowOblast), dec!(3000));
        assert!(!quote.rejected);
        assert_eq!(quote.final_cost, dec!(360000));
    }

    #[test]
    fn identical_inputs_price_identically() {
        let req = request(dec!(105), Region::Moscow);
        let first = compute_quote(&req, dec!(2400));
        let second = compute_quote(&req, dec!(2400));
        assert_eq!(first.final_cost, second.final_cost);
        assert_eq!(first.final_cost, dec!(105) * dec!(2400) * dec!(1.2));
        // Identity differs per calculation even when the money matches.
        assert_ne!(first.id, second.id);
    }
}
