//! Bundled default price table.
//!
//! Used when neither the remote store nor a local cache is available, and to
//! seed a brand-new deployment before the first admin save. Prices are the
//! shipped catalog values in rubles per square meter.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::model::PriceEntry;
use crate::pricing::CoverageType;

const RED_GREEN_PRICES: &[(&str, Decimal)] = &[
    ("10", dec!(1650)),
    ("15", dec!(2400)),
    ("20", dec!(3000)),
    ("30", dec!(4400)),
    ("40", dec!(5800)),
    ("50", dec!(7500)),
];

const BLUE_YELLOW_PRICES: &[(&str, Decimal)] = &[
    ("10", dec!(1815)),
    ("15", dec!(2640)),
    ("20", dec!(3300)),
    ("30", dec!(4840)),
    ("40", dec!(6380)),
    ("50", dec!(8250)),
];

const EPDM_PRICES: &[(&str, Decimal)] = &[
    ("10", dec!(3000)),
    ("10+10", dec!(3900)),
    ("20+10", dec!(5650)),
    ("30+10", dec!(6100)),
    ("40+10", dec!(7600)),
];

/// Version assigned to the bundled defaults. Any accepted remote write
/// produces a strictly greater version.
pub const DEFAULT_PRICES_VERSION: i64 = 0;

/// Returns the bundled default price entries for every coverage type.
pub fn default_entries() -> Vec<PriceEntry> {
    let catalog = [
        (CoverageType::RedGreen, RED_GREEN_PRICES),
        (CoverageType::BlueYellow, BLUE_YELLOW_PRICES),
        (CoverageType::Epdm, EPDM_PRICES),
    ];

    catalog
        .into_iter()
        .flat_map(|(coverage_type, prices)| {
            prices
                .iter()
                .map(move |(thickness, price)| PriceEntry::new(coverage_type, *thickness, *price))
        })
        .collect()
}
