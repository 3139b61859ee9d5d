//! Shared constants for the price engine.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

/// Blob key under which the price table snapshot is cached locally.
pub const PRICE_CACHE_KEY: &str = "prices";

/// Blob key under which the quote history is persisted.
pub const HISTORY_KEY: &str = "history";

/// Document type tag of the authoritative remote price record.
pub const PRICE_DOCUMENT_TYPE: &str = "prices";

/// Smallest quotable coverage area.
pub const MIN_AREA: Decimal = dec!(0.1);

/// Largest quotable coverage area.
pub const MAX_AREA: Decimal = dec!(10000);

/// Largest accepted unit price for admin edits.
pub const MAX_UNIT_PRICE: Decimal = dec!(100000);

/// Quotes below this area are rejected for manual review.
pub const MIN_SERVICEABLE_AREA: Decimal = dec!(50);

/// Maximum number of quotes kept in the calculation history.
pub const HISTORY_CAPACITY: usize = 10;

/// Recommended timeout for the initial cloud fetch. Exceeding it falls back
/// to offline mode with cached or bundled prices.
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(3);
