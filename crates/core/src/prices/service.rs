//! Price service: mode selection, quoting entry point, and admin save
//! orchestration.
//!
//! The service owns the only mutable shared resource (the price table) and
//! funnels every mutation through its own methods. Initialization attempts
//! the cloud first and degrades to the local cache; admin saves persist
//! locally before the remote push so edits survive a network failure.

use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::defaults::{default_entries, DEFAULT_PRICES_VERSION};
use super::local::LocalPriceStore;
use super::model::{PriceEntry, SaveOutcome};
use super::store::{BlobStore, RemotePriceStore};
use super::table::PriceTable;
use crate::auth::AdminSession;
use crate::errors::{Error, Result, ValidationError};
use crate::pricing::{compute_quote, Quote, QuoteRequest};
use crate::validation::{validate_area, validate_price};

/// Connectivity mode of the service.
///
/// `Online` is only entered through a successful cloud fetch and is never
/// silently downgraded within a session; a failed on-demand re-check leaves
/// an online service online with its current table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    Uninitialized,
    Online,
    Offline,
}

impl ServiceMode {
    /// Display label. Anything that is not online reads as offline.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceMode::Online => "online",
            ServiceMode::Uninitialized | ServiceMode::Offline => "offline",
        }
    }
}

pub struct PriceService {
    table: PriceTable,
    local: LocalPriceStore,
    remote: Option<Arc<dyn RemotePriceStore>>,
    mode: RwLock<ServiceMode>,
}

impl PriceService {
    /// Constructs an uninitialized service. Pass `remote: None` to force
    /// offline-only operation (e.g. when the remote endpoint is not
    /// configured).
    pub fn new(blobs: Arc<dyn BlobStore>, remote: Option<Arc<dyn RemotePriceStore>>) -> Self {
        Self {
            table: PriceTable::new(),
            local: LocalPriceStore::new(blobs),
            remote,
            mode: RwLock::new(ServiceMode::Uninitialized),
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Attempts cloud initialization under the given timeout.
    ///
    /// On success the table is hydrated from the remote document (or bundled
    /// defaults when no document exists yet), the snapshot is cached locally,
    /// and the service goes online. A timeout is treated like any other
    /// network failure: the service falls back to the local cache and goes
    /// offline. Re-invoking this while already online never downgrades the
    /// service on failure.
    pub async fn initialize_with_cloud(&self, timeout: Duration) -> Result<ServiceMode> {
        let Some(remote) = self.remote.clone() else {
            info!("No remote price store configured; initializing locally");
            return Ok(self.initialize_local().await);
        };

        let fetched = match tokio::time::timeout(timeout, remote.fetch_latest()).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Cloud price fetch timed out after {timeout:?}");
                return Ok(self.degrade_or_keep_online().await);
            }
        };

        match fetched {
            Ok(document) => {
                self.hydrate(&document.entries, document.version);
                self.persist_snapshot().await;
                self.set_mode(ServiceMode::Online);
                info!(
                    "Connected to cloud price store (version {})",
                    self.table.current_version()
                );
                Ok(ServiceMode::Online)
            }
            Err(Error::NotFound(_)) => {
                // Connected, but no price document exists yet. Seed from the
                // bundled defaults; the first admin save creates the document.
                info!("No remote price document yet; seeding bundled defaults");
                self.hydrate(&default_entries(), DEFAULT_PRICES_VERSION);
                self.persist_snapshot().await;
                self.set_mode(ServiceMode::Online);
                Ok(ServiceMode::Online)
            }
            Err(e) => {
                warn!("Cloud price fetch failed: {e}");
                Ok(self.degrade_or_keep_online().await)
            }
        }
    }

    /// Initializes from the local cache, or bundled defaults when no cache
    /// exists. Explicit offline choice; also the fallback path of
    /// `initialize_with_cloud`.
    pub async fn initialize_local(&self) -> ServiceMode {
        match self.local.load().await {
            Some(document) => {
                info!(
                    "Hydrating price table from local cache (version {})",
                    document.version
                );
                self.hydrate(&document.entries, document.version);
            }
            None => {
                info!("No local price cache; using bundled defaults");
                self.hydrate(&default_entries(), DEFAULT_PRICES_VERSION);
            }
        }
        self.set_mode(ServiceMode::Offline);
        ServiceMode::Offline
    }

    async fn degrade_or_keep_online(&self) -> ServiceMode {
        if self.mode() == ServiceMode::Online {
            // No silent downgrade mid-session; keep serving the current table.
            warn!("Cloud re-check failed; staying online with the current table");
            ServiceMode::Online
        } else {
            self.initialize_local().await
        }
    }

    /// Replaces the table, treating an equal-version replacement as already
    /// current. That happens on a re-initialization that fetches the same
    /// version the table already holds.
    fn hydrate(&self, entries: &[PriceEntry], version: i64) {
        match self.table.replace_all(entries, version) {
            Ok(()) => {}
            Err(Error::StaleVersion { current, proposed }) => {
                debug!("Table already at version {current} (fetched {proposed}); keeping it");
            }
            Err(e) => error!("Failed to hydrate price table: {e}"),
        }
    }

    /// Best-effort local persistence of the current table. Failures are
    /// logged and never propagate; the in-memory table stays correct.
    async fn persist_snapshot(&self) {
        let entries = self.table.snapshot_all();
        if let Err(e) = self.local.save(&entries, self.table.current_version()).await {
            warn!("Failed to cache price table locally: {e}");
        }
    }

    // =========================================================================
    // Lookup and quoting
    // =========================================================================

    /// Current connectivity mode.
    pub fn mode(&self) -> ServiceMode {
        match self.mode.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// "online" or "offline", for display only.
    pub fn mode_label(&self) -> &'static str {
        self.mode().label()
    }

    fn set_mode(&self, mode: ServiceMode) {
        let mut guard = self
            .mode
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = mode;
    }

    /// Unit price for a coverage type and thickness, or zero when unknown.
    ///
    /// The zero sentinel keeps quoting usable while prices are missing;
    /// contexts that must distinguish price-unknown use the table directly.
    pub fn get_price(&self, coverage_type: crate::pricing::CoverageType, thickness: &str) -> Decimal {
        self.table
            .get(coverage_type, thickness)
            .unwrap_or(Decimal::ZERO)
    }

    /// Every price entry, sorted for display.
    pub fn list_prices(&self) -> Vec<PriceEntry> {
        self.table.snapshot_all()
    }

    /// Version of the current price table.
    pub fn current_version(&self) -> i64 {
        self.table.current_version()
    }

    /// Validates the request and computes a quote.
    ///
    /// Out-of-policy inputs (region, minimum area) come back as rejected
    /// quotes; only malformed input (area outside [0.1, 10000], a thickness
    /// the coverage type does not have) is an error.
    pub fn quote(&self, request: &QuoteRequest) -> Result<Quote> {
        validate_area(request.area)?;
        if !request.coverage_type.has_thickness(&request.thickness) {
            return Err(ValidationError::UnknownThickness(
                request.thickness.clone(),
                request.coverage_type.to_string(),
            )
            .into());
        }
        let unit_price = self.get_price(request.coverage_type, &request.thickness);
        Ok(compute_quote(request, unit_price))
    }

    // =========================================================================
    // Admin save
    // =========================================================================

    /// Saves an admin-edited price set.
    ///
    /// The edit is always written to the local cache before any remote push,
    /// so it is never lost to a network failure. When online, the push is
    /// admin-gated (a permission rejection writes nothing at all) and
    /// version-guarded: a concurrent edit surfaces as `Error::Conflict` and
    /// the caller refreshes and retries. A push that fails on transport
    /// downgrades the outcome to `SaveOutcome::LocalOnly` instead of rolling
    /// anything back.
    pub async fn save_admin_prices(
        &self,
        entries: &[PriceEntry],
        session: Option<&AdminSession>,
    ) -> Result<SaveOutcome> {
        for entry in entries {
            validate_price(entry.unit_price)?;
            if !entry.coverage_type.has_thickness(&entry.thickness) {
                return Err(ValidationError::UnknownThickness(
                    entry.thickness.clone(),
                    entry.coverage_type.to_string(),
                )
                .into());
            }
        }

        let base_version = self.table.current_version();

        let remote = match (self.mode(), self.remote.as_ref()) {
            (ServiceMode::Online, Some(remote)) => remote,
            _ => return self.save_locally(entries, base_version).await,
        };

        let session = session
            .ok_or_else(|| Error::Permission("admin sign-in required to save prices".into()))?;
        if !remote.is_admin(session).await {
            return Err(Error::Permission(
                "current user does not hold admin rights".into(),
            ));
        }

        // Local write first: the edit survives a failed push.
        if let Err(e) = self.local.save(entries, base_version).await {
            warn!("Failed to pre-cache admin edit locally: {e}");
        }

        match remote.push_new_version(entries, base_version, session).await {
            Ok(version) => {
                self.hydrate(entries, version);
                self.persist_snapshot().await;
                info!("Admin prices synced to cloud at version {version}");
                Ok(SaveOutcome::Synced { version })
            }
            Err(e) if e.is_network() => {
                warn!("Cloud push failed, keeping local save: {e}");
                let outcome = self.save_locally(entries, base_version).await?;
                Ok(outcome)
            }
            Err(e) => Err(e),
        }
    }

    /// Applies an edit locally with an optimistic version bump. A later push
    /// whose base no longer matches the remote surfaces a conflict and the
    /// admin re-fetches; local edits are never silently clobbered either way.
    async fn save_locally(&self, entries: &[PriceEntry], base_version: i64) -> Result<SaveOutcome> {
        let version = base_version + 1;
        self.hydrate(entries, version);
        if let Err(e) = self.local.save(entries, version).await {
            warn!("Failed to cache admin edit locally: {e}");
        }
        info!("Admin prices saved locally at version {version} (cloud not synced)");
        Ok(SaveOutcome::LocalOnly { version })
    }
}
