//! Tests for the price service state machine and save orchestration.
//!
//! Contract points covered here:
//!
//! 1. Initialization: cloud success, missing document, network failure,
//!    timeout, and the no-silent-downgrade rule for online re-checks.
//! 2. Quoting: validation bounds and the zero price sentinel.
//! 3. Admin saves: permission gating, local-first persistence, version
//!    conflict on concurrent edits, offline outcomes.

use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::auth::AdminSession;
use crate::errors::{Error, Result};
use crate::pricing::{CoverageType, QuoteRequest, Region};
use crate::prices::{
    default_entries, BlobStore, LocalPriceStore, PriceDocument, PriceEntry, PriceService,
    RemotePriceStore, SaveOutcome, ServiceMode,
};

const INIT_TIMEOUT: Duration = Duration::from_millis(200);

// =============================================================================
// Mock BlobStore
// =============================================================================

#[derive(Default)]
struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryBlobStore {
    fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }

    fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.lock().unwrap().get(key).cloned())
    }

    async fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage("disk full".into()));
        }
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn remove_blob(&self, key: &str) -> Result<()> {
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }
}

// =============================================================================
// Mock RemotePriceStore
// =============================================================================

struct MockRemoteStore {
    document: Mutex<Option<PriceDocument>>,
    admins: Mutex<HashSet<String>>,
    fail_network: AtomicBool,
    fail_push: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
}

impl MockRemoteStore {
    fn new(document: Option<PriceDocument>) -> Self {
        Self {
            document: Mutex::new(document),
            admins: Mutex::new(HashSet::new()),
            fail_network: AtomicBool::new(false),
            fail_push: AtomicBool::new(false),
            fetch_delay: Mutex::new(None),
        }
    }

    fn with_admin(self, user_id: &str) -> Self {
        self.admins.lock().unwrap().insert(user_id.to_string());
        self
    }

    fn set_fail_network(&self, fail: bool) {
        self.fail_network.store(fail, Ordering::SeqCst);
    }

    /// Fails the push only, leaving the admin lookup working. Models a
    /// connection dropping between the permission check and the write.
    fn set_push_network_failure(&self, fail: bool) {
        self.fail_push.store(fail, Ordering::SeqCst);
    }

    fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    fn document_version(&self) -> Option<i64> {
        self.document.lock().unwrap().as_ref().map(|d| d.version)
    }

    fn overwrite_document(&self, document: PriceDocument) {
        *self.document.lock().unwrap() = Some(document);
    }
}

#[async_trait]
impl RemotePriceStore for MockRemoteStore {
    async fn fetch_latest(&self) -> Result<PriceDocument> {
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_network.load(Ordering::SeqCst) {
            return Err(Error::Network("connection refused".into()));
        }
        self.document
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::NotFound("no price document".into()))
    }

    async fn push_new_version(
        &self,
        entries: &[PriceEntry],
        base_version: i64,
        session: &AdminSession,
    ) -> Result<i64> {
        if !self.is_admin(session).await {
            return Err(Error::Permission("not an admin".into()));
        }
        if self.fail_network.load(Ordering::SeqCst) || self.fail_push.load(Ordering::SeqCst) {
            return Err(Error::Network("connection refused".into()));
        }

        // Compare-and-swap on the stored version, like the real store's
        // filtered update.
        let mut document = self.document.lock().unwrap();
        match document.as_ref() {
            Some(current) if current.version != base_version => {
                Err(Error::Conflict { base_version })
            }
            _ => {
                let version = base_version + 1;
                *document = Some(PriceDocument {
                    entries: entries.to_vec(),
                    version,
                });
                Ok(version)
            }
        }
    }

    async fn is_admin(&self, session: &AdminSession) -> bool {
        // Yield so concurrent saves genuinely interleave in tests.
        tokio::task::yield_now().await;
        !self.fail_network.load(Ordering::SeqCst)
            && self.admins.lock().unwrap().contains(&session.user_id)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn admin_session() -> AdminSession {
    AdminSession::new("admin-1", "token", true)
}

fn custom_entries() -> Vec<PriceEntry> {
    vec![
        PriceEntry::new(CoverageType::RedGreen, "10", dec!(1700)),
        PriceEntry::new(CoverageType::Epdm, "20+10", dec!(5800)),
    ]
}

fn service_with(
    blobs: Arc<MemoryBlobStore>,
    remote: Option<Arc<MockRemoteStore>>,
) -> PriceService {
    PriceService::new(blobs, remote.map(|r| r as Arc<dyn RemotePriceStore>))
}

fn quote_request(area: rust_decimal::Decimal) -> QuoteRequest {
    QuoteRequest {
        area,
        thickness: "10".to_string(),
        coverage_type: CoverageType::RedGreen,
        region: Region::Moscow,
    }
}

// =============================================================================
// Initialization
// =============================================================================

#[tokio::test]
async fn cloud_init_hydrates_table_and_caches_locally() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let remote = Arc::new(MockRemoteStore::new(Some(PriceDocument {
        entries: custom_entries(),
        version: 3,
    })));
    let service = service_with(Arc::clone(&blobs), Some(remote));

    let mode = service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();

    assert_eq!(mode, ServiceMode::Online);
    assert_eq!(service.mode_label(), "online");
    assert_eq!(service.current_version(), 3);
    assert_eq!(service.get_price(CoverageType::RedGreen, "10"), dec!(1700));

    let cached = LocalPriceStore::new(blobs).load().await.unwrap();
    assert_eq!(cached.version, 3);
}

#[tokio::test]
async fn missing_remote_document_seeds_defaults_and_goes_online() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let remote = Arc::new(MockRemoteStore::new(None));
    let service = service_with(blobs, Some(remote));

    let mode = service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();

    assert_eq!(mode, ServiceMode::Online);
    assert_eq!(service.current_version(), 0);
    assert_eq!(service.get_price(CoverageType::RedGreen, "10"), dec!(1650));
}

#[tokio::test]
async fn network_failure_falls_back_to_cached_snapshot() {
    let blobs = Arc::new(MemoryBlobStore::default());
    LocalPriceStore::new(Arc::clone(&blobs) as Arc<dyn BlobStore>)
        .save(&custom_entries(), 5)
        .await
        .unwrap();

    let remote = Arc::new(MockRemoteStore::new(None));
    remote.set_fail_network(true);
    let service = service_with(blobs, Some(remote));

    let mode = service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();

    assert_eq!(mode, ServiceMode::Offline);
    assert_eq!(service.mode_label(), "offline");
    assert_eq!(service.current_version(), 5);
    assert_eq!(service.get_price(CoverageType::Epdm, "20+10"), dec!(5800));
}

#[tokio::test]
async fn slow_remote_times_out_into_usable_offline_service() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let remote = Arc::new(MockRemoteStore::new(Some(PriceDocument {
        entries: custom_entries(),
        version: 9,
    })));
    remote.set_fetch_delay(Duration::from_secs(30));
    let service = service_with(blobs, Some(remote));

    let mode = service
        .initialize_with_cloud(Duration::from_millis(50))
        .await
        .unwrap();

    assert_eq!(mode, ServiceMode::Offline);
    // Bundled defaults keep quoting usable; nothing throws.
    assert_eq!(service.get_price(CoverageType::RedGreen, "10"), dec!(1650));
    let quote = service.quote(&quote_request(dec!(120))).unwrap();
    assert!(!quote.rejected);
}

#[tokio::test]
async fn failed_recheck_never_downgrades_an_online_service() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let remote = Arc::new(MockRemoteStore::new(Some(PriceDocument {
        entries: custom_entries(),
        version: 3,
    })));
    let service = service_with(blobs, Some(Arc::clone(&remote)));
    service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();

    remote.set_fail_network(true);
    let mode = service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();

    assert_eq!(mode, ServiceMode::Online);
    assert_eq!(service.current_version(), 3);
}

#[tokio::test]
async fn offline_service_upgrades_on_successful_recheck() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let remote = Arc::new(MockRemoteStore::new(Some(PriceDocument {
        entries: custom_entries(),
        version: 3,
    })));
    remote.set_fail_network(true);
    let service = service_with(blobs, Some(Arc::clone(&remote)));

    assert_eq!(
        service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap(),
        ServiceMode::Offline
    );

    remote.set_fail_network(false);
    assert_eq!(
        service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap(),
        ServiceMode::Online
    );
    assert_eq!(service.current_version(), 3);
}

#[tokio::test]
async fn unconfigured_remote_initializes_offline() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let service = service_with(blobs, None);

    let mode = service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();

    assert_eq!(mode, ServiceMode::Offline);
    assert_eq!(service.get_price(CoverageType::BlueYellow, "15"), dec!(2640));
}

#[tokio::test]
async fn failed_cache_write_keeps_in_memory_table_correct() {
    let blobs = Arc::new(MemoryBlobStore::default());
    blobs.set_fail_writes(true);
    let remote = Arc::new(MockRemoteStore::new(Some(PriceDocument {
        entries: custom_entries(),
        version: 2,
    })));
    let service = service_with(Arc::clone(&blobs), Some(remote));

    let mode = service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();

    // Storage failure is logged, never fatal.
    assert_eq!(mode, ServiceMode::Online);
    assert_eq!(service.get_price(CoverageType::RedGreen, "10"), dec!(1700));
    assert!(!blobs.contains("prices"));
}

// =============================================================================
// Quoting
// =============================================================================

#[tokio::test]
async fn quote_rejects_areas_outside_validation_bounds() {
    let service = service_with(Arc::new(MemoryBlobStore::default()), None);
    service.initialize_local().await;

    assert!(matches!(
        service.quote(&quote_request(dec!(0))),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        service.quote(&quote_request(dec!(0.05))),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        service.quote(&quote_request(dec!(10001))),
        Err(Error::Validation(_))
    ));
}

#[tokio::test]
async fn quote_rejects_unknown_thickness() {
    let service = service_with(Arc::new(MemoryBlobStore::default()), None);
    service.initialize_local().await;

    let request = QuoteRequest {
        area: dec!(80),
        thickness: "10+10".to_string(), // valid for EPDM, not for granulate
        coverage_type: CoverageType::RedGreen,
        region: Region::Moscow,
    };
    assert!(matches!(service.quote(&request), Err(Error::Validation(_))));
}

#[tokio::test]
async fn quote_prices_from_the_hydrated_table() {
    let service = service_with(Arc::new(MemoryBlobStore::default()), None);
    service.initialize_local().await;

    let quote = service.quote(&quote_request(dec!(80))).unwrap();
    assert!(!quote.rejected);
    assert_eq!(quote.unit_price, dec!(1650));
    assert_eq!(quote.final_cost, dec!(264000));
}

#[tokio::test]
async fn identical_requests_quote_identically() {
    let service = service_with(Arc::new(MemoryBlobStore::default()), None);
    service.initialize_local().await;

    let request = quote_request(dec!(105));
    let first = service.quote(&request).unwrap();
    let second = service.quote(&request).unwrap();
    assert_eq!(first.final_cost, second.final_cost);
}

// =============================================================================
// Admin save
// =============================================================================

#[tokio::test]
async fn offline_save_is_local_only_with_version_bump() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let service = service_with(Arc::clone(&blobs), None);
    service.initialize_local().await;

    let outcome = service
        .save_admin_prices(&custom_entries(), None)
        .await
        .unwrap();

    assert_eq!(outcome, SaveOutcome::LocalOnly { version: 1 });
    assert_eq!(service.get_price(CoverageType::RedGreen, "10"), dec!(1700));
    assert!(blobs.contains("prices"));
}

#[tokio::test]
async fn online_save_without_admin_rights_writes_nothing() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let remote = Arc::new(MockRemoteStore::new(Some(PriceDocument {
        entries: default_entries(),
        version: 5,
    })));
    let service = service_with(Arc::clone(&blobs), Some(Arc::clone(&remote)));
    service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();
    blobs.blobs.lock().unwrap().clear();

    let session = AdminSession::new("viewer-1", "token", false);
    let err = service
        .save_admin_prices(&custom_entries(), Some(&session))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Permission(_)));
    assert_eq!(remote.document_version(), Some(5));
    assert_eq!(service.get_price(CoverageType::RedGreen, "10"), dec!(1650));
    assert!(!blobs.contains("prices"));
}

#[tokio::test]
async fn online_save_without_session_is_rejected() {
    let remote = Arc::new(MockRemoteStore::new(Some(PriceDocument {
        entries: default_entries(),
        version: 5,
    })));
    let service = service_with(Arc::new(MemoryBlobStore::default()), Some(remote));
    service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();

    let err = service
        .save_admin_prices(&custom_entries(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Permission(_)));
}

#[tokio::test]
async fn online_save_syncs_and_advances_the_version() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let remote = Arc::new(
        MockRemoteStore::new(Some(PriceDocument {
            entries: default_entries(),
            version: 5,
        }))
        .with_admin("admin-1"),
    );
    let service = service_with(Arc::clone(&blobs), Some(Arc::clone(&remote)));
    service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();

    let outcome = service
        .save_admin_prices(&custom_entries(), Some(&admin_session()))
        .await
        .unwrap();

    assert_eq!(outcome, SaveOutcome::Synced { version: 6 });
    assert_eq!(service.current_version(), 6);
    assert_eq!(remote.document_version(), Some(6));
    let cached = LocalPriceStore::new(blobs).load().await.unwrap();
    assert_eq!(cached.version, 6);
}

#[tokio::test]
async fn save_rejects_out_of_bounds_prices_before_any_io() {
    let remote = Arc::new(MockRemoteStore::new(Some(PriceDocument {
        entries: default_entries(),
        version: 5,
    })));
    let service = service_with(Arc::new(MemoryBlobStore::default()), Some(Arc::clone(&remote)));
    service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();

    let bad = vec![PriceEntry::new(CoverageType::RedGreen, "10", dec!(100001))];
    let err = service
        .save_admin_prices(&bad, Some(&admin_session()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(remote.document_version(), Some(5));
}

#[tokio::test]
async fn push_failure_downgrades_to_local_only_without_rollback() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let remote = Arc::new(
        MockRemoteStore::new(Some(PriceDocument {
            entries: default_entries(),
            version: 5,
        }))
        .with_admin("admin-1"),
    );
    let service = service_with(Arc::clone(&blobs), Some(Arc::clone(&remote)));
    service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();

    // Admin check passes, then the push itself hits the network failure.
    remote.set_push_network_failure(true);
    let outcome = service
        .save_admin_prices(&custom_entries(), Some(&admin_session()))
        .await
        .unwrap();

    assert_eq!(outcome, SaveOutcome::LocalOnly { version: 6 });
    assert_eq!(service.get_price(CoverageType::RedGreen, "10"), dec!(1700));
    assert_eq!(remote.document_version(), Some(5));
}

#[tokio::test]
async fn concurrent_saves_from_the_same_base_conflict() {
    let remote = Arc::new(
        MockRemoteStore::new(Some(PriceDocument {
            entries: default_entries(),
            version: 5,
        }))
        .with_admin("admin-1"),
    );
    let service = service_with(Arc::new(MemoryBlobStore::default()), Some(remote));
    service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();

    let first_edit = vec![PriceEntry::new(CoverageType::RedGreen, "10", dec!(1700))];
    let second_edit = vec![PriceEntry::new(CoverageType::RedGreen, "10", dec!(1800))];
    let session = admin_session();

    let (first, second) = futures::join!(
        service.save_admin_prices(&first_edit, Some(&session)),
        service.save_admin_prices(&second_edit, Some(&session)),
    );

    // Exactly one write wins with version 6; the other must surface a
    // conflict, never version 7 or a silent overwrite.
    let outcomes = [first, second];
    let wins = outcomes
        .iter()
        .filter(|r| matches!(r, Ok(SaveOutcome::Synced { version: 6 })))
        .count();
    let conflicts = outcomes
        .iter()
        .filter(|r| matches!(r, Err(Error::Conflict { base_version: 5 })))
        .count();
    assert_eq!((wins, conflicts), (1, 1), "outcomes: {outcomes:?}");
    assert_eq!(service.current_version(), 6);
}

#[tokio::test]
async fn externally_advanced_version_surfaces_a_conflict() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let remote = Arc::new(
        MockRemoteStore::new(Some(PriceDocument {
            entries: default_entries(),
            version: 5,
        }))
        .with_admin("admin-1"),
    );
    let service = service_with(blobs, Some(Arc::clone(&remote)));
    service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();

    // Another admin saved from a different device in the meantime.
    remote.overwrite_document(PriceDocument {
        entries: default_entries(),
        version: 9,
    });

    let err = service
        .save_admin_prices(&custom_entries(), Some(&admin_session()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { base_version: 5 }));

    // Refresh then retry succeeds from the new base.
    service.initialize_with_cloud(INIT_TIMEOUT).await.unwrap();
    let outcome = service
        .save_admin_prices(&custom_entries(), Some(&admin_session()))
        .await
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Synced { version: 10 });
}
