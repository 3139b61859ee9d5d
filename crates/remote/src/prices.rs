//! Cloud-backed implementation of [`RemotePriceStore`].
//!
//! The authoritative price record lives in a single `price_documents` row
//! tagged with a fixed document type. The row carries the full entry set as
//! a nested JSON map and a monotonically increasing version. Updates are a
//! compare-and-swap on that version: the PATCH filters on the version the
//! editor based their edit on, and an empty match means someone else won
//! the race (or no row exists yet, in which case the write becomes an
//! insert).

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use kover_core::auth::AdminSession;
use kover_core::constants::PRICE_DOCUMENT_TYPE;
use kover_core::errors::{Error, Result};
use kover_core::prices::{PriceDocument, PriceEntry, RemotePriceStore};
use kover_core::pricing::CoverageType;

use crate::client::RemoteClient;

const PRICE_DOCUMENTS_PATH: &str = "/rest/v1/price_documents";
const PROFILES_PATH: &str = "/rest/v1/profiles";

/// Price content as stored remotely: coverage type key to a map of
/// thickness label to unit price.
type PriceContent = HashMap<String, HashMap<String, Decimal>>;

#[derive(Debug, Deserialize)]
struct PriceDocumentRow {
    data_content: PriceContent,
    version: i64,
}

#[derive(Debug, Serialize)]
struct PriceDocumentWrite<'a> {
    doc_type: &'a str,
    data_content: &'a PriceContent,
    version: i64,
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    is_admin: bool,
}

/// [`RemotePriceStore`] backed by the PostgREST price document table.
pub struct RemotePriceClient {
    client: RemoteClient,
}

impl RemotePriceClient {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    async fn fetch_latest_row(&self) -> Result<PriceDocumentRow> {
        let path = format!(
            "{PRICE_DOCUMENTS_PATH}?select=data_content,version\
             &doc_type=eq.{PRICE_DOCUMENT_TYPE}&order=version.desc&limit=1"
        );
        let rows: Vec<PriceDocumentRow> = self.client.get_json(&path, None).await?;
        rows.into_iter().next().ok_or_else(|| {
            Error::NotFound(format!("no '{PRICE_DOCUMENT_TYPE}' document exists yet"))
        })
    }

    async fn insert_document(
        &self,
        content: &PriceContent,
        version: i64,
        session: &AdminSession,
    ) -> Result<i64> {
        let body = PriceDocumentWrite {
            doc_type: PRICE_DOCUMENT_TYPE,
            data_content: content,
            version,
        };
        let rows: Vec<PriceDocumentRow> = self
            .client
            .request_json(
                Method::POST,
                PRICE_DOCUMENTS_PATH,
                Some(&body),
                Some(&session.access_token),
                Some("return=representation"),
            )
            .await?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.version),
            None => Err(Error::Network(
                "insert returned no representation".to_string(),
            )),
        }
    }
}

#[async_trait]
impl RemotePriceStore for RemotePriceClient {
    async fn fetch_latest(&self) -> Result<PriceDocument> {
        let row = self.fetch_latest_row().await?;
        debug!("[remote] fetched price document v{}", row.version);
        Ok(PriceDocument {
            entries: entries_from_content(&row.data_content),
            version: row.version,
        })
    }

    async fn push_new_version(
        &self,
        entries: &[PriceEntry],
        base_version: i64,
        session: &AdminSession,
    ) -> Result<i64> {
        if !self.is_admin(session).await {
            return Err(Error::Permission(
                "price edits require an admin profile".to_string(),
            ));
        }

        let content = content_from_entries(entries);
        let next_version = base_version + 1;
        let body = PriceDocumentWrite {
            doc_type: PRICE_DOCUMENT_TYPE,
            data_content: &content,
            version: next_version,
        };

        // CAS: the filter only matches while the row still holds the version
        // this edit was based on.
        let path = format!(
            "{PRICE_DOCUMENTS_PATH}?doc_type=eq.{PRICE_DOCUMENT_TYPE}&version=eq.{base_version}"
        );
        let updated: Vec<PriceDocumentRow> = self
            .client
            .request_json(
                Method::PATCH,
                &path,
                Some(&body),
                Some(&session.access_token),
                Some("return=representation"),
            )
            .await?;
        if let Some(row) = updated.into_iter().next() {
            debug!("[remote] price document updated to v{}", row.version);
            return Ok(row.version);
        }

        // An empty match is ambiguous: either no document exists yet, or the
        // version moved. A follow-up fetch tells them apart.
        match self.fetch_latest_row().await {
            Err(Error::NotFound(_)) => {
                debug!("[remote] no price document, inserting v{next_version}");
                self.insert_document(&content, next_version, session).await
            }
            Ok(row) => {
                warn!(
                    "[remote] price push lost the race: based on v{base_version}, remote is v{}",
                    row.version
                );
                Err(Error::Conflict { base_version })
            }
            Err(e) => Err(e),
        }
    }

    async fn is_admin(&self, session: &AdminSession) -> bool {
        let path = format!(
            "{PROFILES_PATH}?id=eq.{}&select=is_admin",
            session.user_id
        );
        let rows: Result<Vec<ProfileRow>> = self
            .client
            .get_json(&path, Some(&session.access_token))
            .await;
        match rows {
            Ok(rows) => rows.first().map(|row| row.is_admin).unwrap_or(false),
            Err(e) => {
                warn!("[remote] admin lookup failed, denying: {e}");
                false
            }
        }
    }
}

/// Flattens the nested wire map into catalog entries.
///
/// Unknown coverage type keys are skipped with a warning so an old client
/// keeps working against a newer catalog.
fn entries_from_content(content: &PriceContent) -> Vec<PriceEntry> {
    let mut entries = Vec::new();
    for (type_key, by_thickness) in content {
        let Some(coverage_type) = resolve_coverage_type(type_key) else {
            warn!("[remote] skipping unknown coverage type '{type_key}'");
            continue;
        };
        for (thickness, unit_price) in by_thickness {
            entries.push(PriceEntry::new(coverage_type, thickness.clone(), *unit_price));
        }
    }
    entries
}

/// Resolves a wire key to a coverage type.
///
/// Documents written by older deployments key the map by the localized
/// catalog label instead of the stable identifier; both are accepted on
/// read, and writes always use the stable identifier.
fn resolve_coverage_type(key: &str) -> Option<CoverageType> {
    CoverageType::from_key(key).or_else(|| {
        CoverageType::ALL
            .iter()
            .copied()
            .find(|t| t.display_name() == key)
    })
}

fn content_from_entries(entries: &[PriceEntry]) -> PriceContent {
    let mut content: PriceContent = HashMap::new();
    for entry in entries {
        content
            .entry(entry.coverage_type.as_str().to_string())
            .or_default()
            .insert(entry.thickness.clone(), entry.unit_price);
    }
    content
}
