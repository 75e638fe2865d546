use std::collections::HashSet;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::{AvailabilityBackend, AvailabilityError, BackendConfigError};
use crate::config::SheetsConfig;
use crate::models::BookingRecord;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Availability index backed by a Google Sheets worksheet. Bookings are
/// appended as rows, never rewritten; existence checks scan the sheet
/// unless a local cache of known-booked slots is enabled.
pub struct SheetsBackend {
    client: reqwest::Client,
    spreadsheet_id: String,
    worksheet: String,
    api_token: String,
    /// `None` = caching disabled, every check is a full scan. The mutex
    /// also serializes the check-then-append pair in `book_slot`, which
    /// spans awaits.
    cache: Mutex<Option<HashSet<String>>>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl SheetsBackend {
    /// Builds the backend and probes the worksheet with one full scan, so a
    /// bad token or unreachable store surfaces at startup instead of on the
    /// first booking. The scanned slots seed the cache when enabled.
    pub async fn connect(config: SheetsConfig) -> Result<Self, BackendConfigError> {
        let backend = Self {
            client: reqwest::Client::new(),
            spreadsheet_id: config.spreadsheet_id,
            worksheet: config.worksheet,
            api_token: config.api_token,
            cache: Mutex::new(None),
        };

        let slots = backend
            .scan_slots()
            .await
            .map_err(|e| BackendConfigError {
                spreadsheet_id: backend.spreadsheet_id.clone(),
                reason: format!("{e:#}"),
            })?;

        if config.use_cache {
            *backend.cache.lock().await = Some(slots);
        }

        Ok(backend)
    }

    fn values_url(&self, suffix: &str) -> String {
        format!(
            "{SHEETS_API_BASE}/{}/values/{}{suffix}",
            self.spreadsheet_id, self.worksheet
        )
    }

    async fn scan_slots(&self) -> anyhow::Result<HashSet<String>> {
        let range: ValueRange = self
            .client
            .get(self.values_url(""))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .context("failed to read worksheet")?
            .error_for_status()
            .context("Sheets API rejected the read")?
            .json()
            .await
            .context("failed to decode worksheet values")?;

        Ok(slots_from_rows(&range.values))
    }

    async fn append_row(&self, record: &BookingRecord) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "values": [[
                record.full_name,
                record.lesson_type.label(),
                record.slot,
                record.user_id,
            ]]
        });

        self.client
            .post(self.values_url(":append?valueInputOption=RAW"))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .context("failed to append booking row")?
            .error_for_status()
            .context("Sheets API rejected the append")?;

        Ok(())
    }

    /// Membership test against the cache when present, otherwise a full
    /// scan. Callers must already hold the cache lock.
    async fn has_slot(
        &self,
        cache: &Option<HashSet<String>>,
        slot: &str,
    ) -> anyhow::Result<bool> {
        match cache {
            Some(known) => Ok(known.contains(slot)),
            None => Ok(self.scan_slots().await?.contains(slot)),
        }
    }
}

/// Extracts booked-slot tokens from raw worksheet rows. Skips blank rows
/// and the header row (first cell "slot" or "horario", case-insensitive).
/// The slot lives in the third column; single-column rows from older
/// sheets carry it in the first.
fn slots_from_rows(rows: &[Vec<String>]) -> HashSet<String> {
    let mut slots = HashSet::new();
    for row in rows {
        let first = match row.first() {
            Some(cell) => cell.trim(),
            None => continue,
        };
        if first.is_empty() {
            continue;
        }
        if first.eq_ignore_ascii_case("slot") || first.eq_ignore_ascii_case("horario") {
            continue;
        }
        let slot = row
            .get(2)
            .map(|cell| cell.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or(first);
        slots.insert(slot.to_string());
    }
    slots
}

#[async_trait]
impl AvailabilityBackend for SheetsBackend {
    async fn check_availability(&self, slot: &str) -> Result<bool, AvailabilityError> {
        let cache = self.cache.lock().await;
        let booked = self
            .has_slot(&cache, slot)
            .await
            .map_err(|e| AvailabilityError::Backend(format!("{e:#}")))?;
        Ok(!booked)
    }

    async fn book_slot(&self, record: &BookingRecord) -> Result<(), AvailabilityError> {
        // Lock held across the re-check and the append: the authoritative
        // decision for any slot happens in exactly one task at a time.
        let mut cache = self.cache.lock().await;

        let booked = self
            .has_slot(&cache, &record.slot)
            .await
            .map_err(|e| AvailabilityError::Backend(format!("{e:#}")))?;
        if booked {
            return Err(AvailabilityError::Conflict);
        }

        self.append_row(record)
            .await
            .map_err(|e| AvailabilityError::Backend(format!("{e:#}")))?;

        if let Some(known) = cache.as_mut() {
            known.insert(record.slot.clone());
        }

        Ok(())
    }

    async fn list_booked(&self) -> Result<Vec<String>, AvailabilityError> {
        let cache = self.cache.lock().await;
        let mut slots: Vec<String> = match &*cache {
            Some(known) => known.iter().cloned().collect(),
            None => self
                .scan_slots()
                .await
                .map_err(|e| AvailabilityError::Backend(format!("{e:#}")))?
                .into_iter()
                .collect(),
        };
        slots.sort();
        Ok(slots)
    }

    async fn reset_bookings(&self) {
        // Only the local mirror; the worksheet itself is never cleared.
        if let Some(known) = self.cache.lock().await.as_mut() {
            known.clear();
        }
    }
}
