//! Official record writer
//!
//! Materializes the single canonical ball record and maintains the innings
//! aggregate. This is the only place match totals are mutated: consensus
//! and dispute resolution both hand their chosen entry here, and no other
//! code path writes totals.

use crate::{
    error::Result,
    storage::Storage,
    types::{BallEntry, InningsTotals, OfficialBall, RecordedBy},
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Official ball plus the totals increment it carries, staged for the
/// caller's atomic commit
#[derive(Debug, Clone)]
pub struct Materialized {
    /// Canonical record to insert
    pub official: OfficialBall,
    /// Innings totals after crediting the delivery
    pub totals: InningsTotals,
}

/// Idempotently materializes canonical ball records
pub struct OfficialRecordWriter {
    storage: Arc<Storage>,
}

impl OfficialRecordWriter {
    /// Create writer over shared storage
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Build the canonical record for a ball from its chosen source entry.
    ///
    /// Returns `None` when an official ball already exists at the key: the
    /// record was materialized by an earlier call and must not be touched
    /// again. The returned rows are staged, not committed — the caller puts
    /// them in the same write batch as the rest of its unit.
    pub fn materialize(
        &self,
        source: &BallEntry,
        recorded_by: RecordedBy,
    ) -> Result<Option<Materialized>> {
        let key = source.key();

        if self.storage.get_official(&key)?.is_some() {
            tracing::debug!(key = %key, "Official ball already materialized");
            return Ok(None);
        }

        let now = Utc::now();

        let mut totals = self
            .storage
            .get_totals(&key.match_id, key.innings)?
            .unwrap_or_else(|| InningsTotals::new(key.match_id, key.innings, now));
        totals.apply_delivery(&source.outcome, now);

        let official = OfficialBall {
            official_id: Uuid::now_v7(),
            match_id: source.match_id,
            innings: source.innings,
            over_number: source.over_number,
            ball_number: source.ball_number,
            source_entry: source.entry_id,
            outcome: source.outcome.clone(),
            participants: source.participants,
            recorded_by,
            created_at: now,
        };

        tracing::info!(
            key = %key,
            source_entry = %source.entry_id,
            runs = official.outcome.total_runs(),
            wicket = official.outcome.is_wicket,
            "Official ball materialized"
        );

        Ok(Some(Materialized { official, totals }))
    }
}
