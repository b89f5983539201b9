//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `assignments` - Scorer assignments (key: match_id || user_id)
//! - `entries` - Append-only ball entries (key: entry_id)
//! - `verifications` - Consensus bookkeeping (key: ball key)
//! - `official` - Canonical ball records (key: ball key, insert-if-absent)
//! - `totals` - Innings aggregates (key: match_id || innings)
//! - `audit` - Append-only audit trail (key: match_id || timestamp || audit_id)
//! - `indices` - Secondary indices (entries per ball key, per-scorer dedupe)
//!
//! All multi-row mutations commit through a single `WriteBatch`, so the
//! "entry + verification + official + totals" unit is all-or-nothing.

use crate::{
    error::{Error, Result},
    types::{
        AuditLogEntry, BallEntry, BallKey, BallVerification, InningsTotals, MatchId, OfficialBall,
        ScorerAssignment, UserId,
    },
    Config,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_ASSIGNMENTS: &str = "assignments";
const CF_ENTRIES: &str = "entries";
const CF_VERIFICATIONS: &str = "verifications";
const CF_OFFICIAL: &str = "official";
const CF_TOTALS: &str = "totals";
const CF_AUDIT: &str = "audit";
const CF_INDICES: &str = "indices";

/// Index key tags (the indices CF mixes key shapes)
const IDX_BALL_ENTRY: u8 = b'b';
const IDX_SCORER_BALL: u8 = b's';

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ASSIGNMENTS, Self::cf_options_point_lookup()),
            ColumnFamilyDescriptor::new(CF_ENTRIES, Self::cf_options_append_only()),
            ColumnFamilyDescriptor::new(CF_VERIFICATIONS, Self::cf_options_point_lookup()),
            ColumnFamilyDescriptor::new(CF_OFFICIAL, Self::cf_options_append_only()),
            ColumnFamilyDescriptor::new(CF_TOTALS, Self::cf_options_point_lookup()),
            ColumnFamilyDescriptor::new(CF_AUDIT, Self::cf_options_append_only()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened scoring database");

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_append_only() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_point_lookup() -> Options {
        let mut opts = Options::default();
        // Frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Indices benefit from bloom filters
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Key encoding helpers

    fn key_ball(key: &BallKey) -> Vec<u8> {
        let mut k = key.match_id.as_uuid().as_bytes().to_vec();
        k.push(key.innings);
        k.extend_from_slice(&key.over_number.to_be_bytes());
        k.push(key.ball_number);
        k
    }

    fn key_assignment(match_id: &MatchId, user: &UserId) -> Vec<u8> {
        let mut k = match_id.as_uuid().as_bytes().to_vec();
        k.extend_from_slice(user.as_uuid().as_bytes());
        k
    }

    fn key_totals(match_id: &MatchId, innings: u8) -> Vec<u8> {
        let mut k = match_id.as_uuid().as_bytes().to_vec();
        k.push(innings);
        k
    }

    fn key_audit(entry: &AuditLogEntry) -> Vec<u8> {
        let mut k = entry.match_id.as_uuid().as_bytes().to_vec();
        // Timestamp prefix keeps the trail in append order; the id breaks ties
        let nanos = entry.created_at.timestamp_nanos_opt().unwrap_or(0);
        k.extend_from_slice(&nanos.to_be_bytes());
        k.extend_from_slice(entry.audit_id.as_bytes());
        k
    }

    fn index_key_ball_entry(key: &BallKey, entry_id: Option<Uuid>) -> Vec<u8> {
        let mut k = vec![IDX_BALL_ENTRY];
        k.extend_from_slice(&Self::key_ball(key));
        if let Some(id) = entry_id {
            k.extend_from_slice(id.as_bytes());
        }
        k
    }

    fn index_key_scorer_ball(key: &BallKey, scorer: &UserId) -> Vec<u8> {
        let mut k = vec![IDX_SCORER_BALL];
        k.extend_from_slice(key.match_id.as_uuid().as_bytes());
        k.extend_from_slice(scorer.as_uuid().as_bytes());
        k.push(key.innings);
        k.extend_from_slice(&key.over_number.to_be_bytes());
        k.push(key.ball_number);
        k
    }

    /// Iterate all values under a key prefix in one column family
    fn scan_prefix<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        prefix: &[u8],
    ) -> Result<Vec<T>> {
        let cf = self.cf_handle(cf_name)?;
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        let mut out = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            out.push(bincode::deserialize(&value)?);
        }
        Ok(out)
    }

    // Assignment operations

    /// Put assignment (insert or replace)
    pub fn put_assignment(&self, assignment: &ScorerAssignment) -> Result<()> {
        let cf = self.cf_handle(CF_ASSIGNMENTS)?;
        let key = Self::key_assignment(&assignment.match_id, &assignment.user);
        let value = bincode::serialize(assignment)?;
        self.db.put_cf(cf, key, value)?;

        tracing::debug!(
            match_id = %assignment.match_id,
            user = %assignment.user,
            role = %assignment.role,
            "Assignment stored"
        );

        Ok(())
    }

    /// Put several assignments in one write batch (all-or-nothing)
    pub fn put_assignments(&self, assignments: &[ScorerAssignment]) -> Result<()> {
        let cf = self.cf_handle(CF_ASSIGNMENTS)?;
        let mut batch = WriteBatch::default();
        for assignment in assignments {
            let key = Self::key_assignment(&assignment.match_id, &assignment.user);
            batch.put_cf(cf, key, bincode::serialize(assignment)?);
        }
        self.db.write(batch)?;
        Ok(())
    }

    /// Get assignment for (match, user)
    pub fn get_assignment(
        &self,
        match_id: &MatchId,
        user: &UserId,
    ) -> Result<Option<ScorerAssignment>> {
        let cf = self.cf_handle(CF_ASSIGNMENTS)?;
        let key = Self::key_assignment(match_id, user);
        match self.db.get_cf(cf, key)? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// All assignments for a match
    pub fn match_assignments(&self, match_id: &MatchId) -> Result<Vec<ScorerAssignment>> {
        self.scan_prefix(CF_ASSIGNMENTS, match_id.as_uuid().as_bytes())
    }

    // Entry operations

    /// Get entry by ID
    pub fn get_entry(&self, entry_id: Uuid) -> Result<BallEntry> {
        let cf = self.cf_handle(CF_ENTRIES)?;
        let value = self
            .db
            .get_cf(cf, entry_id.as_bytes())?
            .ok_or_else(|| Error::NotFound(format!("entry {}", entry_id)))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// All entries submitted for a ball key (via index)
    pub fn entries_for_key(&self, key: &BallKey) -> Result<Vec<BallEntry>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;
        let prefix = Self::index_key_ball_entry(key, None);

        let iter = self
            .db
            .iterator_cf(cf_indices, IteratorMode::From(&prefix, Direction::Forward));

        let mut entries = Vec::new();
        for item in iter {
            let (idx_key, _) = item?;
            if !idx_key.starts_with(&prefix) {
                break;
            }
            // Entry id is the trailing 16 bytes of the index key
            if idx_key.len() >= prefix.len() + 16 {
                let id_bytes: [u8; 16] = idx_key[prefix.len()..prefix.len() + 16]
                    .try_into()
                    .map_err(|_| Error::Storage("Malformed ball-entry index key".to_string()))?;
                entries.push(self.get_entry(Uuid::from_bytes(id_bytes))?);
            }
        }

        Ok(entries)
    }

    /// Whether this scorer already submitted for this ball key
    pub fn scorer_entry_exists(&self, key: &BallKey, scorer: &UserId) -> Result<bool> {
        let cf = self.cf_handle(CF_INDICES)?;
        let idx = Self::index_key_scorer_ball(key, scorer);
        Ok(self.db.get_cf(cf, idx)?.is_some())
    }

    // Verification operations

    /// Get verification for a ball key
    pub fn get_verification(&self, key: &BallKey) -> Result<Option<BallVerification>> {
        let cf = self.cf_handle(CF_VERIFICATIONS)?;
        match self.db.get_cf(cf, Self::key_ball(key))? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// All verifications for a match
    pub fn match_verifications(&self, match_id: &MatchId) -> Result<Vec<BallVerification>> {
        self.scan_prefix(CF_VERIFICATIONS, match_id.as_uuid().as_bytes())
    }

    // Official record operations

    /// Get official ball for a key
    pub fn get_official(&self, key: &BallKey) -> Result<Option<OfficialBall>> {
        let cf = self.cf_handle(CF_OFFICIAL)?;
        match self.db.get_cf(cf, Self::key_ball(key))? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Count official balls for a match
    pub fn official_count(&self, match_id: &MatchId) -> Result<u64> {
        let cf = self.cf_handle(CF_OFFICIAL)?;
        let prefix = match_id.as_uuid().as_bytes();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        let mut count = 0u64;
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    // Totals operations

    /// Get innings totals
    pub fn get_totals(&self, match_id: &MatchId, innings: u8) -> Result<Option<InningsTotals>> {
        let cf = self.cf_handle(CF_TOTALS)?;
        match self.db.get_cf(cf, Self::key_totals(match_id, innings))? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    // Audit operations

    /// Append one audit row
    pub fn append_audit(&self, entry: &AuditLogEntry) -> Result<()> {
        let cf = self.cf_handle(CF_AUDIT)?;
        let key = Self::key_audit(entry);
        let value = bincode::serialize(entry)?;
        self.db.put_cf(cf, key, value)?;
        Ok(())
    }

    /// Audit trail for a match, in append order
    pub fn match_audit(&self, match_id: &MatchId) -> Result<Vec<AuditLogEntry>> {
        self.scan_prefix(CF_AUDIT, match_id.as_uuid().as_bytes())
    }

    // Atomic multi-row commits

    /// Commit one accepted submission: entry + indices + verification, and
    /// when consensus was reached, the official ball + totals — all in one
    /// write batch.
    pub fn commit_submission(
        &self,
        entry: &BallEntry,
        verification: &BallVerification,
        materialized: Option<(&OfficialBall, &InningsTotals)>,
    ) -> Result<()> {
        let mut batch = WriteBatch::default();
        let key = entry.key();

        // 1. Entry (immutable evidence)
        let cf_entries = self.cf_handle(CF_ENTRIES)?;
        batch.put_cf(cf_entries, entry.entry_id.as_bytes(), bincode::serialize(entry)?);

        // 2. Indices
        let cf_indices = self.cf_handle(CF_INDICES)?;
        batch.put_cf(
            cf_indices,
            Self::index_key_ball_entry(&key, Some(entry.entry_id)),
            b"",
        );
        batch.put_cf(
            cf_indices,
            Self::index_key_scorer_ball(&key, &entry.scorer),
            entry.entry_id.as_bytes(),
        );

        // 3. Verification
        let cf_verifications = self.cf_handle(CF_VERIFICATIONS)?;
        batch.put_cf(
            cf_verifications,
            Self::key_ball(&key),
            bincode::serialize(verification)?,
        );

        // 4. Official record + totals, when consensus was reached
        if let Some((official, totals)) = materialized {
            self.stage_official(&mut batch, official, totals)?;
        }

        self.db.write(batch)?;

        tracing::debug!(
            entry_id = %entry.entry_id,
            key = %key,
            consensus = verification.consensus_reached,
            "Submission committed"
        );

        Ok(())
    }

    /// Commit one dispute resolution: verification update + official ball +
    /// totals in one write batch.
    pub fn commit_resolution(
        &self,
        verification: &BallVerification,
        official: &OfficialBall,
        totals: &InningsTotals,
    ) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_verifications = self.cf_handle(CF_VERIFICATIONS)?;
        batch.put_cf(
            cf_verifications,
            Self::key_ball(&verification.key()),
            bincode::serialize(verification)?,
        );

        self.stage_official(&mut batch, official, totals)?;

        self.db.write(batch)?;

        tracing::debug!(key = %verification.key(), "Resolution committed");

        Ok(())
    }

    fn stage_official(
        &self,
        batch: &mut WriteBatch,
        official: &OfficialBall,
        totals: &InningsTotals,
    ) -> Result<()> {
        let cf_official = self.cf_handle(CF_OFFICIAL)?;
        batch.put_cf(
            cf_official,
            Self::key_ball(&official.key()),
            bincode::serialize(official)?,
        );

        let cf_totals = self.cf_handle(CF_TOTALS)?;
        batch.put_cf(
            cf_totals,
            Self::key_totals(&totals.match_id, totals.innings),
            bincode::serialize(totals)?,
        );

        Ok(())
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("Scoring database closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BallOutcome, BallType, Participants, RecordedBy, ScorerRole, VerificationStatus,
    };
    use chrono::Utc;
    use tempfile::TempDir;

    fn test_config() -> (Config, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (config, temp_dir)
    }

    fn test_key(match_id: MatchId) -> BallKey {
        BallKey {
            match_id,
            innings: 1,
            over_number: 1,
            ball_number: 1,
        }
    }

    fn test_entry(key: BallKey, scorer: UserId) -> BallEntry {
        BallEntry {
            entry_id: Uuid::now_v7(),
            match_id: key.match_id,
            scorer,
            innings: key.innings,
            over_number: key.over_number,
            ball_number: key.ball_number,
            outcome: BallOutcome {
                runs: 1,
                extras: 0,
                ball_type: BallType::Legal,
                is_wicket: false,
                wicket_type: None,
                is_boundary: false,
                boundary_type: None,
            },
            participants: Participants {
                bowler: UserId::new(Uuid::new_v4()),
                striker: UserId::new(Uuid::new_v4()),
                non_striker: UserId::new(Uuid::new_v4()),
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_storage_open() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();
        assert!(storage.db.cf_handle(CF_ENTRIES).is_some());
        assert!(storage.db.cf_handle(CF_OFFICIAL).is_some());
    }

    #[test]
    fn test_assignment_roundtrip() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        let match_id = MatchId::new(Uuid::new_v4());
        let user = UserId::new(Uuid::new_v4());
        let assignment = ScorerAssignment {
            match_id,
            user,
            role: ScorerRole::TeamAScorer,
            appointed_by: UserId::new(Uuid::new_v4()),
            active: true,
            appointed_at: Utc::now(),
        };

        storage.put_assignment(&assignment).unwrap();

        let retrieved = storage.get_assignment(&match_id, &user).unwrap().unwrap();
        assert_eq!(retrieved.role, ScorerRole::TeamAScorer);
        assert!(retrieved.active);

        let all = storage.match_assignments(&match_id).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_commit_submission_without_consensus() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        let match_id = MatchId::new(Uuid::new_v4());
        let key = test_key(match_id);
        let scorer = UserId::new(Uuid::new_v4());
        let entry = test_entry(key, scorer);

        let mut verification = BallVerification::new(key, Utc::now());
        verification.total_entries = 1;
        verification.matching_entries = 1;

        storage.commit_submission(&entry, &verification, None).unwrap();

        // Entry, index and dedupe marker are all visible
        let retrieved = storage.get_entry(entry.entry_id).unwrap();
        assert_eq!(retrieved.scorer, scorer);
        assert_eq!(storage.entries_for_key(&key).unwrap().len(), 1);
        assert!(storage.scorer_entry_exists(&key, &scorer).unwrap());

        let v = storage.get_verification(&key).unwrap().unwrap();
        assert_eq!(v.status(), VerificationStatus::Pending);
        assert!(storage.get_official(&key).unwrap().is_none());
    }

    #[test]
    fn test_commit_submission_with_consensus() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        let match_id = MatchId::new(Uuid::new_v4());
        let key = test_key(match_id);
        let entry = test_entry(key, UserId::new(Uuid::new_v4()));

        let mut verification = BallVerification::new(key, Utc::now());
        verification.total_entries = 2;
        verification.matching_entries = 2;
        verification.consensus_reached = true;
        verification.final_entry = Some(entry.entry_id);
        verification.verified_at = Some(Utc::now());

        let official = OfficialBall {
            official_id: Uuid::now_v7(),
            match_id,
            innings: key.innings,
            over_number: key.over_number,
            ball_number: key.ball_number,
            source_entry: entry.entry_id,
            outcome: entry.outcome.clone(),
            participants: entry.participants,
            recorded_by: RecordedBy::Consensus,
            created_at: Utc::now(),
        };

        let mut totals = InningsTotals::new(match_id, key.innings, Utc::now());
        totals.apply_delivery(&entry.outcome, Utc::now());

        storage
            .commit_submission(&entry, &verification, Some((&official, &totals)))
            .unwrap();

        let o = storage.get_official(&key).unwrap().unwrap();
        assert_eq!(o.source_entry, entry.entry_id);
        assert_eq!(storage.official_count(&match_id).unwrap(), 1);

        let t = storage.get_totals(&match_id, key.innings).unwrap().unwrap();
        assert_eq!(t.runs, 1);
        assert_eq!(t.balls_bowled, 1);
    }

    #[test]
    fn test_entries_for_key_scoped_to_key() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        let match_id = MatchId::new(Uuid::new_v4());
        let key1 = test_key(match_id);
        let key2 = BallKey {
            ball_number: 2,
            ..key1
        };

        let e1 = test_entry(key1, UserId::new(Uuid::new_v4()));
        let e2 = test_entry(key2, UserId::new(Uuid::new_v4()));

        let v1 = BallVerification::new(key1, Utc::now());
        let v2 = BallVerification::new(key2, Utc::now());

        storage.commit_submission(&e1, &v1, None).unwrap();
        storage.commit_submission(&e2, &v2, None).unwrap();

        let entries = storage.entries_for_key(&key1).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_id, e1.entry_id);
    }

    #[test]
    fn test_audit_append_and_scan() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        let match_id = MatchId::new(Uuid::new_v4());
        for i in 0..3 {
            let entry = AuditLogEntry {
                audit_id: Uuid::now_v7(),
                match_id,
                actor: UserId::new(Uuid::new_v4()),
                action: crate::types::AuditAction::BallEntry,
                position: None,
                old_value: None,
                new_value: Some(serde_json::json!({ "seq": i })),
                request: None,
                outcome: crate::types::AuditOutcome::Accepted,
                notes: None,
                created_at: Utc::now(),
            };
            storage.append_audit(&entry).unwrap();
        }

        let trail = storage.match_audit(&match_id).unwrap();
        assert_eq!(trail.len(), 3);
        // UUIDv7 keys keep append order
        assert_eq!(trail[0].new_value, Some(serde_json::json!({ "seq": 0 })));
    }
}
