//! Main engine orchestration layer
//!
//! Ties together storage, the writer actor, and the read-side reporters
//! into a high-level API for co-scored matches.
//!
//! # Example
//!
//! ```no_run
//! use scoring_core::{Config, ScoringEngine};
//!
//! #[tokio::main]
//! async fn main() -> scoring_core::Result<()> {
//!     let config = Config::default();
//!     let engine = ScoringEngine::open(config).await?;
//!
//!     // let outcome = engine.submit_entry(request).await?;
//!
//!     engine.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_scoring_actor, ScoringHandle},
    dispute::ResolutionRequest,
    entries::{BallEntryRequest, SubmitOutcome},
    metrics::Metrics,
    registry::AssignmentResult,
    status::{ScoringStatus, ScoringStatusReporter},
    storage::Storage,
    types::{
        AuditLogEntry, BallKey, InningsTotals, MatchId, OfficialBall, RequestMeta,
        ScorerAssignment, ScorerRole, UserId,
    },
    Config, Result,
};
use chrono::Utc;
use std::sync::Arc;

/// Main scoring engine interface
///
/// Mutations go through the single writer; reads are served directly from
/// storage.
pub struct ScoringEngine {
    /// Actor handle for mutating operations
    handle: ScoringHandle,

    /// Direct storage access (for reads)
    storage: Arc<Storage>,

    /// Read-side reporter
    reporter: ScoringStatusReporter,

    /// Metrics collector
    metrics: Metrics,
}

impl ScoringEngine {
    /// Open engine with configuration
    pub async fn open(config: Config) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);

        let metrics = Metrics::new()
            .map_err(|e| crate::Error::Config(format!("Failed to create metrics: {}", e)))?;

        let handle = spawn_scoring_actor(storage.clone(), &config, metrics.clone());
        let reporter = ScoringStatusReporter::new(storage.clone());

        Ok(Self {
            handle,
            storage,
            reporter,
            metrics,
        })
    }

    /// Assign the two team scorers (and optionally an umpire) for a match
    pub async fn assign_scorers(
        &self,
        match_id: MatchId,
        team_a_scorer: UserId,
        team_b_scorer: UserId,
        appointed_by: UserId,
        umpire: Option<UserId>,
        meta: RequestMeta,
    ) -> Result<AssignmentResult> {
        self.handle
            .assign_scorers(match_id, team_a_scorer, team_b_scorer, appointed_by, umpire, meta)
            .await
    }

    /// Appoint an umpire or referee
    pub async fn appoint_official(
        &self,
        match_id: MatchId,
        user: UserId,
        role: ScorerRole,
        appointed_by: UserId,
        meta: RequestMeta,
    ) -> Result<ScorerAssignment> {
        self.handle
            .appoint_official(match_id, user, role, appointed_by, meta)
            .await
    }

    /// Deactivate a scorer's assignment (mid-match replacement)
    pub async fn deactivate_scorer(
        &self,
        match_id: MatchId,
        user: UserId,
        requested_by: UserId,
        meta: RequestMeta,
    ) -> Result<ScorerAssignment> {
        self.handle
            .deactivate_scorer(match_id, user, requested_by, meta)
            .await
    }

    /// Submit one scorer's record of one delivery.
    ///
    /// Persists the entry and re-evaluates consensus for the ball key in a
    /// single atomic unit; on majority agreement the official record is
    /// materialized in the same unit.
    pub async fn submit_entry(&self, request: BallEntryRequest) -> Result<SubmitOutcome> {
        self.handle.submit_entry(request).await
    }

    /// Resolve a disputed ball in favor of a chosen entry
    pub async fn resolve_dispute(&self, request: ResolutionRequest) -> Result<OfficialBall> {
        self.handle.resolve_dispute(request).await
    }

    /// Read-only scoring snapshot for a match
    pub fn scoring_status(&self, match_id: &MatchId) -> Result<ScoringStatus> {
        self.reporter.status(match_id)
    }

    /// Running totals for one innings (zeroed if nothing is verified yet)
    pub fn innings_totals(&self, match_id: &MatchId, innings: u8) -> Result<InningsTotals> {
        Ok(self
            .storage
            .get_totals(match_id, innings)?
            .unwrap_or_else(|| InningsTotals::new(*match_id, innings, Utc::now())))
    }

    /// Official ball for a key, if one has been materialized
    pub fn official_ball(&self, key: &BallKey) -> Result<Option<OfficialBall>> {
        self.storage.get_official(key)
    }

    /// Audit trail for a match, in append order
    pub fn audit_trail(&self, match_id: &MatchId) -> Result<Vec<AuditLogEntry>> {
        self.storage.match_audit(match_id)
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Shutdown engine
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}
