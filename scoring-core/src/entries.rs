//! Ball entry store
//!
//! Append-only persistence of raw scorer submissions, plus the submit path
//! that re-evaluates consensus and hands consensus results to the official
//! record writer. Entries are evidence: once written they are never updated
//! or deleted, and a duplicate outcome from another scorer is corroboration,
//! not a retry.

use crate::{
    config::ConsensusConfig,
    consensus::{self, ConsensusDecision},
    error::{Error, Result},
    official::OfficialRecordWriter,
    registry::ScorerRegistry,
    storage::Storage,
    types::{
        BallEntry, BallKey, BallOutcome, BallVerification, MatchId, Participants, RecordedBy,
        RequestMeta, UserId, VerificationStatus,
    },
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// One scorer's submission for one delivery
#[derive(Debug, Clone)]
pub struct BallEntryRequest {
    /// Match
    pub match_id: MatchId,
    /// Submitting scorer
    pub scorer: UserId,
    /// Innings number (scorer-tracked)
    pub innings: u8,
    /// Over number (scorer-tracked)
    pub over_number: u16,
    /// Ball number within the over (scorer-tracked)
    pub ball_number: u8,
    /// Claimed outcome
    pub outcome: BallOutcome,
    /// Claimed participants
    pub participants: Participants,
    /// Request metadata for audit
    pub meta: RequestMeta,
}

impl BallEntryRequest {
    /// Position the submission claims to describe
    pub fn key(&self) -> BallKey {
        BallKey {
            match_id: self.match_id,
            innings: self.innings,
            over_number: self.over_number,
            ball_number: self.ball_number,
        }
    }
}

/// Result of an accepted submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Id of the persisted entry
    pub entry_id: Uuid,
    /// Verification status after re-evaluation
    pub status: VerificationStatus,
    /// Whether the key has reached consensus
    pub consensus_reached: bool,
}

/// Append-only store of scorer submissions
pub struct BallEntryStore {
    storage: Arc<Storage>,
    official_writer: OfficialRecordWriter,
    consensus: ConsensusConfig,
}

impl BallEntryStore {
    /// Create store over shared storage
    pub fn new(storage: Arc<Storage>, consensus: ConsensusConfig) -> Self {
        let official_writer = OfficialRecordWriter::new(storage.clone());
        Self {
            storage,
            official_writer,
            consensus,
        }
    }

    /// Accept one submission: authorize, validate, dedupe, persist, and
    /// re-evaluate consensus for the ball key — all committed as one unit.
    ///
    /// Must only be called from the single writer task; the check-then-write
    /// sequences below rely on its serialization.
    pub fn submit(&self, registry: &ScorerRegistry, request: BallEntryRequest) -> Result<SubmitOutcome> {
        if !registry.authorize(&request.match_id, &request.scorer)? {
            return Err(Error::Authorization(format!(
                "user {} holds no active scoring assignment for match {}",
                request.scorer, request.match_id
            )));
        }

        validate(&request)?;

        let key = request.key();

        if self.storage.scorer_entry_exists(&key, &request.scorer)? {
            return Err(Error::Conflict(format!(
                "scorer {} already submitted for ball {}",
                request.scorer, key
            )));
        }

        let now = Utc::now();
        let entry = BallEntry {
            entry_id: Uuid::now_v7(),
            match_id: request.match_id,
            scorer: request.scorer,
            innings: request.innings,
            over_number: request.over_number,
            ball_number: request.ball_number,
            outcome: request.outcome,
            participants: request.participants,
            created_at: now,
        };

        let mut all_entries = self.storage.entries_for_key(&key)?;
        all_entries.push(entry.clone());

        let mut verification = self
            .storage
            .get_verification(&key)?
            .unwrap_or_else(|| BallVerification::new(key, now));

        let decision = consensus::evaluate(&all_entries, self.consensus.min_corroborating_entries);

        // A verified key never regresses: the new entry is kept as evidence
        // and the counts refresh, but the flags and the official record are
        // untouchable.
        if verification.consensus_reached {
            let (total, matching) = decision_counts(&decision);
            verification.total_entries = total;
            verification.matching_entries = matching;
            verification.updated_at = now;

            self.storage.commit_submission(&entry, &verification, None)?;

            tracing::debug!(key = %key, entry_id = %entry.entry_id, "Late entry for verified ball recorded as evidence");

            return Ok(SubmitOutcome {
                entry_id: entry.entry_id,
                status: VerificationStatus::Verified,
                consensus_reached: true,
            });
        }

        let materialized = match decision {
            ConsensusDecision::Pending { total, matching } => {
                verification.total_entries = total;
                verification.matching_entries = matching;
                verification.updated_at = now;
                None
            }
            ConsensusDecision::Disputed { total, matching } => {
                verification.total_entries = total;
                verification.matching_entries = matching;
                verification.has_dispute = true;
                verification.updated_at = now;
                None
            }
            ConsensusDecision::Reached {
                final_entry,
                total,
                matching,
            } => {
                verification.total_entries = total;
                verification.matching_entries = matching;
                verification.consensus_reached = true;
                verification.has_dispute = false;
                verification.final_entry = Some(final_entry);
                verification.verified_at = Some(now);
                verification.updated_at = now;

                let source = all_entries
                    .iter()
                    .find(|e| e.entry_id == final_entry)
                    .expect("final entry is one of the evaluated entries");

                self.official_writer
                    .materialize(source, RecordedBy::Consensus)?
            }
        };

        let status = verification.status();
        let consensus_reached = verification.consensus_reached;

        self.storage.commit_submission(
            &entry,
            &verification,
            materialized.as_ref().map(|m| (&m.official, &m.totals)),
        )?;

        tracing::info!(
            key = %key,
            entry_id = %entry.entry_id,
            status = status.as_str(),
            total = verification.total_entries,
            matching = verification.matching_entries,
            "Ball entry accepted"
        );

        Ok(SubmitOutcome {
            entry_id: entry.entry_id,
            status,
            consensus_reached,
        })
    }
}

fn decision_counts(decision: &ConsensusDecision) -> (u32, u32) {
    match decision {
        ConsensusDecision::Pending { total, matching }
        | ConsensusDecision::Disputed { total, matching }
        | ConsensusDecision::Reached {
            total, matching, ..
        } => (*total, *matching),
    }
}

/// Reject malformed outcomes before anything is persisted
fn validate(request: &BallEntryRequest) -> Result<()> {
    if request.innings == 0 {
        return Err(Error::Validation("innings numbers start at 1".to_string()));
    }
    if request.over_number == 0 {
        return Err(Error::Validation("over numbers start at 1".to_string()));
    }
    if !(1..=6).contains(&request.ball_number) {
        return Err(Error::Validation(format!(
            "ball number {} outside 1..=6",
            request.ball_number
        )));
    }

    let outcome = &request.outcome;

    if outcome.is_wicket && outcome.wicket_type.is_none() {
        return Err(Error::Validation("wicket requires a wicket type".to_string()));
    }
    if !outcome.is_wicket && outcome.wicket_type.is_some() {
        return Err(Error::Validation("wicket type given without a wicket".to_string()));
    }

    match (outcome.is_boundary, outcome.boundary_type) {
        (true, None) => {
            return Err(Error::Validation("boundary requires a boundary type".to_string()))
        }
        (true, Some(boundary)) if outcome.runs != boundary.runs() => {
            return Err(Error::Validation(format!(
                "a {} must carry {} runs, got {}",
                boundary.as_str(),
                boundary.runs(),
                outcome.runs
            )));
        }
        (false, Some(_)) => {
            return Err(Error::Validation("boundary type given without a boundary".to_string()))
        }
        _ => {}
    }

    Ok(())
}
