//! Scoring status reporter
//!
//! Read-only snapshot of a match's scoring state: who is assigned, how
//! many balls are verified, what is still pending, and which keys are in
//! dispute. Served straight from storage without going through the writer.

use crate::{
    error::Result,
    storage::Storage,
    types::{BallKey, MatchId, ScorerAssignment},
};
use serde::Serialize;
use std::sync::Arc;

/// One disputed ball key and its entry counts
#[derive(Debug, Clone, Serialize)]
pub struct DisputeSummary {
    /// Disputed position
    pub key: BallKey,
    /// Entries submitted for the key
    pub total_entries: u32,
    /// Size of the largest agreeing group
    pub matching_entries: u32,
}

/// Snapshot of a match's scoring state
#[derive(Debug, Clone, Serialize)]
pub struct ScoringStatus {
    /// All assignments for the match (active and replaced)
    pub scorers: Vec<ScorerAssignment>,
    /// Balls with an official record
    pub verified_count: u64,
    /// Ball keys still awaiting consensus (including disputed ones)
    pub pending_count: u64,
    /// Ball keys in open dispute
    pub disputes: Vec<DisputeSummary>,
}

/// Builds read-only scoring snapshots
pub struct ScoringStatusReporter {
    storage: Arc<Storage>,
}

impl ScoringStatusReporter {
    /// Create reporter over shared storage
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Snapshot one match
    pub fn status(&self, match_id: &MatchId) -> Result<ScoringStatus> {
        let scorers = self.storage.match_assignments(match_id)?;
        let verified_count = self.storage.official_count(match_id)?;

        let verifications = self.storage.match_verifications(match_id)?;

        let mut pending_count = 0u64;
        let mut disputes = Vec::new();
        for v in &verifications {
            if v.consensus_reached {
                continue;
            }
            pending_count += 1;
            if v.has_dispute {
                disputes.push(DisputeSummary {
                    key: v.key(),
                    total_entries: v.total_entries,
                    matching_entries: v.matching_entries,
                });
            }
        }

        Ok(ScoringStatus {
            scorers,
            verified_count,
            pending_count,
            disputes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsensusConfig;
    use crate::entries::{BallEntryRequest, BallEntryStore};
    use crate::registry::ScorerRegistry;
    use crate::types::{BallOutcome, BallType, Participants, RequestMeta, UserId};
    use crate::Config;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn setup() -> (
        ScoringStatusReporter,
        ScorerRegistry,
        BallEntryStore,
        MatchId,
        UserId,
        UserId,
        TempDir,
    ) {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp.path().to_path_buf();
        let storage = Arc::new(Storage::open(&config).unwrap());

        let reporter = ScoringStatusReporter::new(storage.clone());
        let registry = ScorerRegistry::new(storage.clone());
        let store = BallEntryStore::new(storage, ConsensusConfig::default());

        let match_id = MatchId::new(Uuid::new_v4());
        let a = UserId::new(Uuid::new_v4());
        let b = UserId::new(Uuid::new_v4());
        registry
            .assign(match_id, a, b, UserId::new(Uuid::new_v4()), None)
            .unwrap();

        (reporter, registry, store, match_id, a, b, temp)
    }

    fn outcome(runs: u8) -> BallOutcome {
        BallOutcome {
            runs,
            extras: 0,
            ball_type: BallType::Legal,
            is_wicket: false,
            wicket_type: None,
            is_boundary: false,
            boundary_type: None,
        }
    }

    fn submit(
        store: &BallEntryStore,
        registry: &ScorerRegistry,
        match_id: MatchId,
        scorer: UserId,
        ball_number: u8,
        runs: u8,
    ) {
        store
            .submit(
                registry,
                BallEntryRequest {
                    match_id,
                    scorer,
                    innings: 1,
                    over_number: 1,
                    ball_number,
                    outcome: outcome(runs),
                    participants: Participants {
                        bowler: UserId::new(Uuid::new_v4()),
                        striker: UserId::new(Uuid::new_v4()),
                        non_striker: UserId::new(Uuid::new_v4()),
                    },
                    meta: RequestMeta::default(),
                },
            )
            .unwrap();
    }

    #[test]
    fn test_empty_match_status() {
        let (reporter, _registry, _store, match_id, _a, _b, _temp) = setup();
        let status = reporter.status(&match_id).unwrap();
        assert_eq!(status.scorers.len(), 2);
        assert_eq!(status.verified_count, 0);
        assert_eq!(status.pending_count, 0);
        assert!(status.disputes.is_empty());
    }

    #[test]
    fn test_counts_track_verification_lifecycle() {
        let (reporter, registry, store, match_id, a, b, _temp) = setup();

        // Ball 1: both agree -> verified
        submit(&store, &registry, match_id, a, 1, 4);
        submit(&store, &registry, match_id, b, 1, 4);

        // Ball 2: disagreement -> disputed (and pending)
        submit(&store, &registry, match_id, a, 2, 1);
        submit(&store, &registry, match_id, b, 2, 2);

        // Ball 3: single entry -> pending, not disputed
        submit(&store, &registry, match_id, a, 3, 0);

        let status = reporter.status(&match_id).unwrap();
        assert_eq!(status.verified_count, 1);
        assert_eq!(status.pending_count, 2);
        assert_eq!(status.disputes.len(), 1);

        let dispute = &status.disputes[0];
        assert_eq!(dispute.key.ball_number, 2);
        assert_eq!(dispute.total_entries, 2);
        assert_eq!(dispute.matching_entries, 1);
    }
}
