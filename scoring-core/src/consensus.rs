//! Consensus decision logic
//!
//! Pure functions over the entries submitted for one ball key. The decision
//! is re-evaluated synchronously after every accepted submission.
//!
//! # Rule
//!
//! Entries are grouped by their outcome tuple (runs, extras, ball type,
//! wicket fields, boundary fields). The largest group of size `m` out of
//! `n` total entries reaches consensus only when it is a strict majority
//! with a corroboration floor:
//!
//! ```text
//! m > n / 2  AND  m >= min_corroborating_entries
//! ```
//!
//! A naive `m >= ceil(n/2)` rule would accept two mutually-conflicting
//! singleton entries (n = 2, m = 1) as "consensus"; the strict rule is
//! pinned by regression tests.

use crate::types::{BallEntry, BallOutcome};
use std::collections::HashMap;
use uuid::Uuid;

/// Outcome of re-evaluating one ball key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusDecision {
    /// Not enough corroboration yet, and no disagreement
    Pending {
        /// Entries submitted so far
        total: u32,
        /// Size of the (single) agreeing group
        matching: u32,
    },
    /// A strict majority agreed
    Reached {
        /// Entry the official record should be built from
        final_entry: Uuid,
        /// Size of the majority group
        matching: u32,
        /// Entries submitted
        total: u32,
    },
    /// Entries disagree and no strict majority exists
    Disputed {
        /// Size of the largest group
        matching: u32,
        /// Entries submitted
        total: u32,
    },
}

/// Re-evaluate consensus over all entries for one ball key.
///
/// `min_corroborating` is the configured floor (clamped to >= 2 at config
/// load). The representative of the majority group is its earliest
/// submission, tie-broken by entry id, so replays are deterministic.
pub fn evaluate(entries: &[BallEntry], min_corroborating: u32) -> ConsensusDecision {
    let total = entries.len() as u32;

    let mut groups: HashMap<&BallOutcome, Vec<&BallEntry>> = HashMap::new();
    for entry in entries {
        groups.entry(&entry.outcome).or_default().push(entry);
    }

    let matching = groups.values().map(|g| g.len() as u32).max().unwrap_or(0);

    if total < 2 {
        return ConsensusDecision::Pending { total, matching };
    }

    let strict_majority = matching * 2 > total;
    if strict_majority && matching >= min_corroborating {
        let majority = groups
            .into_values()
            .find(|g| g.len() as u32 == matching)
            .expect("a group of the maximum size exists");

        let representative = majority
            .into_iter()
            .min_by_key(|e| (e.created_at, e.entry_id))
            .expect("majority group is non-empty");

        return ConsensusDecision::Reached {
            final_entry: representative.entry_id,
            matching,
            total,
        };
    }

    // All entries agree but the corroboration floor is not met: still
    // pending, not disputed. Disagreement requires more than one outcome.
    if groups.len() <= 1 {
        ConsensusDecision::Pending { total, matching }
    } else {
        ConsensusDecision::Disputed { matching, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BallKey, BallType, BoundaryType, MatchId, Participants, UserId, WicketType,
    };
    use chrono::{Duration, Utc};

    fn outcome_runs(runs: u8) -> BallOutcome {
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

    fn outcome_wicket(wicket_type: WicketType) -> BallOutcome {
        BallOutcome {
            runs: 0,
            extras: 0,
            ball_type: BallType::Legal,
            is_wicket: true,
            wicket_type: Some(wicket_type),
            is_boundary: false,
            boundary_type: None,
        }
    }

    fn participants() -> Participants {
        Participants {
            bowler: UserId::new(Uuid::new_v4()),
            striker: UserId::new(Uuid::new_v4()),
            non_striker: UserId::new(Uuid::new_v4()),
        }
    }

    fn entry(outcome: BallOutcome, offset_ms: i64) -> BallEntry {
        let key = BallKey {
            match_id: MatchId::new(Uuid::new_v4()),
            innings: 1,
            over_number: 1,
            ball_number: 1,
        };
        BallEntry {
            entry_id: Uuid::now_v7(),
            match_id: key.match_id,
            scorer: UserId::new(Uuid::new_v4()),
            innings: key.innings,
            over_number: key.over_number,
            ball_number: key.ball_number,
            outcome,
            participants: participants(),
            created_at: Utc::now() + Duration::milliseconds(offset_ms),
        }
    }

    #[test]
    fn no_entries_is_pending() {
        assert_eq!(
            evaluate(&[], 2),
            ConsensusDecision::Pending {
                total: 0,
                matching: 0
            }
        );
    }

    #[test]
    fn single_entry_is_pending() {
        let entries = vec![entry(outcome_runs(4), 0)];
        assert_eq!(
            evaluate(&entries, 2),
            ConsensusDecision::Pending {
                total: 1,
                matching: 1
            }
        );
    }

    #[test]
    fn matching_pair_reaches_consensus() {
        let a = entry(outcome_runs(4), 0);
        let b = entry(outcome_runs(4), 100);
        let decision = evaluate(&[a.clone(), b], 2);
        match decision {
            ConsensusDecision::Reached {
                final_entry,
                matching,
                total,
            } => {
                // Earliest submission wins representative
                assert_eq!(final_entry, a.entry_id);
                assert_eq!(matching, 2);
                assert_eq!(total, 2);
            }
            other => panic!("expected Reached, got {:?}", other),
        }
    }

    #[test]
    fn split_pair_is_disputed() {
        // Regression guard: the naive m >= ceil(n/2) rule would call this
        // consensus (n = 2, m = 1).
        let a = entry(outcome_runs(1), 0);
        let b = entry(outcome_wicket(WicketType::Bowled), 100);
        assert_eq!(
            evaluate(&[a, b], 2),
            ConsensusDecision::Disputed {
                matching: 1,
                total: 2
            }
        );
    }

    #[test]
    fn two_against_one_reaches_consensus() {
        let a = entry(outcome_runs(2), 0);
        let b = entry(outcome_runs(2), 50);
        let c = entry(outcome_runs(3), 100);
        let decision = evaluate(&[a.clone(), b, c], 2);
        match decision {
            ConsensusDecision::Reached {
                final_entry,
                matching,
                total,
            } => {
                assert_eq!(final_entry, a.entry_id);
                assert_eq!(matching, 2);
                assert_eq!(total, 3);
            }
            other => panic!("expected Reached, got {:?}", other),
        }
    }

    #[test]
    fn even_split_is_disputed() {
        // 2 vs 2: largest group is not a strict majority
        let entries = vec![
            entry(outcome_runs(1), 0),
            entry(outcome_runs(1), 10),
            entry(outcome_runs(2), 20),
            entry(outcome_runs(2), 30),
        ];
        assert_eq!(
            evaluate(&entries, 2),
            ConsensusDecision::Disputed {
                matching: 2,
                total: 4
            }
        );
    }

    #[test]
    fn three_way_split_is_disputed() {
        let entries = vec![
            entry(outcome_runs(1), 0),
            entry(outcome_runs(2), 10),
            entry(outcome_runs(3), 20),
        ];
        assert_eq!(
            evaluate(&entries, 2),
            ConsensusDecision::Disputed {
                matching: 1,
                total: 3
            }
        );
    }

    #[test]
    fn agreement_below_floor_stays_pending() {
        // With a floor of 3, two agreeing entries are not yet consensus,
        // but they are not a dispute either: nothing disagrees.
        let a = entry(outcome_runs(4), 0);
        let b = entry(outcome_runs(4), 10);
        assert_eq!(
            evaluate(&[a, b], 3),
            ConsensusDecision::Pending {
                total: 2,
                matching: 2
            }
        );
    }

    #[test]
    fn participants_do_not_split_groups() {
        // Same outcome, different claimed bowler/striker: the grouping key
        // deliberately ignores participant identity, so these corroborate.
        let boundary = BallOutcome {
            runs: 4,
            extras: 0,
            ball_type: BallType::Legal,
            is_wicket: false,
            wicket_type: None,
            is_boundary: true,
            boundary_type: Some(BoundaryType::Four),
        };
        let a = entry(boundary.clone(), 0);
        let b = entry(boundary, 10);
        assert!(matches!(
            evaluate(&[a, b], 2),
            ConsensusDecision::Reached { matching: 2, total: 2, .. }
        ));
    }

    #[test]
    fn differing_wicket_types_disagree() {
        let a = entry(outcome_wicket(WicketType::Caught), 0);
        let b = entry(outcome_wicket(WicketType::Bowled), 10);
        assert_eq!(
            evaluate(&[a, b], 2),
            ConsensusDecision::Disputed {
                matching: 1,
                total: 2
            }
        );
    }
}
