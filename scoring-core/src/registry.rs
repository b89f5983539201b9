//! Scorer registry
//!
//! Assigns and authorizes scorer roles per match. Every mutating operation
//! in the engine checks authorization here before touching storage.

use crate::{
    error::{Error, Result},
    storage::Storage,
    types::{MatchId, ScorerAssignment, ScorerRole, UserId},
};
use chrono::Utc;
use std::sync::Arc;

/// Result of a bulk scorer assignment
#[derive(Debug, Clone)]
pub struct AssignmentResult {
    /// Assignments created by the call
    pub assignments: Vec<ScorerAssignment>,
}

/// Assigns and authorizes scorer roles per match
pub struct ScorerRegistry {
    storage: Arc<Storage>,
}

impl ScorerRegistry {
    /// Create registry over shared storage
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Assign the two team scorers (and optionally an umpire) for a match.
    ///
    /// Rejects with `Conflict` if any named user already holds an active
    /// assignment for the match, or the same user is named twice. Nothing
    /// is written unless every assignment is admissible.
    pub fn assign(
        &self,
        match_id: MatchId,
        team_a_scorer: UserId,
        team_b_scorer: UserId,
        appointed_by: UserId,
        umpire: Option<UserId>,
    ) -> Result<AssignmentResult> {
        let mut roster: Vec<(UserId, ScorerRole)> = vec![
            (team_a_scorer, ScorerRole::TeamAScorer),
            (team_b_scorer, ScorerRole::TeamBScorer),
        ];
        if let Some(umpire) = umpire {
            roster.push((umpire, ScorerRole::Umpire));
        }

        for (i, (user, _)) in roster.iter().enumerate() {
            if roster[..i].iter().any(|(u, _)| u == user) {
                return Err(Error::Conflict(format!(
                    "user {} named for more than one role",
                    user
                )));
            }
            self.ensure_unassigned(&match_id, user)?;
        }

        let now = Utc::now();
        let assignments: Vec<ScorerAssignment> = roster
            .into_iter()
            .map(|(user, role)| ScorerAssignment {
                match_id,
                user,
                role,
                appointed_by,
                active: true,
                appointed_at: now,
            })
            .collect();

        self.storage.put_assignments(&assignments)?;

        tracing::info!(
            match_id = %match_id,
            count = assignments.len(),
            "Scorers assigned"
        );

        Ok(AssignmentResult { assignments })
    }

    /// Appoint an umpire or referee after initial assignment.
    pub fn appoint_official(
        &self,
        match_id: MatchId,
        user: UserId,
        role: ScorerRole,
        appointed_by: UserId,
    ) -> Result<ScorerAssignment> {
        if !role.is_official() {
            return Err(Error::Validation(format!(
                "role {} is not an official role",
                role
            )));
        }
        self.ensure_unassigned(&match_id, &user)?;

        let assignment = ScorerAssignment {
            match_id,
            user,
            role,
            appointed_by,
            active: true,
            appointed_at: Utc::now(),
        };
        self.storage.put_assignment(&assignment)?;

        tracing::info!(match_id = %match_id, user = %user, role = %role, "Official appointed");

        Ok(assignment)
    }

    /// Deactivate a scorer's assignment (mid-match replacement).
    ///
    /// The assignment row is kept; a deactivated scorer fails `authorize`
    /// and their prior entries remain as evidence.
    pub fn deactivate(&self, match_id: MatchId, user: UserId) -> Result<ScorerAssignment> {
        let mut assignment = self
            .storage
            .get_assignment(&match_id, &user)?
            .ok_or_else(|| Error::NotFound(format!("assignment for user {}", user)))?;

        if !assignment.active {
            return Err(Error::Conflict(format!(
                "assignment for user {} is already inactive",
                user
            )));
        }

        assignment.active = false;
        self.storage.put_assignment(&assignment)?;

        tracing::info!(match_id = %match_id, user = %user, "Assignment deactivated");

        Ok(assignment)
    }

    /// Whether the user holds an active assignment for the match
    pub fn authorize(&self, match_id: &MatchId, user: &UserId) -> Result<bool> {
        Ok(self.find_active(match_id, user)?.is_some())
    }

    /// Active assignment for (match, user), if any
    pub fn find_active(
        &self,
        match_id: &MatchId,
        user: &UserId,
    ) -> Result<Option<ScorerAssignment>> {
        Ok(self
            .storage
            .get_assignment(match_id, user)?
            .filter(|a| a.active))
    }

    fn ensure_unassigned(&self, match_id: &MatchId, user: &UserId) -> Result<()> {
        if self.find_active(match_id, user)?.is_some() {
            return Err(Error::Conflict(format!(
                "user {} already holds an active assignment for match {}",
                user, match_id
            )));
        }
        Ok(())
    }
}
