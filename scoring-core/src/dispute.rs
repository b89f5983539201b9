//! Dispute resolver
//!
//! Manual override for ball keys whose entries never reached consensus.
//! Only an active umpire or referee may resolve, and a ball that already
//! has an official record may never be re-resolved.

use crate::{
    error::{Error, Result},
    official::OfficialRecordWriter,
    registry::ScorerRegistry,
    storage::Storage,
    types::{BallKey, MatchId, OfficialBall, RecordedBy, RequestMeta, UserId},
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// One official's ruling on a disputed ball
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
    /// Match
    pub match_id: MatchId,
    /// Innings number
    pub innings: u8,
    /// Over number
    pub over_number: u16,
    /// Ball number within the over
    pub ball_number: u8,
    /// Resolving official (must hold umpire or referee)
    pub resolver: UserId,
    /// Entry whose outcome becomes canonical
    pub final_entry_id: Uuid,
    /// Rationale recorded on the verification
    pub notes: String,
    /// Request metadata for audit
    pub meta: RequestMeta,
}

impl ResolutionRequest {
    /// Position being resolved
    pub fn key(&self) -> BallKey {
        BallKey {
            match_id: self.match_id,
            innings: self.innings,
            over_number: self.over_number,
            ball_number: self.ball_number,
        }
    }
}

/// Resolves disputes by materializing an official's chosen entry
pub struct DisputeResolver {
    storage: Arc<Storage>,
    official_writer: OfficialRecordWriter,
}

impl DisputeResolver {
    /// Create resolver over shared storage
    pub fn new(storage: Arc<Storage>) -> Self {
        let official_writer = OfficialRecordWriter::new(storage.clone());
        Self {
            storage,
            official_writer,
        }
    }

    /// Resolve one ball key in favor of a chosen entry.
    ///
    /// Must only be called from the single writer task; the existence
    /// checks below rely on its serialization.
    pub fn resolve(
        &self,
        registry: &ScorerRegistry,
        request: ResolutionRequest,
    ) -> Result<OfficialBall> {
        let assignment = registry
            .find_active(&request.match_id, &request.resolver)?
            .ok_or_else(|| {
                Error::Authorization(format!(
                    "user {} holds no active assignment for match {}",
                    request.resolver, request.match_id
                ))
            })?;

        if !assignment.role.is_official() {
            return Err(Error::Authorization(format!(
                "role {} may not resolve disputes",
                assignment.role
            )));
        }

        let key = request.key();

        let mut verification = self
            .storage
            .get_verification(&key)?
            .ok_or_else(|| Error::NotFound(format!("no entries recorded for ball {}", key)))?;

        if self.storage.get_official(&key)?.is_some() {
            return Err(Error::Conflict(format!(
                "ball {} is already verified and may not be re-resolved",
                key
            )));
        }

        let chosen = self.storage.get_entry(request.final_entry_id)?;
        if chosen.key() != key {
            return Err(Error::Validation(format!(
                "entry {} was submitted for ball {}, not {}",
                chosen.entry_id,
                chosen.key(),
                key
            )));
        }

        let now = Utc::now();
        verification.consensus_reached = true;
        verification.has_dispute = false;
        verification.final_entry = Some(chosen.entry_id);
        verification.resolved_by = Some(request.resolver);
        verification.resolution_notes = Some(request.notes);
        verification.verified_at = Some(now);
        verification.updated_at = now;

        let materialized = self
            .official_writer
            .materialize(
                &chosen,
                RecordedBy::Resolution {
                    resolver: request.resolver,
                },
            )?
            // The official check above makes this unreachable under the
            // single writer, but a conflict beats a panic.
            .ok_or_else(|| {
                Error::Conflict(format!("ball {} was materialized concurrently", key))
            })?;

        self.storage
            .commit_resolution(&verification, &materialized.official, &materialized.totals)?;

        tracing::info!(
            key = %key,
            resolver = %request.resolver,
            final_entry = %chosen.entry_id,
            "Dispute resolved"
        );

        Ok(materialized.official)
    }
}
