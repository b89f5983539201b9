//! Crosscheck Scoring Core
//!
//! Ball-scoring consensus and dispute-resolution engine for co-scored
//! cricket matches.
//!
//! # Architecture
//!
//! - **Evidence, not edits**: every scorer submission is an immutable row;
//!   corrections arrive as new entries, never as updates
//! - **Single Writer**: one logical writer task eliminates race conditions
//! - **Strict majority**: a ball verifies only when more than half of its
//!   entries agree, with at least two corroborating
//! - **Atomic units**: entry, re-evaluation and official record commit in
//!   one write batch
//!
//! # Invariants
//!
//! - At most one official ball per (match, innings, over, ball)
//! - Ball entries are never modified or deleted
//! - Verification state only moves forward; a verified ball never regresses
//! - Innings totals are mutated only by official-record materialization

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod audit;
pub mod config;
pub mod consensus;
pub mod dispute;
pub mod engine;
pub mod entries;
pub mod error;
pub mod metrics;
pub mod official;
pub mod registry;
pub mod status;
pub mod storage;
pub mod types;

// Re-exports
pub use config::{Config, ConsensusConfig};
pub use dispute::ResolutionRequest;
pub use engine::ScoringEngine;
pub use entries::{BallEntryRequest, SubmitOutcome};
pub use error::{Error, Result};
pub use registry::AssignmentResult;
pub use status::{DisputeSummary, ScoringStatus};
pub use storage::Storage;
pub use types::{
    AuditAction, AuditLogEntry, AuditOutcome, BallEntry, BallKey, BallOutcome, BallType,
    BallVerification, BoundaryType, InningsTotals, MatchId, OfficialBall, Participants,
    RecordedBy, RequestMeta, ScorerAssignment, ScorerRole, UserId, VerificationStatus, WicketType,
};
