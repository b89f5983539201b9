//! Core types for the scoring engine
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Append-only evidence (entries and audit rows are never mutated)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Match identifier (owned by the external match service)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(Uuid);

impl MatchId {
    /// Wrap an externally-issued match id
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User identifier (owned by the external identity service)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Wrap an externally-issued user id
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role held by an appointed scorer or official
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ScorerRole {
    /// Scorer appointed by team A
    TeamAScorer = 1,
    /// Scorer appointed by team B
    TeamBScorer = 2,
    /// Match umpire
    Umpire = 3,
    /// Match referee
    Referee = 4,
}

impl ScorerRole {
    /// Stable name used in logs and audit snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            ScorerRole::TeamAScorer => "team_a_scorer",
            ScorerRole::TeamBScorer => "team_b_scorer",
            ScorerRole::Umpire => "umpire",
            ScorerRole::Referee => "referee",
        }
    }

    /// Umpires and referees may resolve disputes
    pub fn is_official(&self) -> bool {
        matches!(self, ScorerRole::Umpire | ScorerRole::Referee)
    }
}

impl fmt::Display for ScorerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scorer appointment for one match
///
/// At most one *active* assignment per (match, user). Assignments are never
/// deleted; replacement flips `active` to false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerAssignment {
    /// Match this assignment applies to
    pub match_id: MatchId,

    /// Appointed user
    pub user: UserId,

    /// Role held
    pub role: ScorerRole,

    /// Who appointed them
    pub appointed_by: UserId,

    /// False once replaced or withdrawn
    pub active: bool,

    /// Appointment timestamp
    pub appointed_at: DateTime<Utc>,
}

/// Delivery classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BallType {
    /// Fair delivery
    Legal = 1,
    /// Wide (re-bowled, does not count toward the over)
    Wide = 2,
    /// No-ball (re-bowled, does not count toward the over)
    NoBall = 3,
    /// Bye (runs without bat contact)
    Bye = 4,
    /// Leg bye (runs off the batter's body)
    LegBye = 5,
}

impl BallType {
    /// Stable name used in logs and audit snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            BallType::Legal => "legal",
            BallType::Wide => "wide",
            BallType::NoBall => "no_ball",
            BallType::Bye => "bye",
            BallType::LegBye => "leg_bye",
        }
    }

    /// Whether the delivery counts toward the over (wides and no-balls
    /// are re-bowled)
    pub fn counts_toward_over(&self) -> bool {
        !matches!(self, BallType::Wide | BallType::NoBall)
    }
}

/// How the batter was dismissed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum WicketType {
    /// Bowled
    Bowled = 1,
    /// Caught
    Caught = 2,
    /// Leg before wicket
    Lbw = 3,
    /// Run out
    RunOut = 4,
    /// Stumped
    Stumped = 5,
    /// Hit wicket
    HitWicket = 6,
}

impl WicketType {
    /// Stable name used in logs and audit snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            WicketType::Bowled => "bowled",
            WicketType::Caught => "caught",
            WicketType::Lbw => "lbw",
            WicketType::RunOut => "run_out",
            WicketType::Stumped => "stumped",
            WicketType::HitWicket => "hit_wicket",
        }
    }
}

/// Boundary classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BoundaryType {
    /// Ball reached the rope
    Four = 4,
    /// Ball cleared the rope
    Six = 6,
}

impl BoundaryType {
    /// Runs a boundary of this kind must carry
    pub fn runs(&self) -> u8 {
        match self {
            BoundaryType::Four => 4,
            BoundaryType::Six => 6,
        }
    }

    /// Stable name used in logs and audit snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryType::Four => "four",
            BoundaryType::Six => "six",
        }
    }
}

/// Position of one delivery within a match
///
/// Innings/over/ball are caller-supplied: each scorer tracks their own
/// running position like a paper scorebook, and agreement on position is
/// part of what consensus checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BallKey {
    /// Match
    pub match_id: MatchId,
    /// Innings number (1-based)
    pub innings: u8,
    /// Over number (1-based)
    pub over_number: u16,
    /// Ball number within the over (1-6)
    pub ball_number: u8,
}

impl fmt::Display for BallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}.{}.{}",
            self.match_id, self.innings, self.over_number, self.ball_number
        )
    }
}

/// Outcome of one delivery — exactly the consensus grouping tuple
///
/// Two entries corroborate each other iff their outcomes compare equal.
/// Participant identity is deliberately not part of this tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BallOutcome {
    /// Runs off the bat
    pub runs: u8,

    /// Extra runs (wides, no-balls, byes, leg byes, overthrows)
    pub extras: u8,

    /// Delivery classification
    pub ball_type: BallType,

    /// Whether a wicket fell
    pub is_wicket: bool,

    /// Dismissal kind, required when `is_wicket`
    pub wicket_type: Option<WicketType>,

    /// Whether the ball reached or cleared the rope
    pub is_boundary: bool,

    /// Boundary kind, required when `is_boundary`
    pub boundary_type: Option<BoundaryType>,
}

impl BallOutcome {
    /// Runs credited to the batting side for this delivery
    pub fn total_runs(&self) -> u32 {
        u32::from(self.runs) + u32::from(self.extras)
    }
}

/// Who was involved in the delivery
///
/// Carried on every entry for the official record, but excluded from the
/// consensus grouping tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participants {
    /// Bowler
    pub bowler: UserId,
    /// Batter on strike
    pub striker: UserId,
    /// Batter at the non-striker's end
    pub non_striker: UserId,
}

/// One scorer's record of one delivery
///
/// Immutable once written — never updated or deleted. A scorer who made a
/// mistake submits nothing; the dispute path handles disagreement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallEntry {
    /// Unique entry ID (UUIDv7 for time-ordering)
    pub entry_id: Uuid,

    /// Match
    pub match_id: MatchId,

    /// Submitting scorer
    pub scorer: UserId,

    /// Innings number (caller-supplied)
    pub innings: u8,

    /// Over number (caller-supplied)
    pub over_number: u16,

    /// Ball number within the over (caller-supplied)
    pub ball_number: u8,

    /// What happened
    pub outcome: BallOutcome,

    /// Who was involved
    pub participants: Participants,

    /// Submission timestamp
    pub created_at: DateTime<Utc>,
}

impl BallEntry {
    /// Position this entry claims to describe
    pub fn key(&self) -> BallKey {
        BallKey {
            match_id: self.match_id,
            innings: self.innings,
            over_number: self.over_number,
            ball_number: self.ball_number,
        }
    }
}

/// Derived verification state for one ball key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum VerificationStatus {
    /// Fewer than two entries, or one entry awaiting corroboration
    Pending = 1,
    /// Strict majority agreement reached (or dispute resolved)
    Verified = 2,
    /// Entries disagree and no strict majority exists
    Disputed = 3,
}

impl VerificationStatus {
    /// Stable name used in logs and audit snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Disputed => "disputed",
        }
    }
}

/// Consensus bookkeeping for one ball key
///
/// Unique per (match, innings, over, ball). Transitions only forward:
/// Pending → Verified | Disputed → (resolution) → Verified. Once an
/// official ball exists the flags never regress; later entries only
/// refresh the counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallVerification {
    /// Match
    pub match_id: MatchId,

    /// Innings number
    pub innings: u8,

    /// Over number
    pub over_number: u16,

    /// Ball number within the over
    pub ball_number: u8,

    /// Entries submitted for this key
    pub total_entries: u32,

    /// Size of the largest agreeing group
    pub matching_entries: u32,

    /// True once a strict majority agreed (or an official resolved)
    pub consensus_reached: bool,

    /// Entry the official record was (or will be) built from
    pub final_entry: Option<Uuid>,

    /// True while entries disagree without a strict majority
    pub has_dispute: bool,

    /// Official who resolved the dispute, if resolution happened
    pub resolved_by: Option<UserId>,

    /// Resolution rationale
    pub resolution_notes: Option<String>,

    /// When consensus was reached or the dispute resolved
    pub verified_at: Option<DateTime<Utc>>,

    /// First entry timestamp
    pub created_at: DateTime<Utc>,

    /// Last re-evaluation timestamp
    pub updated_at: DateTime<Utc>,
}

impl BallVerification {
    /// Fresh verification row for a key's first entry
    pub fn new(key: BallKey, now: DateTime<Utc>) -> Self {
        Self {
            match_id: key.match_id,
            innings: key.innings,
            over_number: key.over_number,
            ball_number: key.ball_number,
            total_entries: 0,
            matching_entries: 0,
            consensus_reached: false,
            final_entry: None,
            has_dispute: false,
            resolved_by: None,
            resolution_notes: None,
            verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Position this row tracks
    pub fn key(&self) -> BallKey {
        BallKey {
            match_id: self.match_id,
            innings: self.innings,
            over_number: self.over_number,
            ball_number: self.ball_number,
        }
    }

    /// Derived status
    pub fn status(&self) -> VerificationStatus {
        if self.consensus_reached {
            VerificationStatus::Verified
        } else if self.has_dispute {
            VerificationStatus::Disputed
        } else {
            VerificationStatus::Pending
        }
    }
}

/// How an official ball came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordedBy {
    /// Strict majority of independent entries
    Consensus,
    /// Manual override by an umpire or referee
    Resolution {
        /// Resolving official
        resolver: UserId,
    },
}

/// The canonical, externally-visible outcome of one delivery
///
/// At most one per ball key, created exactly once and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficialBall {
    /// Unique record ID
    pub official_id: Uuid,

    /// Match
    pub match_id: MatchId,

    /// Innings number
    pub innings: u8,

    /// Over number
    pub over_number: u16,

    /// Ball number within the over
    pub ball_number: u8,

    /// Entry the record was materialized from
    pub source_entry: Uuid,

    /// Canonical outcome
    pub outcome: BallOutcome,

    /// Canonical participants (taken from the source entry)
    pub participants: Participants,

    /// Consensus or manual resolution
    pub recorded_by: RecordedBy,

    /// Materialization timestamp
    pub created_at: DateTime<Utc>,
}

impl OfficialBall {
    /// Position of this record
    pub fn key(&self) -> BallKey {
        BallKey {
            match_id: self.match_id,
            innings: self.innings,
            over_number: self.over_number,
            ball_number: self.ball_number,
        }
    }
}

/// Running aggregate for the batting side of one innings
///
/// Mutated in exactly one place: official-record materialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InningsTotals {
    /// Match
    pub match_id: MatchId,

    /// Innings number
    pub innings: u8,

    /// Runs scored (bat + extras)
    pub runs: u32,

    /// Wickets fallen
    pub wickets: u8,

    /// Legal deliveries bowled (wides and no-balls excluded)
    pub balls_bowled: u32,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl InningsTotals {
    /// Zeroed totals for an innings
    pub fn new(match_id: MatchId, innings: u8, now: DateTime<Utc>) -> Self {
        Self {
            match_id,
            innings,
            runs: 0,
            wickets: 0,
            balls_bowled: 0,
            updated_at: now,
        }
    }

    /// Credit one verified delivery to the batting side
    pub fn apply_delivery(&mut self, outcome: &BallOutcome, now: DateTime<Utc>) {
        self.runs += outcome.total_runs();
        if outcome.is_wicket {
            self.wickets = self.wickets.saturating_add(1);
        }
        if outcome.ball_type.counts_toward_over() {
            self.balls_bowled += 1;
        }
        self.updated_at = now;
    }

    /// Overs in standard `completed.balls` notation
    pub fn overs(&self) -> String {
        format!("{}.{}", self.balls_bowled / 6, self.balls_bowled % 6)
    }
}

/// Kind of mutating action recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AuditAction {
    /// Scorer assignment created, appointed or deactivated
    Assignment = 1,
    /// Ball entry submission
    BallEntry = 2,
    /// Manual dispute resolution
    DisputeResolution = 3,
}

impl AuditAction {
    /// Stable name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Assignment => "assignment",
            AuditAction::BallEntry => "ball_entry",
            AuditAction::DisputeResolution => "dispute_resolution",
        }
    }
}

/// Whether the audited call was accepted or rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    /// Primary operation committed
    Accepted,
    /// Rejected before any write, with the rejection reason
    Rejected(String),
}

/// Request metadata captured for audit purposes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Client IP address
    pub ip: Option<String>,
    /// Client user agent
    pub user_agent: Option<String>,
}

/// One row of the append-only audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique audit ID (UUIDv7 for time-ordering)
    pub audit_id: Uuid,

    /// Match the action applied to
    pub match_id: MatchId,

    /// Acting user
    pub actor: UserId,

    /// Kind of action
    pub action: AuditAction,

    /// Ball position, where applicable
    pub position: Option<BallKey>,

    /// State snapshot before the action
    pub old_value: Option<serde_json::Value>,

    /// State snapshot after the action
    pub new_value: Option<serde_json::Value>,

    /// Request metadata
    pub request: Option<RequestMeta>,

    /// Accepted or rejected
    pub outcome: AuditOutcome,

    /// Free-form notes
    pub notes: Option<String>,

    /// Timestamp
    pub created_at: DateTime<Utc>,
}
