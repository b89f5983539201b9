//! Actor-based concurrency for the scoring engine
//!
//! All mutating operations flow through one writer task:
//! - A single logical writer eliminates race conditions, so the
//!   check-then-insert on the official-ball table is safe and at most one
//!   official record can ever exist per ball key.
//! - Callers await a oneshot reply, so every operation still completes
//!   inside the request that invoked it — no background work survives the
//!   reply.
//! - The audit row for each attempted operation is appended after the
//!   primary unit commits (or after the rejection is decided), so a failed
//!   audit write can never roll the primary back.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │            Application glue (HTTP handlers)           │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              ScoringHandle (Clone)                    │
//! │         Sends messages to the writer mailbox          │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │            ScoringActor (single task)                 │
//! │   authorize → validate → WriteBatch commit → audit    │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::{
    audit::AuditLogger,
    dispute::{DisputeResolver, ResolutionRequest},
    entries::{BallEntryRequest, BallEntryStore, SubmitOutcome},
    error::{Error, Result},
    metrics::Metrics,
    registry::{AssignmentResult, ScorerRegistry},
    storage::Storage,
    types::{
        AuditAction, AuditOutcome, MatchId, OfficialBall, RequestMeta, ScorerAssignment,
        ScorerRole, UserId, VerificationStatus,
    },
    Config,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the scoring actor
pub enum ScoringMessage {
    /// Assign the initial scorer roster for a match
    AssignScorers {
        /// Match
        match_id: MatchId,
        /// Team A scorer
        team_a_scorer: UserId,
        /// Team B scorer
        team_b_scorer: UserId,
        /// Appointing user
        appointed_by: UserId,
        /// Optional umpire
        umpire: Option<UserId>,
        /// Request metadata for audit
        meta: RequestMeta,
        /// Reply channel
        response: oneshot::Sender<Result<AssignmentResult>>,
    },

    /// Appoint an umpire or referee
    AppointOfficial {
        /// Match
        match_id: MatchId,
        /// Appointed user
        user: UserId,
        /// Official role
        role: ScorerRole,
        /// Appointing user
        appointed_by: UserId,
        /// Request metadata for audit
        meta: RequestMeta,
        /// Reply channel
        response: oneshot::Sender<Result<ScorerAssignment>>,
    },

    /// Deactivate a scorer's assignment
    DeactivateScorer {
        /// Match
        match_id: MatchId,
        /// User whose assignment is withdrawn
        user: UserId,
        /// Requesting user
        requested_by: UserId,
        /// Request metadata for audit
        meta: RequestMeta,
        /// Reply channel
        response: oneshot::Sender<Result<ScorerAssignment>>,
    },

    /// Submit one ball entry
    SubmitEntry {
        /// The submission
        request: BallEntryRequest,
        /// Reply channel
        response: oneshot::Sender<Result<SubmitOutcome>>,
    },

    /// Resolve a disputed ball
    ResolveDispute {
        /// The ruling
        request: ResolutionRequest,
        /// Reply channel
        response: oneshot::Sender<Result<OfficialBall>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that serializes all mutating operations
pub struct ScoringActor {
    storage: Arc<Storage>,
    registry: ScorerRegistry,
    entry_store: BallEntryStore,
    dispute_resolver: DisputeResolver,
    audit: AuditLogger,
    metrics: Metrics,
    mailbox: mpsc::Receiver<ScoringMessage>,
}

impl ScoringActor {
    /// Create new actor
    pub fn new(
        storage: Arc<Storage>,
        config: &Config,
        metrics: Metrics,
        mailbox: mpsc::Receiver<ScoringMessage>,
    ) -> Self {
        Self {
            registry: ScorerRegistry::new(storage.clone()),
            entry_store: BallEntryStore::new(storage.clone(), config.consensus.clone()),
            dispute_resolver: DisputeResolver::new(storage.clone()),
            audit: AuditLogger::new(storage.clone(), metrics.clone()),
            metrics,
            storage,
            mailbox,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                ScoringMessage::Shutdown => break,
                other => self.handle_message(other),
            }
        }
        tracing::info!("Scoring actor stopped");
    }

    fn handle_message(&mut self, msg: ScoringMessage) {
        match msg {
            ScoringMessage::AssignScorers {
                match_id,
                team_a_scorer,
                team_b_scorer,
                appointed_by,
                umpire,
                meta,
                response,
            } => {
                let result = self.registry.assign(
                    match_id,
                    team_a_scorer,
                    team_b_scorer,
                    appointed_by,
                    umpire,
                );

                let (outcome, new_value) = match &result {
                    Ok(r) => (AuditOutcome::Accepted, AuditLogger::snapshot(&r.assignments)),
                    Err(e) => (AuditOutcome::Rejected(e.to_string()), None),
                };
                if result.is_err() {
                    self.metrics.record_rejection();
                }
                self.audit.log(
                    match_id,
                    appointed_by,
                    AuditAction::Assignment,
                    None,
                    None,
                    new_value,
                    Some(meta),
                    outcome,
                    None,
                );

                let _ = response.send(result);
            }

            ScoringMessage::AppointOfficial {
                match_id,
                user,
                role,
                appointed_by,
                meta,
                response,
            } => {
                let result = self
                    .registry
                    .appoint_official(match_id, user, role, appointed_by);

                let (outcome, new_value) = match &result {
                    Ok(a) => (AuditOutcome::Accepted, AuditLogger::snapshot(a)),
                    Err(e) => (AuditOutcome::Rejected(e.to_string()), None),
                };
                if result.is_err() {
                    self.metrics.record_rejection();
                }
                self.audit.log(
                    match_id,
                    appointed_by,
                    AuditAction::Assignment,
                    None,
                    None,
                    new_value,
                    Some(meta),
                    outcome,
                    None,
                );

                let _ = response.send(result);
            }

            ScoringMessage::DeactivateScorer {
                match_id,
                user,
                requested_by,
                meta,
                response,
            } => {
                let old_value = self
                    .storage
                    .get_assignment(&match_id, &user)
                    .ok()
                    .flatten()
                    .as_ref()
                    .and_then(AuditLogger::snapshot);

                let result = self.registry.deactivate(match_id, user);

                let (outcome, new_value) = match &result {
                    Ok(a) => (AuditOutcome::Accepted, AuditLogger::snapshot(a)),
                    Err(e) => (AuditOutcome::Rejected(e.to_string()), None),
                };
                if result.is_err() {
                    self.metrics.record_rejection();
                }
                self.audit.log(
                    match_id,
                    requested_by,
                    AuditAction::Assignment,
                    None,
                    old_value,
                    new_value,
                    Some(meta),
                    outcome,
                    None,
                );

                let _ = response.send(result);
            }

            ScoringMessage::SubmitEntry { request, response } => {
                let started = Instant::now();
                let key = request.key();
                let scorer = request.scorer;
                let meta = request.meta.clone();

                let before = self.storage.get_verification(&key).ok().flatten();
                let was_disputed = before
                    .as_ref()
                    .map(|v| v.status() == VerificationStatus::Disputed)
                    .unwrap_or(false);
                let was_verified = before
                    .as_ref()
                    .map(|v| v.consensus_reached)
                    .unwrap_or(false);
                let old_value = before.as_ref().and_then(AuditLogger::snapshot);

                let result = self.entry_store.submit(&self.registry, request);

                match &result {
                    Ok(outcome) => {
                        self.metrics.record_entry();
                        if outcome.consensus_reached && !was_verified {
                            self.metrics.record_consensus();
                            if was_disputed {
                                // Third entry formed a majority over an
                                // existing dispute
                                self.metrics.record_dispute_closed();
                            }
                        } else if outcome.status == VerificationStatus::Disputed && !was_disputed {
                            self.metrics.record_dispute_opened();
                        }
                    }
                    Err(_) => self.metrics.record_rejection(),
                }

                let new_value = self
                    .storage
                    .get_verification(&key)
                    .ok()
                    .flatten()
                    .as_ref()
                    .and_then(AuditLogger::snapshot);
                let outcome = match &result {
                    Ok(_) => AuditOutcome::Accepted,
                    Err(e) => AuditOutcome::Rejected(e.to_string()),
                };
                self.audit.log(
                    key.match_id,
                    scorer,
                    AuditAction::BallEntry,
                    Some(key),
                    old_value,
                    new_value,
                    Some(meta),
                    outcome,
                    None,
                );

                self.metrics
                    .record_submit_duration(started.elapsed().as_secs_f64());

                let _ = response.send(result);
            }

            ScoringMessage::ResolveDispute { request, response } => {
                let key = request.key();
                let resolver = request.resolver;
                let meta = request.meta.clone();
                let notes = request.notes.clone();

                let before = self.storage.get_verification(&key).ok().flatten();
                let was_disputed = before
                    .as_ref()
                    .map(|v| v.status() == VerificationStatus::Disputed)
                    .unwrap_or(false);
                let old_value = before.as_ref().and_then(AuditLogger::snapshot);

                let result = self.dispute_resolver.resolve(&self.registry, request);

                let (outcome, new_value) = match &result {
                    Ok(official) => {
                        self.metrics.record_resolution();
                        if was_disputed {
                            self.metrics.record_dispute_closed();
                        }
                        (AuditOutcome::Accepted, AuditLogger::snapshot(official))
                    }
                    Err(e) => {
                        self.metrics.record_rejection();
                        (AuditOutcome::Rejected(e.to_string()), None)
                    }
                };
                self.audit.log(
                    key.match_id,
                    resolver,
                    AuditAction::DisputeResolution,
                    Some(key),
                    old_value,
                    new_value,
                    Some(meta),
                    outcome,
                    Some(notes),
                );

                let _ = response.send(result);
            }

            ScoringMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct ScoringHandle {
    sender: mpsc::Sender<ScoringMessage>,
}

impl ScoringHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<ScoringMessage>) -> Self {
        Self { sender }
    }

    /// Assign the initial scorer roster
    pub async fn assign_scorers(
        &self,
        match_id: MatchId,
        team_a_scorer: UserId,
        team_b_scorer: UserId,
        appointed_by: UserId,
        umpire: Option<UserId>,
        meta: RequestMeta,
    ) -> Result<AssignmentResult> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ScoringMessage::AssignScorers {
                match_id,
                team_a_scorer,
                team_b_scorer,
                appointed_by,
                umpire,
                meta,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
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
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ScoringMessage::AppointOfficial {
                match_id,
                user,
                role,
                appointed_by,
                meta,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Deactivate a scorer's assignment
    pub async fn deactivate_scorer(
        &self,
        match_id: MatchId,
        user: UserId,
        requested_by: UserId,
        meta: RequestMeta,
    ) -> Result<ScorerAssignment> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ScoringMessage::DeactivateScorer {
                match_id,
                user,
                requested_by,
                meta,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Submit one ball entry
    pub async fn submit_entry(&self, request: BallEntryRequest) -> Result<SubmitOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ScoringMessage::SubmitEntry {
                request,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Resolve a disputed ball
    pub async fn resolve_dispute(&self, request: ResolutionRequest) -> Result<OfficialBall> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ScoringMessage::ResolveDispute {
                request,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(ScoringMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the scoring actor
pub fn spawn_scoring_actor(
    storage: Arc<Storage>,
    config: &Config,
    metrics: Metrics,
) -> ScoringHandle {
    let (tx, rx) = mpsc::channel(1000); // Bounded channel for backpressure
    let actor = ScoringActor::new(storage, config, metrics, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    ScoringHandle::new(tx)
}
