//! Audit logger
//!
//! Append-only trail of every mutating action, success or failure. Writes
//! are best-effort: a failed audit write is logged and counted but never
//! propagates, so it cannot abort or roll back the primary operation.

use crate::{
    metrics::Metrics,
    storage::Storage,
    types::{
        AuditAction, AuditLogEntry, AuditOutcome, BallKey, MatchId, RequestMeta, UserId,
    },
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Best-effort append-only audit trail
pub struct AuditLogger {
    storage: Arc<Storage>,
    metrics: Metrics,
}

impl AuditLogger {
    /// Create logger over shared storage
    pub fn new(storage: Arc<Storage>, metrics: Metrics) -> Self {
        Self { storage, metrics }
    }

    /// Append one audit row. Never fails outward.
    #[allow(clippy::too_many_arguments)]
    pub fn log(
        &self,
        match_id: MatchId,
        actor: UserId,
        action: AuditAction,
        position: Option<BallKey>,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
        request: Option<RequestMeta>,
        outcome: AuditOutcome,
        notes: Option<String>,
    ) {
        let entry = AuditLogEntry {
            audit_id: Uuid::now_v7(),
            match_id,
            actor,
            action,
            position,
            old_value,
            new_value,
            request,
            outcome,
            notes,
            created_at: Utc::now(),
        };

        if let Err(e) = self.storage.append_audit(&entry) {
            self.metrics.record_audit_failure();
            tracing::warn!(
                error = %e,
                match_id = %entry.match_id,
                action = entry.action.as_str(),
                "Audit write failed; primary operation unaffected"
            );
        }
    }

    /// Serialize a value for an audit snapshot, swallowing failures the
    /// same way the write path does.
    pub fn snapshot<T: serde::Serialize>(value: &T) -> Option<serde_json::Value> {
        match serde_json::to_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(error = %e, "Audit snapshot serialization failed");
                None
            }
        }
    }
}
