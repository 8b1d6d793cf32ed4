//! Audit log sink — best-effort, never able to change a decision.
//!
//! Every authorization attempt produces exactly one entry. If the
//! audit write itself fails, the failure goes to process diagnostics
//! and the already-determined outcome stands, uniformly on both the
//! grant and deny paths.

use entitle_core::denial::DenyReason;
use entitle_core::models::audit::{CreateAccessLogEntry, Decision};
use entitle_core::models::decision::RequestMeta;
use entitle_core::repository::AccessLogRepository;
use tracing::error;
use uuid::Uuid;

pub struct AuditSink<X: AccessLogRepository> {
    repo: X,
}

impl<X: AccessLogRepository> AuditSink<X> {
    pub fn new(repo: X) -> Self {
        Self { repo }
    }

    pub async fn granted(
        &self,
        actor_id: Uuid,
        tenant_id: Uuid,
        application_id: Uuid,
        meta: &RequestMeta,
    ) {
        let entry = CreateAccessLogEntry {
            actor_id: Some(actor_id),
            tenant_id: Some(tenant_id),
            application_id: Some(application_id),
            decision: Decision::Granted,
            reason: None,
            ip_address: meta.ip_address.clone(),
            user_agent: meta.user_agent.clone(),
        };
        if let Err(e) = self.repo.append(entry).await {
            error!(error = %e, "audit write failed for granted decision");
        }
    }

    pub async fn denied(
        &self,
        actor_id: Option<Uuid>,
        tenant_id: Option<Uuid>,
        application_id: Option<Uuid>,
        reason: &DenyReason,
        meta: &RequestMeta,
    ) {
        let entry = CreateAccessLogEntry {
            actor_id,
            tenant_id,
            application_id,
            decision: Decision::Denied,
            reason: Some(reason.code().to_string()),
            ip_address: meta.ip_address.clone(),
            user_agent: meta.user_agent.clone(),
        };
        if let Err(e) = self.repo.append(entry).await {
            error!(error = %e, reason = reason.code(), "audit write failed for denied decision");
        }
    }
}
