//! The authorization decision engine.
//!
//! Authorization is an explicit ordered pipeline over a mutable
//! evaluation context. Each layer either passes (possibly enriching
//! the context) or halts with a [`DenyReason`]; the first halt wins
//! and no layer substitutes another's error. Every call produces
//! exactly one audit entry, granted or denied.

use entitle_core::denial::DenyReason;
use entitle_core::error::{EntitleError, EntitleResult};
use entitle_core::models::application::Application;
use entitle_core::models::decision::{AccessSource, DecisionContext, RequestMeta};
use entitle_core::models::grant::Grant;
use entitle_core::models::license::License;
use entitle_core::models::principal::Principal;
use entitle_core::models::tenant::Tenant;
use entitle_core::repository::{
    AccessLogRepository, ApplicationRepository, GrantRepository, LicenseRepository,
};
use entitle_core::roles::RolePolicy;

use crate::audit::AuditSink;
use crate::error::AccessError;

/// One protected-route authorization request.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    /// Verified principal, or `None` when authentication failed
    /// upstream.
    pub principal: Option<Principal>,
    /// Resolved tenant context, supplied by upstream middleware.
    pub tenant: Option<Tenant>,
    /// Target application slug.
    pub application_slug: String,
    /// Required role-in-application, when the route declares one.
    pub required_role: Option<String>,
    pub meta: RequestMeta,
}

/// The ordered pipeline. Evaluation halts at the first denying layer;
/// the order is data, not control flow buried in conditionals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Authentication,
    TenantContext,
    Application,
    License,
    Seats,
    UserAccess,
    Role,
}

const PIPELINE: &[Layer] = &[
    Layer::Authentication,
    Layer::TenantContext,
    Layer::Application,
    Layer::License,
    Layer::Seats,
    Layer::UserAccess,
    Layer::Role,
];

/// Mutable state threaded through the pipeline.
#[derive(Debug, Default)]
struct Evaluation {
    application: Option<Application>,
    license: Option<License>,
    /// The requester's active grant, fetched once at the seat layer
    /// and reused by the access and role layers.
    grant: Option<Grant>,
    source: Option<AccessSource>,
    /// Set for platform admins: remaining layers are skipped.
    bypass: bool,
}

pub struct DecisionEngine<A, L, G, X>
where
    A: ApplicationRepository,
    L: LicenseRepository,
    G: GrantRepository,
    X: AccessLogRepository,
{
    apps: A,
    licenses: L,
    grants: G,
    audit: AuditSink<X>,
    roles: RolePolicy,
}

impl<A, L, G, X> DecisionEngine<A, L, G, X>
where
    A: ApplicationRepository,
    L: LicenseRepository,
    G: GrantRepository,
    X: AccessLogRepository,
{
    pub fn new(apps: A, licenses: L, grants: G, audit: AuditSink<X>) -> Self {
        Self {
            apps,
            licenses,
            grants,
            audit,
            roles: RolePolicy::default(),
        }
    }

    /// Override the default role equivalence policy.
    pub fn with_role_policy(mut self, roles: RolePolicy) -> Self {
        self.roles = roles;
        self
    }

    /// Decide whether the request may invoke the target application.
    ///
    /// On a full pass, returns the decision context for downstream
    /// handlers and audits a granted entry. On any halt, audits a
    /// denied entry with the specific reason and returns exactly that
    /// reason. Infrastructure faults propagate as `Internal` without
    /// completing the audit write.
    pub async fn authorize(&self, req: &AccessRequest) -> Result<DecisionContext, AccessError> {
        let mut eval = Evaluation::default();

        for layer in PIPELINE {
            if eval.bypass {
                break;
            }
            if let Some(reason) = self.evaluate(*layer, req, &mut eval).await? {
                self.audit
                    .denied(
                        req.principal.as_ref().map(|p| p.user_id),
                        req.tenant.as_ref().map(|t| t.id),
                        eval.application.as_ref().map(|a| a.id),
                        &reason,
                        &req.meta,
                    )
                    .await;
                return Err(AccessError::Denied(reason));
            }
        }

        let ctx = self.context(req, eval)?;
        if let (Some(principal), Some(tenant)) = (req.principal.as_ref(), req.tenant.as_ref()) {
            self.audit
                .granted(principal.user_id, tenant.id, ctx.application_id, &req.meta)
                .await;
        }
        Ok(ctx)
    }

    /// Evaluate one layer: `None` passes, `Some(reason)` halts.
    async fn evaluate(
        &self,
        layer: Layer,
        req: &AccessRequest,
        eval: &mut Evaluation,
    ) -> EntitleResult<Option<DenyReason>> {
        match layer {
            Layer::Authentication => {
                Ok(req.principal.is_none().then_some(DenyReason::Unauthenticated))
            }

            Layer::TenantContext => Ok(req
                .tenant
                .is_none()
                .then_some(DenyReason::TenantContextMissing)),

            Layer::Application => match self.apps.get_by_slug(&req.application_slug).await? {
                Some(app) => {
                    eval.application = Some(app);
                    Ok(None)
                }
                None => Ok(Some(DenyReason::ApplicationNotFound {
                    slug: req.application_slug.clone(),
                })),
            },

            Layer::License => {
                let Some(principal) = req.principal.as_ref() else {
                    return Ok(Some(DenyReason::Unauthenticated));
                };
                let Some(tenant) = req.tenant.as_ref() else {
                    return Ok(Some(DenyReason::TenantContextMissing));
                };
                let Some(app) = eval.application.as_ref() else {
                    return Ok(Some(DenyReason::ApplicationNotFound {
                        slug: req.application_slug.clone(),
                    }));
                };

                eval.license = self.licenses.find_usable(tenant.id, app.id).await?;

                // Platform staff are not gated on tenant licensing,
                // seats, or grants.
                if principal.is_platform_admin() {
                    eval.bypass = true;
                    return Ok(None);
                }

                if eval.license.is_none() {
                    return Ok(Some(DenyReason::NoTenantLicense {
                        application: app.slug.clone(),
                    }));
                }
                Ok(None)
            }

            Layer::Seats => {
                let Some(principal) = req.principal.as_ref() else {
                    return Ok(Some(DenyReason::Unauthenticated));
                };
                let Some(tenant) = req.tenant.as_ref() else {
                    return Ok(Some(DenyReason::TenantContextMissing));
                };
                let Some(app) = eval.application.as_ref() else {
                    return Ok(Some(DenyReason::ApplicationNotFound {
                        slug: req.application_slug.clone(),
                    }));
                };

                eval.grant = self
                    .grants
                    .find_active(principal.user_id, tenant.id, app.id)
                    .await?;

                // Seat checks gate unseated users only: a user holding
                // an active grant is already counted.
                if eval.grant.is_none()
                    && let Some(license) = eval.license.as_ref()
                    && let Some(limit) = license.seat_limit
                {
                    let availability = self.licenses.seat_availability(license.id).await?;
                    if availability.is_some_and(|a| a.available() <= 0) {
                        return Ok(Some(DenyReason::SeatLimitExceeded { limit }));
                    }
                }
                Ok(None)
            }

            Layer::UserAccess => {
                let Some(principal) = req.principal.as_ref() else {
                    return Ok(Some(DenyReason::Unauthenticated));
                };
                let Some(app) = eval.application.as_ref() else {
                    return Ok(Some(DenyReason::ApplicationNotFound {
                        slug: req.application_slug.clone(),
                    }));
                };

                // Fast path: the token's precomputed allowed-apps set.
                // Slow path: the grant fetched at the seat layer.
                if principal.allowed_apps.iter().any(|slug| *slug == app.slug) {
                    eval.source = Some(AccessSource::Token);
                } else if eval.grant.is_some() {
                    eval.source = Some(AccessSource::Database);
                } else {
                    return Ok(Some(DenyReason::NoUserAccess {
                        application: app.slug.clone(),
                    }));
                }
                Ok(None)
            }

            Layer::Role => {
                let Some(required) = req.required_role.as_deref() else {
                    return Ok(None);
                };
                let Some(principal) = req.principal.as_ref() else {
                    return Ok(Some(DenyReason::Unauthenticated));
                };

                let effective = effective_role(eval.grant.as_ref(), principal);
                if self.roles.satisfies(&effective, required) {
                    Ok(None)
                } else {
                    Ok(Some(DenyReason::InsufficientRole {
                        required: required.to_string(),
                    }))
                }
            }
        }
    }

    /// Build the decision context after a full pass.
    fn context(&self, req: &AccessRequest, eval: Evaluation) -> Result<DecisionContext, AccessError> {
        let app = eval.application.ok_or_else(|| {
            EntitleError::Internal("decision context without resolved application".into())
        })?;

        let (role, source) = if eval.bypass {
            // Superuser scope: effective role is admin, attributed to
            // the credential.
            ("admin".to_string(), AccessSource::Token)
        } else {
            let principal = req.principal.as_ref().ok_or_else(|| {
                EntitleError::Internal("decision context without principal".into())
            })?;
            let source = eval.source.ok_or_else(|| {
                EntitleError::Internal("decision context without access source".into())
            })?;
            (effective_role(eval.grant.as_ref(), principal), source)
        };

        Ok(DecisionContext {
            application_id: app.id,
            application_name: app.name,
            role,
            license: eval.license,
            source,
        })
    }
}

/// The grant's role-in-application, falling back to the principal's
/// tenant role.
fn effective_role(grant: Option<&Grant>, principal: &Principal) -> String {
    grant
        .map(|g| g.app_role.clone())
        .unwrap_or_else(|| principal.role.as_str().to_string())
}
