//! The stable denial-reason taxonomy.
//!
//! Every way an authorization attempt, grant, or revoke can be refused
//! for a business reason is one of these variants. The decision engine
//! is the only producer; route handlers consume the taxonomy and never
//! see raw datastore errors. Codes returned by [`DenyReason::code`] are
//! a wire-stable contract; messages may be reworded.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DenyReason {
    #[error("authentication required")]
    Unauthenticated,

    #[error("tenant context missing from request")]
    TenantContextMissing,

    #[error("application not found: {slug}")]
    ApplicationNotFound { slug: String },

    #[error("tenant has no active license for application {application}")]
    NoTenantLicense { application: String },

    #[error("seat limit of {limit} reached for this license")]
    SeatLimitExceeded { limit: u32 },

    #[error("user has no access to application {application}")]
    NoUserAccess { application: String },

    #[error("role {required} is required for this operation")]
    InsufficientRole { required: String },

    #[error("no pricing configured for application {application} and user type {user_type}")]
    PricingNotConfigured {
        application: String,
        user_type: String,
    },

    #[error("no access grant exists for this user and application")]
    GrantNotFound,

    #[error("an active access grant already exists for this user and application")]
    DuplicateGrant,

    #[error("invalid price: {price}")]
    InvalidPrice { price: String },
}

impl DenyReason {
    /// Wire-stable reason code, stored on audit entries and returned to
    /// API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::TenantContextMissing => "tenant_context_missing",
            Self::ApplicationNotFound { .. } => "application_not_found",
            Self::NoTenantLicense { .. } => "no_tenant_license",
            Self::SeatLimitExceeded { .. } => "seat_limit_exceeded",
            Self::NoUserAccess { .. } => "no_user_access",
            Self::InsufficientRole { .. } => "insufficient_role",
            Self::PricingNotConfigured { .. } => "pricing_not_configured",
            Self::GrantNotFound => "grant_not_found",
            Self::DuplicateGrant => "duplicate_grant",
            Self::InvalidPrice { .. } => "invalid_price",
        }
    }

    /// HTTP-equivalent status class for transport layers.
    pub fn status_hint(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::TenantContextMissing => 400,
            Self::ApplicationNotFound { .. } | Self::GrantNotFound => 404,
            Self::DuplicateGrant => 409,
            Self::InvalidPrice { .. } => 422,
            Self::NoTenantLicense { .. }
            | Self::SeatLimitExceeded { .. }
            | Self::NoUserAccess { .. }
            | Self::InsufficientRole { .. }
            | Self::PricingNotConfigured { .. } => 403,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(DenyReason::Unauthenticated.code(), "unauthenticated");
        assert_eq!(
            DenyReason::SeatLimitExceeded { limit: 2 }.code(),
            "seat_limit_exceeded"
        );
        assert_eq!(
            DenyReason::PricingNotConfigured {
                application: "tq".into(),
                user_type: "operations".into(),
            }
            .code(),
            "pricing_not_configured"
        );
    }

    #[test]
    fn status_hints_follow_the_failure_class() {
        assert_eq!(DenyReason::Unauthenticated.status_hint(), 401);
        assert_eq!(DenyReason::TenantContextMissing.status_hint(), 400);
        assert_eq!(
            DenyReason::ApplicationNotFound { slug: "tq".into() }.status_hint(),
            404
        );
        assert_eq!(DenyReason::DuplicateGrant.status_hint(), 409);
        assert_eq!(
            DenyReason::NoTenantLicense {
                application: "tq".into()
            }
            .status_hint(),
            403
        );
    }

    #[test]
    fn seat_limit_message_includes_the_limit() {
        let reason = DenyReason::SeatLimitExceeded { limit: 2 };
        assert!(reason.to_string().contains('2'));
    }

    #[test]
    fn pricing_message_names_application_and_user_type() {
        let reason = DenyReason::PricingNotConfigured {
            application: "tq".into(),
            user_type: "operations".into(),
        };
        let msg = reason.to_string();
        assert!(msg.contains("tq"));
        assert!(msg.contains("operations"));
    }
}
