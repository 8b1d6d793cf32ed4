//! Token context extraction — bearer credential to verified
//! [`Principal`].
//!
//! Verification is two-step: cryptographic (signature, expiry, issuer)
//! followed by a fresh lookup of the user's current record, so a user
//! deactivated after issuance is rejected even while their token is
//! still valid. Role and user-type come from the current record; the
//! allowed-apps list stays token-sourced (it is explicitly the
//! possibly-stale fast path).

use chrono::DateTime;
use entitle_core::models::principal::Principal;
use entitle_core::models::user::UserStatus;
use entitle_core::repository::UserRepository;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token;

/// Turns a raw bearer credential into a verified [`Principal`].
///
/// Generic over the user repository so the auth layer has no
/// dependency on the database crate.
pub struct PrincipalExtractor<U: UserRepository> {
    users: U,
    config: AuthConfig,
}

impl<U: UserRepository> PrincipalExtractor<U> {
    pub fn new(users: U, config: AuthConfig) -> Self {
        Self { users, config }
    }

    /// Verify `raw` and produce the request principal.
    ///
    /// Fails with `TokenExpired`/`TokenInvalid` when verification
    /// fails, and with `AccountInactive` when the backing user is no
    /// longer active even though the token itself is valid.
    pub async fn extract(&self, raw: &str) -> Result<Principal, AuthError> {
        let raw = raw.strip_prefix("Bearer ").unwrap_or(raw);
        let claims = token::decode_access_token(raw, &self.config)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|e| AuthError::TokenInvalid(format!("bad subject: {e}")))?;
        let tenant_id = Uuid::parse_str(&claims.tenant_id)
            .map_err(|e| AuthError::TokenInvalid(format!("bad tenant id: {e}")))?;

        // Fresh lookup: catch deactivation since token issuance.
        let user = self
            .users
            .get_by_id(tenant_id, user_id)
            .await?
            .ok_or(AuthError::AccountInactive)?;

        if user.status != UserStatus::Active {
            return Err(AuthError::AccountInactive);
        }

        let issued_at = DateTime::from_timestamp(claims.iat, 0)
            .ok_or_else(|| AuthError::TokenInvalid("bad iat".into()))?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::TokenInvalid("bad exp".into()))?;

        Ok(Principal {
            user_id: user.id,
            tenant_id: user.tenant_id,
            role: user.role,
            platform_role: user.platform_role,
            user_type: user.user_type,
            allowed_apps: claims.apps,
            issued_at,
            expires_at,
        })
    }
}
