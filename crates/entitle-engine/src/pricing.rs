//! Pricing snapshot resolver.
//!
//! Resolves the price in force for an (application, user type) pair
//! and schedules future entries. Grants freeze the resolved price, so
//! later changes never touch issued snapshots.

use bigdecimal::Zero;
use chrono::Utc;
use entitle_core::denial::DenyReason;
use entitle_core::error::{EntitleError, EntitleResult};
use entitle_core::models::pricing::{CreatePricingEntry, PricingEntry};
use entitle_core::repository::{PricingRepository, PricingWrite};
use uuid::Uuid;

use crate::error::AccessError;

pub struct PricingService<P: PricingRepository> {
    repo: P,
}

impl<P: PricingRepository> PricingService<P> {
    pub fn new(repo: P) -> Self {
        Self { repo }
    }

    /// The entry whose validity window contains now; `None` when the
    /// pair is unconfigured.
    pub async fn current_price(
        &self,
        application_id: Uuid,
        user_type: &str,
    ) -> EntitleResult<Option<PricingEntry>> {
        self.repo.current(application_id, user_type, Utc::now()).await
    }

    /// Insert a (possibly future-dated) entry.
    ///
    /// A negative price is rejected before any I/O; an overlapping
    /// window is rejected atomically by the repository transaction.
    pub async fn schedule_price(
        &self,
        input: CreatePricingEntry,
    ) -> Result<PricingEntry, AccessError> {
        if input.price < bigdecimal::BigDecimal::zero() {
            return Err(AccessError::Denied(DenyReason::InvalidPrice {
                price: input.price.to_string(),
            }));
        }
        if let Some(valid_to) = input.valid_to
            && valid_to <= input.valid_from
        {
            return Err(AccessError::Internal(EntitleError::Validation {
                message: "valid_to must be after valid_from".into(),
            }));
        }

        match self.repo.create(input).await? {
            PricingWrite::Created(entry) => Ok(entry),
            PricingWrite::Overlap => Err(AccessError::Internal(EntitleError::Validation {
                message: "pricing window overlaps an existing entry for this \
                          application and user type"
                    .into(),
            })),
        }
    }

    /// Full price history for the pair, newest window first.
    pub async fn history(
        &self,
        application_id: Uuid,
        user_type: &str,
    ) -> EntitleResult<Vec<PricingEntry>> {
        self.repo.history(application_id, user_type).await
    }
}
