//! Pricing entry domain model.
//!
//! Prices are versioned by validity window and keyed by (application,
//! user type). Entries are superseded, never overwritten, so snapshots
//! frozen onto grants keep pointing at real history.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingEntry {
    pub id: Uuid,
    pub application_id: Uuid,
    /// Pricing category slug (see `User::user_type`).
    pub user_type: String,
    /// Non-negative decimal amount.
    pub price: BigDecimal,
    /// ISO 4217 currency code (e.g., `BRL`).
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub valid_from: DateTime<Utc>,
    /// `None` means open-ended (valid until superseded).
    pub valid_to: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PricingEntry {
    /// True when this entry's validity window contains `at`.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.valid_from <= at && self.valid_to.is_none_or(|to| at < to)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePricingEntry {
    pub application_id: Uuid,
    pub user_type: String,
    pub price: BigDecimal,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
}
