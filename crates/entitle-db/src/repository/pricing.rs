//! SurrealDB implementation of [`PricingRepository`].
//!
//! Entries are versioned by validity window; the overlap check runs in
//! the same transaction as the insert so concurrent schedules for one
//! (application, user type) pair cannot both land.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use entitle_core::error::EntitleResult;
use entitle_core::models::pricing::{BillingCycle, CreatePricingEntry, PricingEntry};
use entitle_core::repository::{PricingRepository, PricingWrite};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

const THROW_OVERLAP: &str = "pricing_overlap";

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PricingRowWithId {
    record_id: String,
    application_id: String,
    user_type: String,
    price: String,
    currency: String,
    billing_cycle: String,
    valid_from: DateTime<Utc>,
    valid_to: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl PricingRowWithId {
    fn try_into_entry(self) -> Result<PricingEntry, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let application_id = Uuid::parse_str(&self.application_id)
            .map_err(|e| DbError::Decode(format!("invalid application UUID: {e}")))?;
        let price = BigDecimal::from_str(&self.price)
            .map_err(|e| DbError::Decode(format!("invalid price: {e}")))?;
        let billing_cycle = BillingCycle::parse(&self.billing_cycle)
            .ok_or_else(|| DbError::Decode(format!("unknown billing cycle: {}", self.billing_cycle)))?;

        Ok(PricingEntry {
            id,
            application_id,
            user_type: self.user_type,
            price,
            currency: self.currency,
            billing_cycle,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Pricing repository.
#[derive(Clone)]
pub struct SurrealPricingRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPricingRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn get_by_id(&self, id: Uuid) -> EntitleResult<Option<PricingEntry>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('pricing_entry', $id)",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PricingRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(PricingRowWithId::try_into_entry)
            .transpose()
            .map_err(Into::into)
    }
}

impl<C: Connection> PricingRepository for SurrealPricingRepository<C> {
    async fn current(
        &self,
        application_id: Uuid,
        user_type: &str,
        at: DateTime<Utc>,
    ) -> EntitleResult<Option<PricingEntry>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM pricing_entry \
                 WHERE application_id = $application_id \
                 AND user_type = $user_type \
                 AND valid_from <= $at \
                 AND (valid_to = NONE OR valid_to > $at)",
            )
            .bind(("application_id", application_id.to_string()))
            .bind(("user_type", user_type.to_string()))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PricingRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(PricingRowWithId::try_into_entry)
            .transpose()
            .map_err(Into::into)
    }

    async fn create(&self, input: CreatePricingEntry) -> EntitleResult<PricingWrite> {
        let id = Uuid::new_v4();

        // Two windows [f1, t1) and [f2, t2) overlap iff f1 < t2 and
        // f2 < t1, with a missing bound standing in for infinity.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $clash = (SELECT * FROM pricing_entry \
                     WHERE application_id = $application_id \
                     AND user_type = $user_type \
                     AND (valid_to = NONE OR valid_to > $valid_from) \
                     AND ($valid_to = NONE OR valid_from < $valid_to)); \
                 IF array::len($clash) > 0 { THROW 'pricing_overlap' }; \
                 CREATE type::record('pricing_entry', $id) SET \
                     application_id = $application_id, \
                     user_type = $user_type, \
                     price = $price, \
                     currency = $currency, \
                     billing_cycle = $billing_cycle, \
                     valid_from = $valid_from, \
                     valid_to = $valid_to; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("application_id", input.application_id.to_string()))
            .bind(("user_type", input.user_type))
            .bind(("price", input.price.to_string()))
            .bind(("currency", input.currency))
            .bind(("billing_cycle", input.billing_cycle.as_str().to_string()))
            .bind(("valid_from", input.valid_from))
            .bind(("valid_to", input.valid_to))
            .await
            .map_err(DbError::from)?;

        if let Err(e) = result.check() {
            let msg = e.to_string();
            if msg.contains(THROW_OVERLAP) {
                return Ok(PricingWrite::Overlap);
            }
            return Err(DbError::Query(msg).into());
        }

        let entry = self.get_by_id(id).await?.ok_or_else(|| DbError::NotFound {
            entity: "pricing_entry".into(),
            id: id.to_string(),
        })?;

        Ok(PricingWrite::Created(entry))
    }

    async fn history(
        &self,
        application_id: Uuid,
        user_type: &str,
    ) -> EntitleResult<Vec<PricingEntry>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM pricing_entry \
                 WHERE application_id = $application_id \
                 AND user_type = $user_type \
                 ORDER BY valid_from DESC",
            )
            .bind(("application_id", application_id.to_string()))
            .bind(("user_type", user_type.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PricingRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(PricingRowWithId::try_into_entry)
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }
}
