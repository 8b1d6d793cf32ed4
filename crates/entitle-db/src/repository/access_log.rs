//! SurrealDB implementation of [`AccessLogRepository`].
//!
//! The backing table is append-only: update and delete are disabled at
//! the schema level (see the migration DDL).

use chrono::{DateTime, Utc};
use entitle_core::error::EntitleResult;
use entitle_core::models::audit::{AccessLogEntry, CreateAccessLogEntry, Decision};
use entitle_core::repository::{AccessLogFilter, AccessLogRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AccessLogRowWithId {
    record_id: String,
    actor_id: Option<String>,
    tenant_id: Option<String>,
    application_id: Option<String>,
    decision: String,
    reason: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    timestamp: DateTime<Utc>,
}

fn parse_decision(s: &str) -> Result<Decision, DbError> {
    match s {
        "Granted" => Ok(Decision::Granted),
        "Denied" => Ok(Decision::Denied),
        other => Err(DbError::Decode(format!("unknown decision: {other}"))),
    }
}

fn decision_to_string(d: Decision) -> &'static str {
    match d {
        Decision::Granted => "Granted",
        Decision::Denied => "Denied",
    }
}

fn parse_opt_uuid(field: &str, s: Option<&str>) -> Result<Option<Uuid>, DbError> {
    s.map(|s| {
        Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
    })
    .transpose()
}

impl AccessLogRowWithId {
    fn try_into_entry(self) -> Result<AccessLogEntry, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(AccessLogEntry {
            id,
            actor_id: parse_opt_uuid("actor", self.actor_id.as_deref())?,
            tenant_id: parse_opt_uuid("tenant", self.tenant_id.as_deref())?,
            application_id: parse_opt_uuid("application", self.application_id.as_deref())?,
            decision: parse_decision(&self.decision)?,
            reason: self.reason,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            timestamp: self.timestamp,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the access log repository.
#[derive(Clone)]
pub struct SurrealAccessLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAccessLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AccessLogRepository for SurrealAccessLogRepository<C> {
    async fn append(&self, input: CreateAccessLogEntry) -> EntitleResult<AccessLogEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('access_log', $id) SET \
                 actor_id = $actor_id, \
                 tenant_id = $tenant_id, \
                 application_id = $application_id, \
                 decision = $decision, \
                 reason = $reason, \
                 ip_address = $ip_address, \
                 user_agent = $user_agent; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('access_log', $id)",
            )
            .bind(("id", id_str.clone()))
            .bind(("actor_id", input.actor_id.map(|u| u.to_string())))
            .bind(("tenant_id", input.tenant_id.map(|u| u.to_string())))
            .bind(("application_id", input.application_id.map(|u| u.to_string())))
            .bind(("decision", decision_to_string(input.decision).to_string()))
            .bind(("reason", input.reason))
            .bind(("ip_address", input.ip_address))
            .bind(("user_agent", input.user_agent))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccessLogRowWithId> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "access_log".into(),
            id: id_str,
        })?;

        Ok(row.try_into_entry()?)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filter: AccessLogFilter,
        pagination: Pagination,
    ) -> EntitleResult<PaginatedResult<AccessLogEntry>> {
        let mut conditions = vec!["tenant_id = $tenant_id"];
        if filter.actor_id.is_some() {
            conditions.push("actor_id = $actor_id");
        }
        if filter.application_id.is_some() {
            conditions.push("application_id = $application_id");
        }
        if filter.decision.is_some() {
            conditions.push("decision = $decision");
        }
        if filter.from.is_some() {
            conditions.push("timestamp >= $from");
        }
        if filter.to.is_some() {
            conditions.push("timestamp < $to");
        }
        let where_clause = conditions.join(" AND ");

        let count_query = format!(
            "SELECT count() AS total FROM access_log \
             WHERE {where_clause} GROUP ALL"
        );
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM access_log \
             WHERE {where_clause} \
             ORDER BY timestamp DESC \
             LIMIT $limit START $offset"
        );

        let mut count_builder = self
            .db
            .query(&count_query)
            .bind(("tenant_id", tenant_id.to_string()));
        if let Some(actor_id) = filter.actor_id {
            count_builder = count_builder.bind(("actor_id", actor_id.to_string()));
        }
        if let Some(application_id) = filter.application_id {
            count_builder = count_builder.bind(("application_id", application_id.to_string()));
        }
        if let Some(decision) = filter.decision {
            count_builder = count_builder.bind(("decision", decision_to_string(decision).to_string()));
        }
        if let Some(from) = filter.from {
            count_builder = count_builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            count_builder = count_builder.bind(("to", to));
        }

        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut builder = self
            .db
            .query(&list_query)
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(actor_id) = filter.actor_id {
            builder = builder.bind(("actor_id", actor_id.to_string()));
        }
        if let Some(application_id) = filter.application_id {
            builder = builder.bind(("application_id", application_id.to_string()));
        }
        if let Some(decision) = filter.decision {
            builder = builder.bind(("decision", decision_to_string(decision).to_string()));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to));
        }

        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<AccessLogRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(AccessLogRowWithId::try_into_entry)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
