//! SurrealDB implementation of [`ApplicationRepository`].

use chrono::{DateTime, Utc};
use entitle_core::error::{EntitleError, EntitleResult};
use entitle_core::models::application::{Application, CreateApplication};
use entitle_core::repository::{ApplicationRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct ApplicationRow {
    slug: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct ApplicationRowWithId {
    record_id: String,
    slug: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ApplicationRow {
    fn into_application(self, id: Uuid) -> Application {
        Application {
            id,
            slug: self.slug,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl ApplicationRowWithId {
    fn try_into_application(self) -> Result<Application, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Application {
            id,
            slug: self.slug,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Application repository.
#[derive(Clone)]
pub struct SurrealApplicationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealApplicationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ApplicationRepository for SurrealApplicationRepository<C> {
    async fn create(&self, input: CreateApplication) -> EntitleResult<Application> {
        if self.get_by_slug(&input.slug).await?.is_some() {
            return Err(EntitleError::AlreadyExists {
                entity: format!("application {}", input.slug),
            });
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('application', $id) SET \
                 slug = $slug, name = $name, description = $description",
            )
            .bind(("id", id_str.clone()))
            .bind(("slug", input.slug))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "application".into(),
            id: id_str,
        })?;

        Ok(row.into_application(id))
    }

    async fn get_by_id(&self, id: Uuid) -> EntitleResult<Option<Application>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('application', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(|row| row.into_application(id)))
    }

    async fn get_by_slug(&self, slug: &str) -> EntitleResult<Option<Application>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM application \
                 WHERE slug = $slug",
            )
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ApplicationRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(ApplicationRowWithId::try_into_application)
            .transpose()
            .map_err(Into::into)
    }

    async fn list(&self, pagination: Pagination) -> EntitleResult<PaginatedResult<Application>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM application GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM application \
                 ORDER BY slug ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ApplicationRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(ApplicationRowWithId::try_into_application)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
