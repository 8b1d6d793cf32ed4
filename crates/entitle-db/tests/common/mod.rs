//! Shared helpers for repository integration tests.

use entitle_core::models::application::{Application, CreateApplication};
use entitle_core::models::tenant::{CreateTenant, Tenant};
use entitle_core::models::user::{CreateUser, TenantRole, User};
use entitle_core::repository::{ApplicationRepository, TenantRepository, UserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

use entitle_db::repository::{
    SurrealApplicationRepository, SurrealTenantRepository, SurrealUserRepository,
};

/// Spin up an in-memory DB and run migrations.
pub async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    entitle_db::run_migrations(&db).await.unwrap();
    db
}

/// Create a tenant, an application, and one active user in that
/// tenant — the baseline fixture most suites need.
pub async fn seed(db: &Surreal<Db>) -> (Tenant, Application, User) {
    let tenant = SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            name: "Clinica Aurora".into(),
            slug: "clinica-aurora".into(),
        })
        .await
        .unwrap();

    let app = SurrealApplicationRepository::new(db.clone())
        .create(CreateApplication {
            slug: "tq".into(),
            name: "Transcription & Quoting".into(),
            description: "Clinical transcription and quote generation".into(),
        })
        .await
        .unwrap();

    let user = SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            tenant_id: tenant.id,
            username: "alice".into(),
            email: "alice@example.com".into(),
            role: TenantRole::Operations,
            platform_role: None,
            user_type: None,
        })
        .await
        .unwrap();

    (tenant, app, user)
}
