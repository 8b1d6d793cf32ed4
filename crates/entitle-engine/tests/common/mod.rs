//! Shared fixture for engine integration tests.
#![allow(dead_code)] // not every suite uses every helper

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use entitle_core::models::application::{Application, CreateApplication};
use entitle_core::models::decision::RequestMeta;
use entitle_core::models::license::{CreateLicense, License};
use entitle_core::models::pricing::{BillingCycle, CreatePricingEntry};
use entitle_core::models::principal::Principal;
use entitle_core::models::tenant::{CreateTenant, Tenant};
use entitle_core::models::user::{CreateUser, TenantRole, User};
use entitle_core::repository::{
    AccessLogFilter, AccessLogRepository, ApplicationRepository, LicenseRepository, Pagination,
    PricingRepository, PricingWrite, TenantRepository, UserRepository,
};
use entitle_db::repository::{
    SurrealAccessLogRepository, SurrealApplicationRepository, SurrealGrantRepository,
    SurrealLicenseRepository, SurrealPricingRepository, SurrealTenantRepository,
    SurrealUserRepository,
};
use entitle_engine::{AccessRequest, AccessService, AuditSink, DecisionEngine, PricingService};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

pub type Engine = DecisionEngine<
    SurrealApplicationRepository<Db>,
    SurrealLicenseRepository<Db>,
    SurrealGrantRepository<Db>,
    SurrealAccessLogRepository<Db>,
>;

pub type Service = AccessService<
    SurrealApplicationRepository<Db>,
    SurrealUserRepository<Db>,
    SurrealLicenseRepository<Db>,
    SurrealGrantRepository<Db>,
    SurrealPricingRepository<Db>,
>;

pub struct Env {
    pub db: Surreal<Db>,
    pub tenant: Tenant,
    pub app: Application,
    pub user: User,
}

/// In-memory DB, migrations, one tenant, the "tq" application, and
/// one active operations user.
pub async fn setup() -> Env {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    entitle_db::run_migrations(&db).await.unwrap();

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

    Env {
        db,
        tenant,
        app,
        user,
    }
}

impl Env {
    pub fn engine(&self) -> Engine {
        DecisionEngine::new(
            SurrealApplicationRepository::new(self.db.clone()),
            SurrealLicenseRepository::new(self.db.clone()),
            SurrealGrantRepository::new(self.db.clone()),
            AuditSink::new(SurrealAccessLogRepository::new(self.db.clone())),
        )
    }

    pub fn service(&self) -> Service {
        AccessService::new(
            SurrealApplicationRepository::new(self.db.clone()),
            SurrealUserRepository::new(self.db.clone()),
            SurrealLicenseRepository::new(self.db.clone()),
            SurrealGrantRepository::new(self.db.clone()),
            PricingService::new(SurrealPricingRepository::new(self.db.clone())),
        )
    }

    pub async fn create_user(&self, username: &str, role: TenantRole) -> User {
        SurrealUserRepository::new(self.db.clone())
            .create(CreateUser {
                tenant_id: self.tenant.id,
                username: username.into(),
                email: format!("{username}@example.com"),
                role,
                platform_role: None,
                user_type: None,
            })
            .await
            .unwrap()
    }

    pub async fn license(&self, seat_limit: Option<u32>) -> License {
        SurrealLicenseRepository::new(self.db.clone())
            .create(CreateLicense {
                tenant_id: self.tenant.id,
                application_id: self.app.id,
                expires_at: None,
                seat_limit,
            })
            .await
            .unwrap()
    }

    /// Open-ended pricing window in force since 30 days ago.
    pub async fn price(&self, user_type: &str, price: &str) {
        self.price_window(user_type, price, Utc::now() - Duration::days(30), None)
            .await;
    }

    pub async fn price_window(
        &self,
        user_type: &str,
        price: &str,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) {
        let write = SurrealPricingRepository::new(self.db.clone())
            .create(CreatePricingEntry {
                application_id: self.app.id,
                user_type: user_type.into(),
                price: BigDecimal::from_str(price).unwrap(),
                currency: "BRL".into(),
                billing_cycle: BillingCycle::Monthly,
                valid_from: from,
                valid_to: to,
            })
            .await
            .unwrap();
        assert!(matches!(write, PricingWrite::Created(_)));
    }

    /// A request principal for `user`, with the given token-embedded
    /// allowed-apps fast path.
    pub fn principal(&self, user: &User, allowed_apps: &[&str]) -> Principal {
        let now = Utc::now();
        Principal {
            user_id: user.id,
            tenant_id: user.tenant_id,
            role: user.role,
            platform_role: user.platform_role.clone(),
            user_type: user.user_type.clone(),
            allowed_apps: allowed_apps.iter().map(|s| s.to_string()).collect(),
            issued_at: now,
            expires_at: now + Duration::minutes(15),
        }
    }

    pub fn request(&self, principal: Option<Principal>, required_role: Option<&str>) -> AccessRequest {
        AccessRequest {
            principal,
            tenant: Some(self.tenant.clone()),
            application_slug: self.app.slug.clone(),
            required_role: required_role.map(Into::into),
            meta: RequestMeta {
                ip_address: Some("10.0.0.7".into()),
                user_agent: Some("engine-test".into()),
            },
        }
    }

    pub async fn audit_entries(&self) -> Vec<entitle_core::models::audit::AccessLogEntry> {
        SurrealAccessLogRepository::new(self.db.clone())
            .list(
                self.tenant.id,
                AccessLogFilter::default(),
                Pagination {
                    offset: 0,
                    limit: 100,
                },
            )
            .await
            .unwrap()
            .items
    }

    pub async fn fresh_license(&self) -> License {
        SurrealLicenseRepository::new(self.db.clone())
            .get(self.tenant.id, self.app.id)
            .await
            .unwrap()
            .unwrap()
    }
}
