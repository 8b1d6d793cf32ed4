//! SurrealDB repository implementations.

mod access_log;
mod application;
mod grant;
mod license;
mod pricing;
mod tenant;
mod user;

pub use access_log::SurrealAccessLogRepository;
pub use application::SurrealApplicationRepository;
pub use grant::SurrealGrantRepository;
pub use license::SurrealLicenseRepository;
pub use pricing::SurrealPricingRepository;
pub use tenant::SurrealTenantRepository;
pub use user::SurrealUserRepository;
