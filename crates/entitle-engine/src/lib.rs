//! Entitle Engine — the authorization decision pipeline, access grant
//! orchestration, pricing snapshot resolution, and the audit sink.

pub mod access;
pub mod audit;
pub mod decision;
pub mod error;
pub mod pricing;
pub mod ratelimit;

pub use access::{AccessService, GrantOutcome, GrantRequest};
pub use audit::AuditSink;
pub use decision::{AccessRequest, DecisionEngine};
pub use error::AccessError;
pub use pricing::PricingService;
pub use ratelimit::{RateLimiter, SlidingWindow};
