//! Domain models for Entitle.
//!
//! These are the core types shared across all crates.

pub mod application;
pub mod audit;
pub mod decision;
pub mod grant;
pub mod license;
pub mod pricing;
pub mod principal;
pub mod tenant;
pub mod user;
