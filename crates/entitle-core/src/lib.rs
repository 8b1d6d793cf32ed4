//! Entitle Core — domain models, repository trait definitions, and the
//! authorization decision taxonomy shared across all crates.

pub mod counter;
pub mod denial;
pub mod error;
pub mod models;
pub mod repository;
pub mod roles;

pub use denial::DenyReason;
pub use error::{EntitleError, EntitleResult};
