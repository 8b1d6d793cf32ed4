//! Engine error type — the split between expected business denials
//! and infrastructure faults.

use entitle_core::denial::DenyReason;
use entitle_core::error::EntitleError;
use thiserror::Error;

/// Outcome of any engine operation that can refuse.
///
/// `Denied` carries the stable reason taxonomy and is an *expected*
/// result: it is always audited and never logged as a process-level
/// error. `Internal` is an infrastructure fault (datastore
/// unreachable, malformed stored data) and maps to a 500-equivalent.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("{0}")]
    Denied(#[from] DenyReason),

    #[error(transparent)]
    Internal(#[from] EntitleError),
}

impl AccessError {
    /// The denial reason, when this is a business denial.
    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Denied(reason) => Some(reason),
            Self::Internal(_) => None,
        }
    }
}
