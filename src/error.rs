//! Domain error types for Promille.
//!
//! Removing an unknown drink is deliberately *not* represented here — it is
//! a silent no-op, not a failure.

use thiserror::Error;
use uuid::Uuid;

/// An error reported by a domain operation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("person not found: {0}")]
    PersonNotFound(Uuid),

    #[error("weight must be positive, got {0}")]
    InvalidWeight(f64),

    #[error("volume must be positive, got {0}")]
    InvalidVolume(f64),

    #[error("strength must be between 0 and 100 percent, got {0}")]
    InvalidStrength(f64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
