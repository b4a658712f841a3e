//! The module contains the errors the engine can throw.
//!
//! - [`InvalidAmount`] an amount was rejected before any storage access.
//! - [`UnknownCategory`] an expense targeted a category without a bucket and
//!   the engine is configured to reject it.
//! - [`InvalidPolicy`] the allocation policy has negative or non-finite values.
//! - [`StorageUnavailable`] the database could not be reached or a query failed.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`UnknownCategory`]: EngineError::UnknownCategory
//!  [`InvalidPolicy`]: EngineError::InvalidPolicy
//!  [`StorageUnavailable`]: EngineError::StorageUnavailable
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" has no budget bucket")]
    UnknownCategory(String),
    #[error("Invalid allocation policy: {0}")]
    InvalidPolicy(String),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::UnknownCategory(a), Self::UnknownCategory(b)) => a == b,
            (Self::InvalidPolicy(a), Self::InvalidPolicy(b)) => a == b,
            (Self::StorageUnavailable(a), Self::StorageUnavailable(b)) => {
                a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}
