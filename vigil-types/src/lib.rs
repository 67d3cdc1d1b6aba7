//! Core type definitions for Vigil.
//!
//! This crate defines the fundamental types shared by the sync engine:
//! - Record and device identifiers
//! - The `DataType` tag that classifies every syncable payload
//!
//! Domain types (audit-event records, security settings) belong to the
//! embedding application, not here. The sync engine only ever sees
//! opaque encrypted bytes tagged with a `DataType`.

mod data_type;
mod ids;

pub use data_type::DataType;
pub use ids::{DeviceId, RecordId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("unknown data type: {0}")]
    UnknownDataType(String),
}
