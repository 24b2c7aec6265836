//! Guestdrop Core Library
//!
//! This crate provides the domain models, error types, configuration, and validation
//! shared by the event registry, the storage gateway, and the HTTP service.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, UnknownEventPolicy, UploadServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::{StorageBackend, Visibility};
