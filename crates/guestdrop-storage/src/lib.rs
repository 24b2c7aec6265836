//! Guestdrop Storage Library
//!
//! This crate is the only integration point with durable binary storage. It
//! provides the `Storage` trait and implementations for S3 (through
//! `object_store`) and the local filesystem.
//!
//! # Storage key format
//!
//! - **Guest uploads**: `uploads/{event_id}/{unix_millis}_{uuid}_{filename}` (private)
//! - **Event backgrounds**: `backgrounds/{unix_millis}_{uuid}_{filename}` (public)
//!
//! Keys must not have a leading `/`, empty segments, or dot-prefixed segments
//! (which covers `.` and `..`). Key
//! generation is centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod token;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use guestdrop_core::{StorageBackend, Visibility};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{
    ObjectDownload, ObjectReader, ObjectStream, PutObjectOptions, Storage, StorageError,
    StorageResult,
};
