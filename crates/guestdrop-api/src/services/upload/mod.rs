//! Guest upload pipeline: stage → forward → clean up.

mod service;
mod types;

pub use service::UploadService;
pub use types::{IncomingFile, StagedFile, StoredBackground};
