//! Data models for the application
//!
//! Events are the only persisted record; uploads exist implicitly as objects in
//! the store and are described here only as listing/browse results.

mod event;
mod upload;

pub use event::*;
pub use upload::*;
