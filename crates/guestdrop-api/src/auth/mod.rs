//! Admin authorization
//!
//! Admin operations share one secret. It can be presented either as
//! `Authorization: Bearer <secret>` or as the `password` form/query field.

pub mod admin;

pub use admin::{bearer_token, require_admin};
