//! Guestdrop API Library
//!
//! HTTP handlers, services, middleware, and application setup for the guest
//! upload service.

mod handlers;
mod middleware;
mod telemetry;
mod utils;
mod views;

pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
