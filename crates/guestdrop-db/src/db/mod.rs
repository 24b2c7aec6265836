//! Event registry persistence
//!
//! The registry is a single JSON document holding every event in creation
//! order. `EventRepository` is the only component that reads or writes it.

pub mod event;

pub use event::EventRepository;
