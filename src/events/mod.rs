//! CRUD event system for real-time WebSocket notifications
//!
//! This module provides:
//! - `CrudEvent` — typed events emitted after every mutation
//! - `EventBus` — broadcast channel for distributing events to WebSocket clients
//!
//! Discussion threads are pushed to subscribers through the same bus.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{CrudAction, CrudEvent, EntityType, EventEmitter, RelatedEntity};
