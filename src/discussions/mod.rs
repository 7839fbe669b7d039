//! Per-record discussion threads
//!
//! Each department table has a sibling discussion table keyed by the parent
//! record id. New messages are broadcast on the event bus so WebSocket
//! subscribers see them as they are posted.

pub mod manager;
pub mod models;

pub use manager::DiscussionManager;
pub use models::{Author, DeleteOutcome, DiscussionMessage, PostMessageRequest};
