//! Derived views across departments
//!
//! - `team` — one user's merged schedule (personal + department records)
//! - `dashboard` — calendar and summary over every department table

pub mod dashboard;
pub mod models;
pub mod team;

pub use dashboard::DashboardService;
pub use models::*;
pub use team::TeamScheduler;
