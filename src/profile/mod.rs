//! Profiles, personal calendars and user administration

pub mod manager;
pub mod models;
pub mod personal;

pub use manager::{ProfileManager, PROFILES_TABLE};
pub use models::*;
pub use personal::{EntryUpdate, PersonalScheduleManager, PERSONAL_TABLE};
