//! Profile and personal calendar models

use crate::departments::Department;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Access level of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Staff,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
        })
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "staff" => Ok(Role::Staff),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// A user's profile row (the password hash never leaves the manager)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub department: Option<Department>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Self-service profile update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub department: Option<Department>,
    pub position: Option<String>,
    pub phone: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err("name cannot be empty".to_string());
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.department.is_none()
            && self.position.is_none()
            && self.phone.is_none()
    }
}

/// Entry in a user's personal calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl PersonalEntry {
    /// Start/end ordering check, used after partial updates
    pub fn validate_times(&self) -> Result<(), String> {
        check_times(self.start_time, self.end_time)
    }
}

fn check_times(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Result<(), String> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => {
            Err("end_time must not be before start_time".to_string())
        }
        _ => Ok(()),
    }
}

/// Request to add a personal calendar entry
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePersonalEntryRequest {
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub title: String,
    pub notes: Option<String>,
}

impl CreatePersonalEntryRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title cannot be empty".to_string());
        }
        check_times(self.start_time, self.end_time)
    }
}

/// Partial update of a personal entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePersonalEntryRequest {
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub title: Option<String>,
    pub notes: Option<String>,
}

impl UpdatePersonalEntryRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err("title cannot be empty".to_string());
        }
        check_times(self.start_time, self.end_time)
    }

    /// Apply onto an existing entry
    pub fn apply(self, entry: &mut PersonalEntry) {
        if let Some(date) = self.date {
            entry.date = date;
        }
        if let Some(start) = self.start_time {
            entry.start_time = Some(start);
        }
        if let Some(end) = self.end_time {
            entry.end_time = Some(end);
        }
        if let Some(title) = self.title {
            entry.title = title.trim().to_string();
        }
        if let Some(notes) = self.notes {
            entry.notes = Some(notes);
        }
    }
}
