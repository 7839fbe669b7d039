//! Department schedule modules (BDM, Cluster 6, HiTech)
//!
//! One generic record lifecycle driven by the static table catalog:
//! - `catalog` — departments, their tables and responsible-party columns
//! - `models` — record and request types
//! - `manager` — list/get/create/update/delete against the backend

pub mod catalog;
pub mod manager;
pub mod models;

pub use catalog::{lookup, Department, Participant, ResponsibleField, TableSpec, CATALOG};
pub use manager::DepartmentManager;
pub use models::{CreateRecordRequest, DepartmentRecord, RecordFilter, UpdateRecordRequest};
