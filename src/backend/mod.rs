//! Hosted backend access — tables of JSON rows behind a PostgREST-style API

pub mod client;
pub mod query;
pub mod traits;

pub use client::{BackendError, RestClient};
pub use query::{Filter, SelectQuery, SortDirection};
pub use traits::{row_date, row_str, row_uuid, RecordStore, Row};

#[cfg(test)]
pub(crate) mod mock;
