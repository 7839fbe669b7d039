//! HTTP API for the dashboard

pub mod auth_handlers;
pub mod department_handlers;
pub mod discussion_handlers;
pub mod handlers;
pub mod profile_handlers;
pub mod query;
pub mod routes;
pub mod schedule_handlers;
pub mod user_handlers;
pub mod ws_auth;
pub mod ws_handlers;

pub use handlers::{AppError, DashboardState, ServerState};
pub use query::*;
pub use routes::create_router;
