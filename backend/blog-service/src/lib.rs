/// Blog Service Library
///
/// Multi-tenant blogging backend: every user is a tenant reachable under its own
/// subdomain (or custom domain), owns posts, and moderates the comments left on them.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `models`: Users, posts, comments, subscriptions
/// - `forms`: Form validation returning field-level errors
/// - `validators`: Username, domain name, slug and upload validators
/// - `services`: Comment gate, post detail view, account operations
/// - `db`: Repository traits with PostgreSQL and in-memory implementations
/// - `tenancy`: Host to tenant resolution
/// - `middleware`: API key identity and ownership checks
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod tenancy;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
