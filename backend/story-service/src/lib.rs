/// Story Service Library
///
/// Server-rendered story sharing: authenticated users upload an image plus
/// metadata to create a story, which can be listed, viewed, edited, liked,
/// and deleted, with public/private visibility control.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers producing rendered pages or redirects
/// - `models`: Story entity, status enum, and validated form types
/// - `services`: Business logic layer and the remote image store delegate
/// - `db`: Database access layer (sqlx over Postgres)
/// - `views`: Embedded template registry, render helpers, flash messages
/// - `middleware`: Authentication gate
/// - `error`: Error types and handling
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod views;

pub use config::Config;
pub use error::{AppError, Result};
