pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod models;
pub mod repository;
pub mod routes;
pub mod stats;

pub use config::Config;
pub use db::Store;
pub use errors::{AppError, AppResult};
pub use models::*;
pub use routes::{configure, AppState};
