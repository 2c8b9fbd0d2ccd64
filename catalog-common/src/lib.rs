//! # Collectible Catalog Common Library
//!
//! Shared code for the catalog service including:
//! - Database initialization, schema and migrations
//! - Row models
//! - Configuration loading
//! - Password hashing
//! - Time and slug utilities

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod slug;
pub mod time;

pub use error::{Error, Result};
pub use slug::slugify;
