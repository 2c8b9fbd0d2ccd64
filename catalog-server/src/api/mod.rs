//! HTTP API handlers for catalog-server

pub mod auth;
pub mod buildinfo;
pub mod catalog;
pub mod health;
pub mod items;
pub mod polls;
pub mod users;
pub mod visits;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use visits::{get_visit_stats, visit_counter};
