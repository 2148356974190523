//! Storytime daemon library - exposes modules for testing.

pub mod config;
pub mod generator;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod store;
