//! Lucra+: margin and pricing calculator for small businesses.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod engine;
pub mod session;
pub mod sheets;
pub mod auth;
pub mod api;
