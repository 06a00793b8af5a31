//! # dramlog Common Library
//!
//! Shared code for the dramlog crates:
//! - Database initialization, migrations and models
//! - Badge rule engine
//! - Event types and event bus
//! - Configuration loading
//! - API key utilities

pub mod auth;
pub mod badges;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod time;

pub use error::{is_foreign_key_violation, is_unique_violation, Error, Result};
