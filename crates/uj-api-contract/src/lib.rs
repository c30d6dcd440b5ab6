//! Unified-job REST API contract types and validation
//!
//! This crate defines the schema types shared between the REST client,
//! the scripted mock service, and the lifecycle observer in `uj-core`.
//! A "unified job" is any remote task observed through the common
//! status/lifecycle contract: a job run, a project (source-control)
//! update, or an inventory-import update.

pub mod error;
pub mod types;
pub mod validation;

pub use error::*;
pub use types::*;
