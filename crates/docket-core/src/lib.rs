#![forbid(unsafe_code)]
//! docket-core library.
//!
//! Backlog items and meeting notes live as markdown files in a git working
//! tree. This crate owns the entities, their markdown codec, the in-memory
//! query engine, and the collaborator interfaces (content store, search
//! index, notification sink) that the CLI wires together.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at module seams, `anyhow::Result`
//!   for config loading and collaborator adapters.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod codec;
pub mod config;
pub mod dates;
pub mod error;
pub mod index;
pub mod lock;
pub mod model;
pub mod notify;
pub mod query;
pub mod schedule;
pub mod service;
pub mod store;

pub use error::{DocketError, ErrorCode, ValidationError};
