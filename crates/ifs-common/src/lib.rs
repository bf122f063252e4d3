//! # ifs-common
//!
//! Shared types for talking to the IFS ERP REST API.
//!
//! This crate holds everything that does not perform I/O:
//! - Client configuration and OAuth credentials
//! - The uniform [`ResultEnvelope`] and the pure [`normalize`] function
//! - Pagination extraction
//! - Declared field casts and typed resource records with path builders
//!
//! ## Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use ifs_common::{Config, Pagination, normalize};
//! use serde_json::json;
//!
//! let config = Config::new("https://ifs.example.com/projection/v1")
//!     .with_credentials("IFS_connect", "secret", "https://ifs.example.com/token");
//! assert!(config.validate().is_ok());
//!
//! let envelope = normalize(json!({"message": "not found"}), BTreeMap::new(), 404);
//! assert!(!envelope.is_success());
//! assert_eq!(envelope.pagination(), Pagination::default());
//! ```

/// Client configuration and credentials.
pub mod config;
/// Result envelope, response normalization and pagination.
pub mod envelope;
/// Declared field casts for typed records.
pub mod casts;
/// Typed resource records and path builders.
pub mod resources;

pub use casts::{CastTable, FieldCast, cast_fields, cast_value};
pub use config::{Config, Credentials, DEFAULT_TOKEN_CACHE_KEY, TOKEN_SAFETY_MARGIN_SECS};
pub use envelope::{Pagination, ResultEnvelope, is_success_status, normalize};
pub use resources::Resource;
