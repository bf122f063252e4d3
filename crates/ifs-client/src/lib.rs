//! # ifs-client
//!
//! Authenticated client for the IFS ERP REST API.
//!
//! This crate provides:
//! - [`TokenManager`]: OAuth2 client-credentials tokens, cached in memory and
//!   optionally mirrored into an external [`TokenCache`]
//! - [`IfsClient`]: one authenticated request per call, normalized into a
//!   [`ResultEnvelope`](ifs_common::ResultEnvelope)
//! - [`services`]: typed customer, invoice, vessel and currency access
//!
//! The client never retries. Every failure surfaces as a [`ClientError`]
//! carrying the HTTP status (0 when no response was received).
//!
//! ## Example
//!
//! ```no_run
//! use ifs_client::IfsClient;
//! use ifs_client::services::{CustomerService, ListQuery};
//! use ifs_common::Config;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = IfsClient::new(Config::from_env()?)?;
//!
//! let customers = CustomerService::new(client.clone());
//! let page = customers.list(&ListQuery::builder().top(10).build()).await?;
//! for customer in &page.items {
//!     println!("{} {}", customer.customer_id, customer.name.as_deref().unwrap_or("-"));
//! }
//!
//! let envelope = client.delete("/CustomersHandling.svc/CustomerInfoSet(CustomerId='OLD')").await?;
//! assert!(envelope.is_success());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod clock;
pub mod error;
pub mod services;
pub mod token;

pub use client::{IfsClient, IfsClientBuilder, RequestOptions};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use error::{ClientError, ErrorKind};
pub use reqwest::Method;
pub use token::{CachedToken, InMemoryTokenCache, TokenCache, TokenManager};
