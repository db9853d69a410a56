//! Formation API client.
//!
//! This crate is the only place that speaks HTTP to the Formation platform.
//! It covers:
//!
//! - Token lifecycle: static bearer tokens or username/password logins with
//!   transparent refresh shortly before expiry
//! - App catalog search, parameter lookup and launches
//! - Analysis status, listing and control
//! - Data store browsing and mutation, with metadata carried as
//!   `X-Datastore-*` headers
//!
//! The entry point is [`FormationClient`], which implements the
//! [`FormationApi`] trait so higher layers can be exercised against a double.
//!
//! # Example
//!
//! ```ignore
//! use formation_api::{AppQuery, FormationApi, FormationClient};
//!
//! let client = FormationClient::new("https://formation.example.org", Some(token), None)?;
//! let apps = client
//!     .list_apps(&AppQuery { name: Some("RStudio".into()), ..Default::default() })
//!     .await?;
//! ```

mod auth;
mod client;
mod errors;
mod metadata;

pub use auth::{Credentials, TOKEN_EXPIRY_MARGIN};
pub use client::{AppQuery, DEFAULT_APP_LIMIT, FormationApi, FormationClient};
pub use errors::{FormationError, Result};
pub use metadata::{METADATA_HEADER_PREFIX, decode_metadata_headers, encode_metadata_headers};
