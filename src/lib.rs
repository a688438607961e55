//! # nav-adapter
//!
//! Library for driving legacy Microsoft Dynamics NAV environments from Rust:
//! export objects as C/AL text through the classic development environment
//! client (finsql.exe), open the designer, and read object metadata and
//! service tier registrations straight from the application database.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **One adapter per environment** - Server, database and credentials are
//!   fixed at construction; revision quirks are a construction-time policy
//! - **Classified failures** - The tool reports problems as log text; this
//!   crate turns the known messages into typed errors
//! - **Cancellable** - Long-running operations take a `CancellationToken`
//!   and leave no orphan processes or temp files behind
//!
//! ## Quick Start
//!
//! ```no_run
//! use nav_adapter::{FinsqlAdapter, NavAdapter, NavEnvironment, ObjectIdRange};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let env = NavEnvironment::new("navsql01", "CRONUS");
//!     let adapter = FinsqlAdapter::nav2015(env);
//!
//!     let ranges = vec![ObjectIdRange::new(Some(1), Some(49_999))?];
//!     adapter
//!         .export_multiple(&ranges, "objects.txt".as_ref(), &CancellationToken::new())
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// The adapter trait and its finsql.exe-backed implementation
pub mod adapter;
/// Environment configuration
pub mod config;
/// SQL Server metadata queries
pub(crate) mod db;
/// Error types
pub mod error;
/// Object id and version list filters
pub mod filter;
/// Driving the classic development environment client
pub mod finsql;
/// Core types
pub mod types;

// Re-export commonly used types
pub use adapter::{FinsqlAdapter, NavAdapter};
pub use config::{NavEnvironment, SqlAuth};
pub use error::{Error, ExportError, FilterError, Result};
pub use filter::{ObjectIdRange, VersionListFilter};
pub use finsql::{VariantPolicy, POLL_INTERVAL};
pub use types::{
    LicenseStatus, ObjectMetadata, ObjectReference, ObjectType, ServiceTier, ServiceTierStatus,
};
