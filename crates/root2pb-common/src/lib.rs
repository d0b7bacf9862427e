//! root2pb Common Library
//!
//! Shared utilities and error handling for the root2pb workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the pipeline error type and result alias
//! - **Logging**: tracing subscriber setup shared by every binary
//! - **Checksums**: SHA-256 digests of converted output files
//!
//! # Example
//!
//! ```no_run
//! use root2pb_common::Result;
//! use root2pb_common::checksum::compute_file_checksum;
//!
//! fn report(path: &str) -> Result<()> {
//!     let digest = compute_file_checksum(path)?;
//!     println!("sha256: {}", digest);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, Root2pbError};
