//! # gridcraft-error
//!
//! Unified error handling for gridcraft.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what went wrong (e.g., NoDirectionFound, AgentDeceased)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Locate the cause with key-value context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use gridcraft_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::NoDirectionFound, "reply names no direction")
//!         .with_operation("parser::parse_direction")
//!         .with_context("reply", "I am not sure"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All fallible functions return `Result<T, gridcraft_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent layers only append context
//! - Blocked moves are simulation outcomes, never errors

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using gridcraft Error
pub type Result<T> = std::result::Result<T, Error>;
