//! # boxproto
//!
//! Client-side codec for the Tarantool 1.5 binary box protocol:
//! - Length-prefixed field encoding for built-in and custom value types
//! - Byte-exact request bodies for SELECT, INSERT/ADD/REPLACE, UPDATE,
//!   DELETE, CALL and PING
//! - Reply parsing with explicit server and truncation errors
//! - A blocking TCP transport and thin connection/space handles
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Connection / Space                          │
//! │             (space_no + transport handle)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │  Request    │          │  Response    │
//!   │  Builder    │          │  Parser      │
//!   └──────┬──────┘          └──────▲───────┘
//!          │     Field Codec        │
//!          ▼                        │
//!   ┌─────────────────────────────────────────┐
//!   │        Transport (IPROTO over TCP)       │
//!   └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use boxproto::{Config, Connection, Field};
//!
//! # fn main() -> boxproto::Result<()> {
//! let conn = Connection::connect(&Config::default())?;
//! let space = conn.space(0);
//!
//! let tuple: [&dyn Field; 4] = [&1i32, &"Peter", &18i8, &"janitor"];
//! let inserted = space.insert(&tuple, true)?;
//! assert_eq!(inserted.count, 1);
//!
//! let name: String = inserted.tuples[0].get(1)?;
//! # let _ = name;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BoxError, Result};
pub use config::Config;
pub use client::{Connection, Space};
pub use protocol::{
    Field, FromField, FromTuple, InsertMode, ResponseMode, Tuple, TupleResponse, UpdateOp,
    UpdateOpCode,
};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of boxproto
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
