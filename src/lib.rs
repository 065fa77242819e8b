// Enforce at crate level
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! EML staging
//!
//! Turns real-world, frequently malformed email header data into flattened
//! `.eml` files in a staging directory.
//!
//! # Features
//!
//! - RFC 2047 header decoding that falls back to the raw text
//! - Layered recovery of bare From/To addresses that never fails
//! - Fixed nine-line header layout, one file per message id
//!
//! # Example
//!
//! ```rust,no_run
//! use eml_stage::{MessageRecord, StageConfig, Workspace, stage_message};
//!
//! let workspace = Workspace::create(&StageConfig::default()).unwrap();
//! let record = MessageRecord {
//!     id: 42,
//!     from_addr: "John Doe john@example.com".into(),
//!     subject: "Hello".into(),
//!     ..MessageRecord::default()
//! };
//!
//! let path = stage_message(&workspace, record, "a@example.com; b@example.com", "Body").unwrap();
//! println!("Staged at {}", path.display());
//! ```

mod config;
mod decoder;
mod error;
mod grammar;
mod materializer;
mod normalizer;
mod parser;
mod types;
mod workspace;

pub use config::{DEFAULT_STAGE_NAME, StageConfig};
pub use decoder::{DecodeError, decode, try_decode};
pub use error::{Result, StageError};
pub use grammar::{AddrError, parse_address, parse_address_list};
pub use materializer::{EmlFile, create_file, render_header, stage_message};
pub use normalizer::{clean_address, normalize_addresses, normalize_from, normalize_to};
pub use parser::parse_message;
pub use types::*;
pub use workspace::{Workspace, discard};
