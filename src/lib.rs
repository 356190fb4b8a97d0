//! # kpimport
//!
//! Converts CSV password exports into KeePass 2.x XML.
//!
//! ## Features
//!
//! - Positional or header-row column mapping
//! - Column-name normalization onto KeePass fields (`Title`, `UserName`,
//!   `Password`, `URL`, `Notes`, ...)
//! - New documents from a bundled template, or appending to an existing export
//! - Per-row sub-groups selected by a CSV column
//! - Lenient XML parsing of existing documents
//!
//! ## Example
//!
//! ```no_run
//! use kpimport::{ColumnSpec, ImportConfig, Importer};
//!
//! let config = ImportConfig::new(ColumnSpec::parse("url,user,pass"));
//! let mut importer = Importer::new(config).unwrap();
//! importer.import_csv(std::io::stdin().lock()).unwrap();
//! importer.write_to(std::io::stdout().lock()).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod import;
pub mod keepass;
pub mod utils;
pub mod xml;

// Re-export main types
pub use config::{ColumnSpec, ImportConfig};
pub use error::{ImportError, Result};
pub use import::{ImportStats, Importer};
pub use keepass::{FieldMap, FieldRules};
pub use xml::{Document, Element};

/// Group receiving entries when `--group` is not given
pub const DEFAULT_GROUP_NAME: &str = "Imported";

/// Epoch values below this (1999-12-31T23:00:00Z) are replaced by the current time
pub const MIN_VALID_TIMESTAMP: i64 = 946_681_200;

/// Base64 characters kept from a random UUID before the fixed tail
pub const UUID_BODY_LENGTH: usize = 20;

/// Document used when not appending to an existing file
pub const DEFAULT_TEMPLATE: &str = include_str!("../assets/template.xml");
