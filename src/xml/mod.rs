//! XML document layer
//!
//! A small owned tree on top of `quick-xml` events:
//! - Lenient parsing of existing KeePass XML exports
//! - Pre-order lookup returning child-index paths
//! - Programmatic node construction and appending
//! - Indented serialization

pub mod document;
pub mod writer;

pub use document::{Declaration, Document, Element, Node, NodePath};
pub use writer::{to_string, write_document};
