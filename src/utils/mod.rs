//! Shared helpers: identifiers and timestamps

pub mod common;
pub mod id_gen;

pub use common::{format_timestamp, now, parse_epoch, resolve_timestamp};
pub use id_gen::generate_uuid;
