//! Foundation types for docchain.
//!
//! A document is stored as a flat set of leaf properties, each addressed by a
//! `/`-delimited path of the form `<docID>/<segment>(/<segment>)*/<type>`.
//! This crate provides the shared vocabulary for that mapping; every other
//! docchain crate depends on `docchain-types`.
//!
//! # Key Types
//!
//! - [`Document`] -- Tagged value tree mirroring the JSON data model
//! - [`PropertyEntry`] -- One leaf: its full path and canonical value bytes
//! - [`PropertyEntryList`] -- Ordered list of leaves, sortable by path
//! - [`Segment`] -- A single path step: map key or `[index.capacity]` element
//! - [`ValueType`] -- The leaf type tag closing every path

pub mod document;
pub mod error;
pub mod property;
pub mod segment;

pub use document::Document;
pub use error::TypeError;
pub use property::{split_type_tag, PathParts, PropertyEntry, PropertyEntryList, ValueType};
pub use segment::Segment;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';
