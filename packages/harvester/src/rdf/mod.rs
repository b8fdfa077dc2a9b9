//! RDF/XML document assembly for the ARC/SiRO schema.
//!
//! - [`namespaces`]: the fixed prefix table
//! - [`element`]: a small namespace-qualified element tree
//! - [`builder`]: canonical record to document fragment
//! - [`document`]: the batch root and its XML serialization

pub mod builder;
pub mod document;
pub mod element;
pub mod namespaces;

pub use builder::{build_fragment, DocumentFragment};
pub use document::RdfDocument;
pub use element::{Element, QName};
pub use namespaces::Prefix;
