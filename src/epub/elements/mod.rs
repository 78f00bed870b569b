//! The metadata subtree of a package document.
//!
//! - `namespace`: namespace URIs, qualified names and tag spellings
//! - `element`: the [`MetadataElement`] node
//! - `list`: the ordered [`MetadataList`] and refinement utilities
//! - `parser`: splitting a package document around its metadata

pub mod element;
pub mod list;
pub mod namespace;
pub(crate) mod parser;

pub use element::MetadataElement;
pub use list::{MetadataList, RefinementIndices};
pub use namespace::{NamespaceContext, QualifiedName, Tag, TagForm};
