//! epubtool - edit the metadata of EPUB files
//!
//! This library reads the package document of an EPUB archive, edits its
//! title, authors and series metadata in place, and writes a copy of the
//! archive with only the package document replaced.
//!
//! # Features
//!
//! - **Faithful round trips**: markup outside the edited elements, including
//!   indentation and comments, is written back unchanged
//! - **Refinement aware**: EPUB 3 `refines` links are followed, and deleting an
//!   element deletes everything refining it
//! - **Both series dialects**: EPUB 3 collections and `calibre:series`
//! - **Tolerant lookups**: `dc:title`, `opf:meta`, bare `meta` and generated
//!   prefixes such as `ns0:meta` are all recognised
//!
//! # Example
//!
//! ```no_run
//! use epubtool::epub::core::Package;
//! use epubtool::epub::{AuthorEditor, TitleEditor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let package = Package::open("book.epub")?;
//! let mut doc = package.document()?;
//!
//! println!("Title: {}", TitleEditor::new(&mut doc).title());
//! AuthorEditor::new(&mut doc).set_authors(&["Frank Herbert"])?;
//!
//! // Writes book.epub.new
//! doc.save_to(&package)?;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod epub;

pub use common::{Error, Result};
