//! EPUB metadata editing.
//!
//! A [`PackageDocument`] is loaded from an archive through
//! [`core::Package`], edited with the [`TitleEditor`], [`AuthorEditor`] and
//! [`SeriesEditor`], and written back with [`PackageDocument::save_to`].
//!
//! # Examples
//!
//! ```no_run
//! use epubtool::epub::core::Package;
//! use epubtool::epub::{SeriesConfig, SeriesEditor, SeriesInfo, TitleEditor};
//!
//! # fn main() -> epubtool::Result<()> {
//! let package = Package::open("book.epub")?;
//! let mut doc = package.document()?;
//!
//! TitleEditor::new(&mut doc).set_title(Some("Dune"), Some("Book One"));
//! SeriesEditor::new(&mut doc, SeriesConfig::default())
//!     .set_series(&SeriesInfo::new("Dune Chronicles", "1")?);
//!
//! if let Some(path) = doc.save_to(&package)? {
//!     println!("wrote {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod author;
pub mod config;
pub mod core;
pub mod document;
pub mod elements;
pub mod series;
pub mod title;

pub use author::AuthorEditor;
pub use config::{Dialects, SeriesConfig};
pub use document::PackageDocument;
pub use series::{SeriesEditor, SeriesInfo, SeriesRecord};
pub use title::{MISSING_TITLE, TitleEditor, TitleRecord};
