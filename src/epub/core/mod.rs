//! Archive side of an EPUB: the container index, the ZIP package and
//! rewriting a package with one entry replaced.

/// Container index parsing
mod container;
/// EPUB package handling
mod package;
/// Archive rewriting
mod writer;

pub use container::{CONTAINER_PATH, Container, RootFile};
pub use package::Package;
pub use writer::{derived_path, rewrite_archive, rewrite_entry};
