//! EPUB package (ZIP archive) handling.
//!
//! A [`Package`] wraps the archive, remembers where the container index
//! points, and hands out the parsed package document.

use crate::common::{Error, Result};
use crate::epub::core::container::Container;
use crate::epub::document::PackageDocument;
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;

/// An EPUB package (ZIP file containing the package document)
pub struct Package<R> {
    archive: RefCell<zip::ZipArchive<R>>,
    container: Container,
    content_path: String,
    path: Option<PathBuf>,
}

impl Package<BufReader<File>> {
    /// Open an EPUB file.
    ///
    /// # Errors
    ///
    /// [`Error::PackageNotFound`] if nothing exists at `path`,
    /// [`Error::ContainerNotFound`] if the archive has no usable container
    /// index.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::PackageNotFound(path.display().to_string()));
        }
        let file = File::open(path)?;
        let mut package = Self::from_reader(BufReader::new(file))?;
        package.path = Some(path.to_path_buf());
        Ok(package)
    }
}

impl<R: Read + Seek> Package<R> {
    /// Open an EPUB package from a reader
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(reader)
            .map_err(|_| Error::InvalidFormat("Invalid ZIP archive".to_string()))?;

        let container = Container::from_archive(&mut archive)?;
        let content_path = container.rootfile_path()?.to_string();
        debug!(content_path = %content_path, "located package document");

        Ok(Self {
            archive: RefCell::new(archive),
            container,
            content_path,
            path: None,
        })
    }

    /// The file this package was opened from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The container index
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Archive path of the package document
    pub fn content_path(&self) -> &str {
        &self.content_path
    }

    /// Get a file from the package by path
    pub fn get_file(&self, path: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(path)
            .map_err(|_| Error::ComponentNotFound(path.to_string()))?;

        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Check if a file exists in the package
    pub fn has_file(&self, path: &str) -> bool {
        self.archive.borrow().index_for_name(path).is_some()
    }

    /// List all files in the package, in archive order
    pub fn files(&self) -> Vec<String> {
        self.archive
            .borrow()
            .file_names()
            .map(str::to_string)
            .collect()
    }

    /// Load and parse the package document
    pub fn document(&self) -> Result<PackageDocument> {
        let bytes = self.get_file(&self.content_path)?;
        PackageDocument::from_bytes(&bytes)
    }
}
