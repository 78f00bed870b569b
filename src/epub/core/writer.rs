//! EPUB archive rewriting.
//!
//! An edit never touches the original archive. A new archive is written next
//! to it with every entry copied raw (compressed bytes, timestamps and extra
//! fields unchanged) except the one being replaced, and the archive comment
//! carried over. The output is staged in a temporary file in the destination
//! directory and only moved into place once complete.

use crate::common::{Error, Result};
use crate::epub::core::package::Package;
use crate::epub::document::PackageDocument;
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Where the rewritten copy of `path` goes: `<path>.new`
pub fn derived_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".new");
    PathBuf::from(name)
}

/// Copy the archive at `src` to [`derived_path`]`(src)`, replacing the
/// content of `entry` with `bytes`.
///
/// Returns the path written.
///
/// # Errors
///
/// [`Error::PackageNotFound`] if `src` does not exist,
/// [`Error::ComponentNotFound`] if the archive has no `entry`. Nothing is
/// left at the output path on failure.
pub fn rewrite_entry(src: &Path, entry: &str, bytes: &[u8]) -> Result<PathBuf> {
    if !src.is_file() {
        return Err(Error::PackageNotFound(src.display().to_string()));
    }
    let mut archive = zip::ZipArchive::new(BufReader::new(File::open(src)?))?;

    let out = derived_path(src);
    let dir = match out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let staging = tempfile::NamedTempFile::new_in(dir)?;
    let staging = rewrite_archive(&mut archive, staging, entry, bytes)?;
    staging.persist(&out)?;

    debug!(path = %out.display(), entry, "wrote archive");
    Ok(out)
}

/// Write a copy of `archive` into `writer` with `entry` replaced by `bytes`.
///
/// Entries keep their order; the replacement takes the original's place.
pub fn rewrite_archive<R, W>(
    archive: &mut zip::ZipArchive<R>,
    writer: W,
    entry: &str,
    bytes: &[u8],
) -> Result<W>
where
    R: Read + Seek,
    W: Write + Seek,
{
    if archive.index_for_name(entry).is_none() {
        return Err(Error::ComponentNotFound(entry.to_string()));
    }

    let mut zip = ZipWriter::new(writer);
    zip.set_raw_comment(archive.comment().to_vec().into_boxed_slice())?;

    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for i in 0..archive.len() {
        let file = archive.by_index_raw(i)?;
        if file.name() == entry {
            zip.start_file(entry, options)?;
            zip.write_all(bytes)?;
        } else {
            zip.raw_copy_file(file)?;
        }
    }

    Ok(zip.finish()?)
}

impl PackageDocument {
    /// Write this document back into a copy of the archive it came from.
    ///
    /// Returns `None` without writing anything when the document is
    /// unmodified, otherwise the path of the new archive.
    pub fn save_to<R: Read + Seek>(&self, package: &Package<R>) -> Result<Option<PathBuf>> {
        if !self.is_modified() {
            return Ok(None);
        }
        let src = package
            .path()
            .ok_or_else(|| Error::InvalidFormat("package was not opened from a file".to_string()))?;
        rewrite_entry(src, package.content_path(), &self.serialize()).map(Some)
    }
}
