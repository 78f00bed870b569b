//! Series dialect configuration.
//!
//! Series membership can be recorded two ways: the EPUB 3 collection
//! convention (`belongs-to-collection` plus `group-position` refinements) and
//! the flat `calibre:series` / `calibre:series_index` pair that calibre and
//! most reading software understand. [`SeriesConfig`] says which of them the
//! series editor reads and writes.
//!
//! # Examples
//!
//! ```rust
//! use epubtool::epub::{Dialects, SeriesConfig};
//!
//! // Read both, write both
//! let config = SeriesConfig::new().with_write(Dialects::all());
//! assert!(config.writes(Dialects::STRUCTURED));
//! assert!(config.reads(Dialects::FLAT));
//! ```

use bitflags::bitflags;

bitflags! {
    /// Set of series metadata conventions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Dialects: u8 {
        /// EPUB 3 `belongs-to-collection` with `group-position`
        const STRUCTURED = 0x01;
        /// `calibre:series` / `calibre:series_index`
        const FLAT = 0x02;
    }
}

/// Which series dialects to read and write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesConfig {
    /// Dialects probed when reading
    pub read: Dialects,
    /// Dialects emitted when writing
    pub write: Dialects,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            read: Dialects::all(),
            write: Dialects::FLAT,
        }
    }
}

impl SeriesConfig {
    /// Read both dialects, write the flat one
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dialects probed when reading
    #[inline]
    pub fn with_read(mut self, read: Dialects) -> Self {
        self.read = read;
        self
    }

    /// Set the dialects emitted when writing
    #[inline]
    pub fn with_write(mut self, write: Dialects) -> Self {
        self.write = write;
        self
    }

    /// Map the command-line switches onto a configuration.
    ///
    /// `epub3` alone selects the structured dialect, `calibre` (or nothing)
    /// the flat one, and both together write both.
    pub fn from_switches(epub3: bool, calibre: bool) -> Self {
        let write = match (epub3, calibre) {
            (true, true) => Dialects::all(),
            (true, false) => Dialects::STRUCTURED,
            (false, _) => Dialects::FLAT,
        };
        Self::default().with_write(write)
    }

    /// Whether every dialect in `dialects` is read
    #[inline]
    pub fn reads(&self, dialects: Dialects) -> bool {
        self.read.contains(dialects)
    }

    /// Whether every dialect in `dialects` is written
    #[inline]
    pub fn writes(&self, dialects: Dialects) -> bool {
        self.write.contains(dialects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_writes_flat_only() {
        let config = SeriesConfig::default();
        assert!(config.writes(Dialects::FLAT));
        assert!(!config.writes(Dialects::STRUCTURED));
        assert!(config.reads(Dialects::all()));
    }

    #[test]
    fn test_from_switches() {
        assert_eq!(SeriesConfig::from_switches(false, false).write, Dialects::FLAT);
        assert_eq!(SeriesConfig::from_switches(false, true).write, Dialects::FLAT);
        assert_eq!(SeriesConfig::from_switches(true, false).write, Dialects::STRUCTURED);
        assert_eq!(SeriesConfig::from_switches(true, true).write, Dialects::all());
    }
}
