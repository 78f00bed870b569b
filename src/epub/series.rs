//! Series editor.
//!
//! Series membership is stored in one or both of two dialects (see
//! [`Dialects`]):
//!
//! ```xml
//! <!-- structured -->
//! <meta property="belongs-to-collection" id="series">Dune Chronicles</meta>
//! <meta refines="#series" property="collection-type">series</meta>
//! <meta refines="#series" property="group-position">1</meta>
//!
//! <!-- flat -->
//! <meta name="calibre:series" content="Dune Chronicles"/>
//! <meta name="calibre:series_index" content="1"/>
//! ```
//!
//! Reading prefers the structured dialect. Writing first removes every
//! series element of both dialects, so repeated writes never accumulate
//! stale entries.

use crate::common::{Error, Result};
use crate::epub::config::{Dialects, SeriesConfig};
use crate::epub::document::PackageDocument;
use crate::epub::elements::element::MetadataElement;
use crate::epub::elements::list::MetadataList;
use crate::epub::elements::namespace::META;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

const COLLECTION: &str = "belongs-to-collection";
const COLLECTION_TYPE: &str = "collection-type";
const GROUP_POSITION: &str = "group-position";
const FLAT_NAME: &str = "calibre:series";
const FLAT_INDEX: &str = "calibre:series_index";

/// A validated series name and number, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesInfo {
    name: String,
    number: String,
}

impl SeriesInfo {
    /// Validate a series name and number.
    ///
    /// The number is kept as written but must be a finite decimal number,
    /// so fractional positions such as `1.5` are accepted.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSeries`] for an empty name or a number that does not
    /// parse.
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_string();
        let number = number.into().trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidSeries("series name is empty".to_string()));
        }
        match number.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Self { name, number }),
            _ => Err(Error::InvalidSeries(format!("'{}' is not a series number", number))),
        }
    }

    /// Parse `name:number`, splitting at the last colon so names may
    /// contain colons themselves.
    pub fn parse(input: &str) -> Result<Self> {
        let (name, number) = input
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidSeries(format!("expected NAME:NUMBER, got '{}'", input)))?;
        Self::new(name, number)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> &str {
        &self.number
    }
}

impl FromStr for SeriesInfo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Series metadata found in a document, tagged with the dialect it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesRecord {
    Structured { name: String, number: String },
    Flat { name: String, number: String },
}

impl SeriesRecord {
    pub fn name(&self) -> &str {
        match self {
            Self::Structured { name, .. } | Self::Flat { name, .. } => name,
        }
    }

    pub fn number(&self) -> &str {
        match self {
            Self::Structured { number, .. } | Self::Flat { number, .. } => number,
        }
    }

    /// The dialect that supplied this record
    pub fn dialect(&self) -> Dialects {
        match self {
            Self::Structured { .. } => Dialects::STRUCTURED,
            Self::Flat { .. } => Dialects::FLAT,
        }
    }

    /// `structured` or `flat`
    pub fn label(&self) -> &'static str {
        match self {
            Self::Structured { .. } => "structured",
            Self::Flat { .. } => "flat",
        }
    }
}

impl fmt::Display for SeriesRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}  ({})", self.name(), self.number(), self.label())
    }
}

/// Reads and replaces the series metadata of a package document
pub struct SeriesEditor<'a> {
    doc: &'a mut PackageDocument,
    config: SeriesConfig,
}

impl<'a> SeriesEditor<'a> {
    pub fn new(doc: &'a mut PackageDocument, config: SeriesConfig) -> Self {
        Self { doc, config }
    }

    pub fn config(&self) -> SeriesConfig {
        self.config
    }

    /// The series the document belongs to, if any.
    ///
    /// Only the dialects enabled for reading are probed, structured first.
    pub fn series(&self) -> Option<SeriesRecord> {
        let list = self.doc.metadata();
        let structured = self
            .config
            .reads(Dialects::STRUCTURED)
            .then(|| read_structured(list))
            .flatten();
        structured.or_else(|| self.config.reads(Dialects::FLAT).then(|| read_flat(list)).flatten())
    }

    /// Replace the series metadata with `info` in every dialect enabled for
    /// writing.
    ///
    /// Existing series elements of both dialects are removed regardless of
    /// the configuration. New elements take the position of the first one
    /// removed, or go to the end of the metadata.
    pub fn set_series(&mut self, info: &SeriesInfo) {
        let list = self.doc.metadata();
        let set = list.with_refinements(series_elements(list));
        let anchor = set.first().copied().unwrap_or(list.len());

        let mut elements = Vec::new();
        if self.config.writes(Dialects::STRUCTURED) {
            let id = self.unique_id_after_removal(&set);
            elements.extend(self.structured(&id, info));
        }
        if self.config.writes(Dialects::FLAT) {
            elements.extend(self.flat(info));
        }
        if elements.is_empty() {
            warn!("no series dialect enabled for writing");
        }

        let list = self.doc.metadata_mut();
        let mut at = list.remove_anchored(&set, anchor);
        debug!(removed = set.len(), added = elements.len(), "replacing series elements");
        let changed = !set.is_empty() || !elements.is_empty();
        for element in elements {
            at = list.insert(at, element);
        }
        if changed {
            self.doc.mark_modified();
        }
    }

    /// An id for the new collection element. Ids of elements about to be
    /// removed are free for reuse.
    fn unique_id_after_removal(&self, removed: &BTreeSet<usize>) -> String {
        let list = self.doc.metadata();
        let taken = |candidate: &str| {
            list.iter()
                .enumerate()
                .any(|(i, el)| !removed.contains(&i) && el.id() == Some(candidate))
        };
        std::iter::once("series".to_string())
            .chain((1..).map(|n| format!("series{}", n)))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| list.unique_id("series"))
    }

    fn structured(&self, id: &str, info: &SeriesInfo) -> Vec<MetadataElement> {
        let target = format!("#{}", id);
        vec![
            self.doc
                .new_meta_element()
                .with_attribute("property", COLLECTION)
                .with_attribute("id", id)
                .with_text(info.name()),
            self.doc
                .new_meta_element()
                .with_attribute("refines", &target)
                .with_attribute("property", COLLECTION_TYPE)
                .with_text("series"),
            self.doc
                .new_meta_element()
                .with_attribute("refines", &target)
                .with_attribute("property", GROUP_POSITION)
                .with_text(info.number()),
        ]
    }

    fn flat(&self, info: &SeriesInfo) -> Vec<MetadataElement> {
        vec![
            self.doc
                .new_meta_element()
                .with_attribute("name", FLAT_NAME)
                .with_attribute("content", info.name()),
            self.doc
                .new_meta_element()
                .with_attribute("name", FLAT_INDEX)
                .with_attribute("content", info.number()),
        ]
    }
}

/// First collection with a position, probing each `meta` spelling
fn read_structured(list: &MetadataList) -> Option<SeriesRecord> {
    list.probe(META).into_iter().find_map(|index| {
        let el = list.get(index)?;
        if el.property() != Some(COLLECTION) {
            return None;
        }
        let name = el.trimmed_text()?;
        let number = list.refinement_value(index, GROUP_POSITION)?;
        Some(SeriesRecord::Structured {
            name: name.to_string(),
            number: number.trim().to_string(),
        })
    })
}

fn read_flat(list: &MetadataList) -> Option<SeriesRecord> {
    let content = |name: &str| {
        list.find_first(META, |el| {
            el.attribute_is("name", name) && el.attribute("content").is_some()
        })
            .and_then(|i| list.get(i))
            .and_then(|el| el.attribute("content"))
            .map(|value| value.trim().to_string())
    };
    Some(SeriesRecord::Flat {
        name: content(FLAT_NAME)?,
        number: content(FLAT_INDEX)?,
    })
}

/// Every element of either dialect, without refinements
fn series_elements(list: &MetadataList) -> Vec<usize> {
    list.find_all(META, |el| {
        el.property() == Some(COLLECTION)
            || el.attribute_is("name", FLAT_NAME)
            || el.attribute_is("name", FLAT_INDEX)
    })
}
