//! Title editor.
//!
//! A document may carry several `title` elements. EPUB 3 documents classify
//! them with a `title-type` refinement (`main`, `subtitle`, `short`, ...);
//! older documents simply list one title. Reading reconstructs a
//! [`TitleRecord`] from whatever is present; writing replaces every title and
//! its refinements with a fresh, fully classified main title and optional
//! subtitle at the position of the first one removed.

use crate::epub::document::PackageDocument;
use crate::epub::elements::element::MetadataElement;
use crate::epub::elements::list::MetadataList;
use crate::epub::elements::namespace::TITLE;
use tracing::{debug, warn};

/// Returned in place of the main title when a document has none
pub const MISSING_TITLE: &str = "<missing>";

const TITLE_TYPE: &str = "title-type";
const DISPLAY_SEQ: &str = "display-seq";

/// The main title and subtitle of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRecord {
    pub main: String,
    pub subtitle: Option<String>,
}

impl std::fmt::Display for TitleRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.subtitle {
            Some(subtitle) => write!(f, "{}: {}", self.main, subtitle),
            None => f.write_str(&self.main),
        }
    }
}

/// Reads and replaces the title of a package document
pub struct TitleEditor<'a> {
    doc: &'a mut PackageDocument,
}

impl<'a> TitleEditor<'a> {
    pub fn new(doc: &'a mut PackageDocument) -> Self {
        Self { doc }
    }

    /// The current title.
    ///
    /// An explicit `main` classification wins; otherwise the first title
    /// without a `title-type` refinement is the main title. A document with
    /// neither yields [`MISSING_TITLE`].
    pub fn title(&self) -> TitleRecord {
        let (main, subtitle) = classify(self.doc.metadata());
        let main = main.unwrap_or_else(|| {
            warn!("document has no main title");
            MISSING_TITLE.to_string()
        });
        TitleRecord { main, subtitle }
    }

    /// Replace the title and subtitle.
    ///
    /// Does nothing if both are `None`. An omitted title keeps the current
    /// main text, and no main title is written when there is none to keep;
    /// an omitted subtitle removes the existing one.
    pub fn set_title(&mut self, title: Option<&str>, subtitle: Option<&str>) {
        if title.is_none() && subtitle.is_none() {
            return;
        }

        let list = self.doc.metadata();
        let main = title.map(str::to_string).or_else(|| classify(list).0);
        let set = list.with_refinements(list.indices_of(TITLE));
        let anchor = set.first().copied().unwrap_or(list.len());

        let list = self.doc.metadata_mut();
        let mut at = list.remove_anchored(&set, anchor);
        debug!(removed = set.len(), at, "replacing title elements");

        let mut elements = Vec::with_capacity(6);
        match &main {
            Some(main) => elements.extend(self.classified_title("maintitle", main, "main", "1")),
            None => warn!("document has no main title to keep"),
        }
        if let Some(subtitle) = subtitle {
            elements.extend(self.classified_title("subtitle", subtitle, "subtitle", "2"));
        }

        let list = self.doc.metadata_mut();
        for element in elements {
            at = list.insert(at, element);
        }
        self.doc.mark_modified();
    }

    /// A title element followed by its `title-type` and `display-seq`
    /// refinements
    fn classified_title(
        &self,
        id: &str,
        text: &str,
        kind: &str,
        seq: &str,
    ) -> Vec<MetadataElement> {
        let id = self.doc.metadata().unique_id(id);
        let target = format!("#{}", id);
        vec![
            self.doc.new_dc_element("title").with_attribute("id", &id).with_text(text),
            self.doc
                .new_meta_element()
                .with_attribute("refines", &target)
                .with_attribute("property", TITLE_TYPE)
                .with_text(kind),
            self.doc
                .new_meta_element()
                .with_attribute("refines", &target)
                .with_attribute("property", DISPLAY_SEQ)
                .with_text(seq),
        ]
    }
}

/// Split the titles of `list` into (main, subtitle).
///
/// Titles with another classification (`short`, `collection`, ...) are
/// ignored.
fn classify(list: &MetadataList) -> (Option<String>, Option<String>) {
    let mut main = None;
    let mut subtitle = None;
    let mut unclassified = None;

    for index in list.probe(TITLE) {
        let Some(text) = list.get(index).and_then(|el| el.trimmed_text()) else {
            continue;
        };
        match list.refinement_value(index, TITLE_TYPE) {
            Some("main") => {
                main.get_or_insert_with(|| text.to_string());
            },
            Some("subtitle") => {
                subtitle.get_or_insert_with(|| text.to_string());
            },
            Some(_) => {},
            None => {
                unclassified.get_or_insert_with(|| text.to_string());
            },
        }
    }

    (main.or(unclassified), subtitle)
}
