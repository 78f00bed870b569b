//! Author editor.
//!
//! Authors are `creator` elements. Replacing them writes one creator per
//! name, each refined with a MARC relator `role` of `aut` and, for more than
//! one author, a `display-seq` giving its position.

use crate::common::{Error, Result};
use crate::epub::document::PackageDocument;
use crate::epub::elements::element::MetadataElement;
use crate::epub::elements::namespace::CREATOR;
use tracing::{debug, warn};

const AUTHOR_ROLE: &str = "aut";
const ROLE_SCHEME: &str = "marc:relators";

/// Reads and replaces the creators of a package document
pub struct AuthorEditor<'a> {
    doc: &'a mut PackageDocument,
}

impl<'a> AuthorEditor<'a> {
    pub fn new(doc: &'a mut PackageDocument) -> Self {
        Self { doc }
    }

    /// Creator names in document order
    pub fn authors(&self) -> Vec<String> {
        let list = self.doc.metadata();
        let authors: Vec<String> = list
            .indices_of(CREATOR)
            .into_iter()
            .filter_map(|i| list.get(i).and_then(|el| el.trimmed_text()))
            .map(str::to_string)
            .collect();
        if authors.is_empty() {
            warn!("document has no authors");
        }
        authors
    }

    /// Replace every creator with `names`, in order.
    ///
    /// # Errors
    ///
    /// [`Error::AuthorsNotFound`] when the document has no creator to take
    /// the position from. The document is left untouched.
    pub fn set_authors<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let list = self.doc.metadata();
        let creators = list.indices_of(CREATOR);
        let Some(&anchor) = creators.first() else {
            return Err(Error::AuthorsNotFound);
        };
        let set = list.with_refinements(creators);

        let mut elements = Vec::with_capacity(names.len() * 3);
        for (i, name) in names.iter().enumerate() {
            let id = format!("creator{:02}", i + 1);
            elements.extend(self.creator(&id, name.as_ref(), (names.len() > 1).then_some(i)));
        }

        let list = self.doc.metadata_mut();
        let mut at = list.remove_anchored(&set, anchor);
        debug!(removed = set.len(), added = names.len(), "replacing creators");
        for element in elements {
            at = list.insert(at, element);
        }
        self.doc.mark_modified();
        Ok(())
    }

    /// A creator followed by its role and, if given, display-seq refinements
    fn creator(&self, id: &str, name: &str, seq: Option<usize>) -> Vec<MetadataElement> {
        let target = format!("#{}", id);
        let mut elements = vec![
            self.doc.new_dc_element("creator").with_attribute("id", id).with_text(name),
            self.doc
                .new_meta_element()
                .with_attribute("refines", &target)
                .with_attribute("property", "role")
                .with_attribute("scheme", ROLE_SCHEME)
                .with_text(AUTHOR_ROLE),
        ];
        if let Some(seq) = seq {
            elements.push(
                self.doc
                    .new_meta_element()
                    .with_attribute("refines", &target)
                    .with_attribute("property", "display-seq")
                    .with_text(&seq.to_string()),
            );
        }
        elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::document::tests::{EPUB2_OPF, EPUB3_OPF};

    #[test]
    fn test_authors() {
        let mut doc = PackageDocument::parse(EPUB3_OPF).unwrap();
        assert_eq!(AuthorEditor::new(&mut doc).authors(), ["J. R. R. Tolkien"]);
        let mut doc = PackageDocument::parse(EPUB2_OPF).unwrap();
        assert_eq!(AuthorEditor::new(&mut doc).authors(), ["Frank Herbert"]);
    }

    #[test]
    fn test_set_several_authors() {
        let mut doc = PackageDocument::parse(EPUB3_OPF).unwrap();
        let mut editor = AuthorEditor::new(&mut doc);
        editor.set_authors(&["a", "b", "c"]).unwrap();
        assert_eq!(editor.authors(), ["a", "b", "c"]);

        let list = doc.metadata();
        let creators = list.indices_of(CREATOR);
        assert_eq!(creators.len(), 3);
        for (seq, index) in creators.into_iter().enumerate() {
            let id = format!("creator{:02}", seq + 1);
            assert_eq!(list.get(index).and_then(|el| el.id()), Some(id.as_str()));
            assert_eq!(list.refinement_value(index, "role"), Some("aut"));
            assert_eq!(list.refinement_value(index, "display-seq"), Some(seq.to_string().as_str()));
        }
        // the old creator and its role are gone
        assert!(list.iter().all(|el| el.id() != Some("c1") && el.refines() != Some("c1")));
        assert!(doc.is_modified());
    }

    #[test]
    fn test_set_single_author_has_no_display_seq() {
        let mut doc = PackageDocument::parse(EPUB3_OPF).unwrap();
        AuthorEditor::new(&mut doc).set_authors(&["Tolkien"]).unwrap();
        let list = doc.metadata();
        let index = list.indices_of(CREATOR)[0];
        assert_eq!(list.refinement_value(index, "role"), Some("aut"));
        assert_eq!(list.find_refinement(index, "display-seq"), None);
    }

    #[test]
    fn test_set_authors_stay_contiguous_in_place() {
        let mut doc = PackageDocument::parse(EPUB2_OPF).unwrap();
        AuthorEditor::new(&mut doc).set_authors(&["Frank Herbert", "Brian Herbert"]).unwrap();
        let tags: Vec<&str> = doc.metadata().iter().map(|el| el.local_name()).collect();
        assert_eq!(
            tags,
            ["title", "creator", "meta", "meta", "creator", "meta", "meta", "identifier", "meta", "meta"]
        );
        assert!(doc.to_xml_string().contains(
            "<dc:creator id=\"creator01\">Frank Herbert</dc:creator>\n<ns0:meta refines=\"#creator01\" property=\"role\" scheme=\"marc:relators\">aut</ns0:meta>"
        ));
    }

    #[test]
    fn test_authors_in_document_order_across_spellings() {
        let xml = r#"<package xmlns="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/"><metadata><creator>First</creator><dc:creator>Second</dc:creator></metadata></package>"#;
        let mut doc = PackageDocument::parse(xml).unwrap();
        assert_eq!(AuthorEditor::new(&mut doc).authors(), ["First", "Second"]);
    }

    #[test]
    fn test_set_authors_without_creators_fails() {
        let xml = r#"<package xmlns="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/"><metadata><dc:title>X</dc:title><dc:language>en</dc:language></metadata></package>"#;
        let mut doc = PackageDocument::parse(xml).unwrap();
        let mut editor = AuthorEditor::new(&mut doc);
        assert!(editor.authors().is_empty());
        assert!(matches!(editor.set_authors(&["a"]), Err(Error::AuthorsNotFound)));
        assert!(!doc.is_modified());
        assert!(doc.metadata().iter().any(|el| el.local_name() == "language"));
        assert_eq!(doc.to_xml_string(), xml);
    }
}
