//! Ordered metadata sequence and refinement-graph utilities.
//!
//! The children of the package document's `<metadata>` element form a flat,
//! ordered list. Order matters (readers show the first title, creators are
//! listed in sequence), so edits remove and insert at explicit positions and
//! never reorder unrelated elements.
//!
//! Elements are linked by reference rather than containment: a `meta`
//! element whose `refines` attribute is `#someid` augments the element with
//! `id="someid"`. Deleting an element therefore means deleting every element
//! that refines it as well, which is what [`MetadataList::delete_node_and_refinements`]
//! does.

use crate::epub::elements::element::MetadataElement;
use crate::epub::elements::namespace::{Tag, TagForm};
use smallvec::SmallVec;
use std::collections::BTreeSet;

/// Indices of the refinements of one element. Most elements have one to three.
pub type RefinementIndices = SmallVec<[usize; 4]>;

/// The ordered children of `<metadata>`
#[derive(Debug, Clone, Default)]
pub struct MetadataList {
    elements: Vec<MetadataElement>,
    /// Raw markup between the last element and `</metadata>`
    trailer: String,
}

impl MetadataList {
    pub(crate) fn from_parts(elements: Vec<MetadataElement>, trailer: String) -> Self {
        Self { elements, trailer }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<&MetadataElement> {
        self.elements.get(index)
    }

    /// Iterate over the elements in document order
    pub fn iter(&self) -> std::slice::Iter<'_, MetadataElement> {
        self.elements.iter()
    }

    /// Indices of every element that is `tag`, in document order
    pub fn indices_of(&self, tag: Tag) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.is(tag))
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of every element that is `tag`, ordered by spelling
    /// ([`TagForm::PROBE_ORDER`]) and then by document position.
    pub fn probe(&self, tag: Tag) -> Vec<usize> {
        TagForm::PROBE_ORDER
            .iter()
            .flat_map(|form| {
                self.elements
                    .iter()
                    .enumerate()
                    .filter(move |(_, el)| el.is_form(tag, *form))
                    .map(|(i, _)| i)
            })
            .collect()
    }

    /// Find the first element that is `tag` and satisfies `predicate`,
    /// probing each spelling of the tag in turn.
    pub fn find_first<P>(&self, tag: Tag, predicate: P) -> Option<usize>
    where
        P: Fn(&MetadataElement) -> bool,
    {
        self.probe(tag)
            .into_iter()
            .find(|i| predicate(&self.elements[*i]))
    }

    /// Indices of every element that is `tag` and satisfies `predicate`
    pub fn find_all<P>(&self, tag: Tag, predicate: P) -> Vec<usize>
    where
        P: Fn(&MetadataElement) -> bool,
    {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.is(tag) && predicate(el))
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of the elements refining the element at `index`.
    ///
    /// Empty if the element has no id or is out of range.
    pub fn refinements_of(&self, index: usize) -> RefinementIndices {
        let Some(id) = self.elements.get(index).and_then(|el| el.id()) else {
            return RefinementIndices::new();
        };
        self.elements
            .iter()
            .enumerate()
            .filter(|(i, el)| *i != index && el.refines() == Some(id))
            .map(|(i, _)| i)
            .collect()
    }

    /// Find the element refining the element at `index` with the given
    /// `property`.
    ///
    /// Returns `None` when the element has no id or nothing matches.
    pub fn find_refinement(&self, index: usize, property: &str) -> Option<usize> {
        self.refinements_of(index)
            .into_iter()
            .find(|i| self.elements[*i].property() == Some(property))
    }

    /// The value of the `property` refinement of the element at `index`
    pub fn refinement_value(&self, index: usize, property: &str) -> Option<&str> {
        self.find_refinement(index, property)
            .and_then(|i| self.elements[i].value())
    }

    /// Remove every element refining the element at `index`, directly or
    /// through another refinement.
    ///
    /// Returns the removed elements in document order. Indices after a
    /// removed element shift down; the refined element itself moves to
    /// `index - (removed elements that preceded it)`.
    pub fn delete_refinements_of(&mut self, index: usize) -> Vec<MetadataElement> {
        let mut set = self.with_refinements(self.refinements_of(index));
        set.remove(&index);
        self.remove_set(&set)
    }

    /// Remove the element at `index` together with everything refining it.
    ///
    /// The set is computed before anything is removed, so either the whole
    /// group goes or (for an out-of-range index) nothing does.
    pub fn delete_node_and_refinements(&mut self, index: usize) -> Vec<MetadataElement> {
        if index >= self.elements.len() {
            return Vec::new();
        }
        let set = self.with_refinements([index]);
        self.remove_set(&set)
    }

    /// The given indices plus the indices of everything refining them,
    /// following chains of refinements (a refinement with its own id may be
    /// refined in turn).
    pub fn with_refinements<I>(&self, indices: I) -> BTreeSet<usize>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut set = BTreeSet::new();
        let mut pending: Vec<usize> = indices
            .into_iter()
            .filter(|index| *index < self.elements.len())
            .collect();
        while let Some(index) = pending.pop() {
            if set.insert(index) {
                pending.extend(self.refinements_of(index));
            }
        }
        set
    }

    /// Remove every index in `set`, returning the removed elements in
    /// document order.
    pub fn remove_set(&mut self, set: &BTreeSet<usize>) -> Vec<MetadataElement> {
        let mut removed = Vec::with_capacity(set.len());
        for &index in set.iter().rev() {
            if index < self.elements.len() {
                removed.push(self.elements.remove(index));
            }
        }
        removed.reverse();
        removed
    }

    /// Remove every index in `set` and translate `anchor` (an index valid
    /// before the removal) to the position it occupies afterwards.
    pub fn remove_anchored(&mut self, set: &BTreeSet<usize>, anchor: usize) -> usize {
        let shift = set.range(..anchor).count();
        self.remove_set(set);
        (anchor - shift).min(self.elements.len())
    }

    /// Insert `element` at `index`, taking the indentation of its neighbours.
    /// Returns the index after the inserted element.
    pub fn insert(&mut self, index: usize, mut element: MetadataElement) -> usize {
        let index = index.min(self.elements.len());
        element.lead = self.indent_at(index);
        self.elements.insert(index, element);
        index + 1
    }

    /// Append `element` after the last element
    pub fn push(&mut self, element: MetadataElement) -> usize {
        self.insert(self.elements.len(), element)
    }

    /// The whitespace separating elements around `index`
    fn indent_at(&self, index: usize) -> String {
        let neighbour = self
            .elements
            .get(index)
            .or_else(|| index.checked_sub(1).and_then(|i| self.elements.get(i)));
        let lead = neighbour.map(|el| el.lead.as_str()).unwrap_or("");
        let indent = &lead[lead.trim_end().len()..];
        if indent.is_empty() && neighbour.is_none() {
            "\n".to_string()
        } else {
            indent.to_string()
        }
    }

    /// An id starting with `base` that no element in the list carries yet
    pub fn unique_id(&self, base: &str) -> String {
        let taken = |candidate: &str| self.elements.iter().any(|el| el.id() == Some(candidate));
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{}{}", base, n))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Serialize the list (the inner content of `<metadata>`)
    pub(crate) fn write_xml(&self, output: &mut String) {
        for el in &self.elements {
            output.push_str(&el.lead);
            el.write_xml(output);
        }
        output.push_str(&self.trailer);
    }
}

impl<'a> IntoIterator for &'a MetadataList {
    type Item = &'a MetadataElement;
    type IntoIter = std::slice::Iter<'a, MetadataElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::elements::namespace::{CREATOR, DCNS, META, NamespaceContext, OPFNS, TITLE};
    use proptest::prelude::*;

    fn ctx() -> NamespaceContext {
        let mut ctx = NamespaceContext::default();
        ctx.add_declaration("xmlns", OPFNS);
        ctx.add_declaration("xmlns:dc", DCNS);
        ctx
    }

    fn el(tag: &str, attrs: &[(&str, &str)], text: &str) -> MetadataElement {
        let mut el = MetadataElement::new(tag, &ctx()).with_text(text);
        for (k, v) in attrs {
            el.set_attribute(k, v);
        }
        el.lead = "\n    ".to_string();
        el
    }

    fn sample() -> MetadataList {
        MetadataList::from_parts(
            vec![
                el("dc:identifier", &[("id", "uid")], "urn:uuid:1"),
                el("dc:title", &[("id", "t1")], "Title"),
                el("meta", &[("refines", "#t1"), ("property", "title-type")], "main"),
                el("dc:creator", &[("id", "c1")], "Author"),
                el("meta", &[("refines", "#c1"), ("property", "role")], "aut"),
                el("meta", &[("refines", "#t1"), ("property", "display-seq")], "1"),
                el("dc:language", &[], "en"),
            ],
            "\n  ".to_string(),
        )
    }

    #[test]
    fn test_find_refinement() {
        let list = sample();
        assert_eq!(list.find_refinement(1, "title-type"), Some(2));
        assert_eq!(list.find_refinement(1, "display-seq"), Some(5));
        assert_eq!(list.find_refinement(1, "role"), None);
        assert_eq!(list.refinement_value(3, "role"), Some("aut"));
        // no id
        assert_eq!(list.find_refinement(6, "title-type"), None);
        // out of range
        assert_eq!(list.find_refinement(42, "title-type"), None);
    }

    #[test]
    fn test_delete_refinements_of() {
        let mut list = sample();
        let removed = list.delete_refinements_of(1);
        assert_eq!(removed.len(), 2);
        assert_eq!(list.len(), 5);
        assert!(list.iter().all(|el| el.refines() != Some("t1")));
        // the title itself stays
        assert_eq!(list.indices_of(TITLE), vec![1]);

        let mut list = sample();
        assert!(list.delete_refinements_of(6).is_empty());
        assert_eq!(list.len(), 7);
    }

    #[test]
    fn test_delete_node_and_refinements() {
        let mut list = sample();
        let removed = list.delete_node_and_refinements(3);
        assert_eq!(removed.len(), 2);
        assert!(list.indices_of(CREATOR).is_empty());
        assert!(list.iter().all(|el| el.refines() != Some("c1")));
        // unrelated order preserved
        let tags: Vec<&str> = list.iter().map(|el| el.tag_name()).collect();
        assert_eq!(tags, ["dc:identifier", "dc:title", "meta", "meta", "dc:language"]);

        assert!(list.delete_node_and_refinements(99).is_empty());
        assert_eq!(list.len(), 5);
    }

    fn chained() -> MetadataList {
        MetadataList::from_parts(
            vec![
                el("dc:title", &[("id", "t1")], "Title"),
                el("meta", &[("refines", "#t1"), ("property", "alternate-script"), ("id", "alt")], "Alt"),
                el("meta", &[("refines", "#alt"), ("property", "file-as")], "AltSort"),
                el("dc:language", &[], "en"),
            ],
            "\n  ".to_string(),
        )
    }

    #[test]
    fn test_delete_follows_refinement_chains() {
        let mut list = chained();
        let removed = list.delete_node_and_refinements(0);
        assert_eq!(removed.len(), 3);
        assert_eq!(list.len(), 1);
        assert!(list.iter().all(|el| el.refines().is_none()));

        let mut list = chained();
        assert_eq!(list.delete_refinements_of(0).len(), 2);
        assert_eq!(list.indices_of(TITLE), vec![0]);
        assert!(list.iter().all(|el| el.refines().is_none()));
    }

    #[test]
    fn test_with_refinements_tolerates_cycles() {
        let list = MetadataList::from_parts(
            vec![
                el("meta", &[("id", "a"), ("refines", "#b")], "x"),
                el("meta", &[("id", "b"), ("refines", "#a")], "y"),
                el("dc:language", &[], "en"),
            ],
            String::new(),
        );
        assert_eq!(list.with_refinements([0]), BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_refines_requires_hash() {
        let list = MetadataList::from_parts(
            vec![
                el("dc:title", &[("id", "t1")], "Title"),
                el("meta", &[("refines", "t1"), ("property", "title-type")], "main"),
                el("meta", &[("refines", "##t1"), ("property", "title-type")], "main"),
            ],
            String::new(),
        );
        assert!(list.refinements_of(0).is_empty());
        assert_eq!(list.find_refinement(0, "title-type"), None);
    }

    #[test]
    fn test_remove_anchored_shifts_anchor() {
        let mut list = sample();
        let set = list.with_refinements([3]);
        // anchor at dc:language (6): two removed elements precede it
        assert_eq!(list.remove_anchored(&set, 6), 4);
        assert_eq!(list.get(4).map(|el| el.tag_name()), Some("dc:language"));
    }

    #[test]
    fn test_insert_takes_neighbour_indent() {
        let mut list = sample();
        let next = list.insert(1, MetadataElement::new("meta", &ctx()));
        assert_eq!(next, 2);
        assert_eq!(list.get(1).map(|el| el.lead.as_str()), Some("\n    "));

        let mut empty = MetadataList::default();
        empty.push(MetadataElement::new("meta", &ctx()));
        assert_eq!(empty.get(0).map(|el| el.lead.as_str()), Some("\n"));
    }

    #[test]
    fn test_find_first_probes_qualified_then_bare() {
        let list = MetadataList::from_parts(
            vec![
                el("meta", &[("name", "calibre:series")], ""),
                el("opf:meta", &[("name", "calibre:series")], ""),
            ],
            String::new(),
        );
        assert_eq!(list.find_first(META, |el| el.attribute_is("name", "calibre:series")), Some(1));
    }

    #[test]
    fn test_unique_id() {
        let list = sample();
        assert_eq!(list.unique_id("series"), "series");
        assert_eq!(list.unique_id("t"), "t");
        assert_eq!(list.unique_id("t1"), "t11");
    }

    #[test]
    fn test_write_xml_keeps_layout() {
        let mut list = sample();
        list.delete_node_and_refinements(3);
        let mut out = String::new();
        list.write_xml(&mut out);
        assert!(out.starts_with("\n    <dc:identifier id=\"uid\">urn:uuid:1</dc:identifier>"));
        assert!(out.ends_with("<dc:language>en</dc:language>\n  "));
        assert!(!out.contains("creator"));
    }

    proptest! {
        #[test]
        fn prop_cascade_delete_leaves_no_dangling_refinement(target in 0usize..7) {
            let mut list = sample();
            let id = list.get(target).and_then(|el| el.id()).map(str::to_string);
            list.delete_node_and_refinements(target);
            if let Some(id) = id {
                prop_assert!(list.iter().all(|el| el.refines() != Some(id.as_str())));
                prop_assert!(list.iter().all(|el| el.id() != Some(id.as_str())));
            }
            prop_assert_eq!(list.len() + 1 + sample().refinements_of(target).len(), 7);
        }
    }
}
