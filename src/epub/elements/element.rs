//! Metadata element node.
//!
//! A [`MetadataElement`] is one element of the package document's metadata
//! subtree: a tag, an ordered attribute list with unique keys, optional text
//! and nested children. Elements read from a document keep their original
//! markup and are written back verbatim until something mutates them.

use crate::common::xml::{escape_text, escape_xml};
use crate::epub::elements::namespace::{NamespaceContext, QualifiedName, Tag, TagForm, split_prefix};

/// A single element of the metadata subtree
#[derive(Debug, Clone)]
pub struct MetadataElement {
    tag_name: String,
    qualified_name: QualifiedName,
    attributes: Vec<(String, String)>,
    text: String,
    pub(crate) children: Vec<MetadataElement>,
    /// Raw markup between the previous sibling (or the parent's start tag)
    /// and this element, usually indentation
    pub(crate) lead: String,
    /// Raw markup between the last child and the end tag
    pub(crate) closing: String,
    /// Original markup, dropped on the first mutation
    pub(crate) source: Option<String>,
}

impl MetadataElement {
    /// Create a new element. The tag name is written as given (`dc:title`,
    /// `meta`, ...) and resolved against `context`.
    pub fn new(tag_name: &str, context: &NamespaceContext) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            qualified_name: QualifiedName::parse(tag_name, context),
            attributes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
            lead: String::new(),
            closing: String::new(),
            source: None,
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style text setter
    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    /// Get the tag name as written
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Get the qualified name
    pub fn qualified_name(&self) -> &QualifiedName {
        &self.qualified_name
    }

    /// Get the local name (without namespace prefix)
    pub fn local_name(&self) -> &str {
        &self.qualified_name.local_name
    }

    /// Check whether this element is `tag` in any spelling
    pub fn is(&self, tag: Tag) -> bool {
        tag.matches(&self.qualified_name)
    }

    /// Check whether this element is `tag` written in `form`
    pub fn is_form(&self, tag: Tag, form: TagForm) -> bool {
        tag.matches_form(&self.qualified_name, form)
    }

    /// Get the attributes in document order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Get attribute value by name.
    ///
    /// An exact key wins; otherwise a prefixed key with the same local name
    /// (`opf:content` for `content`) is accepted.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .or_else(|| {
                self.attributes.iter().find(|(key, _)| match split_prefix(key) {
                    (Some(prefix), local) => prefix != "xmlns" && local == name,
                    (None, _) => false,
                })
            })
            .map(|(_, value)| value.as_str())
    }

    /// Check whether `name` is present with exactly `value`
    pub fn attribute_is(&self, name: &str, value: &str) -> bool {
        self.attribute(name) == Some(value)
    }

    /// Set attribute value, replacing an existing key in place
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.source = None;
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Remove attribute
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(key, _)| key == name)?;
        self.source = None;
        Some(self.attributes.remove(pos).1)
    }

    /// The `id` attribute
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// The id this element refines, without the leading `#`
    pub fn refines(&self) -> Option<&str> {
        self.attribute("refines")
            .and_then(|target| target.trim().strip_prefix('#'))
    }

    /// The `property` attribute
    pub fn property(&self) -> Option<&str> {
        self.attribute("property")
    }

    /// Get the text content (unescaped, untrimmed)
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text content with surrounding whitespace removed, `None` if empty
    pub fn trimmed_text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// Set the text content
    pub fn set_text(&mut self, text: &str) {
        self.source = None;
        self.text = text.to_string();
    }

    /// A refinement's value: its text, or its `content` attribute
    pub fn value(&self) -> Option<&str> {
        self.trimmed_text().or_else(|| self.attribute("content"))
    }

    /// Get children
    pub fn children(&self) -> &[MetadataElement] {
        &self.children
    }

    /// Add a child element
    pub fn add_child(&mut self, child: MetadataElement) {
        self.source = None;
        self.children.push(child);
    }

    /// Serialize element to XML string (without its lead)
    pub fn to_xml_string(&self) -> String {
        let mut xml = String::new();
        self.write_xml(&mut xml);
        xml
    }

    pub(crate) fn write_xml(&self, output: &mut String) {
        if let Some(source) = &self.source {
            output.push_str(source);
            return;
        }

        output.push('<');
        output.push_str(&self.tag_name);
        for (key, value) in &self.attributes {
            output.push(' ');
            output.push_str(key);
            output.push_str("=\"");
            output.push_str(&escape_xml(value));
            output.push('"');
        }

        if self.children.is_empty() && self.text.is_empty() {
            output.push_str("/>");
            return;
        }

        output.push('>');
        output.push_str(&escape_text(&self.text));
        for child in &self.children {
            output.push_str(&child.lead);
            child.write_xml(output);
        }
        output.push_str(&self.closing);
        output.push_str("</");
        output.push_str(&self.tag_name);
        output.push('>');
    }

    /// Parser hook: append text without touching the recorded source
    pub(crate) fn push_parsed_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Parser hook: append an attribute read from the document
    pub(crate) fn push_parsed_attribute(&mut self, name: String, value: String) {
        self.attributes.push((name, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::elements::namespace::{DCNS, META, OPFNS, TITLE};

    fn context() -> NamespaceContext {
        let mut ctx = NamespaceContext::default();
        ctx.add_declaration("xmlns", OPFNS);
        ctx.add_declaration("xmlns:dc", DCNS);
        ctx
    }

    #[test]
    fn test_build_and_serialize() {
        let ctx = context();
        let el = MetadataElement::new("meta", &ctx)
            .with_attribute("refines", "#maintitle")
            .with_attribute("property", "title-type")
            .with_text("main");
        assert!(el.is(META));
        assert_eq!(el.refines(), Some("maintitle"));
        assert_eq!(
            el.to_xml_string(),
            r##"<meta refines="#maintitle" property="title-type">main</meta>"##
        );
    }

    #[test]
    fn test_refines_needs_single_hash() {
        let ctx = context();
        let refines = |target: &str| {
            MetadataElement::new("meta", &ctx)
                .with_attribute("refines", target)
                .refines()
                .map(str::to_string)
        };
        assert_eq!(refines(" #t1 ").as_deref(), Some("t1"));
        assert_eq!(refines("t1"), None);
        assert_eq!(refines("##t1").as_deref(), Some("#t1"));
    }

    #[test]
    fn test_empty_element_self_closes() {
        let el = MetadataElement::new("meta", &context())
            .with_attribute("name", "calibre:series")
            .with_attribute("content", "Tom & Jerry");
        assert_eq!(
            el.to_xml_string(),
            r#"<meta name="calibre:series" content="Tom &amp; Jerry"/>"#
        );
        assert_eq!(el.value(), Some("Tom & Jerry"));
    }

    #[test]
    fn test_attribute_lookup_tolerates_prefix() {
        let el = MetadataElement::new("opf:meta", &context())
            .with_attribute("xmlns:content", "urn:x")
            .with_attribute("opf:content", "2");
        assert_eq!(el.attribute("content"), Some("2"));
        assert!(el.attribute_is("content", "2"));
    }

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut el = MetadataElement::new("dc:title", &context())
            .with_attribute("id", "a")
            .with_attribute("xml:lang", "en");
        el.set_attribute("id", "b");
        assert!(el.is(TITLE));
        assert_eq!(el.attributes()[0], ("id".to_string(), "b".to_string()));
        assert_eq!(el.remove_attribute("xml:lang"), Some("en".to_string()));
        assert_eq!(el.attributes().len(), 1);
    }

    #[test]
    fn test_source_is_dropped_on_mutation() {
        let mut el = MetadataElement::new("dc:title", &context()).with_text("Old");
        el.source = Some("<dc:title>Old</dc:title>".to_string());
        assert_eq!(el.to_xml_string(), "<dc:title>Old</dc:title>");
        el.set_text("New & Improved");
        assert_eq!(el.to_xml_string(), "<dc:title>New &amp; Improved</dc:title>");
    }
}
