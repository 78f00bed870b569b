//! The EPUB package document (the `.opf` file).
//!
//! [`PackageDocument`] owns the parsed metadata subtree for the duration of a
//! single run. Editors mutate it in place and flag it as modified; only a
//! modified document is worth writing back into the archive.

use crate::common::{Error, Result};
use crate::epub::elements::element::MetadataElement;
use crate::epub::elements::list::MetadataList;
use crate::epub::elements::namespace::{DCNS, NamespaceContext, OPFNS, conventional_prefix};
use crate::epub::elements::parser::parse_package;

const UTF8_BOM: &str = "\u{feff}";

/// A parsed package document
#[derive(Debug, Clone)]
pub struct PackageDocument {
    bom: bool,
    head: String,
    metadata: MetadataList,
    tail: String,
    namespaces: NamespaceContext,
    version: Option<String>,
    modified: bool,
}

impl PackageDocument {
    /// Parse a package document from bytes.
    ///
    /// # Errors
    ///
    /// [`Error::MetadataNotFound`] when the document has no `<metadata>`
    /// element, [`Error::XmlError`] for malformed XML.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes)
            .map_err(|_| Error::InvalidFormat("Invalid UTF-8 in package document".to_string()))?;
        Self::parse(xml)
    }

    /// Parse a package document from a string
    pub fn parse(xml: &str) -> Result<Self> {
        let (bom, xml) = match xml.strip_prefix(UTF8_BOM) {
            Some(rest) => (true, rest),
            None => (false, xml),
        };
        let parsed = parse_package(xml)?;

        Ok(Self {
            bom,
            head: parsed.head,
            metadata: parsed.metadata,
            tail: parsed.tail,
            namespaces: parsed.namespaces,
            version: parsed.version,
            modified: false,
        })
    }

    /// The package `version` attribute (`2.0`, `3.0`, ...)
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The metadata children
    pub fn metadata(&self) -> &MetadataList {
        &self.metadata
    }

    /// Mutable access to the metadata children.
    ///
    /// Callers that change the structure must call [`mark_modified`](Self::mark_modified).
    pub fn metadata_mut(&mut self) -> &mut MetadataList {
        &mut self.metadata
    }

    /// Whether an editor changed the document
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Flag the document as changed
    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Namespaces in scope at `<metadata>`
    pub fn namespaces(&self) -> &NamespaceContext {
        &self.namespaces
    }

    /// A new Dublin Core element (`title`, `creator`, ...) spelled the way
    /// this document spells them.
    pub fn new_dc_element(&self, local_name: &str) -> MetadataElement {
        self.new_element(DCNS, local_name)
    }

    /// A new OPF `meta` element spelled the way this document spells it.
    pub fn new_meta_element(&self) -> MetadataElement {
        self.new_element(OPFNS, "meta")
    }

    fn new_element(&self, namespace: &str, local_name: &str) -> MetadataElement {
        match self.namespaces.prefix_for(namespace) {
            Some("") => MetadataElement::new(local_name, &self.namespaces),
            Some(prefix) => {
                MetadataElement::new(&format!("{}:{}", prefix, local_name), &self.namespaces)
            },
            None => {
                // Undeclared: the element carries its own declaration
                let prefix = conventional_prefix(namespace).unwrap_or("ns");
                let declaration = format!("xmlns:{}", prefix);
                let mut scope = self.namespaces.clone();
                scope.add_declaration(&declaration, namespace);
                MetadataElement::new(&format!("{}:{}", prefix, local_name), &scope)
                    .with_attribute(&declaration, namespace)
            },
        }
    }

    /// Serialize the whole document
    pub fn to_xml_string(&self) -> String {
        let mut xml = String::with_capacity(self.head.len() + self.tail.len() + 4096);
        if self.bom {
            xml.push_str(UTF8_BOM);
        }
        xml.push_str(&self.head);
        self.metadata.write_xml(&mut xml);
        xml.push_str(&self.tail);
        xml
    }

    /// Serialize the whole document to bytes
    pub fn serialize(&self) -> Vec<u8> {
        self.to_xml_string().into_bytes()
    }

    /// The `<metadata>` element alone, for display
    pub fn metadata_xml(&self) -> String {
        let open = self
            .head
            .rfind('<')
            .map(|i| &self.head[i..])
            .unwrap_or_default();
        let close = self
            .tail
            .find('>')
            .map(|i| &self.tail[..=i])
            .unwrap_or_default();

        let mut xml = String::from(open);
        self.metadata.write_xml(&mut xml);
        xml.push_str(close);
        xml
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::epub::elements::namespace::{META, TITLE};

    pub(crate) const EPUB3_OPF: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:0b7ef6a0-1b39-4cc2-9d2e-1f0d6f7f0a11</dc:identifier>
    <dc:title id="t1">The Fellowship of the Ring</dc:title>
    <meta refines="#t1" property="title-type">main</meta>
    <dc:title id="t2">Being the First Part</dc:title>
    <meta refines="#t2" property="title-type">subtitle</meta>
    <dc:creator id="c1">J. R. R. Tolkien</dc:creator>
    <meta refines="#c1" property="role" scheme="marc:relators">aut</meta>
    <dc:language>en</dc:language>
    <meta property="belongs-to-collection" id="col1">The Lord of the Rings</meta>
    <meta refines="#col1" property="collection-type">series</meta>
    <meta refines="#col1" property="group-position">1</meta>
    <meta property="dcterms:modified">2020-01-01T00:00:00Z</meta>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
  </manifest>
  <spine>
    <itemref idref="nav"/>
  </spine>
</package>
"##;

    /// EPUB 2 document as written by an ElementTree-based tool: generated
    /// `ns0` prefix, flat series metadata.
    pub(crate) const EPUB2_OPF: &str = r#"<ns0:package xmlns:ns0="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/" version="2.0" unique-identifier="uid">
<ns0:metadata>
<dc:title>Dune</dc:title>
<dc:creator>Frank Herbert</dc:creator>
<dc:identifier id="uid">9780441013593</dc:identifier>
<ns0:meta name="calibre:series" content="Dune Chronicles" />
<ns0:meta name="calibre:series_index" content="1" />
</ns0:metadata>
<ns0:manifest />
</ns0:package>"#;

    #[test]
    fn test_load_records_version() {
        let doc = PackageDocument::parse(EPUB3_OPF).unwrap();
        assert_eq!(doc.version(), Some("3.0"));
        assert!(!doc.is_modified());
        assert_eq!(doc.metadata().len(), 12);
    }

    #[test]
    fn test_unmodified_serialize_is_identical() {
        let doc = PackageDocument::parse(EPUB3_OPF).unwrap();
        assert_eq!(doc.to_xml_string(), EPUB3_OPF);
        let doc = PackageDocument::parse(EPUB2_OPF).unwrap();
        assert_eq!(doc.to_xml_string(), EPUB2_OPF);
    }

    #[test]
    fn test_bom_is_kept() {
        let xml = format!("{}{}", UTF8_BOM, EPUB2_OPF);
        let doc = PackageDocument::from_bytes(xml.as_bytes()).unwrap();
        assert_eq!(doc.to_xml_string(), xml);
    }

    #[test]
    fn test_missing_metadata_is_fatal() {
        let xml = r#"<package xmlns="http://www.idpf.org/2007/opf" version="3.0"><manifest/></package>"#;
        assert!(matches!(PackageDocument::parse(xml), Err(Error::MetadataNotFound)));
    }

    #[test]
    fn test_new_elements_follow_document_prefixes() {
        let doc = PackageDocument::parse(EPUB3_OPF).unwrap();
        assert_eq!(doc.new_dc_element("title").tag_name(), "dc:title");
        assert_eq!(doc.new_meta_element().tag_name(), "meta");

        let doc = PackageDocument::parse(EPUB2_OPF).unwrap();
        assert_eq!(doc.new_meta_element().tag_name(), "ns0:meta");
        assert!(doc.new_meta_element().is(META));
    }

    #[test]
    fn test_new_element_declares_missing_namespace() {
        let xml = r#"<package xmlns="http://www.idpf.org/2007/opf"><metadata><title>X</title></metadata></package>"#;
        let doc = PackageDocument::parse(xml).unwrap();
        let title = doc.new_dc_element("title");
        assert_eq!(title.tag_name(), "dc:title");
        assert_eq!(title.attribute("xmlns:dc"), Some(DCNS));
        assert!(title.is(TITLE));
    }

    #[test]
    fn test_metadata_xml() {
        let doc = PackageDocument::parse(EPUB2_OPF).unwrap();
        let xml = doc.metadata_xml();
        assert!(xml.starts_with("<ns0:metadata>"));
        assert!(xml.ends_with("</ns0:metadata>"));
        assert!(xml.contains("<dc:title>Dune</dc:title>"));
    }
}
