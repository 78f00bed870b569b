//! Container index parsing.
//!
//! `META-INF/container.xml` names the package documents of an EPUB archive:
//!
//! ```xml
//! <container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
//!   <rootfiles>
//!     <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
//!   </rootfiles>
//! </container>
//! ```

use crate::common::{Error, Result};
use crate::epub::elements::element::MetadataElement;
use crate::epub::elements::namespace::{NamespaceContext, ROOTFILE};
use crate::epub::elements::parser::build_element;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Read, Seek};

/// Path of the container index inside the archive
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Container index (META-INF/container.xml)
#[derive(Debug, Clone, Default)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

/// Entry in the container index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: Option<String>,
}

impl Container {
    /// Parse the container index from a ZIP archive
    pub fn from_archive<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Result<Self> {
        let mut file = archive
            .by_name(CONTAINER_PATH)
            .map_err(|_| Error::ContainerNotFound(format!("{} is missing", CONTAINER_PATH)))?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Self::parse(&content)
    }

    /// Parse container XML content
    pub fn parse(xml_content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml_content);
        let mut scopes = vec![NamespaceContext::default()];
        let mut rootfiles = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    let parent = scopes.last().cloned().unwrap_or_default();
                    let (element, scope) = build_element(e, &parent)?;
                    if element.is(ROOTFILE) {
                        rootfiles.extend(Self::rootfile(&element));
                    }
                    scopes.push(scope);
                },
                Event::Empty(ref e) => {
                    let parent = scopes.last().cloned().unwrap_or_default();
                    let (element, _) = build_element(e, &parent)?;
                    if element.is(ROOTFILE) {
                        rootfiles.extend(Self::rootfile(&element));
                    }
                },
                Event::End(_) => {
                    scopes.pop();
                },
                Event::Eof => break,
                _ => {},
            }
        }

        Ok(Self { rootfiles })
    }

    fn rootfile(element: &MetadataElement) -> Option<RootFile> {
        let full_path = element.attribute("full-path")?.trim();
        (!full_path.is_empty()).then(|| RootFile {
            full_path: full_path.to_string(),
            media_type: element.attribute("media-type").map(str::to_string),
        })
    }

    /// Path of the first listed package document
    pub fn rootfile_path(&self) -> Result<&str> {
        self.rootfiles
            .first()
            .map(|rootfile| rootfile.full_path.as_str())
            .ok_or_else(|| Error::ContainerNotFound("no rootfile listed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
    <rootfile full-path="alt/other.opf" media-type="application/oebps-package+xml"></rootfile>
  </rootfiles>
</container>"#;

    #[test]
    fn test_parse_rootfiles() {
        let container = Container::parse(CONTAINER).unwrap();
        assert_eq!(container.rootfiles.len(), 2);
        assert_eq!(container.rootfile_path().unwrap(), "OEBPS/content.opf");
        assert_eq!(
            container.rootfiles[1],
            RootFile {
                full_path: "alt/other.opf".to_string(),
                media_type: Some("application/oebps-package+xml".to_string()),
            }
        );
    }

    #[test]
    fn test_prefixed_rootfile() {
        let xml = r#"<c:container xmlns:c="urn:oasis:names:tc:opendocument:xmlns:container"><c:rootfiles><c:rootfile full-path="book.opf"/></c:rootfiles></c:container>"#;
        assert_eq!(Container::parse(xml).unwrap().rootfile_path().unwrap(), "book.opf");
    }

    #[test]
    fn test_no_rootfile() {
        let xml = r#"<container xmlns="urn:oasis:names:tc:opendocument:xmlns:container"><rootfiles/></container>"#;
        let container = Container::parse(xml).unwrap();
        assert!(matches!(container.rootfile_path(), Err(Error::ContainerNotFound(_))));
    }
}
