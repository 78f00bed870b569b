//! Package document parser.
//!
//! Splits a package document into three parts: the markup up to and
//! including the `<metadata>` start tag, the parsed metadata children, and
//! the markup from `</metadata>` to the end. Only the middle part is ever
//! rebuilt; the other two are written back byte for byte.
//!
//! The reader walks the document once. Every event's raw bytes are sliced
//! out of the source by position, so whitespace and comments between
//! metadata elements survive an edit.

use crate::common::xml::unescape_xml;
use crate::common::{Error, Result};
use crate::epub::elements::element::MetadataElement;
use crate::epub::elements::list::MetadataList;
use crate::epub::elements::namespace::{METADATA, NamespaceContext};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// A package document split around its metadata element
#[derive(Debug)]
pub(crate) struct ParsedPackage {
    /// Markup up to and including the `<metadata>` start tag
    pub head: String,
    /// Children of `<metadata>`
    pub metadata: MetadataList,
    /// Markup from `</metadata>` to the end of the document
    pub tail: String,
    /// Namespaces in scope at `<metadata>`
    pub namespaces: NamespaceContext,
    /// The package root's `version` attribute
    pub version: Option<String>,
}

/// Parse a package document.
///
/// Fails with [`Error::MetadataNotFound`] when the root element has no
/// `metadata` child.
pub(crate) fn parse_package(xml: &str) -> Result<ParsedPackage> {
    let mut reader = Reader::from_str(xml);
    let mut pos = 0usize;
    let mut depth = 0usize;
    let mut root_namespaces = NamespaceContext::default();
    let mut version = None;

    loop {
        let event = reader.read_event()?;
        let start = pos;
        pos = reader.buffer_position() as usize;

        match event {
            Event::Start(ref e) => {
                depth += 1;
                if depth == 1 {
                    let (root, namespaces) = build_element(e, &root_namespaces)?;
                    version = root.attribute("version").map(str::to_string);
                    root_namespaces = namespaces;
                } else if depth == 2 {
                    let (element, namespaces) = build_element(e, &root_namespaces)?;
                    if element.is(METADATA) {
                        let open_end = pos;
                        let (metadata, close_start) =
                            parse_children(xml, &mut reader, &namespaces, &mut pos)?;
                        return Ok(ParsedPackage {
                            head: xml[..open_end].to_string(),
                            metadata,
                            tail: xml[close_start..].to_string(),
                            namespaces,
                            version,
                        });
                    }
                }
            },
            Event::Empty(ref e) => {
                if depth == 1 {
                    let (element, namespaces) = build_element(e, &root_namespaces)?;
                    if element.is(METADATA) {
                        // Expand <metadata/> so elements can be inserted into it
                        let raw = &xml[start..pos];
                        let open = raw.trim_end_matches('>').trim_end_matches('/').trim_end();
                        return Ok(ParsedPackage {
                            head: format!("{}{}>", &xml[..start], open),
                            metadata: MetadataList::default(),
                            tail: format!("</{}>{}", element.tag_name(), &xml[pos..]),
                            namespaces,
                            version,
                        });
                    }
                } else if depth == 0 {
                    break;
                }
            },
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Err(Error::MetadataNotFound)
}

/// Parse the children of `<metadata>` up to and including its end tag.
///
/// Returns the list and the offset where `</metadata>` starts.
fn parse_children(
    xml: &str,
    reader: &mut Reader<&[u8]>,
    namespaces: &NamespaceContext,
    pos: &mut usize,
) -> Result<(MetadataList, usize)> {
    let mut top: Vec<MetadataElement> = Vec::new();
    let mut stack: Vec<(MetadataElement, NamespaceContext, usize)> = Vec::new();
    // Raw markup since the last sibling boundary
    let mut pending = String::new();

    loop {
        let event = reader.read_event()?;
        let start = *pos;
        *pos = reader.buffer_position() as usize;
        let raw = &xml[start..*pos];

        match event {
            Event::Start(ref e) => {
                let parent = stack.last().map(|(_, ns, _)| ns).unwrap_or(namespaces);
                let (mut element, scope) = build_element(e, parent)?;
                element.lead = std::mem::take(&mut pending);
                stack.push((element, scope, start));
            },
            Event::Empty(ref e) => {
                let parent = stack.last().map(|(_, ns, _)| ns).unwrap_or(namespaces);
                let (mut element, _) = build_element(e, parent)?;
                element.lead = std::mem::take(&mut pending);
                element.source = Some(raw.to_string());
                attach(&mut stack, &mut top, element);
            },
            Event::End(_) => match stack.pop() {
                Some((mut element, _, element_start)) => {
                    element.closing = std::mem::take(&mut pending);
                    element.source = Some(xml[element_start..*pos].to_string());
                    attach(&mut stack, &mut top, element);
                },
                None => {
                    return Ok((MetadataList::from_parts(top, pending), start));
                },
            },
            Event::Eof => {
                return Err(Error::InvalidFormat(
                    "Unexpected end of document inside metadata".to_string(),
                ));
            },
            _ => match stack.last_mut() {
                Some((element, _, _))
                    if element.children.is_empty()
                        && !raw.starts_with("<!--")
                        && !raw.starts_with("<?") =>
                {
                    match raw.strip_prefix("<![CDATA[") {
                        Some(cdata) => element.push_parsed_text(cdata.trim_end_matches("]]>")),
                        None => element.push_parsed_text(&unescape_xml(raw)),
                    }
                },
                _ => pending.push_str(raw),
            },
        }
    }
}

fn attach(
    stack: &mut [(MetadataElement, NamespaceContext, usize)],
    top: &mut Vec<MetadataElement>,
    element: MetadataElement,
) {
    match stack.last_mut() {
        Some((parent, _, _)) => parent.children.push(element),
        None => top.push(element),
    }
}

/// Build an element from a start tag, returning it with the namespace
/// scope its own declarations open.
pub(crate) fn build_element(
    e: &BytesStart,
    parent: &NamespaceContext,
) -> Result<(MetadataElement, NamespaceContext)> {
    let tag_name = String::from_utf8(e.name().as_ref().to_vec())?;

    let mut scope = parent.clone();
    let mut attributes = Vec::new();
    for attr_result in e.attributes() {
        let attr = attr_result?;
        let key = String::from_utf8(attr.key.as_ref().to_vec())?;
        let value = unescape_xml(&String::from_utf8(attr.value.to_vec())?);
        scope.add_declaration(&key, &value);
        attributes.push((key, value));
    }

    let mut element = MetadataElement::new(&tag_name, &scope);
    for (key, value) in attributes {
        element.push_parsed_attribute(key, value);
    }
    Ok((element, scope))
}
