//! Namespace handling for package-document elements.
//!
//! Producing tools disagree on how metadata elements are spelled: the same
//! Dublin Core title shows up as `dc:title`, as `title`, or under a generated
//! prefix such as `ns0:title`. Lookups therefore go through [`Tag`], which
//! tries an ordered list of equivalent spellings ([`TagForm`]) uniformly for
//! every query.

use memchr::memchr;
use phf::{Map, phf_map};
use std::collections::HashMap;

// ============================================================================
// NAMESPACE CONSTANTS
// ============================================================================

/// OPF package namespace
pub const OPFNS: &str = "http://www.idpf.org/2007/opf";

/// Dublin Core elements namespace
pub const DCNS: &str = "http://purl.org/dc/elements/1.1/";

/// Dublin Core terms namespace
pub const DCTERMSNS: &str = "http://purl.org/dc/terms/";

/// OCF container namespace (META-INF/container.xml)
pub const CONTAINERNS: &str = "urn:oasis:names:tc:opendocument:xmlns:container";

/// Conventional prefixes, used when a prefix is not declared in scope.
static PREFIX_TO_URI: Map<&'static str, &'static str> = phf_map! {
    "opf" => "http://www.idpf.org/2007/opf",
    "dc" => "http://purl.org/dc/elements/1.1/",
    "dcterms" => "http://purl.org/dc/terms/",
    "xsi" => "http://www.w3.org/2001/XMLSchema-instance",
    "xml" => "http://www.w3.org/XML/1998/namespace",
    "calibre" => "http://calibre.kovidgoyal.net/2009/metadata",
};

static URI_TO_PREFIX: Map<&'static str, &'static str> = phf_map! {
    "http://www.idpf.org/2007/opf" => "opf",
    "http://purl.org/dc/elements/1.1/" => "dc",
    "http://purl.org/dc/terms/" => "dcterms",
};

// ============================================================================
// QUALIFIED NAME
// ============================================================================

/// Qualified name with namespace support
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    /// Prefix as written in the document, if any
    pub prefix: Option<String>,
    /// Namespace URI the prefix resolved to
    pub namespace_uri: Option<String>,
    /// Local name (without prefix)
    pub local_name: String,
}

impl QualifiedName {
    /// Split a raw tag or attribute name, resolving the prefix in `context`.
    pub fn parse(name: &str, context: &NamespaceContext) -> Self {
        match split_prefix(name) {
            (Some(prefix), local_name) => Self {
                namespace_uri: context.resolve_prefix(prefix).map(str::to_string),
                prefix: Some(prefix.to_string()),
                local_name: local_name.to_string(),
            },
            (None, local_name) => Self {
                prefix: None,
                namespace_uri: context.default_namespace().map(str::to_string),
                local_name: local_name.to_string(),
            },
        }
    }

    /// Whether the name was written with a prefix.
    pub fn is_prefixed(&self) -> bool {
        self.prefix.is_some()
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

/// Split `prefix:local` into its parts.
#[inline]
pub fn split_prefix(name: &str) -> (Option<&str>, &str) {
    match memchr(b':', name.as_bytes()) {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

// ============================================================================
// NAMESPACE CONTEXT
// ============================================================================

/// Namespace context for resolving prefixes to URIs
#[derive(Debug, Clone, Default)]
pub struct NamespaceContext {
    /// Mapping from prefix to namespace URI
    prefixes: HashMap<String, String>,
    /// Default namespace URI
    default_namespace: Option<String>,
}

impl NamespaceContext {
    /// Add a namespace declaration given as the raw attribute key
    /// (`xmlns` or `xmlns:prefix`). Other keys are ignored.
    pub fn add_declaration(&mut self, key: &str, uri: &str) {
        if key == "xmlns" {
            self.default_namespace = Some(uri.to_string());
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            self.prefixes.insert(prefix.to_string(), uri.to_string());
        }
    }

    /// Resolve prefix to namespace URI.
    ///
    /// Declared prefixes win; conventional prefixes fill in for documents
    /// that use them without declaring them.
    pub fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        self.prefixes
            .get(prefix)
            .map(String::as_str)
            .or_else(|| PREFIX_TO_URI.get(prefix).copied())
    }

    /// Get default namespace
    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Find the prefix bound to `uri`. `Some("")` means it is the default
    /// namespace.
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        if self.default_namespace.as_deref() == Some(uri) {
            return Some("");
        }
        self.prefixes
            .iter()
            .filter(|(_, bound)| bound.as_str() == uri)
            .map(|(prefix, _)| prefix.as_str())
            // Prefer the conventional spelling when several prefixes are bound
            .min_by_key(|prefix| (Some(*prefix) != URI_TO_PREFIX.get(uri).copied(), *prefix))
    }
}

/// The conventional prefix for a well-known namespace
pub fn conventional_prefix(uri: &str) -> Option<&'static str> {
    URI_TO_PREFIX.get(uri).copied()
}

// ============================================================================
// TAGS
// ============================================================================

/// One spelling of a tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagForm {
    /// Written with a prefix that resolves to the tag's namespace
    Qualified,
    /// Written without a prefix
    Bare,
}

impl TagForm {
    /// The order in which spellings are probed.
    pub const PROBE_ORDER: [TagForm; 2] = [TagForm::Qualified, TagForm::Bare];
}

/// A namespaced element name recognised in every spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub namespace: &'static str,
    pub local_name: &'static str,
}

impl Tag {
    pub const fn new(namespace: &'static str, local_name: &'static str) -> Self {
        Self {
            namespace,
            local_name,
        }
    }

    /// Check whether `name` is this tag written in `form`.
    ///
    /// A prefix that cannot be resolved is accepted: such documents exist and
    /// the local name is the only evidence available.
    pub fn matches_form(&self, name: &QualifiedName, form: TagForm) -> bool {
        if name.local_name != self.local_name {
            return false;
        }
        match form {
            TagForm::Bare => !name.is_prefixed(),
            TagForm::Qualified => {
                name.is_prefixed()
                    && name
                        .namespace_uri
                        .as_deref()
                        .is_none_or(|uri| uri == self.namespace)
            },
        }
    }

    /// Check whether `name` is this tag in any spelling.
    pub fn matches(&self, name: &QualifiedName) -> bool {
        TagForm::PROBE_ORDER
            .iter()
            .any(|form| self.matches_form(name, *form))
    }
}

/// `dc:title`
pub const TITLE: Tag = Tag::new(DCNS, "title");
/// `dc:creator`
pub const CREATOR: Tag = Tag::new(DCNS, "creator");
/// `opf:meta`
pub const META: Tag = Tag::new(OPFNS, "meta");
/// `opf:metadata`
pub const METADATA: Tag = Tag::new(OPFNS, "metadata");
/// `container:rootfile`
pub const ROOTFILE: Tag = Tag::new(CONTAINERNS, "rootfile");
