use crate::error::{Result, SlidesmithError};
use crate::xml::namespaces::CT;
use crate::xml::{XAttribute, XName, XmlDocument, XmlNodeData};
use std::collections::BTreeMap;

/// `[Content_Types].xml`: extension defaults plus per-part overrides.
///
/// Override keys are part names without the leading slash; extensions are
/// stored lower-cased.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    pub fn new() -> Self {
        let mut types = Self::default();
        types.ensure_default("rels", content_type_values::RELATIONSHIPS);
        types.ensure_default("xml", content_type_values::XML);
        types
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = crate::xml::parser::parse_bytes(bytes)?;
        let root = doc.root().ok_or_else(|| SlidesmithError::InvalidPackage {
            message: "[Content_Types].xml has no root element".to_string(),
        })?;

        let mut types = Self::default();
        let extension = XName::local("Extension");
        let part_name = XName::local("PartName");
        let content_type = XName::local("ContentType");

        for node in doc.element_children(root) {
            let Some(ct) = doc.attribute(node, &content_type) else {
                continue;
            };
            if doc.is_element(node, CT::NS, "Default") {
                if let Some(ext) = doc.attribute(node, &extension) {
                    types.ensure_default(ext, ct);
                }
            } else if doc.is_element(node, CT::NS, "Override") {
                if let Some(name) = doc.attribute(node, &part_name) {
                    types.set_override(name, ct);
                }
            }
        }
        Ok(types)
    }

    pub fn to_xml(&self) -> XmlDocument {
        let mut doc = XmlDocument::new();
        let root = doc.add_root(XmlNodeData::element_with_attrs(
            CT::Types(),
            vec![XAttribute::new(XName::xmlns(""), CT::NS)],
        ));
        for (ext, ct) in &self.defaults {
            doc.add_child(
                root,
                XmlNodeData::element_with_attrs(
                    CT::Default(),
                    vec![
                        XAttribute::new(XName::local("Extension"), ext),
                        XAttribute::new(XName::local("ContentType"), ct),
                    ],
                ),
            );
        }
        for (name, ct) in &self.overrides {
            doc.add_child(
                root,
                XmlNodeData::element_with_attrs(
                    CT::Override(),
                    vec![
                        XAttribute::new(XName::local("PartName"), &format!("/{}", name)),
                        XAttribute::new(XName::local("ContentType"), ct),
                    ],
                ),
            );
        }
        doc
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        crate::xml::builder::serialize_bytes(&self.to_xml())
    }

    /// Content type of a part: its override, else the default for its
    /// extension.
    pub fn content_type_of(&self, part_name: &str) -> Option<&str> {
        let key = part_name.trim_start_matches('/');
        if let Some(ct) = self.overrides.get(key) {
            return Some(ct);
        }
        let ext = super::uri::extension(key)?;
        self.default_for(&ext)
    }

    pub fn default_for(&self, extension: &str) -> Option<&str> {
        let ext = extension.to_ascii_lowercase();
        self.defaults
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, ct)| ct.as_str())
    }

    pub fn has_override(&self, part_name: &str) -> bool {
        self.overrides.contains_key(part_name.trim_start_matches('/'))
    }

    pub fn set_override(&mut self, part_name: &str, content_type: &str) {
        self.overrides.insert(
            part_name.trim_start_matches('/').to_string(),
            content_type.to_string(),
        );
    }

    pub fn remove_override(&mut self, part_name: &str) -> Option<String> {
        self.overrides.remove(part_name.trim_start_matches('/'))
    }

    /// Add an extension default unless one is already declared.
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        let ext = extension.to_ascii_lowercase();
        if self.default_for(&ext).is_none() {
            self.defaults.push((ext, content_type.to_string()));
        }
    }

    pub fn remove_default(&mut self, extension: &str) -> bool {
        let ext = extension.to_ascii_lowercase();
        let before = self.defaults.len();
        self.defaults.retain(|(e, _)| *e != ext);
        self.defaults.len() != before
    }

    pub fn overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        self.overrides.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub mod content_type_values {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const NOTES_SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
    pub const NOTES_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
    pub const FONT_DATA: &str = "application/x-fontdata";
    pub const PNG: &str = "image/png";
    pub const GIF: &str = "image/gif";
    pub const JPEG: &str = "image/jpeg";
}

/// XML payloads are parsed into trees when a package is loaded; everything
/// else stays as bytes.
pub fn is_xml_content_type(content_type: &str) -> bool {
    content_type.ends_with("+xml") || content_type == "application/xml" || content_type == "text/xml"
}
