use crate::error::Result;
use crate::xml::namespaces::PR;
use crate::xml::{XAttribute, XName, XmlDocument, XmlNodeData};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TargetMode {
    #[default]
    Internal,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    #[serde(default)]
    pub target_mode: TargetMode,
}

impl Relationship {
    pub fn new(id: &str, rel_type: &str, target: &str) -> Self {
        Self {
            id: id.to_string(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode: TargetMode::Internal,
        }
    }

    pub fn external(id: &str, rel_type: &str, target: &str) -> Self {
        Self {
            id: id.to_string(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode: TargetMode::External,
        }
    }

    pub fn is_external(&self) -> bool {
        self.target_mode == TargetMode::External
    }
}

/// The relationship set owned by one part, in file order.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = crate::xml::parser::parse_bytes(bytes)?;
        Ok(Self::from_xml(&doc))
    }

    pub fn from_xml(doc: &XmlDocument) -> Self {
        let mut items = Vec::new();
        let Some(root) = doc.root() else {
            return Self { items };
        };
        let id = XName::local("Id");
        let rel_type = XName::local("Type");
        let target = XName::local("Target");
        let mode = XName::local("TargetMode");

        for node in doc.elements_by_name(root, &PR::Relationship()) {
            let (Some(rid), Some(rtype), Some(rtarget)) = (
                doc.attribute(node, &id),
                doc.attribute(node, &rel_type),
                doc.attribute(node, &target),
            ) else {
                tracing::warn!("skipping relationship entry with missing Id/Type/Target");
                continue;
            };
            let rel = if doc.attribute(node, &mode) == Some("External") {
                Relationship::external(rid, rtype, rtarget)
            } else {
                Relationship::new(rid, rtype, rtarget)
            };
            items.push(rel);
        }
        Self { items }
    }

    pub fn to_xml(&self) -> XmlDocument {
        let mut doc = XmlDocument::new();
        let root = doc.add_root(XmlNodeData::element_with_attrs(
            PR::Relationships(),
            vec![XAttribute::new(XName::xmlns(""), PR::NS)],
        ));
        for rel in &self.items {
            let mut attrs = vec![
                XAttribute::new(XName::local("Id"), &rel.id),
                XAttribute::new(XName::local("Type"), &rel.rel_type),
                XAttribute::new(XName::local("Target"), &rel.target),
            ];
            if rel.is_external() {
                attrs.push(XAttribute::new(XName::local("TargetMode"), "External"));
            }
            doc.add_child(root, XmlNodeData::element_with_attrs(PR::Relationship(), attrs));
        }
        doc
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        crate::xml::builder::serialize_bytes(&self.to_xml())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Relationship> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn first_of_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.rel_type == rel_type)
    }

    pub fn of_type<'a>(&'a self, rel_type: &'a str) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.items.iter().filter(move |r| r.rel_type == rel_type)
    }

    /// Lowest `rIdN` (N >= 1) not used in this set.
    pub fn next_id(&self) -> String {
        (1..)
            .map(|n| format!("rId{}", n))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| format!("rId{}", self.items.len() + 1))
    }

    /// Add an internal relationship and return its new id.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let id = self.next_id();
        self.items.push(Relationship::new(&id, rel_type, target));
        id
    }

    /// Reuse an external relationship with the same type and URI, or add one.
    pub fn get_or_add_external(&mut self, rel_type: &str, target: &str) -> String {
        if let Some(existing) = self
            .items
            .iter()
            .find(|r| r.is_external() && r.rel_type == rel_type && r.target == target)
        {
            return existing.id.clone();
        }
        let id = self.next_id();
        self.items.push(Relationship::external(&id, rel_type, target));
        id
    }

    pub fn push(&mut self, rel: Relationship) {
        self.items.push(rel);
    }

    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let idx = self.items.iter().position(|r| r.id == id)?;
        Some(self.items.remove(idx))
    }

    pub fn retain<F: FnMut(&Relationship) -> bool>(&mut self, f: F) {
        self.items.retain(f);
    }
}

pub mod relationship_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const NOTES_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
    pub const HANDOUT_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/handoutMaster";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const FONT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/font";
}
