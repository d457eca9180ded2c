use super::relationships::Relationships;
use crate::error::Result;
use crate::xml::XmlDocument;
use std::borrow::Cow;

#[derive(Clone)]
pub struct Part {
    pub name: String,
    pub content_type: String,
    pub payload: PartPayload,
    pub rels: Relationships,
}

#[derive(Clone)]
pub enum PartPayload {
    Xml(XmlDocument),
    Binary(Vec<u8>),
}

impl Part {
    pub fn xml(name: &str, content_type: &str, doc: XmlDocument) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            payload: PartPayload::Xml(doc),
            rels: Relationships::new(),
        }
    }

    pub fn binary(name: &str, content_type: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            payload: PartPayload::Binary(data),
            rels: Relationships::new(),
        }
    }

    pub fn is_xml(&self) -> bool {
        matches!(self.payload, PartPayload::Xml(_))
    }

    pub fn as_xml(&self) -> Option<&XmlDocument> {
        match &self.payload {
            PartPayload::Xml(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_xml_mut(&mut self) -> Option<&mut XmlDocument> {
        match &mut self.payload {
            PartPayload::Xml(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match &self.payload {
            PartPayload::Binary(data) => Some(data),
            _ => None,
        }
    }

    /// Serialized payload as stored in the ZIP archive.
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>> {
        match &self.payload {
            PartPayload::Xml(doc) => Ok(Cow::Owned(crate::xml::builder::serialize_bytes(doc)?)),
            PartPayload::Binary(data) => Ok(Cow::Borrowed(data)),
        }
    }
}
