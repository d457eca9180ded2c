use super::arena::XmlDocument;
use super::namespaces::conventional_prefix;
use super::node::XmlNodeData;
use super::xname::{XAttribute, XName, XML_NS};
use crate::error::{Result, SlidesmithError};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::HashMap;
use std::io::Cursor;

pub fn serialize(doc: &XmlDocument) -> Result<String> {
    let bytes = serialize_bytes(doc)?;
    String::from_utf8(bytes).map_err(|e| SlidesmithError::XmlWrite(e.to_string()))
}

pub fn serialize_bytes(doc: &XmlDocument) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(write_error)?;

    if let Some(root_id) = doc.root() {
        write_node(doc, root_id, &mut writer, &Scope::default())?;
    }

    Ok(writer.into_inner().into_inner())
}

fn write_error<E: std::fmt::Display>(e: E) -> SlidesmithError {
    SlidesmithError::XmlWrite(e.to_string())
}

/// Prefix bindings in force at one element.
#[derive(Clone, Default)]
struct Scope {
    by_prefix: HashMap<String, String>,
    by_uri: HashMap<String, String>,
    default_ns: Option<String>,
}

impl Scope {
    fn bind(&mut self, prefix: &str, uri: &str) {
        if prefix.is_empty() {
            self.default_ns = if uri.is_empty() { None } else { Some(uri.to_string()) };
            return;
        }
        self.by_uri.retain(|u, p| p != prefix || u == uri);
        self.by_prefix.insert(prefix.to_string(), uri.to_string());
        self.by_uri.insert(uri.to_string(), prefix.to_string());
    }

    fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.by_uri.get(uri).map(|p| p.as_str())
    }

    /// Pick a prefix for an undeclared namespace that does not shadow one
    /// already in scope.
    fn fresh_prefix(&self, uri: &str) -> String {
        if let Some(prefix) = conventional_prefix(uri) {
            if !self.by_prefix.contains_key(prefix) {
                return prefix.to_string();
            }
        }
        (0..)
            .map(|n| format!("ns{}", n))
            .find(|candidate| !self.by_prefix.contains_key(candidate))
            .unwrap_or_else(|| "ns".to_string())
    }
}

fn write_node<W: std::io::Write>(
    doc: &XmlDocument,
    node_id: indextree::NodeId,
    writer: &mut Writer<W>,
    scope: &Scope,
) -> Result<()> {
    let Some(node_data) = doc.get(node_id) else {
        return Ok(());
    };

    match node_data {
        XmlNodeData::Element { name, attributes } => {
            write_element(doc, node_id, name, attributes, writer, scope)?;
        }
        XmlNodeData::Text(text) => {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?;
        }
        XmlNodeData::CData(text) => {
            writer
                .write_event(Event::CData(BytesCData::new(text)))
                .map_err(write_error)?;
        }
        XmlNodeData::Comment(text) => {
            writer
                .write_event(Event::Comment(BytesText::new(text)))
                .map_err(write_error)?;
        }
        XmlNodeData::ProcessingInstruction { target, data } => {
            let pi_content = if data.is_empty() {
                target.clone()
            } else {
                format!("{} {}", target, data)
            };
            writer
                .write_event(Event::PI(BytesPI::new(&pi_content)))
                .map_err(write_error)?;
        }
    }

    Ok(())
}

fn write_element<W: std::io::Write>(
    doc: &XmlDocument,
    node_id: indextree::NodeId,
    name: &XName,
    attributes: &[XAttribute],
    writer: &mut Writer<W>,
    parent_scope: &Scope,
) -> Result<()> {
    let mut scope = parent_scope.clone();
    let mut declarations: Vec<(String, String)> = Vec::new();

    for attr in attributes {
        if let Some(prefix) = attr.declared_prefix() {
            scope.bind(prefix, &attr.value);
            declarations.push((prefix.to_string(), attr.value.clone()));
        }
    }

    let tag_name = match &name.namespace {
        Some(ns) if scope.default_ns.as_deref() == Some(ns.as_str()) => name.local_name.clone(),
        Some(ns) => {
            let prefix = match scope.prefix_for(ns) {
                Some(p) => p.to_string(),
                None => {
                    let p = scope.fresh_prefix(ns);
                    scope.bind(&p, ns);
                    declarations.push((p.clone(), ns.clone()));
                    p
                }
            };
            format!("{}:{}", prefix, name.local_name)
        }
        None => name.local_name.clone(),
    };

    let mut plain_attrs: Vec<(String, &str)> = Vec::new();
    for attr in attributes.iter().filter(|a| !a.name.is_namespace_declaration()) {
        let attr_name = match &attr.name.namespace {
            Some(ns) if ns == XML_NS => format!("xml:{}", attr.name.local_name),
            Some(ns) => {
                let prefix = match scope.prefix_for(ns) {
                    Some(p) => p.to_string(),
                    None => {
                        let p = scope.fresh_prefix(ns);
                        scope.bind(&p, ns);
                        declarations.push((p.clone(), ns.clone()));
                        p
                    }
                };
                format!("{}:{}", prefix, attr.name.local_name)
            }
            None => attr.name.local_name.clone(),
        };
        plain_attrs.push((attr_name, attr.value.as_str()));
    }

    let mut elem = BytesStart::new(tag_name.as_str());
    for (prefix, uri) in &declarations {
        let decl_name = if prefix.is_empty() {
            "xmlns".to_string()
        } else {
            format!("xmlns:{}", prefix)
        };
        elem.push_attribute((decl_name.as_str(), uri.as_str()));
    }
    for (attr_name, value) in &plain_attrs {
        elem.push_attribute((attr_name.as_str(), *value));
    }

    let children: Vec<_> = doc.children(node_id).collect();

    if children.is_empty() {
        writer.write_event(Event::Empty(elem)).map_err(write_error)?;
    } else {
        writer.write_event(Event::Start(elem)).map_err(write_error)?;
        for child_id in children {
            write_node(doc, child_id, writer, &scope)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(tag_name.as_str())))
            .map_err(write_error)?;
    }

    Ok(())
}
