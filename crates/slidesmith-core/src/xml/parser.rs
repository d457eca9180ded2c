use super::arena::XmlDocument;
use super::node::XmlNodeData;
use super::xname::{XAttribute, XName};
use crate::error::{Result, SlidesmithError};
use std::collections::HashSet;

pub fn parse(xml: &str) -> Result<XmlDocument> {
    parse_bytes(xml.as_bytes())
}

pub fn parse_bytes(bytes: &[u8]) -> Result<XmlDocument> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|e| SlidesmithError::XmlParse {
        message: e.to_string(),
        location: "input".to_string(),
    })?;
    let doc = roxmltree::Document::parse_with_options(
        text,
        roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        },
    )
    .map_err(|e| SlidesmithError::XmlParse {
        message: e.to_string(),
        location: format!("line {}", e.pos().row),
    })?;

    let mut xml_doc = XmlDocument::new();
    build_tree(doc.root_element(), &mut xml_doc, None);
    Ok(xml_doc)
}

/// Namespaces roxmltree reports for a node include every inherited binding;
/// only the ones that differ from the parent's scope are real declarations.
fn declared_here(node: roxmltree::Node) -> Vec<XAttribute> {
    let inherited: HashSet<(Option<&str>, &str)> = node
        .parent_element()
        .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    node.namespaces()
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .filter(|ns| ns.name() != Some("xml"))
        .map(|ns| XAttribute::new(XName::xmlns(ns.name().unwrap_or("")), ns.uri()))
        .collect()
}

fn build_tree(node: roxmltree::Node, doc: &mut XmlDocument, parent: Option<indextree::NodeId>) {
    let node_data = match node.node_type() {
        roxmltree::NodeType::Element => {
            let name = XName::new(
                node.tag_name().namespace().unwrap_or(""),
                node.tag_name().name(),
            );

            let mut attributes = declared_here(node);
            attributes.extend(node.attributes().map(|attr| {
                XAttribute::new(
                    XName::new(attr.namespace().unwrap_or(""), attr.name()),
                    attr.value(),
                )
            }));

            XmlNodeData::Element { name, attributes }
        }
        roxmltree::NodeType::Text => match node.text() {
            Some(text) => XmlNodeData::Text(text.to_string()),
            None => return,
        },
        roxmltree::NodeType::Comment => match node.text() {
            Some(text) => XmlNodeData::Comment(text.to_string()),
            None => return,
        },
        roxmltree::NodeType::PI => {
            let Some(pi) = node.pi() else { return };
            XmlNodeData::ProcessingInstruction {
                target: pi.target.to_string(),
                data: pi.value.map(|s| s.to_string()).unwrap_or_default(),
            }
        }
        roxmltree::NodeType::Root => return,
    };

    let new_id = match parent {
        Some(parent_id) => doc.add_child(parent_id, node_data),
        None => doc.add_root(node_data),
    };

    for child in node.children() {
        build_tree(child, doc, Some(new_id));
    }
}
