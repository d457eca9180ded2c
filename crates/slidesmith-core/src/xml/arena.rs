use super::node::XmlNodeData;
use super::xname::{XAttribute, XName};
use indextree::{Arena, NodeId};
use std::collections::HashSet;

/// Mutable XML tree backed by an `indextree` arena.
///
/// Node ids stay valid until the node is removed; structural edits never
/// move an existing node to a new id.
#[derive(Clone)]
pub struct XmlDocument {
    arena: Arena<XmlNodeData>,
    root: Option<NodeId>,
}

impl XmlDocument {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&XmlNodeData> {
        self.arena.get(id).map(|node| node.get())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut XmlNodeData> {
        self.arena.get_mut(id).map(|node| node.get_mut())
    }

    pub fn name(&self, id: NodeId) -> Option<&XName> {
        self.get(id).and_then(|data| data.name())
    }

    pub fn is_element(&self, id: NodeId, namespace: &str, local_name: &str) -> bool {
        self.name(id)
            .map(|n| n.is(namespace, local_name))
            .unwrap_or(false)
    }

    pub fn add_root(&mut self, data: XmlNodeData) -> NodeId {
        let id = self.arena.new_node(data);
        self.root = Some(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, data: XmlNodeData) -> NodeId {
        let child = self.arena.new_node(data);
        parent.append(child, &mut self.arena);
        child
    }

    pub fn add_first_child(&mut self, parent: NodeId, data: XmlNodeData) -> NodeId {
        let child = self.arena.new_node(data);
        parent.prepend(child, &mut self.arena);
        child
    }

    pub fn add_before(&mut self, sibling: NodeId, data: XmlNodeData) -> NodeId {
        let new_node = self.arena.new_node(data);
        sibling.insert_before(new_node, &mut self.arena);
        new_node
    }

    pub fn add_after(&mut self, sibling: NodeId, data: XmlNodeData) -> NodeId {
        let new_node = self.arena.new_node(data);
        sibling.insert_after(new_node, &mut self.arena);
        new_node
    }

    /// Remove a node together with its whole subtree.
    pub fn remove(&mut self, node: NodeId) {
        node.remove_subtree(&mut self.arena);
    }

    pub fn remove_children(&mut self, parent: NodeId) {
        let children: Vec<_> = self.children(parent).collect();
        for child in children {
            self.remove(child);
        }
    }

    pub fn attribute(&self, node: NodeId, name: &XName) -> Option<&str> {
        self.get(node).and_then(|data| data.attribute(name))
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &XName, value: &str) {
        if let Some(node_data) = self.get_mut(node) {
            if let Some(attrs) = node_data.attributes_mut() {
                if let Some(attr) = attrs.iter_mut().find(|a| &a.name == name) {
                    attr.value = value.to_string();
                } else {
                    attrs.push(XAttribute::new(name.clone(), value));
                }
            }
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &XName) {
        if let Some(node_data) = self.get_mut(node) {
            if let Some(attrs) = node_data.attributes_mut() {
                attrs.retain(|a| &a.name != name);
            }
        }
    }

    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        parent.children(&self.arena)
    }

    pub fn element_children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(parent)
            .filter(move |&id| self.get(id).map(|d| d.is_element()).unwrap_or(false))
    }

    /// Depth-first traversal including `node` itself.
    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.descendants(&self.arena)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node)?.parent()
    }

    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.ancestors(&self.arena)
    }

    pub fn elements_by_name<'a>(
        &'a self,
        parent: NodeId,
        name: &'a XName,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(parent).filter(move |&child_id| {
            self.get(child_id)
                .and_then(|data| data.name())
                .map(|n| n == name)
                .unwrap_or(false)
        })
    }

    pub fn first_child_named(&self, parent: NodeId, name: &XName) -> Option<NodeId> {
        self.elements_by_name(parent, name).next()
    }

    /// Follow a chain of child element names from `start`.
    pub fn find_path(&self, start: NodeId, path: &[XName]) -> Option<NodeId> {
        path.iter()
            .try_fold(start, |node, name| self.first_child_named(node, name))
    }

    pub fn descendants_named<'a>(
        &'a self,
        node: NodeId,
        name: &'a XName,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(node)
            .filter(move |&id| self.name(id).map(|n| n == name).unwrap_or(false))
    }

    /// Concatenated text of every text node under `node`.
    pub fn text_of(&self, node: NodeId) -> String {
        self.descendants(node)
            .filter_map(|id| self.get(id).and_then(|d| match d {
                XmlNodeData::Text(s) => Some(s.as_str()),
                _ => None,
            }))
            .collect()
    }

    /// Namespace declarations visible at `node`, nearest declaration first.
    pub fn in_scope_namespaces(&self, node: NodeId) -> Vec<XAttribute> {
        let mut seen = HashSet::new();
        let mut declarations = Vec::new();
        for ancestor in self.ancestors(node) {
            let Some(attrs) = self.get(ancestor).and_then(|d| d.attributes()) else {
                continue;
            };
            for attr in attrs {
                if attr.name.is_namespace_declaration() && seen.insert(attr.name.clone()) {
                    declarations.push(attr.clone());
                }
            }
        }
        declarations
    }

    /// Deep-copy `src_node` from another document and append it under `parent`.
    ///
    /// Namespace declarations in scope at the source node are re-declared on
    /// the copy, so prefixes referenced from attribute values (for example
    /// `mc:Ignorable="p14"`) still resolve in the new location.
    pub fn import_subtree(
        &mut self,
        source: &XmlDocument,
        src_node: NodeId,
        parent: NodeId,
    ) -> Option<NodeId> {
        let data = self.carry_namespaces(source, src_node)?;
        let copy = self.add_child(parent, data);
        self.copy_children(source, src_node, copy);
        Some(copy)
    }

    /// Like [`import_subtree`](Self::import_subtree) but inserts the copy
    /// before `sibling`.
    pub fn import_subtree_before(
        &mut self,
        source: &XmlDocument,
        src_node: NodeId,
        sibling: NodeId,
    ) -> Option<NodeId> {
        let data = self.carry_namespaces(source, src_node)?;
        let copy = self.add_before(sibling, data);
        self.copy_children(source, src_node, copy);
        Some(copy)
    }

    fn carry_namespaces(&self, source: &XmlDocument, src_node: NodeId) -> Option<XmlNodeData> {
        let mut data = source.get(src_node)?.clone();
        if let Some(attrs) = data.attributes_mut() {
            let present: HashSet<XName> = attrs
                .iter()
                .filter(|a| a.name.is_namespace_declaration())
                .map(|a| a.name.clone())
                .collect();
            for decl in source.in_scope_namespaces(src_node) {
                if !present.contains(&decl.name) {
                    attrs.push(decl);
                }
            }
        }
        Some(data)
    }

    fn copy_children(&mut self, source: &XmlDocument, src_parent: NodeId, dst_parent: NodeId) {
        let children: Vec<_> = source.children(src_parent).collect();
        for child in children {
            let Some(data) = source.get(child) else {
                continue;
            };
            let copy = self.add_child(dst_parent, data.clone());
            self.copy_children(source, child, copy);
        }
    }
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parser::parse;

    #[test]
    fn remove_drops_whole_subtree() {
        let mut doc = parse("<root><a><b/><c/></a><d/></root>").unwrap();
        let root = doc.root().unwrap();
        let a = doc.first_child_named(root, &XName::local("a")).unwrap();
        doc.remove(a);

        let names: Vec<_> = doc
            .descendants(root)
            .filter_map(|id| doc.name(id).map(|n| n.local_name.clone()))
            .collect();
        assert_eq!(names, vec!["root", "d"]);
    }

    #[test]
    fn set_and_get_attribute() {
        let mut doc = XmlDocument::new();
        let root_id = doc.add_root(XmlNodeData::element(XName::local("root")));

        let attr_name = XName::local("id");
        doc.set_attribute(root_id, &attr_name, "test123");
        doc.set_attribute(root_id, &attr_name, "test456");

        assert_eq!(doc.attribute(root_id, &attr_name), Some("test456"));
        assert_eq!(doc.get(root_id).unwrap().attributes().unwrap().len(), 1);
    }

    #[test]
    fn import_subtree_carries_ancestor_namespaces() {
        let source = parse(
            r#"<p:sld xmlns:p="urn:p" xmlns:a14="urn:a14"><p:sp><p:x a14:flag="1"/></p:sp></p:sld>"#,
        )
        .unwrap();
        let src_root = source.root().unwrap();
        let src_sp = source
            .first_child_named(src_root, &XName::new("urn:p", "sp"))
            .unwrap();

        let mut target = parse(r#"<p:sld xmlns:p="urn:p"><p:tree/></p:sld>"#).unwrap();
        let tgt_root = target.root().unwrap();
        let tree = target
            .first_child_named(tgt_root, &XName::new("urn:p", "tree"))
            .unwrap();

        let copy = target.import_subtree(&source, src_sp, tree).unwrap();
        assert_eq!(target.attribute(copy, &XName::xmlns("a14")), Some("urn:a14"));
        assert_eq!(target.descendants(copy).count(), 2);
    }

    #[test]
    fn find_path_walks_child_chain() {
        let doc = parse("<a><b><c>text</c></b></a>").unwrap();
        let root = doc.root().unwrap();
        let c = doc
            .find_path(root, &[XName::local("b"), XName::local("c")])
            .unwrap();
        assert_eq!(doc.text_of(c), "text");
        assert!(doc.find_path(root, &[XName::local("x")]).is_none());
    }
}
