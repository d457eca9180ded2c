use crate::xml::namespaces::{A, P, R};
use crate::xml::{XName, XmlDocument};
use indextree::NodeId;
use std::collections::HashMap;

/// A relationship reference found in a subtree: the element carrying it,
/// the attribute name and the referenced id.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipRef {
    pub element: NodeId,
    pub attribute: XName,
    pub id: String,
}

/// Every non-empty attribute in the relationships namespace under `node`,
/// in document order.
pub fn relationship_refs(doc: &XmlDocument, node: NodeId) -> Vec<RelationshipRef> {
    let mut refs = Vec::new();
    for element in doc.descendants(node) {
        let Some(attrs) = doc.get(element).and_then(|d| d.attributes()) else {
            continue;
        };
        for attr in attrs {
            if attr.name.in_namespace(R::NS) && !attr.value.is_empty() {
                refs.push(RelationshipRef {
                    element,
                    attribute: attr.name.clone(),
                    id: attr.value.clone(),
                });
            }
        }
    }
    refs
}

/// Rewrite relationship-namespace attributes under `node` whose value is a
/// key of `map`. Attributes in other namespaces are never touched, even when
/// their value looks like a relationship id. Each attribute is rewritten at
/// most once per call. Returns the number of attributes changed.
pub fn remap_ids(doc: &mut XmlDocument, node: NodeId, map: &HashMap<String, String>) -> usize {
    if map.is_empty() {
        return 0;
    }
    let elements: Vec<NodeId> = doc.descendants(node).collect();
    let mut changed = 0;
    for element in elements {
        let Some(attrs) = doc.get_mut(element).and_then(|d| d.attributes_mut()) else {
            continue;
        };
        for attr in attrs.iter_mut().filter(|a| a.name.in_namespace(R::NS)) {
            if let Some(new_id) = map.get(&attr.value) {
                if *new_id != attr.value {
                    attr.value = new_id.clone();
                    changed += 1;
                }
            }
        }
    }
    changed
}

/// Hyperlink elements, whose relationship may be blanked rather than lost.
pub(crate) fn is_hyperlink(doc: &XmlDocument, node: NodeId) -> bool {
    doc.name(node)
        .map(|n| *n == A::hlinkClick() || *n == A::hlinkHover())
        .unwrap_or(false)
}

/// Remap the references under `node` through `map` after clearing every
/// reference `map` cannot carry: hyperlinks become `r:id=""`, picture fills
/// lose the attribute, and any other element takes the shape holding it
/// out of the shape tree (outside a shape tree only the attribute goes).
/// Returns the number of references cleared.
pub fn settle_refs(doc: &mut XmlDocument, node: NodeId, map: &HashMap<String, String>) -> usize {
    let mut cleared = 0;
    let mut doomed: Vec<NodeId> = Vec::new();
    for reference in relationship_refs(doc, node) {
        if map.contains_key(&reference.id) {
            continue;
        }
        cleared += 1;
        let is_blip = doc.name(reference.element).map(|n| *n == A::blip()).unwrap_or(false);
        if is_hyperlink(doc, reference.element) {
            doc.set_attribute(reference.element, &reference.attribute, "");
        } else if is_blip {
            doc.remove_attribute(reference.element, &reference.attribute);
        } else if let Some(shape) = enclosing_shape(doc, reference.element) {
            if !doomed.contains(&shape) {
                doomed.push(shape);
            }
        } else {
            doc.remove_attribute(reference.element, &reference.attribute);
        }
    }
    if doomed.contains(&node) {
        doc.remove(node);
        return cleared;
    }
    for shape in doomed {
        doc.remove(shape);
    }
    remap_ids(doc, node, map);
    cleared
}

/// The top-level shape-tree child holding `element`.
fn enclosing_shape(doc: &XmlDocument, element: NodeId) -> Option<NodeId> {
    doc.ancestors(element).find(|&n| {
        doc.parent(n)
            .and_then(|parent| doc.name(parent))
            .map(|name| *name == P::spTree())
            .unwrap_or(false)
    })
}
