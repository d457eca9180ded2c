use crate::context::BuildContext;
use crate::error::{Result, SlidesmithError};
use crate::package::content_type_values as ctv;
use crate::package::relationship_types as rt;
use crate::package::{Package, Part};
use crate::xml::namespaces::{A, P, R};
use crate::xml::{XAttribute, XName, XmlDocument, XmlNodeData};
use indextree::NodeId;

/// Smallest value PowerPoint accepts in `p:sldId/@id`.
const MIN_SLIDE_ID: u32 = 256;

/// Placeholder types a new slide does not inherit from its layout.
const SKIPPED_PLACEHOLDERS: [&str; 3] = ["dt", "ftr", "sldNum"];

pub fn presentation_part(pkg: &Package) -> Result<String> {
    pkg.main_part_name().ok_or_else(|| SlidesmithError::MissingPart {
        part_path: "ppt/presentation.xml".to_string(),
        context: "package relationships".to_string(),
    })
}

/// Slide part names in presentation order.
pub fn slide_part_names(pkg: &Package) -> Result<Vec<String>> {
    let pres = presentation_part(pkg)?;
    let doc = pkg.require_xml(&pres)?;
    let Some(root) = doc.root() else {
        return Ok(Vec::new());
    };
    let Some(list) = doc.first_child_named(root, &P::sldIdLst()) else {
        return Ok(Vec::new());
    };

    Ok(doc
        .elements_by_name(list, &P::sldId())
        .filter_map(|entry| doc.attribute(entry, &R::id()))
        .filter_map(|rid| pkg.related_part_name(&pres, rid))
        .collect())
}

/// Slide width and height in EMU, from `p:sldSz`.
pub fn slide_size(pkg: &Package) -> Option<(i64, i64)> {
    let pres = pkg.main_part_name()?;
    let doc = pkg.xml(&pres)?;
    let size = doc.first_child_named(doc.root()?, &P::sldSz())?;
    let cx = doc.attribute(size, &XName::local("cx"))?.parse().ok()?;
    let cy = doc.attribute(size, &XName::local("cy"))?.parse().ok()?;
    Some((cx, cy))
}

/// Target of the first relationship of `rel_type` on `part`.
pub fn related_of_type(pkg: &Package, part: &str, rel_type: &str) -> Option<String> {
    let rel = pkg.rels(part)?.first_of_type(rel_type)?;
    pkg.related_part_name(part, &rel.id)
}

pub fn layout_of(pkg: &Package, slide: &str) -> Option<String> {
    related_of_type(pkg, slide, rt::SLIDE_LAYOUT)
}

pub fn master_of(pkg: &Package, layout: &str) -> Option<String> {
    related_of_type(pkg, layout, rt::SLIDE_MASTER)
}

/// Highest id in the presentation's master list or any master's layout
/// list. New master and layout ids are allocated above it.
pub fn max_list_id(pkg: &Package) -> u32 {
    let id = XName::local("id");
    let mut max = 0;
    for part in pkg.parts() {
        let Some(doc) = part.as_xml() else { continue };
        let Some(root) = doc.root() else { continue };
        let entries: Vec<NodeId> = if doc.is_element(root, P::NS, "presentation") {
            doc.descendants_named(root, &P::sldMasterId()).collect()
        } else if doc.is_element(root, P::NS, "sldMaster") {
            doc.descendants_named(root, &P::sldLayoutId()).collect()
        } else {
            continue;
        };
        for entry in entries {
            if let Some(value) = doc.attribute(entry, &id).and_then(|v| v.parse::<u32>().ok()) {
                max = max.max(value);
            }
        }
    }
    max
}

/// Insert `data` as a child of `parent` right after the last child named in
/// `preceding`, or as the first child when none of them is present.
pub(crate) fn insert_in_order(
    doc: &mut XmlDocument,
    parent: NodeId,
    data: XmlNodeData,
    preceding: &[XName],
) -> NodeId {
    let anchor = doc
        .element_children(parent)
        .filter(|&child| doc.name(child).map(|n| preceding.contains(n)).unwrap_or(false))
        .last();
    match anchor {
        Some(sibling) => doc.add_after(sibling, data),
        None => doc.add_first_child(parent, data),
    }
}

/// Find `name` under `parent`, creating it in schema order when missing.
pub(crate) fn ensure_child(
    doc: &mut XmlDocument,
    parent: NodeId,
    name: XName,
    preceding: &[XName],
) -> NodeId {
    match doc.first_child_named(parent, &name) {
        Some(existing) => existing,
        None => insert_in_order(doc, parent, XmlNodeData::element(name), preceding),
    }
}

fn id_entry(name: XName, id: u32, rid: &str) -> XmlNodeData {
    XmlNodeData::element_with_attrs(
        name,
        vec![
            XAttribute::new(XName::local("id"), &id.to_string()),
            XAttribute::new(R::id(), rid),
        ],
    )
}

fn has_entry_for(doc: &XmlDocument, list: NodeId, rid: &str) -> bool {
    doc.element_children(list)
        .any(|entry| doc.attribute(entry, &R::id()) == Some(rid))
}

/// Add a `p:sldMasterId` for relationship `rid` to the presentation.
pub fn register_master(pkg: &mut Package, rid: &str, id: u32) -> Result<()> {
    let pres = presentation_part(pkg)?;
    let doc = pkg.require_xml_mut(&pres)?;
    let root = doc.root().ok_or_else(|| SlidesmithError::InvalidPackage {
        message: "presentation part has no root element".to_string(),
    })?;
    let list = ensure_child(doc, root, P::sldMasterIdLst(), &[]);
    if !has_entry_for(doc, list, rid) {
        doc.add_child(list, id_entry(P::sldMasterId(), id, rid));
    }
    Ok(())
}

/// Add a `p:sldLayoutId` for relationship `rid` to `master`.
pub fn register_layout(pkg: &mut Package, master: &str, rid: &str, id: u32) -> Result<()> {
    let doc = pkg.require_xml_mut(master)?;
    let root = doc.root().ok_or_else(|| SlidesmithError::InvalidPackage {
        message: format!("{} has no root element", master),
    })?;
    let list = ensure_child(doc, root, P::sldLayoutIdLst(), &[P::cSld(), P::clrMap()]);
    if !has_entry_for(doc, list, rid) {
        doc.add_child(list, id_entry(P::sldLayoutId(), id, rid));
    }
    Ok(())
}

/// Append a `p:sldId` for relationship `rid` with the next free slide id.
pub fn register_slide(pkg: &mut Package, rid: &str) -> Result<()> {
    let pres = presentation_part(pkg)?;
    let doc = pkg.require_xml_mut(&pres)?;
    let root = doc.root().ok_or_else(|| SlidesmithError::InvalidPackage {
        message: "presentation part has no root element".to_string(),
    })?;
    let list = ensure_child(
        doc,
        root,
        P::sldIdLst(),
        &[P::sldMasterIdLst(), P::notesMasterIdLst(), P::handoutMasterIdLst()],
    );
    if !has_entry_for(doc, list, rid) {
        let id = next_slide_id(doc, list);
        doc.add_child(list, id_entry(P::sldId(), id, rid));
    }
    Ok(())
}

fn next_slide_id(doc: &XmlDocument, list: NodeId) -> u32 {
    doc.elements_by_name(list, &P::sldId())
        .filter_map(|entry| doc.attribute(entry, &XName::local("id"))?.parse::<u32>().ok())
        .max()
        .map(|max| max + 1)
        .unwrap_or(MIN_SLIDE_ID)
        .max(MIN_SLIDE_ID)
}

/// Create an empty slide backed by `layout`, append it to the slide list,
/// and return its part name. Layout placeholders (other than date, footer
/// and slide number) are stubbed onto the new slide.
pub fn add_slide(ctx: &mut BuildContext, pkg: &mut Package, layout: &str) -> Result<String> {
    let pres = presentation_part(pkg)?;
    let layout_doc = pkg.require_xml(layout)?;
    let stubs = placeholder_stubs(layout_doc);

    let name = ctx.allocate_part_name(pkg, "ppt/slides/slide1.xml");
    let doc = new_slide_xml(&stubs);
    let mut part = Part::xml(&name, ctv::SLIDE, doc);
    part.rels.add(
        rt::SLIDE_LAYOUT,
        &crate::package::uri::relative_target(&name, layout),
    );
    pkg.add_part(part);

    let rid = pkg.relate(&pres, &name, rt::SLIDE)?;
    register_slide(pkg, &rid)?;

    tracing::debug!(slide = %name, layout = %layout, "added slide");
    Ok(name)
}

struct PlaceholderStub {
    name: String,
    ph_attrs: Vec<XAttribute>,
}

fn placeholder_stubs(layout: &XmlDocument) -> Vec<PlaceholderStub> {
    let Some(root) = layout.root() else {
        return Vec::new();
    };
    let Some(tree) = layout.find_path(root, &[P::cSld(), P::spTree()]) else {
        return Vec::new();
    };

    layout
        .elements_by_name(tree, &P::sp())
        .filter_map(|sp| {
            let nv = layout.first_child_named(sp, &P::nvSpPr())?;
            let ph = layout.find_path(nv, &[P::nvPr(), P::ph()])?;
            let ph_type = layout.attribute(ph, &XName::local("type")).unwrap_or("body");
            if SKIPPED_PLACEHOLDERS.contains(&ph_type) {
                return None;
            }
            let name = layout
                .first_child_named(nv, &P::cNvPr())
                .and_then(|c| layout.attribute(c, &XName::local("name")))
                .unwrap_or("Placeholder")
                .to_string();
            let ph_attrs = layout.get(ph)?.attributes()?.to_vec();
            Some(PlaceholderStub { name, ph_attrs })
        })
        .collect()
}

fn new_slide_xml(stubs: &[PlaceholderStub]) -> XmlDocument {
    let mut doc = XmlDocument::new();
    let root = doc.add_root(XmlNodeData::element_with_attrs(
        P::sld(),
        vec![
            XAttribute::new(XName::xmlns("a"), A::NS),
            XAttribute::new(XName::xmlns("r"), R::NS),
            XAttribute::new(XName::xmlns("p"), P::NS),
        ],
    ));
    let c_sld = doc.add_child(root, XmlNodeData::element(P::cSld()));
    let tree = doc.add_child(c_sld, XmlNodeData::element(P::spTree()));

    let nv_grp = doc.add_child(tree, XmlNodeData::element(P::nvGrpSpPr()));
    doc.add_child(
        nv_grp,
        XmlNodeData::element_with_attrs(
            P::cNvPr(),
            vec![
                XAttribute::new(XName::local("id"), "1"),
                XAttribute::new(XName::local("name"), ""),
            ],
        ),
    );
    doc.add_child(nv_grp, XmlNodeData::element(P::cNvGrpSpPr()));
    doc.add_child(nv_grp, XmlNodeData::element(P::nvPr()));
    doc.add_child(tree, XmlNodeData::element(P::grpSpPr()));

    for (idx, stub) in stubs.iter().enumerate() {
        let sp = doc.add_child(tree, XmlNodeData::element(P::sp()));
        let nv = doc.add_child(sp, XmlNodeData::element(P::nvSpPr()));
        doc.add_child(
            nv,
            XmlNodeData::element_with_attrs(
                P::cNvPr(),
                vec![
                    XAttribute::new(XName::local("id"), &(idx + 2).to_string()),
                    XAttribute::new(XName::local("name"), &stub.name),
                ],
            ),
        );
        doc.add_child(nv, XmlNodeData::element(P::cNvSpPr()));
        let nv_pr = doc.add_child(nv, XmlNodeData::element(P::nvPr()));
        doc.add_child(
            nv_pr,
            XmlNodeData::element_with_attrs(P::ph(), stub.ph_attrs.clone()),
        );
        doc.add_child(sp, XmlNodeData::element(P::spPr()));
        let body = doc.add_child(sp, XmlNodeData::element(P::txBody()));
        doc.add_child(body, XmlNodeData::element(A::bodyPr()));
        doc.add_child(body, XmlNodeData::element(A::lstStyle()));
        doc.add_child(body, XmlNodeData::element(A::p()));
    }

    let ovr = doc.add_child(root, XmlNodeData::element(P::clrMapOvr()));
    doc.add_child(ovr, XmlNodeData::element(XName::new(A::NS, "masterClrMapping")));
    doc
}

/// Remove every slide (and its notes slide) from a template while keeping
/// masters, layouts and theme. Returns the number of slides removed.
pub fn strip_slides(pkg: &mut Package) -> Result<usize> {
    let pres = presentation_part(pkg)?;

    let entries: Vec<String> = {
        let doc = pkg.require_xml(&pres)?;
        let Some(root) = doc.root() else { return Ok(0) };
        match doc.first_child_named(root, &P::sldIdLst()) {
            Some(list) => doc
                .elements_by_name(list, &P::sldId())
                .filter_map(|entry| doc.attribute(entry, &R::id()).map(String::from))
                .collect(),
            None => Vec::new(),
        }
    };

    for rid in &entries {
        if let Some(slide) = pkg.related_part_name(&pres, rid) {
            if let Some(notes) = related_of_type(pkg, &slide, rt::NOTES_SLIDE) {
                pkg.remove_part(&notes);
            }
            pkg.remove_part(&slide);
        }
        if let Some(rels) = pkg.rels_mut(&pres) {
            rels.remove(rid);
        }
    }

    let doc = pkg.require_xml_mut(&pres)?;
    if let Some(list) = doc.root().and_then(|root| doc.first_child_named(root, &P::sldIdLst())) {
        doc.remove(list);
    }

    if !entries.is_empty() {
        tracing::info!(count = entries.len(), "stripped existing slides from base template");
    }
    Ok(entries.len())
}
