//! Keep the presentation's and masters' ID lists in step with their
//! relationships.

use crate::error::{Result, SlidesmithError};
use crate::package::relationship_types as rt;
use crate::package::Package;
use crate::pml::presentation::{
    self, ensure_child, max_list_id, register_layout, register_master, register_slide,
};
use crate::xml::namespaces::{P, R};
use crate::xml::{XAttribute, XName, XmlNodeData};
use indextree::NodeId;

/// Lowest id PowerPoint accepts for masters and layouts.
const MIN_LIST_ID: u32 = 2_147_483_648;

/// Drop list entries whose `r:id` no longer resolves and add entries for
/// master, layout and slide relationships that have none. Returns the
/// number of entries touched.
pub fn sync_id_lists(pkg: &mut Package) -> Result<usize> {
    let pres = presentation::presentation_part(pkg)?;
    let mut touched = drop_unresolved(pkg, &pres, &P::sldMasterIdLst())?;
    touched += drop_unresolved(pkg, &pres, &P::sldIdLst())?;

    for rid in unlisted(pkg, &pres, &P::sldMasterIdLst(), rt::SLIDE_MASTER)? {
        let id = next_list_id(pkg);
        register_master(pkg, &rid, id)?;
        touched += 1;
    }
    for rid in unlisted(pkg, &pres, &P::sldIdLst(), rt::SLIDE)? {
        register_slide(pkg, &rid)?;
        touched += 1;
    }

    let masters: Vec<String> = pkg
        .rels(&pres)
        .map(|rels| {
            rels.of_type(rt::SLIDE_MASTER)
                .filter_map(|rel| pkg.related_part_name(&pres, &rel.id))
                .collect()
        })
        .unwrap_or_default();
    for master in masters {
        if pkg.xml(&master).is_none() {
            continue;
        }
        touched += drop_unresolved(pkg, &master, &P::sldLayoutIdLst())?;
        for rid in unlisted(pkg, &master, &P::sldLayoutIdLst(), rt::SLIDE_LAYOUT)? {
            let id = next_list_id(pkg);
            register_layout(pkg, &master, &rid, id)?;
            touched += 1;
        }
    }

    if touched > 0 {
        tracing::info!(entries = touched, "synchronized id lists");
    }
    Ok(touched)
}

/// Add the `p:notesMasterIdLst` PowerPoint requires when the presentation
/// relates to a notes master but does not list it.
pub fn fix_notes_master_list(pkg: &mut Package) -> Result<bool> {
    let pres = presentation::presentation_part(pkg)?;
    let Some(rid) = pkg
        .rels(&pres)
        .and_then(|rels| rels.first_of_type(rt::NOTES_MASTER))
        .map(|rel| rel.id.clone())
    else {
        return Ok(false);
    };

    let doc = pkg.require_xml_mut(&pres)?;
    let root = doc.root().ok_or_else(|| SlidesmithError::InvalidPackage {
        message: "presentation part has no root element".to_string(),
    })?;
    let list = ensure_child(doc, root, P::notesMasterIdLst(), &[P::sldMasterIdLst()]);
    if doc.first_child_named(list, &P::notesMasterId()).is_some() {
        return Ok(false);
    }
    doc.add_child(
        list,
        XmlNodeData::element_with_attrs(P::notesMasterId(), vec![XAttribute::new(R::id(), &rid)]),
    );
    tracing::info!(relationship = %rid, "added missing notes master list");
    Ok(true)
}

fn next_list_id(pkg: &Package) -> u32 {
    max_list_id(pkg).saturating_add(1).max(MIN_LIST_ID)
}

fn list_of(pkg: &Package, owner: &str, list_name: &XName) -> Option<NodeId> {
    let doc = pkg.xml(owner)?;
    doc.first_child_named(doc.root()?, list_name)
}

/// Remove entries of `owner`'s `list_name` whose `r:id` is missing or points
/// at a part the package does not contain.
fn drop_unresolved(pkg: &mut Package, owner: &str, list_name: &XName) -> Result<usize> {
    let Some(list) = list_of(pkg, owner, list_name) else {
        return Ok(0);
    };
    let doc = pkg.require_xml(owner)?;
    let stale: Vec<NodeId> = doc
        .element_children(list)
        .filter(|&entry| {
            doc.attribute(entry, &R::id())
                .and_then(|rid| pkg.related_part_name(owner, rid))
                .map(|target| !pkg.contains(&target))
                .unwrap_or(true)
        })
        .collect();

    let doc = pkg.require_xml_mut(owner)?;
    for &entry in &stale {
        tracing::warn!(part = %owner, "dropping id list entry without a target");
        doc.remove(entry);
    }
    Ok(stale.len())
}

/// Relationship ids of `rel_type` on `owner` that resolve but have no entry
/// in `list_name`.
fn unlisted(pkg: &Package, owner: &str, list_name: &XName, rel_type: &str) -> Result<Vec<String>> {
    let Some(rels) = pkg.rels(owner) else {
        return Ok(Vec::new());
    };
    let doc = pkg.require_xml(owner)?;
    let listed: Vec<&str> = list_of(pkg, owner, list_name)
        .map(|list| {
            doc.element_children(list)
                .filter_map(|entry| doc.attribute(entry, &R::id()))
                .collect()
        })
        .unwrap_or_default();

    Ok(rels
        .of_type(rel_type)
        .filter(|rel| !listed.contains(&rel.id.as_str()))
        .filter(|rel| {
            pkg.related_part_name(owner, &rel.id)
                .map(|target| pkg.contains(&target))
                .unwrap_or(false)
        })
        .map(|rel| rel.id.clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::content_type_values as ctv;
    use crate::package::Part;
    use crate::pml::fixtures::{deck, push_slide};
    use crate::xml::parser::parse;

    fn entry_rids(pkg: &Package, part: &str, entry: XName) -> Vec<String> {
        let doc = pkg.xml(part).unwrap();
        doc.descendants_named(doc.root().unwrap(), &entry)
            .map(|e| doc.attribute(e, &R::id()).unwrap().to_string())
            .collect()
    }

    #[test]
    fn missing_layout_entry_is_added_and_dangling_one_removed() {
        let mut pkg = deck(2, (9_144_000, 6_858_000));
        let master = "ppt/slideMasters/slideMaster1.xml";
        pkg.remove_part("ppt/slideLayouts/slideLayout2.xml");
        {
            let doc = pkg.xml_mut(master).unwrap();
            let first = doc
                .descendants_named(doc.root().unwrap(), &P::sldLayoutId())
                .next()
                .unwrap();
            doc.remove(first);
        }

        let touched = sync_id_lists(&mut pkg).unwrap();
        assert_eq!(touched, 2);
        assert_eq!(entry_rids(&pkg, master, P::sldLayoutId()), vec!["rId2"]);

        let doc = pkg.xml(master).unwrap();
        let entry = doc
            .descendants_named(doc.root().unwrap(), &P::sldLayoutId())
            .next()
            .unwrap();
        let id: u32 = doc.attribute(entry, &XName::local("id")).unwrap().parse().unwrap();
        assert!(id >= MIN_LIST_ID);
        assert_eq!(sync_id_lists(&mut pkg).unwrap(), 0);
    }

    #[test]
    fn slide_relationship_without_entry_is_listed() {
        let mut pkg = deck(1, (9_144_000, 6_858_000));
        let slide = push_slide(&mut pkg, 1, "", "", &[]);
        let pres = "ppt/presentation.xml";
        {
            let doc = pkg.xml_mut(pres).unwrap();
            let list = doc.first_child_named(doc.root().unwrap(), &P::sldIdLst()).unwrap();
            doc.remove(list);
        }
        assert!(presentation::slide_part_names(&pkg).unwrap().is_empty());

        assert_eq!(sync_id_lists(&mut pkg).unwrap(), 1);
        assert_eq!(presentation::slide_part_names(&pkg).unwrap(), vec![slide]);
    }

    #[test]
    fn notes_master_list_is_inserted_after_master_list() {
        let mut pkg = deck(1, (9_144_000, 6_858_000));
        assert!(!fix_notes_master_list(&mut pkg).unwrap());

        pkg.add_part(Part::xml(
            "ppt/notesMasters/notesMaster1.xml",
            ctv::NOTES_MASTER,
            parse(r#"<p:notesMaster xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#).unwrap(),
        ));
        let rid = pkg
            .relate("ppt/presentation.xml", "ppt/notesMasters/notesMaster1.xml", rt::NOTES_MASTER)
            .unwrap();

        assert!(fix_notes_master_list(&mut pkg).unwrap());
        assert!(!fix_notes_master_list(&mut pkg).unwrap());

        let doc = pkg.xml("ppt/presentation.xml").unwrap();
        let root = doc.root().unwrap();
        let order: Vec<String> = doc
            .element_children(root)
            .map(|c| doc.name(c).unwrap().local_name.clone())
            .collect();
        assert_eq!(&order[..2], &["sldMasterIdLst", "notesMasterIdLst"]);
        assert_eq!(entry_rids(&pkg, "ppt/presentation.xml", P::notesMasterId()), vec![rid]);
    }
}
