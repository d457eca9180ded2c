//! Used-part computation and removal of unreachable layouts, masters,
//! themes and media.

use crate::error::Result;
use crate::package::relationship_types as rt;
use crate::package::{uri, Package};
use crate::pml::presentation::{self, related_of_type};
use crate::package::content_type_values as ctv;
use crate::xml::namespaces::{P, R};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Directories whose parts are removed when nothing live references them.
const PRUNABLE_DIRS: [&str; 4] = [
    "ppt/slideLayouts/",
    "ppt/slideMasters/",
    "ppt/theme/",
    "ppt/media/",
];

const NOTES_DIRS: [&str; 2] = ["ppt/notesSlides/", "ppt/notesMasters/"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PruneStats {
    pub layouts: Vec<String>,
    pub masters: Vec<String>,
    pub themes: Vec<String>,
    pub media: Vec<String>,
}

impl PruneStats {
    pub fn total(&self) -> usize {
        self.layouts.len() + self.masters.len() + self.themes.len() + self.media.len()
    }
}

/// Whether the edge `owner --rel_type--> target` keeps `target` alive.
/// Masters list every layout they own and the presentation lists every
/// master; neither edge counts, so only layouts used by a slide (and their
/// masters) survive.
fn is_live_edge(pkg: &Package, pres: &str, owner: &str, rel_type: &str) -> bool {
    if owner == pres {
        return rel_type != rt::SLIDE_MASTER;
    }
    if rel_type == rt::SLIDE {
        return false;
    }
    let owner_is_master = pkg
        .part(owner)
        .map(|p| p.content_type == ctv::SLIDE_MASTER)
        .unwrap_or(false);
    !(owner_is_master && rel_type == rt::SLIDE_LAYOUT)
}

/// Transitive closure of the parts a consumer actually renders: the
/// presentation, its slides and their layouts, masters, themes and media,
/// plus every notes slide and notes master with their own references.
pub fn used_parts(pkg: &Package) -> Result<HashSet<String>> {
    let pres = presentation::presentation_part(pkg)?;
    let mut used = HashSet::new();
    let mut queue = VecDeque::new();

    seed(pres.clone(), &mut used, &mut queue);
    for rel in pkg.root_rels().iter().filter(|r| !r.is_external()) {
        seed(uri::resolve_target("", &rel.target), &mut used, &mut queue);
    }
    for name in pkg.part_names() {
        if NOTES_DIRS.iter().any(|dir| name.starts_with(dir)) {
            seed(name.clone(), &mut used, &mut queue);
        }
    }

    let has_slides = !presentation::slide_part_names(pkg)?.is_empty();
    if !has_slides {
        // A deck without slides still needs one master to open.
        if let Some(master) = related_of_type(pkg, &pres, rt::SLIDE_MASTER) {
            seed(master, &mut used, &mut queue);
        }
    }

    while let Some(owner) = queue.pop_front() {
        let Some(rels) = pkg.rels(&owner) else { continue };
        for rel in rels.iter().filter(|r| !r.is_external()) {
            let keep_layouts = !has_slides && rel.rel_type == rt::SLIDE_LAYOUT;
            if !keep_layouts && !is_live_edge(pkg, &pres, &owner, &rel.rel_type) {
                continue;
            }
            let target = uri::resolve_target(&owner, &rel.target);
            if pkg.contains(&target) {
                seed(target, &mut used, &mut queue);
            }
        }
    }
    Ok(used)
}

fn seed(name: String, used: &mut HashSet<String>, queue: &mut VecDeque<String>) {
    if used.insert(name.clone()) {
        queue.push_back(name);
    }
}

/// Delete unreachable parts under the layout, master, theme and media
/// directories, then drop every relationship and ID-list entry that pointed
/// at them.
pub fn prune_unused(pkg: &mut Package) -> Result<PruneStats> {
    let used = used_parts(pkg)?;
    let doomed: BTreeSet<String> = pkg
        .part_names()
        .filter(|name| PRUNABLE_DIRS.iter().any(|dir| name.starts_with(dir)))
        .filter(|name| !used.contains(*name))
        .cloned()
        .collect();
    if doomed.is_empty() {
        return Ok(PruneStats::default());
    }

    let mut stats = PruneStats::default();
    for name in &doomed {
        pkg.remove_part(name);
        let bucket = if name.starts_with("ppt/slideLayouts/") {
            &mut stats.layouts
        } else if name.starts_with("ppt/slideMasters/") {
            &mut stats.masters
        } else if name.starts_with("ppt/theme/") {
            &mut stats.themes
        } else {
            &mut stats.media
        };
        bucket.push(name.clone());
    }

    let removed_ids = drop_dangling_rels(pkg, &doomed);
    drop_list_entries(pkg, &removed_ids)?;

    tracing::info!(
        layouts = stats.layouts.len(),
        masters = stats.masters.len(),
        themes = stats.themes.len(),
        media = stats.media.len(),
        "pruned unreachable parts"
    );
    Ok(stats)
}

/// Remove relationships targeting `removed` from every part. Returns the
/// removed relationship ids per owning part.
fn drop_dangling_rels(pkg: &mut Package, removed: &BTreeSet<String>) -> HashMap<String, HashSet<String>> {
    let mut by_owner: HashMap<String, HashSet<String>> = HashMap::new();
    for part in pkg.parts_mut() {
        let owner = part.name.clone();
        let mut ids = HashSet::new();
        part.rels.retain(|rel| {
            let dangling = !rel.is_external() && removed.contains(&uri::resolve_target(&owner, &rel.target));
            if dangling {
                ids.insert(rel.id.clone());
            }
            !dangling
        });
        if !ids.is_empty() {
            by_owner.insert(owner, ids);
        }
    }
    pkg.root_rels_mut()
        .retain(|rel| rel.is_external() || !removed.contains(&uri::resolve_target("", &rel.target)));
    by_owner
}

/// Drop `sldMasterId` / `sldLayoutId` entries whose `r:id` is exactly one of
/// the removed relationship ids of their part; empty lists go too.
fn drop_list_entries(pkg: &mut Package, removed: &HashMap<String, HashSet<String>>) -> Result<()> {
    let pres = presentation::presentation_part(pkg)?;
    for (owner, ids) in removed {
        let list_name = if *owner == pres {
            P::sldMasterIdLst()
        } else {
            P::sldLayoutIdLst()
        };
        let Some(doc) = pkg.xml_mut(owner) else { continue };
        let Some(list) = doc.root().and_then(|root| doc.first_child_named(root, &list_name)) else {
            continue;
        };
        let stale: Vec<_> = doc
            .element_children(list)
            .filter(|&entry| doc.attribute(entry, &R::id()).map(|id| ids.contains(id)).unwrap_or(false))
            .collect();
        for entry in stale {
            doc.remove(entry);
        }
        if doc.element_children(list).next().is_none() {
            doc.remove(list);
        }
    }
    Ok(())
}
