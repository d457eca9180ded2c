use super::import::RelationshipImporter;
use super::presentation::{self, max_list_id, register_layout, register_master};
use super::remap::settle_refs;
use crate::context::BuildContext;
use crate::error::{Result, SlidesmithError};
use crate::package::relationship_types as rt;
use crate::package::{Package, Part, Relationships};
use crate::xml::namespaces::P;

/// Bring `source_layout` (and its master) from the importer's source into
/// `target`, returning the layout's part name in `target`.
///
/// Both parts are cached on `ctx` by `(source_key, part name)`, so a layout
/// shared by several cloned slides is copied once per build.
pub fn import_layout(
    ctx: &mut BuildContext,
    target: &mut Package,
    source_key: &str,
    importer: &mut RelationshipImporter<'_>,
    source_layout: &str,
) -> Result<String> {
    if let Some(cached) = ctx.cached_layout(source_key, source_layout) {
        tracing::debug!(layout = %source_layout, imported = %cached, "layout cache hit");
        return Ok(cached.to_string());
    }

    let source = importer.source();
    let master = match presentation::master_of(source, source_layout) {
        Some(source_master) if source.contains(&source_master) => {
            import_master(ctx, target, source_key, importer, &source_master)?
        }
        _ => {
            let fallback = first_master(target)?;
            tracing::warn!(
                layout = %source_layout,
                master = %fallback,
                "source layout has no usable master, attaching to target's first master"
            );
            fallback
        }
    };

    let part = source
        .part(source_layout)
        .ok_or_else(|| SlidesmithError::MissingPart {
            part_path: source_layout.to_string(),
            context: "source package".to_string(),
        })?;
    let name = ctx.allocate_part_name(target, source_layout);
    target.add_part(Part {
        name: name.clone(),
        content_type: part.content_type.clone(),
        payload: part.payload.clone(),
        rels: Relationships::new(),
    });
    target.relate(&name, &master, rt::SLIDE_MASTER)?;

    let rid_map = importer.import_part_rels(ctx, target, source_layout, &name, &[rt::SLIDE_MASTER]);
    let doc = target.require_xml_mut(&name)?;
    if let Some(root) = doc.root() {
        let cleared = settle_refs(doc, root, &rid_map);
        if cleared > 0 {
            tracing::warn!(layout = %source_layout, cleared, "cleared references to relationships not carried over");
        }
    }

    let rid = target.relate(&master, &name, rt::SLIDE_LAYOUT)?;
    let id = ctx.allocate_list_id(|| max_list_id(target));
    register_layout(target, &master, &rid, id)?;

    ctx.cache_layout(source_key, source_layout, &name);
    tracing::debug!(from = %source_layout, to = %name, master = %master, id, "imported layout");
    Ok(name)
}

/// Copy a slide master with its theme and media. The copied master starts
/// with an empty layout list; layouts register themselves as they arrive.
pub fn import_master(
    ctx: &mut BuildContext,
    target: &mut Package,
    source_key: &str,
    importer: &mut RelationshipImporter<'_>,
    source_master: &str,
) -> Result<String> {
    if let Some(cached) = ctx.cached_master(source_key, source_master) {
        tracing::debug!(master = %source_master, imported = %cached, "master cache hit");
        return Ok(cached.to_string());
    }

    let pres = presentation::presentation_part(target)?;
    let part = importer
        .source()
        .part(source_master)
        .ok_or_else(|| SlidesmithError::MissingPart {
            part_path: source_master.to_string(),
            context: "source package".to_string(),
        })?;
    let name = ctx.allocate_part_name(target, source_master);
    target.add_part(Part {
        name: name.clone(),
        content_type: part.content_type.clone(),
        payload: part.payload.clone(),
        rels: Relationships::new(),
    });

    let rid_map = importer.import_part_rels(ctx, target, source_master, &name, &[rt::SLIDE_LAYOUT]);
    let doc = target.require_xml_mut(&name)?;
    if let Some(root) = doc.root() {
        if let Some(list) = doc.first_child_named(root, &P::sldLayoutIdLst()) {
            doc.remove_children(list);
        }
        let cleared = settle_refs(doc, root, &rid_map);
        if cleared > 0 {
            tracing::warn!(master = %source_master, cleared, "cleared references to relationships not carried over");
        }
    }

    let rid = target.relate(&pres, &name, rt::SLIDE_MASTER)?;
    let id = ctx.allocate_list_id(|| max_list_id(target));
    register_master(target, &rid, id)?;

    ctx.cache_master(source_key, source_master, &name);
    tracing::debug!(from = %source_master, to = %name, id, "imported master");
    Ok(name)
}

fn first_master(target: &Package) -> Result<String> {
    let pres = presentation::presentation_part(target)?;
    presentation::related_of_type(target, &pres, rt::SLIDE_MASTER).ok_or_else(|| {
        SlidesmithError::MissingPart {
            part_path: "ppt/slideMasters/slideMaster1.xml".to_string(),
            context: "target presentation has no slide master".to_string(),
        }
    })
}
