use super::remap::settle_refs;
use crate::context::BuildContext;
use crate::error::{Result, SlidesmithError};
use crate::package::relationship_types as rt;
use crate::package::{uri, Package, Part, Relationships};
use std::collections::HashMap;

/// Relationship types that point back up the presentation structure. A
/// copied part never drags these targets along.
pub const STRUCTURAL_TYPES: [&str; 6] = [
    rt::SLIDE,
    rt::SLIDE_LAYOUT,
    rt::SLIDE_MASTER,
    rt::NOTES_SLIDE,
    rt::NOTES_MASTER,
    rt::HANDOUT_MASTER,
];

/// Copies parts and relationships out of one source package.
///
/// Remembers which source parts were already copied, so a part referenced
/// twice within one import lands in the target once.
pub struct RelationshipImporter<'s> {
    source: &'s Package,
    copied: HashMap<String, String>,
}

impl<'s> RelationshipImporter<'s> {
    pub fn new(source: &'s Package) -> Self {
        Self {
            source,
            copied: HashMap::new(),
        }
    }

    pub fn source(&self) -> &'s Package {
        self.source
    }

    /// Copy `source_part` into `target` under a fresh name, pulling along its
    /// own non-structural relationships. Returns the new part name.
    pub fn import_part(
        &mut self,
        ctx: &mut BuildContext,
        target: &mut Package,
        source_part: &str,
    ) -> Result<String> {
        if let Some(done) = self.copied.get(source_part) {
            return Ok(done.clone());
        }
        let part = self
            .source
            .part(source_part)
            .ok_or_else(|| SlidesmithError::MissingPart {
                part_path: source_part.to_string(),
                context: "source package".to_string(),
            })?;

        let new_name = ctx.allocate_part_name(target, source_part);
        target.add_part(Part {
            name: new_name.clone(),
            content_type: part.content_type.clone(),
            payload: part.payload.clone(),
            rels: Relationships::new(),
        });
        self.copied.insert(source_part.to_string(), new_name.clone());
        tracing::debug!(from = %source_part, to = %new_name, "imported part");

        if !part.rels.is_empty() {
            let rid_map = self.import_part_rels(ctx, target, source_part, &new_name, &STRUCTURAL_TYPES);
            if let Some(doc) = target.xml_mut(&new_name) {
                if let Some(root) = doc.root() {
                    let cleared = settle_refs(doc, root, &rid_map);
                    if cleared > 0 {
                        tracing::warn!(part = %new_name, cleared, "cleared references to relationships not carried over");
                    }
                }
            }
        }
        Ok(new_name)
    }

    /// Recreate relationship `rel_id` of `source_owner` on `target_owner`.
    /// External targets are reused when already present; internal targets
    /// are copied. Returns the new relationship id.
    pub fn import_relationship(
        &mut self,
        ctx: &mut BuildContext,
        target: &mut Package,
        source_owner: &str,
        rel_id: &str,
        target_owner: &str,
    ) -> Result<String> {
        let rel = self
            .source
            .rels(source_owner)
            .and_then(|rels| rels.get(rel_id))
            .ok_or_else(|| SlidesmithError::InvalidRelationship {
                message: format!("{} has no relationship {}", source_owner, rel_id),
            })?;

        if rel.is_external() {
            let rels = target
                .rels_mut(target_owner)
                .ok_or_else(|| SlidesmithError::MissingPart {
                    part_path: target_owner.to_string(),
                    context: "target package".to_string(),
                })?;
            return Ok(rels.get_or_add_external(&rel.rel_type, &rel.target));
        }

        let resolved = uri::resolve_target(source_owner, &rel.target);
        if !self.source.contains(&resolved) {
            return Err(SlidesmithError::InvalidRelationship {
                message: format!("{} -> {} points at a missing part", source_owner, resolved),
            });
        }
        let copy = self.import_part(ctx, target, &resolved)?;
        target.relate(target_owner, &copy, &rel.rel_type)
    }

    /// Import every relationship of `source_owner` onto `target_owner`
    /// except those whose type is in `skip`. Returns old id -> new id.
    /// Relationships that fail to import are logged and left out.
    pub fn import_part_rels(
        &mut self,
        ctx: &mut BuildContext,
        target: &mut Package,
        source_owner: &str,
        target_owner: &str,
        skip: &[&str],
    ) -> HashMap<String, String> {
        let Some(rels) = self.source.rels(source_owner) else {
            return HashMap::new();
        };
        let wanted: Vec<(String, String)> = rels
            .iter()
            .filter(|rel| !skip.contains(&rel.rel_type.as_str()))
            .map(|rel| (rel.id.clone(), rel.rel_type.clone()))
            .collect();

        let mut rid_map = HashMap::new();
        for (old_id, rel_type) in wanted {
            match self.import_relationship(ctx, target, source_owner, &old_id, target_owner) {
                Ok(new_id) => {
                    rid_map.insert(old_id, new_id);
                }
                Err(err) => {
                    tracing::warn!(
                        part = %source_owner,
                        rel_id = %old_id,
                        rel_type = %rel_type,
                        error = %err,
                        "skipping relationship that could not be imported"
                    );
                }
            }
        }
        rid_map
    }
}
