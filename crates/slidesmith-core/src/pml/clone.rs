//! Drop-in slide cloning: copy one slide of a source deck, with its layout,
//! master, media and hyperlinks, into the deck being built.

use super::import::{RelationshipImporter, STRUCTURAL_TYPES};
use super::layout_import::import_layout;
use super::presentation;
use super::remap::{is_hyperlink, relationship_refs, settle_refs};
use crate::context::BuildContext;
use crate::error::{Result, SlidesmithError};
use crate::package::{uri, Package};
use crate::xml::namespaces::{A, P};
use crate::xml::{XName, XmlDocument};
use indextree::NodeId;
use std::collections::HashMap;
use std::path::Path;

/// Clone slide `index` (0-based) of the deck at `source_path` onto the end
/// of `target`. Returns the new slide's part name.
///
/// Fails with [`SlidesmithError::SlideIndexOutOfRange`] or
/// [`SlidesmithError::SourceNotFound`] when the slide cannot be cloned at
/// all; individual shapes, media or the background that fail to copy are
/// logged and skipped.
pub fn clone_slide(
    ctx: &mut BuildContext,
    target: &mut Package,
    source_path: &Path,
    index: usize,
) -> Result<String> {
    let (key, source) = ctx.source(source_path)?;
    let source_name = source_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| key.clone());
    clone_from_package(ctx, target, &key, &source, &source_name, index)
}

fn clone_from_package(
    ctx: &mut BuildContext,
    target: &mut Package,
    key: &str,
    source: &Package,
    source_name: &str,
    index: usize,
) -> Result<String> {
    let slides = presentation::slide_part_names(source)?;
    let source_slide = slides
        .get(index)
        .ok_or_else(|| SlidesmithError::SlideIndexOutOfRange {
            index,
            count: slides.len(),
            source_name: source_name.to_string(),
        })?;
    check_dimensions(ctx, source, target, source_name);

    let source_layout = presentation::layout_of(source, source_slide).ok_or_else(|| {
        SlidesmithError::MissingPart {
            part_path: source_slide.clone(),
            context: "slide has no layout relationship".to_string(),
        }
    })?;

    let mut importer = RelationshipImporter::new(source);
    let layout = import_layout(ctx, target, key, &mut importer, &source_layout)?;
    let slide = presentation::add_slide(ctx, target, &layout)?;
    clear_shape_tree(target.require_xml_mut(&slide)?);

    let mut copier = ShapeCopier {
        importer,
        source_slide,
        target_slide: &slide,
        resolved: HashMap::new(),
    };
    let copied = copier.copy_shapes(ctx, target)?;
    copier.copy_background(ctx, target)?;

    tracing::info!(
        source = %source_name,
        index,
        slide = %slide,
        layout = %layout,
        shapes = copied,
        "cloned slide"
    );
    Ok(slide)
}

fn check_dimensions(ctx: &BuildContext, source: &Package, target: &Package, source_name: &str) {
    let (Some(src), Some(dst)) = (presentation::slide_size(source), presentation::slide_size(target)) else {
        return;
    };
    let tolerance = ctx.settings.dimension_tolerance_emu;
    if (src.0 - dst.0).abs() > tolerance || (src.1 - dst.1).abs() > tolerance {
        tracing::warn!(
            source = %source_name,
            source_cx = src.0,
            source_cy = src.1,
            target_cx = dst.0,
            target_cy = dst.1,
            "source slide size differs from target; cloned content may be misplaced"
        );
    }
}

fn is_tree_frame(doc: &XmlDocument, node: NodeId) -> bool {
    doc.name(node)
        .map(|n| {
            *n == P::nvGrpSpPr() || *n == P::grpSpPr() || *n == XName::new(P::NS, "extLst")
        })
        .unwrap_or(true)
}

fn shape_tree(doc: &XmlDocument) -> Option<NodeId> {
    doc.find_path(doc.root()?, &[P::cSld(), P::spTree()])
}

/// Remove every shape from a slide's tree, keeping the group frame.
fn clear_shape_tree(doc: &mut XmlDocument) {
    let Some(tree) = shape_tree(doc) else { return };
    let shapes: Vec<NodeId> = doc
        .element_children(tree)
        .filter(|&child| !is_tree_frame(doc, child))
        .collect();
    for shape in shapes {
        doc.remove(shape);
    }
}

/// What to do with a copied subtree given the references it holds.
enum Verdict {
    Keep,
    Drop(String),
}

struct ShapeCopier<'s, 'a> {
    importer: RelationshipImporter<'s>,
    source_slide: &'a str,
    target_slide: &'a str,
    /// Source relationship id -> target id, or `None` when it cannot be
    /// carried over. Shared by every shape so a repeated image is linked once.
    resolved: HashMap<String, Option<String>>,
}

impl<'s, 'a> ShapeCopier<'s, 'a> {
    fn copy_shapes(&mut self, ctx: &mut BuildContext, target: &mut Package) -> Result<usize> {
        let source = self.importer.source();
        let src_doc = source.require_xml(self.source_slide)?;
        let Some(src_tree) = shape_tree(src_doc) else {
            return Ok(0);
        };
        let shapes: Vec<NodeId> = src_doc
            .element_children(src_tree)
            .filter(|&child| !is_tree_frame(src_doc, child))
            .collect();

        let mut copied = 0;
        for shape in shapes {
            if let Verdict::Drop(rid) = self.resolve_refs(ctx, target, src_doc, shape) {
                tracing::warn!(
                    slide = %self.source_slide,
                    shape = %shape_name(src_doc, shape),
                    rel_id = %rid,
                    "dropping shape with unresolvable reference"
                );
                continue;
            }
            let doc = target.require_xml_mut(self.target_slide)?;
            let Some(tree) = shape_tree(doc) else {
                return Err(SlidesmithError::InvalidPackage {
                    message: format!("{} has no shape tree", self.target_slide),
                });
            };
            match doc.import_subtree(src_doc, shape, tree) {
                Some(copy) => {
                    self.fix_refs(doc, copy);
                    copied += 1;
                }
                None => tracing::warn!(
                    slide = %self.source_slide,
                    shape = %shape_name(src_doc, shape),
                    "failed to copy shape"
                ),
            }
        }
        Ok(copied)
    }

    /// Copy an explicit `p:bg` from the source slide. Without one the
    /// imported layout already supplies the background.
    fn copy_background(&mut self, ctx: &mut BuildContext, target: &mut Package) -> Result<()> {
        let source = self.importer.source();
        let src_doc = source.require_xml(self.source_slide)?;
        let Some(bg) = src_doc
            .root()
            .and_then(|root| src_doc.find_path(root, &[P::cSld(), P::bg()]))
        else {
            return Ok(());
        };
        if src_doc.element_children(bg).next().is_none() {
            return Ok(());
        }

        if let Verdict::Drop(rid) = self.resolve_refs(ctx, target, src_doc, bg) {
            tracing::warn!(slide = %self.source_slide, rel_id = %rid, "skipping slide background");
            return Ok(());
        }

        let doc = target.require_xml_mut(self.target_slide)?;
        let Some(c_sld) = doc.root().and_then(|root| doc.first_child_named(root, &P::cSld())) else {
            return Ok(());
        };
        let existing: Vec<NodeId> = doc.elements_by_name(c_sld, &P::bg()).collect();
        for old in existing {
            doc.remove(old);
        }
        let copy = match doc.first_child_named(c_sld, &P::spTree()) {
            Some(tree) => doc.import_subtree_before(src_doc, bg, tree),
            None => doc.import_subtree(src_doc, bg, c_sld),
        };
        match copy {
            Some(copy) => {
                self.fix_refs(doc, copy);
                tracing::debug!(slide = %self.target_slide, "copied slide background");
            }
            None => tracing::warn!(slide = %self.source_slide, "failed to copy slide background"),
        }
        Ok(())
    }

    /// Import every relationship `node` references. Picture fills and
    /// hyperlinks can lose their target; any other reference must resolve.
    fn resolve_refs(
        &mut self,
        ctx: &mut BuildContext,
        target: &mut Package,
        src_doc: &XmlDocument,
        node: NodeId,
    ) -> Verdict {
        for reference in relationship_refs(src_doc, node) {
            if self.resolve(ctx, target, &reference.id).is_some() {
                continue;
            }
            let optional = is_hyperlink(src_doc, reference.element)
                || src_doc.name(reference.element).map(|n| *n == A::blip()).unwrap_or(false);
            if !optional {
                return Verdict::Drop(reference.id);
            }
        }
        Verdict::Keep
    }

    fn resolve(&mut self, ctx: &mut BuildContext, target: &mut Package, rid: &str) -> Option<String> {
        if let Some(done) = self.resolved.get(rid) {
            return done.clone();
        }
        let outcome = match self.structural_type(rid) {
            Some(rel_type) => Err(SlidesmithError::InvalidRelationship {
                message: format!("{} is a structural {} relationship", rid, rel_type),
            }),
            None => self
                .importer
                .import_relationship(ctx, target, self.source_slide, rid, self.target_slide),
        };
        let value = match outcome {
            Ok(new_id) => Some(new_id),
            Err(err) => {
                tracing::warn!(slide = %self.source_slide, rel_id = %rid, error = %err, "reference not carried over");
                None
            }
        };
        self.resolved.insert(rid.to_string(), value.clone());
        value
    }

    fn structural_type(&self, rid: &str) -> Option<String> {
        let rel = self.importer.source().rels(self.source_slide)?.get(rid)?;
        (!rel.is_external() && STRUCTURAL_TYPES.contains(&rel.rel_type.as_str()))
            .then(|| uri::file_name(&rel.rel_type).to_string())
    }

    /// Blank unresolved hyperlinks, drop unresolved picture fills, then
    /// rewrite the remaining ids for the new slide.
    fn fix_refs(&self, doc: &mut XmlDocument, copy: NodeId) {
        let map: HashMap<String, String> = self
            .resolved
            .iter()
            .filter_map(|(old, new)| Some((old.clone(), new.clone()?)))
            .collect();
        settle_refs(doc, copy, &map);
    }
}

fn shape_name(doc: &XmlDocument, shape: NodeId) -> String {
    doc.descendants_named(shape, &P::cNvPr())
        .next()
        .and_then(|c| doc.attribute(c, &XName::local("name")))
        .unwrap_or("")
        .to_string()
}
