use super::presentation::{self, related_of_type};
use crate::context::BuildContext;
use crate::error::{Result, SlidesmithError};
use crate::package::content_type_values as ctv;
use crate::package::relationship_types as rt;
use crate::package::{Package, Part};
use crate::xml::namespaces::{A, P};
use crate::xml::parser::parse;
use crate::xml::{XName, XmlDocument, XmlNodeData};
use indextree::NodeId;

const NOTES_SKELETON: &str = r#"<p:notes xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr><a:spLocks noGrp="1" noRot="1" noChangeAspect="1"/></p:cNvSpPr><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/></p:txBody></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>"#;

/// Put `text` in the speaker notes of `slide`, one paragraph per line.
///
/// Returns the notes slide's part name, or `None` when the deck has no notes
/// master to hang a notes slide on.
pub fn set_speaker_notes(
    ctx: &mut BuildContext,
    pkg: &mut Package,
    slide: &str,
    text: &str,
) -> Result<Option<String>> {
    if let Some(existing) = related_of_type(pkg, slide, rt::NOTES_SLIDE) {
        let doc = pkg.require_xml_mut(&existing)?;
        return match notes_body(doc) {
            Some(body) => {
                write_paragraphs(doc, body, text);
                Ok(Some(existing))
            }
            None => {
                tracing::warn!(notes = %existing, "notes slide has no body placeholder");
                Ok(None)
            }
        };
    }

    let pres = presentation::presentation_part(pkg)?;
    let Some(notes_master) = related_of_type(pkg, &pres, rt::NOTES_MASTER) else {
        tracing::debug!(slide = %slide, "deck has no notes master, skipping speaker notes");
        return Ok(None);
    };

    let mut doc = parse(NOTES_SKELETON)?;
    let body = notes_body(&doc).ok_or_else(|| SlidesmithError::InvalidPackage {
        message: "notes template lacks a body placeholder".to_string(),
    })?;
    write_paragraphs(&mut doc, body, text);

    let name = ctx.allocate_part_name(pkg, "ppt/notesSlides/notesSlide1.xml");
    pkg.add_part(Part::xml(&name, ctv::NOTES_SLIDE, doc));
    pkg.relate(&name, &notes_master, rt::NOTES_MASTER)?;
    pkg.relate(&name, slide, rt::SLIDE)?;
    pkg.relate(slide, &name, rt::NOTES_SLIDE)?;

    tracing::debug!(slide = %slide, notes = %name, "added speaker notes");
    Ok(Some(name))
}

/// The `p:txBody` of the notes body placeholder.
fn notes_body(doc: &XmlDocument) -> Option<NodeId> {
    let tree = doc.find_path(doc.root()?, &[P::cSld(), P::spTree()])?;
    doc.elements_by_name(tree, &P::sp()).find_map(|sp| {
        let ph = doc.find_path(sp, &[P::nvSpPr(), P::nvPr(), P::ph()])?;
        if doc.attribute(ph, &XName::local("type")) != Some("body") {
            return None;
        }
        doc.first_child_named(sp, &P::txBody())
    })
}

fn write_paragraphs(doc: &mut XmlDocument, body: NodeId, text: &str) {
    let old: Vec<NodeId> = doc.elements_by_name(body, &A::p()).collect();
    for p in old {
        doc.remove(p);
    }
    for line in text.split('\n') {
        let p = doc.add_child(body, XmlNodeData::element(A::p()));
        if line.is_empty() {
            continue;
        }
        let r = doc.add_child(p, XmlNodeData::element(A::r()));
        doc.add_child(r, XmlNodeData::element(A::rPr()));
        let t = doc.add_child(r, XmlNodeData::element(A::t()));
        doc.add_child(t, XmlNodeData::text(line));
    }
}
