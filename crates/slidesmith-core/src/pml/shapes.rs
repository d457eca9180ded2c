use super::presentation;
use crate::package::Package;
use crate::pml::settings::EMU_PER_INCH;
use crate::xml::namespaces::{A, P};
use crate::xml::{XName, XmlDocument};
use indextree::NodeId;

/// A top-level text-bearing shape (`p:sp` with a `p:txBody`) on a slide.
#[derive(Debug, Clone)]
pub struct TextShape {
    pub node: NodeId,
    pub name: String,
    /// Paragraph texts joined by `\n`.
    pub text: String,
    /// Largest explicit run size, in points.
    pub font_size: Option<f64>,
    /// Offset in EMU, from the shape or the placeholder it inherits from.
    pub offset: Option<(i64, i64)>,
    /// Extent in EMU, from the shape or the placeholder it inherits from.
    pub extent: Option<(i64, i64)>,
}

impl TextShape {
    pub fn top_in(&self) -> f64 {
        self.offset.map(|(_, y)| emu_to_in(y)).unwrap_or(0.0)
    }

    pub fn width_in(&self) -> f64 {
        self.extent.map(|(cx, _)| emu_to_in(cx)).unwrap_or(0.0)
    }

    pub fn height_in(&self) -> f64 {
        self.extent.map(|(_, cy)| emu_to_in(cy)).unwrap_or(0.0)
    }

    pub fn area_sq_in(&self) -> f64 {
        self.width_in() * self.height_in()
    }
}

pub fn emu_to_in(emu: i64) -> f64 {
    emu as f64 / EMU_PER_INCH as f64
}

/// Placeholder identity carried by `p:nvPr/p:ph`.
#[derive(Debug, Clone, PartialEq)]
struct PlaceholderKey {
    idx: Option<String>,
    ph_type: String,
}

/// Text shapes of `slide`, in tree order. Shapes without their own
/// `a:xfrm` take position and size from the matching layout (then master)
/// placeholder.
pub fn text_shapes(pkg: &Package, slide: &str) -> Vec<TextShape> {
    let Some(doc) = pkg.xml(slide) else {
        return Vec::new();
    };
    let Some(tree) = doc.root().and_then(|root| doc.find_path(root, &[P::cSld(), P::spTree()])) else {
        return Vec::new();
    };

    let mut shapes = Vec::new();
    for sp in doc.elements_by_name(tree, &P::sp()) {
        let Some(body) = doc.first_child_named(sp, &P::txBody()) else {
            continue;
        };
        let (mut offset, mut extent) = own_geometry(doc, sp);
        if offset.is_none() || extent.is_none() {
            if let Some(key) = placeholder_key(doc, sp) {
                let (o, e) = inherited_geometry(pkg, slide, &key);
                offset = offset.or(o);
                extent = extent.or(e);
            }
        }
        shapes.push(TextShape {
            node: sp,
            name: shape_name(doc, sp),
            text: body_text(doc, body),
            font_size: max_font_size(doc, body),
            offset,
            extent,
        });
    }
    shapes
}

fn shape_name(doc: &XmlDocument, sp: NodeId) -> String {
    doc.find_path(sp, &[P::nvSpPr(), P::cNvPr()])
        .and_then(|c| doc.attribute(c, &XName::local("name")))
        .unwrap_or("")
        .to_string()
}

/// Text of a `p:txBody`, one line per paragraph.
pub fn body_text(doc: &XmlDocument, body: NodeId) -> String {
    doc.elements_by_name(body, &A::p())
        .map(|p| paragraph_text(doc, p))
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(doc: &XmlDocument, p: NodeId) -> String {
    let mut text = String::new();
    for child in doc.element_children(p) {
        match doc.name(child) {
            Some(n) if *n == A::br() => text.push('\n'),
            Some(n) if *n == A::r() || *n == A::fld() => {
                if let Some(t) = doc.first_child_named(child, &A::t()) {
                    text.push_str(&doc.text_of(t));
                }
            }
            _ => {}
        }
    }
    text
}

fn max_font_size(doc: &XmlDocument, body: NodeId) -> Option<f64> {
    doc.descendants_named(body, &A::rPr())
        .filter_map(|rpr| doc.attribute(rpr, &XName::local("sz"))?.parse::<f64>().ok())
        .map(|sz| sz / 100.0)
        .fold(None, |max: Option<f64>, sz| Some(max.map_or(sz, |m| m.max(sz))))
}

fn parse_pair(doc: &XmlDocument, node: NodeId, a: &str, b: &str) -> Option<(i64, i64)> {
    let first = doc.attribute(node, &XName::local(a))?.parse().ok()?;
    let second = doc.attribute(node, &XName::local(b))?.parse().ok()?;
    Some((first, second))
}

fn own_geometry(doc: &XmlDocument, sp: NodeId) -> (Option<(i64, i64)>, Option<(i64, i64)>) {
    let Some(xfrm) = doc.find_path(sp, &[P::spPr(), A::xfrm()]) else {
        return (None, None);
    };
    let offset = doc
        .first_child_named(xfrm, &A::off())
        .and_then(|off| parse_pair(doc, off, "x", "y"));
    let extent = doc
        .first_child_named(xfrm, &A::ext())
        .and_then(|ext| parse_pair(doc, ext, "cx", "cy"));
    (offset, extent)
}

fn placeholder_key(doc: &XmlDocument, sp: NodeId) -> Option<PlaceholderKey> {
    let ph = doc.find_path(sp, &[P::nvSpPr(), P::nvPr(), P::ph()])?;
    Some(PlaceholderKey {
        idx: doc.attribute(ph, &XName::local("idx")).map(String::from),
        ph_type: doc.attribute(ph, &XName::local("type")).unwrap_or("body").to_string(),
    })
}

/// Geometry of the placeholder `key` refers to, looked up on the slide's
/// layout first and then on the layout's master.
fn inherited_geometry(
    pkg: &Package,
    slide: &str,
    key: &PlaceholderKey,
) -> (Option<(i64, i64)>, Option<(i64, i64)>) {
    let mut offset = None;
    let mut extent = None;
    let layout = presentation::layout_of(pkg, slide);
    let master = layout.as_deref().and_then(|l| presentation::master_of(pkg, l));

    for part in [layout, master].into_iter().flatten() {
        let Some(doc) = pkg.xml(&part) else { continue };
        let Some(sp) = find_placeholder(doc, key) else { continue };
        let (o, e) = own_geometry(doc, sp);
        offset = offset.or(o);
        extent = extent.or(e);
        if offset.is_some() && extent.is_some() {
            break;
        }
    }
    (offset, extent)
}

fn find_placeholder(doc: &XmlDocument, key: &PlaceholderKey) -> Option<NodeId> {
    let tree = doc.find_path(doc.root()?, &[P::cSld(), P::spTree()])?;
    let candidates: Vec<(NodeId, PlaceholderKey)> = doc
        .elements_by_name(tree, &P::sp())
        .filter_map(|sp| Some((sp, placeholder_key(doc, sp)?)))
        .collect();

    if key.idx.is_some() {
        if let Some((sp, _)) = candidates.iter().find(|(_, k)| k.idx == key.idx) {
            return Some(*sp);
        }
    }
    candidates
        .iter()
        .find(|(_, k)| k.ph_type == key.ph_type)
        .map(|(sp, _)| *sp)
}
