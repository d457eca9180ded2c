//! Content replacement on a cloned slide: fill mapped text shapes, clear and
//! park every other text shape outside the visible canvas.

use super::classify::{classify, ShapeMetrics, ShapeRole};
use super::presentation::{self, insert_in_order};
use super::shapes::{text_shapes, TextShape};
use crate::content::{ContentZone, DesignGuardrails, SlideContent, ZoneType};
use crate::error::Result;
use crate::package::Package;
use crate::pml::settings::{ReplaceSettings, EMU_PER_INCH};
use crate::xml::namespaces::{A, P};
use crate::xml::{XAttribute, XName, XmlDocument, XmlNodeData};
use indextree::NodeId;
use std::collections::{HashMap, HashSet};

/// Default slide width (10 in) when the presentation declares none.
const DEFAULT_SLIDE_WIDTH_EMU: i64 = 9_144_000;

/// Names of the shapes that received content and of those that were
/// cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaceOutcome {
    pub populated: Vec<String>,
    pub cleared: Vec<String>,
}

/// Fill `slide` with `content`, through the zone map when one is given and
/// through the positional heuristic otherwise.
pub fn populate_slide(
    pkg: &mut Package,
    slide: &str,
    content: &SlideContent,
    zones: Option<&[ContentZone]>,
    guardrails: &DesignGuardrails,
    settings: &ReplaceSettings,
) -> Result<ReplaceOutcome> {
    match zones {
        Some(zones) if !zones.is_empty() => {
            populate_with_zones(pkg, slide, content, zones, guardrails, settings)
        }
        _ => populate_heuristic(pkg, slide, content, settings),
    }
}

fn off_canvas_x(pkg: &Package, settings: &ReplaceSettings) -> i64 {
    let width = presentation::slide_size(pkg)
        .map(|(cx, _)| cx)
        .unwrap_or(DEFAULT_SLIDE_WIDTH_EMU);
    width + (settings.off_canvas_margin_in * EMU_PER_INCH as f64).round() as i64
}

fn zone_text(content: &SlideContent, zone_type: ZoneType) -> String {
    match zone_type {
        ZoneType::Title => content.title_text().to_string(),
        ZoneType::Subtitle => content.subtitle_text().to_string(),
        ZoneType::DataPoint => content.data_point().to_string(),
        ZoneType::Body | ZoneType::BulletArea | ZoneType::Caption => content.combined_body(),
    }
}

pub fn populate_with_zones(
    pkg: &mut Package,
    slide: &str,
    content: &SlideContent,
    zones: &[ContentZone],
    guardrails: &DesignGuardrails,
    settings: &ReplaceSettings,
) -> Result<ReplaceOutcome> {
    let shapes = text_shapes(pkg, slide);
    let park_x = off_canvas_x(pkg, settings);
    let by_name: HashMap<&str, &TextShape> = shapes.iter().map(|s| (s.name.as_str(), s)).collect();
    let doc = pkg.require_xml_mut(slide)?;

    let mut outcome = ReplaceOutcome::default();
    let mut mapped = HashSet::new();
    for zone in zones {
        let Some(shape) = by_name.get(zone.shape_name.as_str()) else {
            tracing::warn!(slide = %slide, shape = %zone.shape_name, "content zone shape not found");
            continue;
        };
        let text = zone_text(content, zone.zone_type);
        if text.is_empty() {
            continue;
        }

        let text = truncate_text(&text, zone.max_chars, settings);
        let size = zone_font_size(zone, shape, &text, guardrails, settings);
        let typeface = guardrails.font_for(zone.zone_type);
        if replace_shape_text(doc, shape.node, &text, Some(size), Some(typeface)) {
            mapped.insert(shape.node);
            outcome.populated.push(shape.name.clone());
        }
    }

    for shape in shapes.iter().filter(|s| !mapped.contains(&s.node)) {
        clear_shape_text(doc, shape.node, park_x, shape.offset, shape.extent);
        outcome.cleared.push(shape.name.clone());
    }
    tracing::debug!(slide = %slide, populated = outcome.populated.len(), cleared = outcome.cleared.len(), "applied content zones");
    Ok(outcome)
}

/// Clamp the shape's own size (or the guardrail size) into the zone's
/// range, shrink it if the text is predicted to overflow, and never go below
/// the minimum readable size.
fn zone_font_size(
    zone: &ContentZone,
    shape: &TextShape,
    text: &str,
    guardrails: &DesignGuardrails,
    settings: &ReplaceSettings,
) -> f64 {
    let (min, max) = (zone.font_size_range.0 as f64, zone.font_size_range.1 as f64);
    let base = shape
        .font_size
        .unwrap_or_else(|| guardrails.size_for(zone.zone_type) as f64);
    let clamped = base.max(min).min(max.max(min));
    let (_, _, width, height) = zone.position;
    let fit = estimate_fit_font_size(text, width, height, clamped, min);
    clamped.min(fit).max(settings.min_font_size_pt)
}

pub fn populate_heuristic(
    pkg: &mut Package,
    slide: &str,
    content: &SlideContent,
    settings: &ReplaceSettings,
) -> Result<ReplaceOutcome> {
    let shapes = text_shapes(pkg, slide);
    let park_x = off_canvas_x(pkg, settings);
    let metrics: Vec<ShapeMetrics> = shapes
        .iter()
        .map(|s| ShapeMetrics {
            name: s.name.clone(),
            font_size: s.font_size.unwrap_or(0.0),
            top_in: s.top_in(),
            area_sq_in: s.area_sq_in(),
        })
        .collect();
    let roles = classify(&metrics, content, settings);

    let body = content.combined_body();
    let chunks: Vec<&str> = body.split("\n\n").collect();
    let doc = pkg.require_xml_mut(slide)?;

    let mut outcome = ReplaceOutcome::default();
    for (idx, role) in roles {
        let shape = &shapes[idx];
        let text = match role {
            ShapeRole::Title => Some(content.title_text()),
            ShapeRole::Subtitle => Some(content.subtitle_text()),
            ShapeRole::DataPoint => Some(content.data_point()),
            ShapeRole::Body(chunk) => chunks.get(chunk).copied(),
            ShapeRole::Clear => None,
        };
        match text {
            Some(text) if replace_shape_text(doc, shape.node, text, None, None) => {
                outcome.populated.push(shape.name.clone());
            }
            _ => {
                clear_shape_text(doc, shape.node, park_x, shape.offset, shape.extent);
                outcome.cleared.push(shape.name.clone());
            }
        }
    }
    tracing::debug!(slide = %slide, populated = outcome.populated.len(), cleared = outcome.cleared.len(), "applied heuristic fill");
    Ok(outcome)
}

/// Formatting read from a shape's first run before its text is replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStyle {
    pub typeface: Option<String>,
    /// Hundredths of a point, as written in `a:rPr/@sz`.
    pub size: Option<String>,
    pub bold: Option<String>,
    pub italic: Option<String>,
    pub lang: Option<String>,
    /// Captured for diagnostics only; an explicit colour is never written
    /// back so the text inherits from the layout and theme.
    pub rgb: Option<String>,
}

fn first_run_style(doc: &XmlDocument, paragraph: NodeId) -> RunStyle {
    let Some(rpr) = doc
        .first_child_named(paragraph, &A::r())
        .and_then(|r| doc.first_child_named(r, &A::rPr()))
    else {
        return RunStyle::default();
    };
    let attr = |name: &str| doc.attribute(rpr, &XName::local(name)).map(String::from);
    RunStyle {
        typeface: doc
            .first_child_named(rpr, &A::latin())
            .and_then(|l| doc.attribute(l, &XName::local("typeface")))
            .map(String::from),
        size: attr("sz"),
        bold: attr("b"),
        italic: attr("i"),
        lang: attr("lang"),
        rgb: doc
            .find_path(rpr, &[A::solidFill(), A::srgbClr()])
            .and_then(|c| doc.attribute(c, &XName::local("val")))
            .map(String::from),
    }
}

/// Keep only the first paragraph of a text body and empty it of runs.
/// Returns that paragraph, creating one if the body had none.
fn reset_paragraphs(doc: &mut XmlDocument, body: NodeId) -> NodeId {
    let paragraphs: Vec<NodeId> = doc.elements_by_name(body, &A::p()).collect();
    let Some((&first, rest)) = paragraphs.split_first() else {
        return doc.add_child(body, XmlNodeData::element(A::p()));
    };
    for &p in rest {
        doc.remove(p);
    }
    let content: Vec<NodeId> = doc
        .element_children(first)
        .filter(|&c| {
            doc.name(c)
                .map(|n| *n == A::r() || *n == A::br() || *n == A::fld())
                .unwrap_or(false)
        })
        .collect();
    for c in content {
        doc.remove(c);
    }
    first
}

/// Replace the text of shape `sp`, keeping the first run's typeface, size,
/// bold and italic. `size_pt` and `fallback_typeface` override or fill in
/// the captured values. Newlines become line breaks. Returns false when the
/// shape has no text body.
pub fn replace_shape_text(
    doc: &mut XmlDocument,
    sp: NodeId,
    text: &str,
    size_pt: Option<f64>,
    fallback_typeface: Option<&str>,
) -> bool {
    let Some(body) = doc.first_child_named(sp, &P::txBody()) else {
        return false;
    };
    let style = doc
        .first_child_named(body, &A::p())
        .map(|p| first_run_style(doc, p))
        .unwrap_or_default();
    if let Some(rgb) = &style.rgb {
        tracing::debug!(color = %rgb, "dropping explicit run colour");
    }

    let paragraph = reset_paragraphs(doc, body);
    let size = size_pt
        .map(|pt| ((pt * 100.0).round() as i64).to_string())
        .or_else(|| style.size.clone());
    let typeface = style
        .typeface
        .clone()
        .or_else(|| fallback_typeface.map(String::from));

    let end = doc.first_child_named(paragraph, &A::endParaRPr());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            insert_run_part(doc, paragraph, end, XmlNodeData::element(A::br()));
        }
        let run = insert_run_part(doc, paragraph, end, XmlNodeData::element(A::r()));
        let mut attrs = Vec::new();
        let fields = [
            ("lang", &style.lang),
            ("sz", &size),
            ("b", &style.bold),
            ("i", &style.italic),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                attrs.push(XAttribute::new(XName::local(name), value));
            }
        }
        let rpr = doc.add_child(run, XmlNodeData::element_with_attrs(A::rPr(), attrs));
        if let Some(face) = &typeface {
            doc.add_child(
                rpr,
                XmlNodeData::element_with_attrs(
                    A::latin(),
                    vec![XAttribute::new(XName::local("typeface"), face)],
                ),
            );
        }
        let t = doc.add_child(run, XmlNodeData::element(A::t()));
        doc.add_child(t, XmlNodeData::text(line));
    }
    true
}

fn insert_run_part(doc: &mut XmlDocument, paragraph: NodeId, end: Option<NodeId>, data: XmlNodeData) -> NodeId {
    match end {
        Some(end) => doc.add_before(end, data),
        None => doc.add_child(paragraph, data),
    }
}

/// Blank shape `sp` down to one empty paragraph and move it to `x_emu`,
/// outside the visible canvas. `offset`/`extent` are the shape's effective
/// geometry, used when it has no transform of its own.
pub fn clear_shape_text(
    doc: &mut XmlDocument,
    sp: NodeId,
    x_emu: i64,
    offset: Option<(i64, i64)>,
    extent: Option<(i64, i64)>,
) {
    if let Some(body) = doc.first_child_named(sp, &P::txBody()) {
        reset_paragraphs(doc, body);
    }

    let sp_pr = match doc.first_child_named(sp, &P::spPr()) {
        Some(existing) => existing,
        None => insert_in_order(doc, sp, XmlNodeData::element(P::spPr()), &[P::nvSpPr()]),
    };
    let xfrm = match doc.first_child_named(sp_pr, &A::xfrm()) {
        Some(existing) => existing,
        None => doc.add_first_child(sp_pr, XmlNodeData::element(A::xfrm())),
    };
    let y = offset.map(|(_, y)| y).unwrap_or(0);
    match doc.first_child_named(xfrm, &A::off()) {
        Some(off) => doc.set_attribute(off, &XName::local("x"), &x_emu.to_string()),
        None => {
            doc.add_first_child(
                xfrm,
                XmlNodeData::element_with_attrs(
                    A::off(),
                    vec![
                        XAttribute::new(XName::local("x"), &x_emu.to_string()),
                        XAttribute::new(XName::local("y"), &y.to_string()),
                    ],
                ),
            );
        }
    }
    if doc.first_child_named(xfrm, &A::ext()).is_none() {
        let (cx, cy) = extent.unwrap_or((0, 0));
        doc.add_child(
            xfrm,
            XmlNodeData::element_with_attrs(
                A::ext(),
                vec![
                    XAttribute::new(XName::local("cx"), &cx.to_string()),
                    XAttribute::new(XName::local("cy"), &cy.to_string()),
                ],
            ),
        );
    }
}

/// Cut `text` to at most `max_chars` characters (ellipsis included),
/// preferring the last word boundary inside the trailing window of the
/// limit.
pub fn truncate_text(text: &str, max_chars: usize, settings: &ReplaceSettings) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }
    let ellipsis_len = settings.ellipsis.chars().count();
    if max_chars <= ellipsis_len {
        return chars[..max_chars].iter().collect();
    }

    let budget = max_chars - ellipsis_len;
    let window_start = (max_chars as f64 * (1.0 - settings.word_boundary_window)).ceil() as usize;
    let cut = (window_start..=budget)
        .rev()
        .find(|&i| chars[i].is_whitespace())
        .unwrap_or(budget);

    let head: String = chars[..cut].iter().collect();
    format!("{}{}", head.trim_end(), settings.ellipsis)
}

/// Largest whole point size, from `max_pt` down to `min_pt`, at which `text`
/// is predicted to fit a `width_in` x `height_in` box. Assumes about nine
/// characters per inch at 12 pt and a line height of 1.3x the font size.
pub fn estimate_fit_font_size(text: &str, width_in: f64, height_in: f64, max_pt: f64, min_pt: f64) -> f64 {
    if text.is_empty() || width_in <= 0.0 || height_in <= 0.0 {
        return max_pt;
    }

    let (high, low) = (max_pt as i64, min_pt as i64);
    for size in (low.max(1)..=high).rev() {
        let size_f = size as f64;
        let chars_per_inch = (9.0 * (12.0 / size_f)).max(1.0);
        let chars_per_line = (width_in * chars_per_inch) as usize;
        if chars_per_line < 1 {
            continue;
        }
        let line_height_in = size_f / 72.0 * 1.3;
        let max_lines = ((height_in / line_height_in) as usize).max(1);

        let lines_needed: usize = text
            .split('\n')
            .map(|para| {
                if para.trim().is_empty() {
                    1
                } else {
                    para.chars().count().div_ceil(chars_per_line).max(1)
                }
            })
            .sum();
        if lines_needed <= max_lines {
            return size_f;
        }
    }
    min_pt
}
