//! Positional fallback for slides without a content-zone map: decide which
//! text shape receives which piece of content. Pure; nothing is mutated.

use crate::content::SlideContent;
use crate::pml::settings::ReplaceSettings;
use std::cmp::Ordering;

/// The measurements the heuristic looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMetrics {
    pub name: String,
    /// Largest run size in points, 0 when the shape has none.
    pub font_size: f64,
    pub top_in: f64,
    pub area_sq_in: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeRole {
    Title,
    Subtitle,
    DataPoint,
    /// The n-th blank-line-separated chunk of the body text.
    Body(usize),
    Clear,
}

/// Assign a role to every shape. The result holds one `(shape index, role)`
/// pair per input shape: content candidates first, in fill order, then the
/// remaining shapes (all [`ShapeRole::Clear`]) in input order.
pub fn classify(
    shapes: &[ShapeMetrics],
    content: &SlideContent,
    settings: &ReplaceSettings,
) -> Vec<(usize, ShapeRole)> {
    let mut candidates: Vec<usize> = (0..shapes.len())
        .filter(|&i| shapes[i].area_sq_in >= settings.content_area_threshold)
        .collect();
    if candidates.is_empty() {
        candidates = (0..shapes.len()).collect();
        candidates.sort_by(|&a, &b| cmp_f64(shapes[b].area_sq_in, shapes[a].area_sq_in));
        candidates.truncate(settings.fallback_content_shapes);
    }
    candidates.sort_by(|&a, &b| {
        cmp_f64(shapes[b].font_size, shapes[a].font_size)
            .then_with(|| cmp_f64(shapes[a].top_in, shapes[b].top_in))
    });

    let mut roles = Vec::with_capacity(shapes.len());
    let mut queue = candidates.iter().copied().peekable();

    let singles = [
        (content.title_text(), ShapeRole::Title),
        (content.subtitle_text(), ShapeRole::Subtitle),
        (content.data_point(), ShapeRole::DataPoint),
    ];
    for (text, role) in singles {
        if text.is_empty() {
            continue;
        }
        if let Some(idx) = queue.next() {
            roles.push((idx, role));
        }
    }

    let body = content.combined_body();
    if !body.is_empty() {
        let chunks = body.split("\n\n").count();
        for (chunk, idx) in queue.by_ref().enumerate() {
            let role = if chunk < chunks { ShapeRole::Body(chunk) } else { ShapeRole::Clear };
            roles.push((idx, role));
        }
    }

    for idx in 0..shapes.len() {
        if !roles.iter().any(|(assigned, _)| *assigned == idx) {
            roles.push((idx, ShapeRole::Clear));
        }
    }
    roles
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
