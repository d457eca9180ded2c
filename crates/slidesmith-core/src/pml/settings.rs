use serde::{Deserialize, Serialize};

/// One inch in EMU (English Metric Units).
pub const EMU_PER_INCH: i64 = 914_400;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneSettings {
    /// Largest width/height difference, in EMU, tolerated between source and
    /// target slide sizes before a mismatch is logged.
    pub dimension_tolerance_emu: i64,
    /// Floor for freshly allocated `sldMasterId` / `sldLayoutId` values.
    pub list_id_seed: u32,
}

impl Default for CloneSettings {
    fn default() -> Self {
        Self {
            dimension_tolerance_emu: 100_000,
            list_id_seed: 2_147_484_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaceSettings {
    /// Shapes at or above this area (square inches) are content candidates
    /// for the heuristic fill.
    pub content_area_threshold: f64,
    /// How many of the largest shapes to use when none reaches the threshold.
    pub fallback_content_shapes: usize,
    /// Cleared shapes are moved this far (inches) past the right slide edge.
    pub off_canvas_margin_in: f64,
    pub min_font_size_pt: f64,
    pub ellipsis: String,
    /// Fraction of the character limit, counted back from the limit, in
    /// which truncation looks for a word boundary.
    pub word_boundary_window: f64,
}

impl Default for ReplaceSettings {
    fn default() -> Self {
        Self {
            content_area_threshold: 1.5,
            fallback_content_shapes: 3,
            off_canvas_margin_in: 10.0,
            min_font_size_pt: 10.0,
            ellipsis: "\u{2026}".to_string(),
            word_boundary_window: 0.4,
        }
    }
}

impl ReplaceSettings {
    pub fn new() -> Self {
        Self::default()
    }
}
