//! Data handed to the content replacer by the surrounding build: the
//! content-zone map of a template slide, the text for the slide being
//! built, and the design system's font guardrails.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    Title,
    #[default]
    Body,
    Subtitle,
    BulletArea,
    DataPoint,
    Caption,
}

/// A named shape on a template slide that receives replacement text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentZone {
    #[serde(default)]
    pub zone_type: ZoneType,
    pub shape_name: String,
    /// (left, top, width, height) in inches.
    pub position: (f64, f64, f64, f64),
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    /// (min, max) font size in points.
    #[serde(default = "default_font_size_range")]
    pub font_size_range: (u32, u32),
}

fn default_max_chars() -> usize {
    200
}

fn default_font_size_range() -> (u32, u32) {
    (10, 44)
}

impl ContentZone {
    pub fn new(zone_type: ZoneType, shape_name: &str, position: (f64, f64, f64, f64)) -> Self {
        Self {
            zone_type,
            shape_name: shape_name.to_string(),
            position,
            max_chars: default_max_chars(),
            font_size_range: default_font_size_range(),
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn with_font_size_range(mut self, min: u32, max: u32) -> Self {
        self.font_size_range = (min, max);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Title,
    Subtitle,
    Body,
    Bullets,
    Quote,
    Caption,
    DataPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub content: String,
}

impl ContentBlock {
    pub fn new(kind: BlockKind, content: &str) -> Self {
        Self {
            kind,
            content: content.to_string(),
        }
    }
}

/// Text for one slide of the deck being built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideContent {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default, rename = "content_blocks")]
    pub blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub speaker_notes: Option<String>,
}

impl SlideContent {
    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn subtitle_text(&self) -> &str {
        self.subtitle.as_deref().unwrap_or("")
    }

    /// Body, bullet and caption blocks joined by blank lines, so the
    /// heuristic fill can split them back into one chunk per shape.
    pub fn combined_body(&self) -> String {
        self.blocks
            .iter()
            .filter(|b| matches!(b.kind, BlockKind::Body | BlockKind::Bullets | BlockKind::Caption))
            .map(|b| b.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn data_point(&self) -> &str {
        self.blocks
            .iter()
            .find(|b| b.kind == BlockKind::DataPoint)
            .map(|b| b.content.as_str())
            .unwrap_or("")
    }
}

/// Fallback font sizes from the design system, used when a zone's shape
/// carries no explicit run size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignGuardrails {
    pub title_font: String,
    pub body_font: String,
    pub title_size: u32,
    pub subtitle_size: u32,
    pub body_size: u32,
}

impl Default for DesignGuardrails {
    fn default() -> Self {
        Self {
            title_font: "Arial".to_string(),
            body_font: "Arial".to_string(),
            title_size: 44,
            subtitle_size: 28,
            body_size: 18,
        }
    }
}

impl DesignGuardrails {
    pub fn size_for(&self, zone_type: ZoneType) -> u32 {
        match zone_type {
            ZoneType::Title | ZoneType::DataPoint => self.title_size,
            ZoneType::Subtitle => self.subtitle_size,
            ZoneType::Body | ZoneType::BulletArea | ZoneType::Caption => self.body_size,
        }
    }

    pub fn font_for(&self, zone_type: ZoneType) -> &str {
        match zone_type {
            ZoneType::Title | ZoneType::DataPoint => &self.title_font,
            _ => &self.body_font,
        }
    }
}

pub fn load_zones(path: &Path) -> Result<Vec<ContentZone>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn load_slide_content(path: &Path) -> Result<SlideContent> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
