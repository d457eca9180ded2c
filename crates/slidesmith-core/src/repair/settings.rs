use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairSettings {
    /// Re-encode large animated GIFs and downscale oversized rasters.
    pub compress_images: bool,
    /// Remove embedded font data and the flag asking consumers to use it.
    pub strip_fonts: bool,
    /// GIFs larger than this many bytes are flattened to a PNG first frame.
    pub gif_threshold_bytes: usize,
    /// PNG and JPEG images larger than this many bytes are candidates for
    /// downscaling.
    pub raster_threshold_bytes: usize,
    /// Longest edge, in pixels, after downscaling.
    pub max_image_dimension: u32,
    /// A downscaled raster is kept only when smaller than this fraction of
    /// the original.
    pub min_savings_ratio: f64,
    /// Synthesize `docProps/core.xml` and `docProps/app.xml` when missing.
    pub inject_doc_props: bool,
    /// Written to `Application` in a synthesized `docProps/app.xml`.
    pub application_name: String,
}

impl Default for RepairSettings {
    fn default() -> Self {
        Self {
            compress_images: true,
            strip_fonts: true,
            gif_threshold_bytes: 100_000,
            raster_threshold_bytes: 500_000,
            max_image_dimension: 1920,
            min_savings_ratio: 0.8,
            inject_doc_props: true,
            application_name: "Slidesmith".to_string(),
        }
    }
}

impl RepairSettings {
    pub fn without_compression() -> Self {
        Self {
            compress_images: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_partial_json() {
        let settings = RepairSettings::default();
        assert!(settings.compress_images);
        assert_eq!(settings.gif_threshold_bytes, 100_000);
        assert_eq!(settings.max_image_dimension, 1920);

        let parsed: RepairSettings = serde_json::from_str(r#"{ "compress_images": false }"#).unwrap();
        assert!(!parsed.compress_images);
        assert!(parsed.strip_fonts);
        assert!(!RepairSettings::without_compression().compress_images);
    }
}
