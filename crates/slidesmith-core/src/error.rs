use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlidesmithError {
    #[error("Invalid OOXML package: {message}")]
    InvalidPackage { message: String },

    #[error("Missing required part '{part_path}' in {context}")]
    MissingPart { part_path: String, context: String },

    #[error("XML parsing error at {location}: {message}")]
    XmlParse { message: String, location: String },

    #[error("XML serialization error: {0}")]
    XmlWrite(String),

    #[error("Invalid relationship: {message}")]
    InvalidRelationship { message: String },

    #[error("Slide index {index} out of range for {source_name} (has {count} slides)")]
    SlideIndexOutOfRange {
        index: usize,
        count: usize,
        source_name: String,
    },

    #[error("Source package not found: {path}")]
    SourceNotFound { path: String },

    #[error("Image processing failed: {0}")]
    Image(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl SlidesmithError {
    /// True for errors that abort a single clone but let the caller fall back
    /// to composing the slide from a generic layout.
    pub fn is_clone_fallback(&self) -> bool {
        matches!(
            self,
            Self::SlideIndexOutOfRange { .. } | Self::SourceNotFound { .. }
        )
    }
}

impl From<image::ImageError> for SlidesmithError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SlidesmithError>;
