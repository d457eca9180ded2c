pub mod content;
pub mod context;
pub mod error;
pub mod hash;
pub mod package;
pub mod pml;
pub mod repair;
pub mod xml;

pub use error::{Result, SlidesmithError};

pub use content::{
    load_slide_content, load_zones, BlockKind, ContentBlock, ContentZone, DesignGuardrails,
    SlideContent, ZoneType,
};
pub use context::BuildContext;
pub use package::{Package, Part, PartPayload};
pub use pml::{
    add_slide, clone_slide, populate_slide, set_speaker_notes, strip_slides, CloneSettings,
    ReplaceOutcome, ReplaceSettings,
};
pub use repair::{repair_bytes, repair_file, repair_package, RepairReport, RepairSettings};
