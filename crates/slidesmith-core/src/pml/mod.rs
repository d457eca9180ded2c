//! PresentationML: slide cloning, content replacement and the deck-level
//! helpers they build on.

pub mod classify;
pub mod clone;
pub mod import;
pub mod layout_import;
pub mod notes;
pub mod presentation;
pub mod remap;
pub mod replace;
pub mod settings;
pub mod shapes;

#[cfg(test)]
pub(crate) mod fixtures;

pub use classify::{classify, ShapeMetrics, ShapeRole};
pub use clone::clone_slide;
pub use import::RelationshipImporter;
pub use layout_import::{import_layout, import_master};
pub use notes::set_speaker_notes;
pub use presentation::{add_slide, slide_part_names, slide_size, strip_slides};
pub use remap::{relationship_refs, remap_ids, settle_refs, RelationshipRef};
pub use replace::{
    clear_shape_text, estimate_fit_font_size, populate_heuristic, populate_slide,
    populate_with_zones, replace_shape_text, truncate_text, ReplaceOutcome,
};
pub use settings::{CloneSettings, ReplaceSettings, EMU_PER_INCH};
pub use shapes::{text_shapes, TextShape};
