//! Package Repair Engine: prune what no slide reaches, keep ID lists and
//! relationships in agreement, compact media and fill in metadata parts
//! some consumers insist on.

pub mod doc_props;
pub mod fonts;
pub mod id_lists;
pub mod media;
pub mod reachability;
pub mod settings;

pub use doc_props::inject_doc_props;
pub use fonts::strip_embedded_fonts;
pub use id_lists::{fix_notes_master_list, sync_id_lists};
pub use media::{compact_media, dedup_media, retarget, CompactStats};
pub use reachability::{prune_unused, used_parts, PruneStats};
pub use settings::RepairSettings;

use crate::error::Result;
use crate::package::{write_atomic, Package};
use serde::Serialize;
use std::path::Path;

/// What a repair run changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepairReport {
    pub original_bytes: u64,
    pub final_bytes: u64,
    pub layouts_removed: usize,
    pub masters_removed: usize,
    pub themes_removed: usize,
    pub media_removed: usize,
    pub media_deduplicated: usize,
    pub media_compressed: usize,
    pub bytes_saved: u64,
    pub fonts_removed: usize,
    pub id_list_entries_fixed: usize,
    pub notes_master_fixed: bool,
    pub doc_props_injected: bool,
}

/// Run a phase that may fail without sinking the whole repair.
fn phase<T: Default>(name: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|err| {
        tracing::warn!(phase = name, error = %err, "repair phase failed, continuing");
        T::default()
    })
}

/// Repair `pkg` in place.
pub fn repair_package(pkg: &mut Package, settings: &RepairSettings) -> Result<RepairReport> {
    let mut report = RepairReport::default();

    if settings.strip_fonts {
        report.fonts_removed = phase("fonts", strip_embedded_fonts(pkg));
    }

    let pruned = phase("prune", prune_unused(pkg));
    report.layouts_removed = pruned.layouts.len();
    report.masters_removed = pruned.masters.len();
    report.themes_removed = pruned.themes.len();
    report.media_removed = pruned.media.len();

    report.id_list_entries_fixed = phase("id lists", sync_id_lists(pkg));
    report.notes_master_fixed = phase("notes master", fix_notes_master_list(pkg));

    if settings.compress_images {
        let compacted = compact_media(pkg, settings);
        report.media_compressed = compacted.compressed;
        report.bytes_saved = compacted.bytes_saved;
    }
    report.media_deduplicated = dedup_media(pkg);

    if settings.inject_doc_props {
        report.doc_props_injected = phase(
            "doc props",
            inject_doc_props(pkg, chrono::Utc::now(), &settings.application_name),
        );
    }
    Ok(report)
}

/// Repair a serialized package, returning the new bytes and the report.
pub fn repair_bytes(bytes: &[u8], settings: &RepairSettings) -> Result<(Vec<u8>, RepairReport)> {
    let mut pkg = Package::from_bytes(bytes)?;
    let mut report = repair_package(&mut pkg, settings)?;
    let output = pkg.to_bytes()?;
    report.original_bytes = bytes.len() as u64;
    report.final_bytes = output.len() as u64;
    Ok((output, report))
}

/// Repair the package at `input`, writing to `output` (or back over
/// `input`). The destination is only replaced once the new package has been
/// written completely.
pub fn repair_file(input: &Path, output: Option<&Path>, settings: &RepairSettings) -> Result<RepairReport> {
    let bytes = std::fs::read(input).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => crate::error::SlidesmithError::SourceNotFound {
            path: input.display().to_string(),
        },
        _ => err.into(),
    })?;
    let (repaired, report) = repair_bytes(&bytes, settings)?;
    let destination = output.unwrap_or(input);
    write_atomic(destination, &repaired)?;

    tracing::info!(
        path = %destination.display(),
        original_bytes = report.original_bytes,
        final_bytes = report.final_bytes,
        layouts_removed = report.layouts_removed,
        media_removed = report.media_removed,
        media_deduplicated = report.media_deduplicated,
        "repaired package"
    );
    Ok(report)
}
