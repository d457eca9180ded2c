//! Media compaction: flatten large GIFs, downscale oversized rasters and
//! collapse byte-identical media onto one part.

use super::settings::RepairSettings;
use crate::error::Result;
use crate::hash::sha256_hash_bytes;
use crate::package::content_type_values as ctv;
use crate::package::{uri, Package, Part, PartPayload};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::collections::HashMap;
use std::io::Cursor;

const MEDIA_DIR: &str = "ppt/media/";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompactStats {
    pub compressed: usize,
    pub bytes_saved: u64,
}

fn media_names(pkg: &Package) -> Vec<String> {
    let mut names: Vec<String> = pkg
        .part_names()
        .filter(|name| name.starts_with(MEDIA_DIR))
        .cloned()
        .collect();
    names.sort();
    names
}

/// Re-encode media per `settings`. A failure on one image is logged and
/// leaves that image as it was.
pub fn compact_media(pkg: &mut Package, settings: &RepairSettings) -> CompactStats {
    let mut stats = CompactStats::default();
    for name in media_names(pkg) {
        let Some(original) = pkg.part(&name).and_then(|p| p.as_binary()).map(<[u8]>::to_vec) else {
            continue;
        };
        let ext = uri::extension(&name).unwrap_or_default();
        let outcome = match ext.as_str() {
            "gif" if original.len() > settings.gif_threshold_bytes => {
                flatten_gif(pkg, &name, &original, settings)
            }
            "png" | "jpg" | "jpeg" if original.len() > settings.raster_threshold_bytes => {
                let format = if ext == "png" { ImageFormat::Png } else { ImageFormat::Jpeg };
                shrink_in_place(pkg, &name, &original, format, settings)
            }
            _ => Ok(None),
        };
        match outcome {
            Ok(Some(saved)) => {
                stats.compressed += 1;
                stats.bytes_saved += saved;
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(media = %name, error = %err, "could not recompress media"),
        }
    }
    if stats.compressed > 0 {
        tracing::info!(images = stats.compressed, bytes_saved = stats.bytes_saved, "compressed media");
    }
    stats
}

/// Replace a GIF with a PNG of its first frame when that is smaller.
fn flatten_gif(
    pkg: &mut Package,
    name: &str,
    original: &[u8],
    settings: &RepairSettings,
) -> Result<Option<u64>> {
    let img = image::load_from_memory_with_format(original, ImageFormat::Gif)?;
    let img = fit_within(DynamicImage::ImageRgba8(img.to_rgba8()), settings.max_image_dimension);
    let png = encode(&img, ImageFormat::Png)?;
    if png.len() >= original.len() {
        return Ok(None);
    }

    let new_name = png_name_for(pkg, name);
    let saved = (original.len() - png.len()) as u64;
    pkg.remove_part(name);
    pkg.add_part(Part::binary(&new_name, ctv::PNG, png));
    retarget(pkg, name, &new_name);
    tracing::debug!(from = %name, to = %new_name, "flattened gif");
    Ok(Some(saved))
}

/// Downscale a PNG or JPEG whose longest edge exceeds the limit, keeping the
/// result only when it saves enough.
fn shrink_in_place(
    pkg: &mut Package,
    name: &str,
    original: &[u8],
    format: ImageFormat,
    settings: &RepairSettings,
) -> Result<Option<u64>> {
    let img = image::load_from_memory_with_format(original, format)?;
    let (width, height) = img.dimensions();
    if width.max(height) <= settings.max_image_dimension {
        return Ok(None);
    }
    let img = fit_within(img, settings.max_image_dimension);
    let img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img,
    };
    let smaller = encode(&img, format)?;
    if (smaller.len() as f64) >= original.len() as f64 * settings.min_savings_ratio {
        return Ok(None);
    }

    let saved = (original.len() - smaller.len()) as u64;
    if let Some(part) = pkg.part_mut(name) {
        part.payload = PartPayload::Binary(smaller);
    }
    Ok(Some(saved))
}

fn fit_within(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width.max(height) > max_dimension {
        img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        img
    }
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format)?;
    Ok(buffer.into_inner())
}

/// `base.png`, or `base_c1.png`, `base_c2.png`, ... when taken.
fn png_name_for(pkg: &Package, gif: &str) -> String {
    let dir = uri::directory(gif);
    let file = uri::file_name(gif);
    let base = file.rsplit_once('.').map(|(b, _)| b).unwrap_or(file);
    let join = |file: String| {
        if dir.is_empty() {
            file
        } else {
            format!("{}/{}", dir, file)
        }
    };

    let mut candidate = join(format!("{}.png", base));
    let mut suffix = 1;
    while pkg.contains(&candidate) {
        candidate = join(format!("{}_c{}.png", base, suffix));
        suffix += 1;
    }
    candidate
}

/// Point every relationship that resolves to `old` at `new` instead.
pub fn retarget(pkg: &mut Package, old: &str, new: &str) -> usize {
    let mut changed = 0;
    for part in pkg.parts_mut() {
        let owner = part.name.clone();
        for rel in part.rels.iter_mut().filter(|r| !r.is_external()) {
            if uri::resolve_target(&owner, &rel.target) == old {
                rel.target = uri::relative_target(&owner, new);
                changed += 1;
            }
        }
    }
    for rel in pkg.root_rels_mut().iter_mut().filter(|r| !r.is_external()) {
        if uri::resolve_target("", &rel.target) == old {
            rel.target = uri::relative_target("", new);
            changed += 1;
        }
    }
    changed
}

/// Collapse media parts with identical bytes onto the first in name order.
/// Returns the number of parts removed.
pub fn dedup_media(pkg: &mut Package) -> usize {
    let mut canonical: HashMap<String, String> = HashMap::new();
    let mut duplicates = Vec::new();
    for name in media_names(pkg) {
        let Some(bytes) = pkg.part(&name).and_then(|p| p.as_binary()) else {
            continue;
        };
        let hash = sha256_hash_bytes(bytes);
        match canonical.get(&hash) {
            Some(first) => duplicates.push((name, first.clone())),
            None => {
                canonical.insert(hash, name);
            }
        }
    }

    for (duplicate, keep) in &duplicates {
        retarget(pkg, duplicate, keep);
        pkg.remove_part(duplicate);
        tracing::debug!(duplicate = %duplicate, kept = %keep, "deduplicated media");
    }
    if !duplicates.is_empty() {
        tracing::info!(removed = duplicates.len(), "deduplicated media");
    }
    duplicates.len()
}
