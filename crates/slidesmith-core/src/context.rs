//! Build-scoped state shared by every clone in one deck build.

use crate::error::{Result, SlidesmithError};
use crate::package::{uri, Package};
use crate::pml::settings::CloneSettings;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

/// Owns the opened source packages, the imported layout/master caches, the
/// set of part names handed out during this build, and the ID-list counter.
///
/// Create one per target deck and drop it (or call [`clear`](Self::clear))
/// when the build finishes.
#[derive(Default)]
pub struct BuildContext {
    pub settings: CloneSettings,
    sources: HashMap<String, Rc<Package>>,
    layouts: HashMap<(String, String), String>,
    masters: HashMap<(String, String), String>,
    names: NameAllocator,
    next_list_id: Option<u32>,
}

impl BuildContext {
    pub fn new(settings: CloneSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Register an already-loaded source package under `key`, so clones can
    /// refer to it by that name without touching the filesystem.
    pub fn insert_source(&mut self, key: &str, package: Package) {
        self.sources.insert(key.to_string(), Rc::new(package));
    }

    /// Open (or reuse) a source package. Returns the identity key used for
    /// caching alongside the package.
    pub fn source(&mut self, path: &Path) -> Result<(String, Rc<Package>)> {
        let raw = path.display().to_string();
        if let Some(pkg) = self.sources.get(&raw) {
            return Ok((raw, Rc::clone(pkg)));
        }

        let key = std::fs::canonicalize(path)
            .map(|p| p.display().to_string())
            .map_err(|_| SlidesmithError::SourceNotFound { path: raw.clone() })?;
        if let Some(pkg) = self.sources.get(&key) {
            return Ok((key, Rc::clone(pkg)));
        }

        let pkg = Rc::new(Package::open(path)?);
        tracing::debug!(source = %key, "opened source package");
        self.sources.insert(key.clone(), Rc::clone(&pkg));
        Ok((key, pkg))
    }

    pub fn cached_layout(&self, source: &str, layout: &str) -> Option<&str> {
        self.layouts
            .get(&(source.to_string(), layout.to_string()))
            .map(|s| s.as_str())
    }

    pub fn cache_layout(&mut self, source: &str, layout: &str, imported: &str) {
        self.layouts
            .insert((source.to_string(), layout.to_string()), imported.to_string());
    }

    pub fn cached_master(&self, source: &str, master: &str) -> Option<&str> {
        self.masters
            .get(&(source.to_string(), master.to_string()))
            .map(|s| s.as_str())
    }

    pub fn cache_master(&mut self, source: &str, master: &str, imported: &str) {
        self.masters
            .insert((source.to_string(), master.to_string()), imported.to_string());
    }

    /// Reserve a part name in `target` that collides with neither an
    /// existing part nor any name handed out earlier in this build.
    pub fn allocate_part_name(&mut self, target: &Package, original: &str) -> String {
        self.names.allocate(target, original)
    }

    /// Next `sldMasterId` / `sldLayoutId` value. The counter is seeded lazily
    /// from `existing_max` the first time it is needed.
    pub fn allocate_list_id(&mut self, existing_max: impl FnOnce() -> u32) -> u32 {
        let next = match self.next_list_id {
            Some(id) => id,
            None => self.settings.list_id_seed.max(existing_max()).saturating_add(1),
        };
        self.next_list_id = Some(next.saturating_add(1));
        next
    }

    pub fn imported_layout_count(&self) -> usize {
        self.layouts.len()
    }

    pub fn imported_master_count(&self) -> usize {
        self.masters.len()
    }

    /// Number of part names handed out so far in this build.
    pub fn allocated_part_count(&self) -> usize {
        self.names.len()
    }

    /// Drop every cache so the next build starts clean.
    pub fn clear(&mut self) {
        self.sources.clear();
        self.layouts.clear();
        self.masters.clear();
        self.names.clear();
        self.next_list_id = None;
    }
}

/// Part-name allocation tracked across a whole build.
#[derive(Default)]
pub struct NameAllocator {
    allocated: HashSet<String>,
}

impl NameAllocator {
    pub fn allocate(&mut self, package: &Package, original: &str) -> String {
        let taken = |name: &str, allocated: &HashSet<String>| {
            package.contains(name) || allocated.contains(name)
        };

        if !taken(original, &self.allocated) {
            self.allocated.insert(original.to_string());
            return original.to_string();
        }

        let file = uri::file_name(original);
        let (stem, ext) = match file.rfind('.') {
            Some(idx) => (
                &original[..original.len() - (file.len() - idx)],
                &file[idx..],
            ),
            None => (original, ""),
        };
        let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let prefix = &stem[..stem.len() - digits];

        let mut idx = if digits > 0 {
            package
                .part_names()
                .chain(self.allocated.iter())
                .filter_map(|name| trailing_number(name.strip_prefix(prefix)?))
                .max()
                .unwrap_or(0)
                + 1
        } else {
            1
        };

        loop {
            let candidate = format!("{}{}{}", prefix, idx, ext);
            if !taken(&candidate, &self.allocated) {
                self.allocated.insert(candidate.clone());
                return candidate;
            }
            idx += 1;
        }
    }

    pub fn is_allocated(&self, name: &str) -> bool {
        self.allocated.contains(name)
    }

    pub fn len(&self) -> usize {
        self.allocated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocated.is_empty()
    }

    pub fn clear(&mut self) {
        self.allocated.clear();
    }
}

/// Parse `"12.xml"` (digits, then an extension) into 12.
fn trailing_number(rest: &str) -> Option<u64> {
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let tail = &rest[end..];
    if !(tail.is_empty() || (tail.starts_with('.') && !tail[1..].contains('/'))) {
        return None;
    }
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Part;

    fn package_with(names: &[&str]) -> Package {
        let mut pkg = Package::new();
        for name in names {
            pkg.add_part(Part::binary(name, "image/png", vec![0]));
        }
        pkg
    }

    #[test]
    fn free_name_is_used_as_is() {
        let pkg = package_with(&[]);
        let mut names = NameAllocator::default();
        assert_eq!(names.allocate(&pkg, "ppt/media/image3.png"), "ppt/media/image3.png");
        assert!(names.is_allocated("ppt/media/image3.png"));
    }

    #[test]
    fn numbered_names_increment_past_highest() {
        let pkg = package_with(&["ppt/media/image1.png", "ppt/media/image7.jpeg"]);
        let mut names = NameAllocator::default();
        assert_eq!(names.allocate(&pkg, "ppt/media/image1.png"), "ppt/media/image8.png");
        assert_eq!(names.allocate(&pkg, "ppt/media/image1.png"), "ppt/media/image9.png");
    }

    #[test]
    fn reservations_count_before_parts_exist() {
        let pkg = package_with(&[]);
        let mut names = NameAllocator::default();
        let first = names.allocate(&pkg, "ppt/slideLayouts/slideLayout1.xml");
        let second = names.allocate(&pkg, "ppt/slideLayouts/slideLayout1.xml");
        assert_eq!(first, "ppt/slideLayouts/slideLayout1.xml");
        assert_eq!(second, "ppt/slideLayouts/slideLayout2.xml");
    }

    #[test]
    fn unnumbered_names_get_a_suffix() {
        let pkg = package_with(&["ppt/media/logo.png"]);
        let mut names = NameAllocator::default();
        assert_eq!(names.allocate(&pkg, "ppt/media/logo.png"), "ppt/media/logo1.png");
    }

    #[test]
    fn list_ids_are_seeded_above_existing() {
        let mut ctx = BuildContext::default();
        assert_eq!(ctx.allocate_list_id(|| 2_147_483_649), 2_147_484_001);
        assert_eq!(ctx.allocate_list_id(|| unreachable!()), 2_147_484_002);

        let mut ctx = BuildContext::default();
        assert_eq!(ctx.allocate_list_id(|| 2_147_490_000), 2_147_490_001);
    }

    #[test]
    fn clear_resets_every_cache() {
        let mut ctx = BuildContext::default();
        ctx.insert_source("bank.pptx", Package::new());
        ctx.cache_layout("bank.pptx", "ppt/slideLayouts/slideLayout1.xml", "x");
        ctx.cache_master("bank.pptx", "ppt/slideMasters/slideMaster1.xml", "y");
        ctx.allocate_list_id(|| 0);
        ctx.clear();

        assert!(ctx.cached_layout("bank.pptx", "ppt/slideLayouts/slideLayout1.xml").is_none());
        assert_eq!(ctx.imported_master_count(), 0);
        assert_eq!(ctx.allocate_list_id(|| 0), 2_147_484_001);
        assert!(matches!(
            ctx.source(Path::new("bank.pptx")),
            Err(SlidesmithError::SourceNotFound { .. })
        ));
    }
}
