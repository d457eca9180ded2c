use crate::error::{Result, SlidesmithError};
use crate::xml::XmlDocument;
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::read::ZipArchive;
use zip::write::ZipWriter;
use zip::CompressionMethod;

use super::content_types::{is_xml_content_type, ContentTypes};
use super::parts::{Part, PartPayload};
use super::relationships::{relationship_types, Relationships};
use super::uri;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const ROOT_RELS_PART: &str = "_rels/.rels";

/// An OPC package held fully in memory: every part with its payload and its
/// own relationship set, plus the content-type table and package-level
/// relationships.
#[derive(Clone)]
pub struct Package {
    parts: BTreeMap<String, Part>,
    content_types: ContentTypes,
    root_rels: Relationships,
}

impl Package {
    pub fn new() -> Self {
        Self {
            parts: BTreeMap::new(),
            content_types: ContentTypes::new(),
            root_rels: Relationships::new(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let cursor = Cursor::new(bytes);
        let mut archive = ZipArchive::new(cursor)?;

        let mut entries: HashMap<String, Vec<u8>> = HashMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut content = Vec::new();
            file.read_to_end(&mut content)?;
            entries.insert(name, content);
        }

        let content_types = match entries.remove(CONTENT_TYPES_PART) {
            Some(bytes) => ContentTypes::from_bytes(&bytes)?,
            None => {
                return Err(SlidesmithError::InvalidPackage {
                    message: "missing [Content_Types].xml".to_string(),
                })
            }
        };

        let root_rels = match entries.remove(ROOT_RELS_PART) {
            Some(bytes) => Relationships::from_bytes(&bytes)?,
            None => {
                tracing::warn!("package has no _rels/.rels");
                Relationships::new()
            }
        };

        let (rels_entries, part_entries): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|(name, _)| uri::source_part_for_rels(name).is_some());
        let mut rels_by_owner: HashMap<String, Vec<u8>> = rels_entries
            .into_iter()
            .filter_map(|(name, bytes)| uri::source_part_for_rels(&name).map(|owner| (owner, bytes)))
            .collect();

        let mut parts = BTreeMap::new();
        for (name, bytes) in part_entries {
            let content_type = content_types
                .content_type_of(&name)
                .unwrap_or("application/octet-stream")
                .to_string();

            let payload = if is_xml_content_type(&content_type) {
                match crate::xml::parser::parse_bytes(&bytes) {
                    Ok(doc) => PartPayload::Xml(doc),
                    Err(err) => {
                        tracing::warn!(part = %name, error = %err, "keeping unparseable XML part as bytes");
                        PartPayload::Binary(bytes)
                    }
                }
            } else {
                PartPayload::Binary(bytes)
            };

            let rels = match rels_by_owner.remove(&name) {
                Some(rels_bytes) => Relationships::from_bytes(&rels_bytes).unwrap_or_else(|err| {
                    tracing::warn!(part = %name, error = %err, "dropping unreadable relationship part");
                    Relationships::new()
                }),
                None => Relationships::new(),
            };

            parts.insert(
                name.clone(),
                Part {
                    name,
                    content_type,
                    payload,
                    rels,
                },
            );
        }

        for owner in rels_by_owner.keys() {
            tracing::debug!(owner = %owner, "ignoring relationship part without an owner");
        }

        Ok(Self {
            parts,
            content_types,
            root_rels,
        })
    }

    /// Open a package from disk. A missing file is reported as
    /// [`SlidesmithError::SourceNotFound`].
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                SlidesmithError::SourceNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SlidesmithError::Io(err)
            }
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        let mut writer = ZipWriter::new(&mut buffer);
        let options: zip::write::FileOptions<'_, ()> =
            zip::write::FileOptions::default().compression_method(CompressionMethod::Deflated);

        writer.start_file(CONTENT_TYPES_PART, options)?;
        writer.write_all(&self.content_types.to_bytes()?)?;

        writer.start_file(ROOT_RELS_PART, options)?;
        writer.write_all(&self.root_rels.to_bytes()?)?;

        for (name, part) in &self.parts {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(&part.bytes()?)?;

            if !part.rels.is_empty() {
                writer.start_file(uri::rels_path_for(name), options)?;
                writer.write_all(&part.rels.to_bytes()?)?;
            }
        }

        writer.finish()?;
        Ok(buffer.into_inner())
    }

    /// Write the package to `path` atomically; see [`write_atomic`].
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, &self.to_bytes()?)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.get(name)
    }

    pub fn part_mut(&mut self, name: &str) -> Option<&mut Part> {
        self.parts.get_mut(name)
    }

    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    pub fn parts_mut(&mut self) -> impl Iterator<Item = &mut Part> {
        self.parts.values_mut()
    }

    pub fn part_names(&self) -> impl Iterator<Item = &String> {
        self.parts.keys()
    }

    pub fn xml(&self, name: &str) -> Option<&XmlDocument> {
        self.parts.get(name).and_then(|p| p.as_xml())
    }

    pub fn xml_mut(&mut self, name: &str) -> Option<&mut XmlDocument> {
        self.parts.get_mut(name).and_then(|p| p.as_xml_mut())
    }

    /// Like [`xml`](Self::xml) but reports a missing part as an error.
    pub fn require_xml(&self, name: &str) -> Result<&XmlDocument> {
        self.xml(name).ok_or_else(|| SlidesmithError::MissingPart {
            part_path: name.to_string(),
            context: "XML part".to_string(),
        })
    }

    pub fn require_xml_mut(&mut self, name: &str) -> Result<&mut XmlDocument> {
        self.xml_mut(name).ok_or_else(|| SlidesmithError::MissingPart {
            part_path: name.to_string(),
            context: "XML part".to_string(),
        })
    }

    pub fn rels(&self, name: &str) -> Option<&Relationships> {
        self.parts.get(name).map(|p| &p.rels)
    }

    pub fn rels_mut(&mut self, name: &str) -> Option<&mut Relationships> {
        self.parts.get_mut(name).map(|p| &mut p.rels)
    }

    pub fn root_rels(&self) -> &Relationships {
        &self.root_rels
    }

    pub fn root_rels_mut(&mut self) -> &mut Relationships {
        &mut self.root_rels
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    pub fn content_types_mut(&mut self) -> &mut ContentTypes {
        &mut self.content_types
    }

    /// Insert a part and declare its content type. XML parts always get an
    /// override; binary parts rely on an extension default when one matches.
    /// A part already stored under the same name is displaced and returned.
    pub fn add_part(&mut self, part: Part) -> Option<Part> {
        let displaced = self.remove_part(&part.name);
        if displaced.is_some() {
            tracing::warn!(part = %part.name, "replacing an existing part");
        }
        let ext = uri::extension(&part.name);
        let default = ext.as_deref().and_then(|e| self.content_types.default_for(e));
        match (part.is_xml(), ext.as_deref(), default) {
            (false, _, Some(ct)) if ct == part.content_type => {}
            (false, Some(e), None) => self.content_types.ensure_default(e, &part.content_type),
            _ => self.content_types.set_override(&part.name, &part.content_type),
        }
        self.parts.insert(part.name.clone(), part);
        displaced
    }

    /// Remove a part and its content-type override. Relationships pointing
    /// at it from other parts are left for the caller to clean up.
    pub fn remove_part(&mut self, name: &str) -> Option<Part> {
        let part = self.parts.remove(name)?;
        self.content_types.remove_override(name);
        Some(part)
    }

    /// Move a part to a new name, carrying its content-type override.
    pub fn rename_part(&mut self, old: &str, new: &str) -> bool {
        if self.parts.contains_key(new) {
            return false;
        }
        let Some(mut part) = self.remove_part(old) else {
            return false;
        };
        part.name = new.to_string();
        self.add_part(part);
        true
    }

    /// Absolute name of the part an internal relationship points at.
    pub fn related_part_name(&self, source: &str, rel_id: &str) -> Option<String> {
        let rels = if source.is_empty() {
            &self.root_rels
        } else {
            self.rels(source)?
        };
        let rel = rels.get(rel_id)?;
        if rel.is_external() {
            return None;
        }
        Some(uri::resolve_target(source, &rel.target))
    }

    /// Add an internal relationship from `source` to `target` and return
    /// its id.
    pub fn relate(&mut self, source: &str, target: &str, rel_type: &str) -> Result<String> {
        let relative = uri::relative_target(source, target);
        if source.is_empty() {
            return Ok(self.root_rels.add(rel_type, &relative));
        }
        let rels = self.rels_mut(source).ok_or_else(|| SlidesmithError::MissingPart {
            part_path: source.to_string(),
            context: "relationship source".to_string(),
        })?;
        Ok(rels.add(rel_type, &relative))
    }

    /// The package's main part (`ppt/presentation.xml` for a deck).
    pub fn main_part_name(&self) -> Option<String> {
        self.root_rels
            .first_of_type(relationship_types::OFFICE_DOCUMENT)
            .map(|rel| uri::resolve_target("", &rel.target))
    }
}

/// Write `bytes` to `path` through a temporary file in the same directory,
/// replacing the destination only once the write has completed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|err| SlidesmithError::Io(err.error))?;
    Ok(())
}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}
