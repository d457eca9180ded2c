//! Package validation for PresentationML output, read back with `zip` and
//! `roxmltree` independently of the crate under test.
//!
//! Rules enforced:
//!
//! 1. **Required parts**: `[Content_Types].xml` and `_rels/.rels` exist.
//! 2. **Well-formedness**: every XML and relationship part parses.
//! 3. **Content types**: every part is covered by a Default or an Override.
//! 4. **Relationships**: internal targets exist, and every `r:*` attribute in
//!    a part names one of that part's relationships (`r:id=""` is allowed).
//! 5. **ID lists**: `sldMasterIdLst`, `sldIdLst` and each master's
//!    `sldLayoutIdLst` list exactly the ids of the matching relationships.

use roxmltree::Document;
use std::collections::{BTreeSet, HashMap};
use std::io::{Cursor, Read};

const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/";

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
    pub error_type: ValidationErrorType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationErrorType {
    MissingPart,
    InvalidXml,
    BrokenRelationship,
    InvalidContentType,
    IdListMismatch,
}

struct Rel {
    id: String,
    kind: String,
    target: String,
    external: bool,
}

fn error(errors: &mut Vec<ValidationError>, path: &str, message: String, error_type: ValidationErrorType) {
    errors.push(ValidationError {
        path: path.to_string(),
        message,
        error_type,
    });
}

/// `ppt/slides/_rels/slide1.xml.rels` -> `ppt/slides/slide1.xml`;
/// `_rels/.rels` -> the package root (`""`).
fn owner_of(rels_path: &str) -> Option<String> {
    if rels_path == "_rels/.rels" {
        return Some(String::new());
    }
    let (dir, file) = rels_path.rsplit_once("/_rels/")?;
    Some(format!("{}/{}", dir, file.strip_suffix(".rels")?))
}

fn resolve(owner: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match owner.rfind('/') {
        Some(idx) => owner[..idx].split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn parse_rels(xml: &str) -> Option<Vec<Rel>> {
    let doc = Document::parse(xml).ok()?;
    Some(
        doc.descendants()
            .filter(|n| n.has_tag_name("Relationship"))
            .map(|n| Rel {
                id: n.attribute("Id").unwrap_or_default().to_string(),
                kind: n.attribute("Type").unwrap_or_default().to_string(),
                target: n.attribute("Target").unwrap_or_default().to_string(),
                external: n.attribute("TargetMode") == Some("External"),
            })
            .collect(),
    )
}

fn ids_of_kind(rels: &[Rel], kind: &str) -> BTreeSet<String> {
    let full = format!("{}{}", REL_TYPE_BASE, kind);
    rels.iter().filter(|r| r.kind == full).map(|r| r.id.clone()).collect()
}

fn listed_ids(doc: &Document, entry: &str) -> BTreeSet<String> {
    doc.descendants()
        .filter(|n| n.has_tag_name(entry))
        .filter_map(|n| n.attribute((R_NS, "id")))
        .map(str::to_string)
        .collect()
}

/// Validate a `.pptx` archive.
pub fn validate_pptx(bytes: &[u8]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut archive = match zip::ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive,
        Err(e) => {
            error(&mut errors, "", format!("Invalid ZIP archive: {}", e), ValidationErrorType::InvalidXml);
            return ValidationResult { is_valid: false, errors };
        }
    };
    let mut entries: HashMap<String, String> = HashMap::new();
    let mut binaries: Vec<String> = Vec::new();
    for i in 0..archive.len() {
        let Ok(mut file) = archive.by_index(i) else { continue };
        let name = file.name().to_string();
        let mut content = Vec::new();
        if file.read_to_end(&mut content).is_err() {
            continue;
        }
        match String::from_utf8(content) {
            Ok(text) if name.ends_with(".xml") || name.ends_with(".rels") => {
                entries.insert(name, text);
            }
            _ => binaries.push(name),
        }
    }

    for required in ["[Content_Types].xml", "_rels/.rels"] {
        if !entries.contains_key(required) {
            error(&mut errors, required, format!("Missing {}", required), ValidationErrorType::MissingPart);
        }
    }

    // Well-formedness
    for (name, xml) in &entries {
        if let Err(e) = Document::parse(xml) {
            error(&mut errors, name, format!("Malformed XML: {}", e), ValidationErrorType::InvalidXml);
        }
    }

    // Content types
    let mut defaults: HashMap<String, String> = HashMap::new();
    let mut overrides: HashMap<String, String> = HashMap::new();
    if let Some(doc) = entries.get("[Content_Types].xml").and_then(|xml| Document::parse(xml).ok()) {
        for node in doc.descendants() {
            if node.has_tag_name("Default") {
                if let (Some(ext), Some(ct)) = (node.attribute("Extension"), node.attribute("ContentType")) {
                    defaults.insert(ext.to_ascii_lowercase(), ct.to_string());
                }
            } else if node.has_tag_name("Override") {
                if let (Some(part), Some(ct)) = (node.attribute("PartName"), node.attribute("ContentType")) {
                    overrides.insert(part.trim_start_matches('/').to_string(), ct.to_string());
                }
            }
        }
    }
    let all_parts: BTreeSet<String> = entries.keys().chain(binaries.iter()).cloned().collect();
    for part in &all_parts {
        if part == "[Content_Types].xml" {
            continue;
        }
        let ext = part.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()).unwrap_or_default();
        if !overrides.contains_key(part) && !defaults.contains_key(&ext) {
            error(&mut errors, part, "No content type declared".to_string(), ValidationErrorType::InvalidContentType);
        }
    }
    for part in overrides.keys() {
        if !all_parts.contains(part) {
            error(&mut errors, part, "Override for a missing part".to_string(), ValidationErrorType::InvalidContentType);
        }
    }

    // Relationships
    let mut rels_by_owner: HashMap<String, Vec<Rel>> = HashMap::new();
    for (name, xml) in entries.iter().filter(|(n, _)| n.ends_with(".rels")) {
        let (Some(owner), Some(rels)) = (owner_of(name), parse_rels(xml)) else {
            continue;
        };
        for rel in rels.iter().filter(|r| !r.external) {
            let target = resolve(&owner, &rel.target);
            if !all_parts.contains(&target) {
                error(
                    &mut errors,
                    name,
                    format!("{} targets missing part {}", rel.id, target),
                    ValidationErrorType::BrokenRelationship,
                );
            }
        }
        rels_by_owner.insert(owner, rels);
    }
    for (name, xml) in entries.iter().filter(|(n, _)| n.ends_with(".xml")) {
        let Ok(doc) = Document::parse(xml) else { continue };
        let known: BTreeSet<&str> = rels_by_owner
            .get(name)
            .map(|rels| rels.iter().map(|r| r.id.as_str()).collect())
            .unwrap_or_default();
        for node in doc.descendants().filter(|n| n.is_element()) {
            for attr in node.attributes().filter(|a| a.namespace() == Some(R_NS)) {
                if !attr.value().is_empty() && !known.contains(attr.value()) {
                    error(
                        &mut errors,
                        name,
                        format!("r:{}=\"{}\" has no relationship", attr.name(), attr.value()),
                        ValidationErrorType::BrokenRelationship,
                    );
                }
            }
        }
    }

    // ID lists
    let empty = Vec::new();
    for (name, xml) in &entries {
        let Ok(doc) = Document::parse(xml) else { continue };
        let root = doc.root_element();
        let rels = rels_by_owner.get(name).unwrap_or(&empty);
        let checks: &[(&str, &str)] = match root.tag_name().name() {
            "presentation" => &[("sldMasterId", "slideMaster"), ("sldId", "slide")],
            "sldMaster" => &[("sldLayoutId", "slideLayout")],
            _ => &[],
        };
        for (entry, kind) in checks {
            let listed = listed_ids(&doc, entry);
            let related = ids_of_kind(rels, kind);
            if listed != related {
                error(
                    &mut errors,
                    name,
                    format!("{} entries {:?} do not match {} relationships {:?}", entry, listed, kind, related),
                    ValidationErrorType::IdListMismatch,
                );
            }
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Panic with every validation error when `bytes` is not a valid deck.
pub fn assert_valid_pptx(bytes: &[u8], context: &str) {
    let result = validate_pptx(bytes);
    if !result.is_valid {
        let messages: Vec<_> = result
            .errors
            .iter()
            .map(|e| format!("  - [{:?}] {}: {}", e.error_type, e.path, e.message))
            .collect();
        panic!("pptx validation failed for {}:\n{}", context, messages.join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_walks_parent_segments() {
        assert_eq!(resolve("ppt/slides/slide1.xml", "../media/image1.png"), "ppt/media/image1.png");
        assert_eq!(resolve("", "ppt/presentation.xml"), "ppt/presentation.xml");
        assert_eq!(resolve("ppt/presentation.xml", "/ppt/slides/slide2.xml"), "ppt/slides/slide2.xml");
    }

    #[test]
    fn owner_of_rels_paths() {
        assert_eq!(owner_of("_rels/.rels").as_deref(), Some(""));
        assert_eq!(
            owner_of("ppt/slides/_rels/slide1.xml.rels").as_deref(),
            Some("ppt/slides/slide1.xml")
        );
    }

    #[test]
    fn validate_detects_invalid_zip() {
        let result = validate_pptx(b"not a zip");
        assert!(!result.is_valid);
    }
}
