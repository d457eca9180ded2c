use crate::error::Result;
use crate::package::content_type_values as ctv;
use crate::package::relationship_types as rt;
use crate::package::{Package, Part};
use crate::xml::namespaces::EP;
use crate::xml::parser::parse;
use crate::xml::XmlNodeData;
use chrono::{DateTime, SecondsFormat, Utc};

const CORE_PART: &str = "docProps/core.xml";
const APP_PART: &str = "docProps/app.xml";

fn core_xml(now: DateTime<Utc>) -> String {
    let stamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        concat!(
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties""#,
            r#" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/""#,
            r#" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            r#"<dc:title>Presentation</dc:title>"#,
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{0}</dcterms:created>"#,
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{0}</dcterms:modified>"#,
            r#"</cp:coreProperties>"#
        ),
        stamp
    )
}

const APP_SKELETON: &str = r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"/>"#;

/// Add `docProps/core.xml` and `docProps/app.xml`, with their package
/// relationships, when the package lacks them. Returns whether anything was
/// added.
pub fn inject_doc_props(pkg: &mut Package, now: DateTime<Utc>, application: &str) -> Result<bool> {
    let mut injected = false;

    if pkg.root_rels().first_of_type(rt::CORE_PROPERTIES).is_none() {
        if !pkg.contains(CORE_PART) {
            pkg.add_part(Part::xml(CORE_PART, ctv::CORE_PROPERTIES, parse(&core_xml(now))?));
        }
        pkg.relate("", CORE_PART, rt::CORE_PROPERTIES)?;
        injected = true;
    }

    if pkg.root_rels().first_of_type(rt::EXTENDED_PROPERTIES).is_none() {
        if !pkg.contains(APP_PART) {
            let mut doc = parse(APP_SKELETON)?;
            if let Some(root) = doc.root() {
                let app = doc.add_child(root, XmlNodeData::element(EP::Application()));
                doc.add_child(app, XmlNodeData::text(application));
            }
            pkg.add_part(Part::xml(APP_PART, ctv::EXTENDED_PROPERTIES, doc));
        }
        pkg.relate("", APP_PART, rt::EXTENDED_PROPERTIES)?;
        injected = true;
    }

    if injected {
        tracing::info!("injected missing document properties");
    }
    Ok(injected)
}
