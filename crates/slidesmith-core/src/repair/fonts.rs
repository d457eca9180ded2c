use crate::error::Result;
use crate::package::content_type_values as ctv;
use crate::package::relationship_types as rt;
use crate::package::{uri, Package};
use crate::pml::presentation;
use crate::xml::namespaces::P;
use crate::xml::XName;
use std::collections::HashSet;

const FONT_EXTENSION: &str = "fntdata";

/// Remove embedded font data, every relationship to it, the presentation's
/// `p:embeddedFontLst` and its `embedTrueTypeFonts` flag. Returns the number
/// of font parts removed.
pub fn strip_embedded_fonts(pkg: &mut Package) -> Result<usize> {
    let fonts: HashSet<String> = pkg
        .parts()
        .filter(|part| {
            part.content_type == ctv::FONT_DATA
                || uri::extension(&part.name).as_deref() == Some(FONT_EXTENSION)
        })
        .map(|part| part.name.clone())
        .collect();
    for name in &fonts {
        pkg.remove_part(name);
    }

    for part in pkg.parts_mut() {
        let owner = part.name.clone();
        part.rels.retain(|rel| {
            rel.rel_type != rt::FONT
                && (rel.is_external() || !fonts.contains(&uri::resolve_target(&owner, &rel.target)))
        });
    }
    pkg.content_types_mut().remove_default(FONT_EXTENSION);

    let pres = presentation::presentation_part(pkg)?;
    let doc = pkg.require_xml_mut(&pres)?;
    if let Some(root) = doc.root() {
        if let Some(list) = doc.first_child_named(root, &P::embeddedFontLst()) {
            doc.remove(list);
        }
        doc.remove_attribute(root, &XName::local("embedTrueTypeFonts"));
    }

    if !fonts.is_empty() {
        tracing::info!(fonts = fonts.len(), "stripped embedded fonts");
    }
    Ok(fonts.len())
}
