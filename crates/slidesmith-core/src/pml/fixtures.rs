//! In-memory decks for unit tests.

use super::presentation;
use crate::context::BuildContext;
use crate::package::content_type_values as ctv;
use crate::package::relationship_types as rt;
use crate::package::{Package, Part, PartPayload};
use crate::xml::parser::parse;

pub const NS_DECL: &str = r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

/// A one-master deck with `layouts` layouts and no slides.
pub fn deck(layouts: usize, size: (i64, i64)) -> Package {
    let mut pkg = Package::new();
    pkg.root_rels_mut().add(rt::OFFICE_DOCUMENT, "ppt/presentation.xml");

    let pres = format!(
        r#"<p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
        NS_DECL, size.0, size.1
    );
    let mut part = Part::xml("ppt/presentation.xml", ctv::PRESENTATION, parse(&pres).unwrap());
    part.rels.add(rt::SLIDE_MASTER, "slideMasters/slideMaster1.xml");
    pkg.add_part(part);

    let mut entries = String::new();
    let mut master = Part::xml("ppt/slideMasters/slideMaster1.xml", ctv::SLIDE_MASTER, parse("<x/>").unwrap());
    master.rels.add(rt::THEME, "../theme/theme1.xml");
    for n in 1..=layouts {
        let rid = master.rels.add(rt::SLIDE_LAYOUT, &format!("../slideLayouts/slideLayout{}.xml", n));
        entries.push_str(&format!(r#"<p:sldLayoutId id="{}" r:id="{}"/>"#, 2_147_483_648u32 + n as u32, rid));
    }
    let master_xml = format!(
        r#"<p:sldMaster {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title Placeholder 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="274638"/><a:ext cx="8229600" cy="1143000"/></a:xfrm></p:spPr></p:sp></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1"/><p:sldLayoutIdLst>{}</p:sldLayoutIdLst></p:sldMaster>"#,
        NS_DECL, entries
    );
    master.payload = PartPayload::Xml(parse(&master_xml).unwrap());
    pkg.add_part(master);

    for n in 1..=layouts {
        let xml = format!(
            r#"<p:sldLayout {}><p:cSld name="Layout {}"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp></p:spTree></p:cSld></p:sldLayout>"#,
            NS_DECL, n
        );
        let mut layout = Part::xml(
            &format!("ppt/slideLayouts/slideLayout{}.xml", n),
            ctv::SLIDE_LAYOUT,
            parse(&xml).unwrap(),
        );
        layout.rels.add(rt::SLIDE_MASTER, "../slideMasters/slideMaster1.xml");
        pkg.add_part(layout);
    }

    pkg.add_part(Part::xml(
        "ppt/theme/theme1.xml",
        ctv::THEME,
        parse(r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office"/>"#).unwrap(),
    ));
    pkg
}

/// Append a slide on layout number `layout` whose shape tree holds
/// `shapes` (and whose `cSld` starts with `background`). The slide's layout
/// relationship is `rId1`; extra relationships are added in order from
/// `rId2`.
pub fn push_slide(
    pkg: &mut Package,
    layout: usize,
    background: &str,
    shapes: &str,
    rels: &[(&str, &str, bool)],
) -> String {
    let mut ctx = BuildContext::default();
    let layout = format!("ppt/slideLayouts/slideLayout{}.xml", layout);
    let name = presentation::add_slide(&mut ctx, pkg, &layout).unwrap();
    let xml = format!(
        r#"<p:sld {}><p:cSld>{}<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        NS_DECL, background, shapes
    );
    let part = pkg.part_mut(&name).unwrap();
    part.payload = PartPayload::Xml(parse(&xml).unwrap());
    for (rel_type, target, external) in rels {
        if *external {
            part.rels.get_or_add_external(rel_type, target);
        } else {
            part.rels.add(rel_type, target);
        }
    }
    name
}

pub fn text_shape(id: u32, name: &str, text: &str, size_pt: u32, off: (i64, i64), ext: (i64, i64)) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" sz="{}" b="1"><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill><a:latin typeface="Georgia"/></a:rPr><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        off.0,
        off.1,
        ext.0,
        ext.1,
        size_pt * 100
    )
}

pub fn picture(id: u32, name: &str, embed: &str) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="{name}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{embed}"/></p:blipFill><p:spPr/></p:pic>"#
    )
}
