#![allow(dead_code)]

pub mod validator;

pub use validator::{assert_valid_pptx, validate_pptx, ValidationErrorType, ValidationResult};

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const OFFICE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PML_CT: &str = "application/vnd.openxmlformats-officedocument.presentationml";

pub struct LayoutSpec {
    pub name: String,
    pub image: Option<Vec<u8>>,
}

pub struct SlideSpec {
    pub layout: usize,
    pub shapes: Vec<String>,
    pub image: Option<Vec<u8>>,
    pub hyperlink: Option<String>,
}

/// Builds small but complete `.pptx` archives: one master and theme, the
/// given layouts and slides, optional media and hyperlinks.
pub struct DeckBuilder {
    size: (i64, i64),
    layouts: Vec<LayoutSpec>,
    slides: Vec<SlideSpec>,
    embedded_font: bool,
    notes_master: bool,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self {
            size: (9_144_000, 6_858_000),
            layouts: Vec::new(),
            slides: Vec::new(),
            embedded_font: false,
            notes_master: false,
        }
    }

    pub fn size(mut self, cx: i64, cy: i64) -> Self {
        self.size = (cx, cy);
        self
    }

    pub fn layout(mut self, name: &str) -> Self {
        self.layouts.push(LayoutSpec {
            name: name.to_string(),
            image: None,
        });
        self
    }

    pub fn layout_with_image(mut self, name: &str, image: &[u8]) -> Self {
        self.layouts.push(LayoutSpec {
            name: name.to_string(),
            image: Some(image.to_vec()),
        });
        self
    }

    /// Slide on layout number `layout` (1-based) holding `shapes`.
    pub fn slide(mut self, layout: usize, shapes: &[String]) -> Self {
        self.slides.push(SlideSpec {
            layout,
            shapes: shapes.to_vec(),
            image: None,
            hyperlink: None,
        });
        self
    }

    /// Slide with a picture (`rId2`) and, optionally, a hyperlinked text
    /// shape (`rId3`).
    pub fn rich_slide(mut self, layout: usize, shapes: &[String], image: &[u8], hyperlink: Option<&str>) -> Self {
        self.slides.push(SlideSpec {
            layout,
            shapes: shapes.to_vec(),
            image: Some(image.to_vec()),
            hyperlink: hyperlink.map(str::to_string),
        });
        self
    }

    pub fn embedded_font(mut self) -> Self {
        self.embedded_font = true;
        self
    }

    /// Relate a notes master from the presentation without listing it in
    /// `notesMasterIdLst`.
    pub fn unlisted_notes_master(mut self) -> Self {
        self.notes_master = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut files: Vec<(String, String)> = Vec::new();
        let mut binaries: Vec<(String, Vec<u8>)> = Vec::new();
        let mut overrides: Vec<(String, String)> = Vec::new();

        files.push((
            "_rels/.rels".into(),
            rels(&[("rId1", "officeDocument", "ppt/presentation.xml", false)]),
        ));

        // Presentation
        let mut pres_rels = vec![("rId1".to_string(), "slideMaster", "slideMasters/slideMaster1.xml".to_string())];
        let mut slide_ids = String::new();
        for (i, _) in self.slides.iter().enumerate() {
            let rid = format!("rId{}", i + 2);
            slide_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + i, rid));
            pres_rels.push((rid, "slide", format!("slides/slide{}.xml", i + 1)));
        }
        let mut next = self.slides.len() + 2;
        pres_rels.push((format!("rId{}", next), "theme", "theme/theme1.xml".to_string()));
        next += 1;
        let mut font_list = String::new();
        if self.embedded_font {
            let rid = format!("rId{}", next);
            next += 1;
            font_list = format!(
                r#"<p:embeddedFontLst><p:embeddedFont><p:font typeface="Brand"/><p:regular r:id="{}"/></p:embeddedFont></p:embeddedFontLst>"#,
                rid
            );
            pres_rels.push((rid, "font", "fonts/font1.fntdata".to_string()));
            binaries.push(("ppt/fonts/font1.fntdata".into(), vec![0xAB; 256]));
        }
        if self.notes_master {
            pres_rels.push((format!("rId{}", next), "notesMaster", "notesMasters/notesMaster1.xml".to_string()));
            files.push((
                "ppt/notesMasters/notesMaster1.xml".into(),
                format!(r#"<p:notesMaster {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/></p:notesMaster>"#, NS),
            ));
            files.push((
                "ppt/notesMasters/_rels/notesMaster1.xml.rels".into(),
                rels(&[("rId1", "theme", "../theme/theme1.xml", false)]),
            ));
            overrides.push(("ppt/notesMasters/notesMaster1.xml".into(), format!("{}.notesMaster+xml", PML_CT)));
        }
        let sld_id_lst = if slide_ids.is_empty() {
            String::new()
        } else {
            format!("<p:sldIdLst>{}</p:sldIdLst>", slide_ids)
        };
        let embed_attr = if self.embedded_font { r#" embedTrueTypeFonts="1""# } else { "" };
        files.push((
            "ppt/presentation.xml".into(),
            format!(
                r#"<p:presentation {}{}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{}<p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/>{}</p:presentation>"#,
                NS, embed_attr, sld_id_lst, self.size.0, self.size.1, font_list
            ),
        ));
        let pres_rel_refs: Vec<(&str, &str, &str, bool)> = pres_rels
            .iter()
            .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str(), false))
            .collect();
        files.push(("ppt/_rels/presentation.xml.rels".into(), rels(&pres_rel_refs)));
        overrides.push(("ppt/presentation.xml".into(), format!("{}.presentation.main+xml", PML_CT)));

        // Master and theme
        let mut master_rels = vec![("rId1".to_string(), "theme", "../theme/theme1.xml".to_string())];
        let mut layout_ids = String::new();
        for (i, _) in self.layouts.iter().enumerate() {
            let rid = format!("rId{}", i + 2);
            layout_ids.push_str(&format!(r#"<p:sldLayoutId id="{}" r:id="{}"/>"#, 2_147_483_649u32 + i as u32, rid));
            master_rels.push((rid, "slideLayout", format!("../slideLayouts/slideLayout{}.xml", i + 1)));
        }
        files.push((
            "ppt/slideMasters/slideMaster1.xml".into(),
            format!(
                r#"<p:sldMaster {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title Placeholder 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="274638"/><a:ext cx="8229600" cy="1143000"/></a:xfrm></p:spPr></p:sp></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst>{}</p:sldLayoutIdLst></p:sldMaster>"#,
                NS, layout_ids
            ),
        ));
        let master_rel_refs: Vec<(&str, &str, &str, bool)> = master_rels
            .iter()
            .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str(), false))
            .collect();
        files.push(("ppt/slideMasters/_rels/slideMaster1.xml.rels".into(), rels(&master_rel_refs)));
        overrides.push(("ppt/slideMasters/slideMaster1.xml".into(), format!("{}.slideMaster+xml", PML_CT)));
        files.push((
            "ppt/theme/theme1.xml".into(),
            r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Brand"><a:themeElements/></a:theme>"#.into(),
        ));
        overrides.push((
            "ppt/theme/theme1.xml".into(),
            "application/vnd.openxmlformats-officedocument.theme+xml".into(),
        ));

        // Layouts
        for (i, layout) in self.layouts.iter().enumerate() {
            let n = i + 1;
            let mut layout_rels = vec![("rId1", "slideMaster", "../slideMasters/slideMaster1.xml".to_string(), false)];
            let mut art = String::new();
            if let Some(image) = &layout.image {
                let media = format!("layout{}.png", n);
                layout_rels.push(("rId2", "image", format!("../media/{}", media), false));
                binaries.push((format!("ppt/media/{}", media), image.clone()));
                art = picture(10, "Layout Art", "rId2");
            }
            files.push((
                format!("ppt/slideLayouts/slideLayout{}.xml", n),
                format!(
                    r#"<p:sldLayout {}><p:cSld name="{}"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>{}</p:spTree></p:cSld></p:sldLayout>"#,
                    NS, layout.name, art
                ),
            ));
            let refs: Vec<(&str, &str, &str, bool)> =
                layout_rels.iter().map(|(id, kind, t, e)| (*id, *kind, t.as_str(), *e)).collect();
            files.push((format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", n), rels(&refs)));
            overrides.push((format!("ppt/slideLayouts/slideLayout{}.xml", n), format!("{}.slideLayout+xml", PML_CT)));
        }

        // Slides
        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            let mut slide_rels = vec![(
                "rId1",
                "slideLayout",
                format!("../slideLayouts/slideLayout{}.xml", slide.layout),
                false,
            )];
            let mut extra = String::new();
            if let Some(image) = &slide.image {
                let media = format!("image{}.png", n);
                slide_rels.push(("rId2", "image", format!("../media/{}", media), false));
                binaries.push((format!("ppt/media/{}", media), image.clone()));
                extra.push_str(&picture(20, "Picture", "rId2"));
            }
            if let Some(url) = &slide.hyperlink {
                slide_rels.push(("rId3", "hyperlink", url.clone(), true));
                extra.push_str(&linked_shape(21, "Link", "Read more", "rId3"));
            }
            files.push((
                format!("ppt/slides/slide{}.xml", n),
                format!(
                    r#"<p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
                    NS,
                    slide.shapes.concat(),
                    extra
                ),
            ));
            let refs: Vec<(&str, &str, &str, bool)> =
                slide_rels.iter().map(|(id, kind, t, e)| (*id, *kind, t.as_str(), *e)).collect();
            files.push((format!("ppt/slides/_rels/slide{}.xml.rels", n), rels(&refs)));
            overrides.push((format!("ppt/slides/slide{}.xml", n), format!("{}.slide+xml", PML_CT)));
        }

        let mut types = String::from(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/>"#,
        );
        if self.embedded_font {
            types.push_str(r#"<Default Extension="fntdata" ContentType="application/x-fontdata"/>"#);
        }
        for (part, content_type) in &overrides {
            types.push_str(&format!(r#"<Override PartName="/{}" ContentType="{}"/>"#, part, content_type));
        }
        types.push_str("</Types>");

        let mut buffer = Cursor::new(Vec::new());
        let mut writer = ZipWriter::new(&mut buffer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file("[Content_Types].xml", options).unwrap();
        writer.write_all(types.as_bytes()).unwrap();
        for (name, xml) in &files {
            writer.start_file(name.as_str(), options).unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
        }
        for (name, bytes) in &binaries {
            writer.start_file(name.as_str(), options).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
        buffer.into_inner()
    }
}

impl Default for DeckBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn rels(entries: &[(&str, &str, &str, bool)]) -> String {
    let mut xml = format!(r#"<Relationships xmlns="{}">"#, REL_NS);
    for (id, kind, target, external) in entries {
        let mode = if *external { r#" TargetMode="External""# } else { "" };
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"{}/>"#,
            id, OFFICE_REL, kind, target, mode
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

pub fn text_shape(id: u32, name: &str, text: &str, size_pt: u32, off: (i64, i64), ext: (i64, i64)) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" sz="{}" b="1"><a:solidFill><a:srgbClr val="FFFFFF"/></a:solidFill><a:latin typeface="Georgia"/></a:rPr><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#,
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

fn linked_shape(id: u32, name: &str, text: &str, link: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"><a:hlinkClick r:id="{link}"/></a:rPr><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
    )
}

/// Every entry of a `.pptx` archive, by name.
pub fn entries(bytes: &[u8]) -> HashMap<String, Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut out = HashMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        out.insert(file.name().to_string(), content);
    }
    out
}

pub fn entry_text(bytes: &[u8], name: &str) -> Option<String> {
    entries(bytes)
        .remove(name)
        .map(|content| String::from_utf8(content).unwrap())
}

/// `cSld/@name` of every layout in the archive.
pub fn layout_names(bytes: &[u8]) -> Vec<String> {
    let mut names: Vec<String> = entries(bytes)
        .into_iter()
        .filter(|(name, _)| name.starts_with("ppt/slideLayouts/") && name.ends_with(".xml"))
        .filter_map(|(_, content)| {
            let text = String::from_utf8(content).ok()?;
            let doc = roxmltree::Document::parse(&text).ok()?;
            let name = doc
                .descendants()
                .find(|n| n.has_tag_name("cSld"))?
                .attribute("name")?
                .to_string();
            Some(name)
        })
        .collect();
    names.sort();
    names
}

pub fn media_names(bytes: &[u8]) -> Vec<String> {
    let mut names: Vec<String> = entries(bytes)
        .into_keys()
        .filter(|name| name.starts_with("ppt/media/"))
        .collect();
    names.sort();
    names
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
