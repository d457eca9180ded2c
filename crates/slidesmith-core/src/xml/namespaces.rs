#![allow(non_snake_case)]

use super::xname::XName;

/// PresentationML.
pub mod P {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

    pub fn presentation() -> XName { XName::new(NS, "presentation") }
    pub fn sld() -> XName { XName::new(NS, "sld") }
    pub fn sldLayout() -> XName { XName::new(NS, "sldLayout") }
    pub fn sldMaster() -> XName { XName::new(NS, "sldMaster") }
    pub fn notes() -> XName { XName::new(NS, "notes") }
    pub fn cSld() -> XName { XName::new(NS, "cSld") }
    pub fn bg() -> XName { XName::new(NS, "bg") }
    pub fn clrMap() -> XName { XName::new(NS, "clrMap") }
    pub fn clrMapOvr() -> XName { XName::new(NS, "clrMapOvr") }
    pub fn spTree() -> XName { XName::new(NS, "spTree") }
    pub fn nvGrpSpPr() -> XName { XName::new(NS, "nvGrpSpPr") }
    pub fn grpSpPr() -> XName { XName::new(NS, "grpSpPr") }
    pub fn sp() -> XName { XName::new(NS, "sp") }
    pub fn pic() -> XName { XName::new(NS, "pic") }
    pub fn grpSp() -> XName { XName::new(NS, "grpSp") }
    pub fn graphicFrame() -> XName { XName::new(NS, "graphicFrame") }
    pub fn cxnSp() -> XName { XName::new(NS, "cxnSp") }
    pub fn contentPart() -> XName { XName::new(NS, "contentPart") }
    pub fn nvSpPr() -> XName { XName::new(NS, "nvSpPr") }
    pub fn nvPicPr() -> XName { XName::new(NS, "nvPicPr") }
    pub fn nvGraphicFramePr() -> XName { XName::new(NS, "nvGraphicFramePr") }
    pub fn nvCxnSpPr() -> XName { XName::new(NS, "nvCxnSpPr") }
    pub fn cNvPr() -> XName { XName::new(NS, "cNvPr") }
    pub fn cNvSpPr() -> XName { XName::new(NS, "cNvSpPr") }
    pub fn cNvGrpSpPr() -> XName { XName::new(NS, "cNvGrpSpPr") }
    pub fn nvPr() -> XName { XName::new(NS, "nvPr") }
    pub fn ph() -> XName { XName::new(NS, "ph") }
    pub fn spPr() -> XName { XName::new(NS, "spPr") }
    pub fn xfrm() -> XName { XName::new(NS, "xfrm") }
    pub fn txBody() -> XName { XName::new(NS, "txBody") }
    pub fn sldIdLst() -> XName { XName::new(NS, "sldIdLst") }
    pub fn sldId() -> XName { XName::new(NS, "sldId") }
    pub fn sldMasterIdLst() -> XName { XName::new(NS, "sldMasterIdLst") }
    pub fn sldMasterId() -> XName { XName::new(NS, "sldMasterId") }
    pub fn sldLayoutIdLst() -> XName { XName::new(NS, "sldLayoutIdLst") }
    pub fn sldLayoutId() -> XName { XName::new(NS, "sldLayoutId") }
    pub fn notesMasterIdLst() -> XName { XName::new(NS, "notesMasterIdLst") }
    pub fn notesMasterId() -> XName { XName::new(NS, "notesMasterId") }
    pub fn handoutMasterIdLst() -> XName { XName::new(NS, "handoutMasterIdLst") }
    pub fn embeddedFontLst() -> XName { XName::new(NS, "embeddedFontLst") }
    pub fn sldSz() -> XName { XName::new(NS, "sldSz") }
}

/// DrawingML.
pub mod A {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

    pub fn p() -> XName { XName::new(NS, "p") }
    pub fn pPr() -> XName { XName::new(NS, "pPr") }
    pub fn r() -> XName { XName::new(NS, "r") }
    pub fn rPr() -> XName { XName::new(NS, "rPr") }
    pub fn br() -> XName { XName::new(NS, "br") }
    pub fn fld() -> XName { XName::new(NS, "fld") }
    pub fn t() -> XName { XName::new(NS, "t") }
    pub fn endParaRPr() -> XName { XName::new(NS, "endParaRPr") }
    pub fn bodyPr() -> XName { XName::new(NS, "bodyPr") }
    pub fn lstStyle() -> XName { XName::new(NS, "lstStyle") }
    pub fn latin() -> XName { XName::new(NS, "latin") }
    pub fn solidFill() -> XName { XName::new(NS, "solidFill") }
    pub fn srgbClr() -> XName { XName::new(NS, "srgbClr") }
    pub fn off() -> XName { XName::new(NS, "off") }
    pub fn ext() -> XName { XName::new(NS, "ext") }
    pub fn xfrm() -> XName { XName::new(NS, "xfrm") }
    pub fn blip() -> XName { XName::new(NS, "blip") }
    pub fn hlinkClick() -> XName { XName::new(NS, "hlinkClick") }
    pub fn hlinkHover() -> XName { XName::new(NS, "hlinkHover") }
}

/// Relationship references embedded in part XML (`r:id`, `r:embed`, ...).
pub mod R {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    pub fn id() -> XName { XName::new(NS, "id") }
    pub fn embed() -> XName { XName::new(NS, "embed") }
}

/// Package relationship files (`*.rels`).
pub mod PR {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

    pub fn Relationships() -> XName { XName::new(NS, "Relationships") }
    pub fn Relationship() -> XName { XName::new(NS, "Relationship") }
}

/// `[Content_Types].xml`.
pub mod CT {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

    pub fn Types() -> XName { XName::new(NS, "Types") }
    pub fn Default() -> XName { XName::new(NS, "Default") }
    pub fn Override() -> XName { XName::new(NS, "Override") }
}

pub mod MC {
    pub const NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
}

pub mod CP {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";

    pub fn coreProperties() -> XName { XName::new(NS, "coreProperties") }
}

pub mod DC {
    use super::XName;
    pub const NS: &str = "http://purl.org/dc/elements/1.1/";

    pub fn title() -> XName { XName::new(NS, "title") }
}

pub mod DCTERMS {
    use super::XName;
    pub const NS: &str = "http://purl.org/dc/terms/";

    pub fn created() -> XName { XName::new(NS, "created") }
    pub fn modified() -> XName { XName::new(NS, "modified") }
}

pub mod XSI {
    use super::XName;
    pub const NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

    pub fn r#type() -> XName { XName::new(NS, "type") }
}

/// Extended (application) properties, `docProps/app.xml`.
pub mod EP {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";

    pub fn Properties() -> XName { XName::new(NS, "Properties") }
    pub fn Application() -> XName { XName::new(NS, "Application") }
}

/// Conventional prefix for a namespace URI, used when the serializer has to
/// declare a namespace that is not in scope.
pub fn conventional_prefix(namespace: &str) -> Option<&'static str> {
    let prefix = match namespace {
        P::NS => "p",
        A::NS => "a",
        R::NS => "r",
        MC::NS => "mc",
        CP::NS => "cp",
        DC::NS => "dc",
        DCTERMS::NS => "dcterms",
        XSI::NS => "xsi",
        "http://schemas.openxmlformats.org/drawingml/2006/picture" => "pic",
        "http://schemas.openxmlformats.org/drawingml/2006/chart" => "c",
        "http://schemas.openxmlformats.org/drawingml/2006/diagram" => "dgm",
        "http://schemas.microsoft.com/office/powerpoint/2010/main" => "p14",
        "http://schemas.microsoft.com/office/powerpoint/2012/main" => "p15",
        "http://schemas.microsoft.com/office/drawing/2010/main" => "a14",
        "http://schemas.microsoft.com/office/drawing/2014/main" => "a16",
        "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes" => "vt",
        _ => return None,
    };
    Some(prefix)
}
