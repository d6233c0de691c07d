//! Paragraph (`w:pPr`) and run (`w:rPr`) properties.
//!
//! Both wrap the raw property element so unknown properties survive a round
//! trip. Setters insert children in schema order.

use crate::xml::XmlNode;

/// Child order of `w:pPr` (CT_PPr).
const PPR_ORDER: &[&str] = &[
    "w:pStyle",
    "w:keepNext",
    "w:keepLines",
    "w:pageBreakBefore",
    "w:framePr",
    "w:widowControl",
    "w:numPr",
    "w:suppressLineNumbers",
    "w:pBdr",
    "w:shd",
    "w:tabs",
    "w:suppressAutoHyphens",
    "w:kinsoku",
    "w:wordWrap",
    "w:overflowPunct",
    "w:topLinePunct",
    "w:autoSpaceDE",
    "w:autoSpaceDN",
    "w:bidi",
    "w:adjustRightInd",
    "w:snapToGrid",
    "w:spacing",
    "w:ind",
    "w:contextualSpacing",
    "w:mirrorIndents",
    "w:suppressOverlap",
    "w:jc",
    "w:textDirection",
    "w:textAlignment",
    "w:textboxTightWrap",
    "w:outlineLvl",
    "w:divId",
    "w:cnfStyle",
    "w:rPr",
    "w:sectPr",
    "w:pPrChange",
];

/// Child order of `w:rPr` (CT_RPr).
const RPR_ORDER: &[&str] = &[
    "w:rStyle",
    "w:rFonts",
    "w:b",
    "w:bCs",
    "w:i",
    "w:iCs",
    "w:caps",
    "w:smallCaps",
    "w:strike",
    "w:dstrike",
    "w:outline",
    "w:shadow",
    "w:emboss",
    "w:imprint",
    "w:noProof",
    "w:snapToGrid",
    "w:vanish",
    "w:webHidden",
    "w:color",
    "w:spacing",
    "w:w",
    "w:kern",
    "w:position",
    "w:sz",
    "w:szCs",
    "w:highlight",
    "w:u",
    "w:effect",
    "w:bdr",
    "w:shd",
    "w:fitText",
    "w:vertAlign",
    "w:rtl",
    "w:cs",
    "w:em",
    "w:lang",
    "w:eastAsianLayout",
    "w:specVanish",
    "w:oMath",
];

/// Paragraph justification (`w:jc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justification {
    Left,
    Center,
    Right,
    Both,
}

impl Justification {
    fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Both => "both",
        }
    }

    /// Map an HTML `align` value; `justify` becomes [`Justification::Both`].
    pub fn from_html(align: &str) -> Option<Self> {
        match align.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            "justify" | "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// Vertical alignment of a run (`w:vertAlign`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Superscript,
    Subscript,
}

/// Paragraph properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphProps {
    node: XmlNode,
}

impl Default for ParagraphProps {
    fn default() -> Self {
        Self {
            node: XmlNode::new("w:pPr"),
        }
    }
}

impl ParagraphProps {
    pub(crate) fn from_xml(node: XmlNode) -> Self {
        Self { node }
    }

    pub(crate) fn to_xml(&self) -> Option<XmlNode> {
        (!self.node.is_bare()).then(|| self.node.clone())
    }

    pub fn style(&self) -> Option<&str> {
        self.node.child_attr("w:pStyle", "w:val")
    }

    pub fn set_style(&mut self, style: &str) {
        self.child("w:pStyle").set_attr("w:val", style);
    }

    pub fn num_id(&self) -> Option<u32> {
        self.node
            .child("w:numPr")?
            .child_attr("w:numId", "w:val")?
            .parse()
            .ok()
    }

    /// Bind the paragraph to a numbering instance.
    pub fn set_numbering(&mut self, num_id: u32, level: u32) {
        *self.child("w:numPr") = XmlNode::new("w:numPr")
            .with_child(XmlNode::new("w:ilvl").with_attr("w:val", level.to_string()))
            .with_child(XmlNode::new("w:numId").with_attr("w:val", num_id.to_string()));
    }

    /// Spacing before/after in twips. `None` leaves the attribute untouched.
    pub fn set_spacing(&mut self, before: Option<u32>, after: Option<u32>) {
        let spacing = self.child("w:spacing");
        if let Some(before) = before {
            spacing.set_attr("w:before", before.to_string());
        }
        if let Some(after) = after {
            spacing.set_attr("w:after", after.to_string());
        }
    }

    pub fn spacing_before(&self) -> Option<u32> {
        self.node.child_attr("w:spacing", "w:before")?.parse().ok()
    }

    pub fn spacing_after(&self) -> Option<u32> {
        self.node.child_attr("w:spacing", "w:after")?.parse().ok()
    }

    /// Line spacing in 240ths of a line.
    pub fn set_line_spacing(&mut self, line: u32) {
        let spacing = self.child("w:spacing");
        spacing.set_attr("w:line", line.to_string());
        spacing.set_attr("w:lineRule", "auto");
    }

    pub fn set_indent_left(&mut self, twips: i64) {
        self.child("w:ind").set_attr("w:left", twips.to_string());
    }

    pub fn indent_left(&self) -> Option<i64> {
        self.node.child_attr("w:ind", "w:left")?.parse().ok()
    }

    pub fn set_indent_first_line(&mut self, twips: i64) {
        self.child("w:ind").set_attr("w:firstLine", twips.to_string());
    }

    pub fn set_justification(&mut self, justification: Justification) {
        self.child("w:jc").set_attr("w:val", justification.as_str());
    }

    pub fn justification(&self) -> Option<&str> {
        self.node.child_attr("w:jc", "w:val")
    }

    pub fn page_break_before(&self) -> bool {
        self.node
            .child("w:pageBreakBefore")
            .is_some_and(|node| is_on(node.attr("w:val")))
    }

    pub fn set_page_break_before(&mut self, on: bool) {
        if on {
            let node = self.child("w:pageBreakBefore");
            node.remove_attr("w:val");
        } else {
            self.node.remove_children("w:pageBreakBefore");
        }
    }

    fn child(&mut self, name: &str) -> &mut XmlNode {
        self.node.ensure_child_ordered(name, PPR_ORDER)
    }
}

/// Run properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProps {
    node: XmlNode,
}

impl Default for RunProps {
    fn default() -> Self {
        Self {
            node: XmlNode::new("w:rPr"),
        }
    }
}

impl RunProps {
    pub(crate) fn from_xml(node: XmlNode) -> Self {
        Self { node }
    }

    pub(crate) fn to_xml(&self) -> Option<XmlNode> {
        (!self.node.is_bare()).then(|| self.node.clone())
    }

    pub fn set_style(&mut self, style: &str) {
        self.child("w:rStyle").set_attr("w:val", style);
    }

    pub fn set_font(&mut self, font: &str) {
        let fonts = self.child("w:rFonts");
        fonts.set_attr("w:ascii", font);
        fonts.set_attr("w:hAnsi", font);
        fonts.set_attr("w:hint", "default");
    }

    pub fn set_bold(&mut self, on: bool) {
        self.toggle("w:b", on);
    }

    pub fn is_bold(&self) -> bool {
        self.is_toggled("w:b")
    }

    pub fn set_italic(&mut self, on: bool) {
        self.toggle("w:i", on);
    }

    pub fn is_italic(&self) -> bool {
        self.is_toggled("w:i")
    }

    pub fn set_caps(&mut self, on: bool) {
        self.toggle("w:caps", on);
    }

    pub fn set_strike(&mut self, on: bool) {
        self.toggle("w:strike", on);
    }

    pub fn is_strike(&self) -> bool {
        self.is_toggled("w:strike")
    }

    /// Colour as `RRGGBB` without `#`.
    pub fn set_color(&mut self, color: &str) {
        self.child("w:color").set_attr("w:val", color);
    }

    pub fn color(&self) -> Option<&str> {
        self.node.child_attr("w:color", "w:val")
    }

    /// Font size in points. Written as half-points to `w:sz` and `w:szCs`.
    pub fn set_size(&mut self, points: u32) {
        let half_points = (points * 2).to_string();
        self.child("w:sz").set_attr("w:val", half_points.clone());
        self.child("w:szCs").set_attr("w:val", half_points);
    }

    /// Font size in points, when set.
    pub fn size(&self) -> Option<u32> {
        self.node
            .child_attr("w:sz", "w:val")?
            .parse::<u32>()
            .ok()
            .map(|half| half / 2)
    }

    pub fn set_highlight(&mut self, color: &str) {
        self.child("w:highlight").set_attr("w:val", color);
    }

    pub fn highlight(&self) -> Option<&str> {
        self.node.child_attr("w:highlight", "w:val")
    }

    /// Single underline.
    pub fn set_underline(&mut self, on: bool) {
        if on {
            self.child("w:u").set_attr("w:val", "single");
        } else {
            self.node.remove_children("w:u");
        }
    }

    pub fn is_underlined(&self) -> bool {
        self.node
            .child_attr("w:u", "w:val")
            .is_some_and(|val| val != "none")
    }

    pub fn set_vertical_align(&mut self, align: VerticalAlign) {
        let value = match align {
            VerticalAlign::Superscript => "superscript",
            VerticalAlign::Subscript => "subscript",
        };
        self.child("w:vertAlign").set_attr("w:val", value);
    }

    pub fn vertical_align(&self) -> Option<&str> {
        self.node.child_attr("w:vertAlign", "w:val")
    }

    fn toggle(&mut self, name: &str, on: bool) {
        if on {
            self.child(name).remove_attr("w:val");
        } else {
            self.node.remove_children(name);
        }
    }

    fn is_toggled(&self, name: &str) -> bool {
        self.node
            .child(name)
            .is_some_and(|node| is_on(node.attr("w:val")))
    }

    fn child(&mut self, name: &str) -> &mut XmlNode {
        self.node.ensure_child_ordered(name, RPR_ORDER)
    }
}

/// OOXML on/off value: absent means on.
fn is_on(value: Option<&str>) -> bool {
    !matches!(value, Some("0" | "false" | "off"))
}
