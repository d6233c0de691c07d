//! Numbering definitions (`word/numbering.xml`).

use crate::xml::{XmlChild, XmlNode};

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Kind of list created for an HTML `ul`/`ol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Decimal,
}

/// The numbering part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numbering {
    root: XmlNode,
}

impl Default for Numbering {
    fn default() -> Self {
        Self {
            root: XmlNode::new("w:numbering").with_attr("xmlns:w", NS_W),
        }
    }
}

impl Numbering {
    pub(crate) fn from_xml(root: XmlNode) -> Self {
        Self { root }
    }

    pub(crate) fn to_xml(&self) -> &XmlNode {
        &self.root
    }

    /// Whether any list has been defined.
    pub fn is_empty(&self) -> bool {
        self.root.child("w:num").is_none()
    }

    /// Create a fresh abstract numbering and a num bound to it. Returns the num id.
    pub fn add_list(&mut self, kind: ListKind) -> u32 {
        let abstract_id = self.next_id("w:abstractNum", "w:abstractNumId");
        let num_id = self.next_id("w:num", "w:numId");

        let abstract_num = XmlNode::new("w:abstractNum")
            .with_attr("w:abstractNumId", abstract_id.to_string())
            .with_child(XmlNode::new("w:multiLevelType").with_attr("w:val", "singleLevel"))
            .with_child(level(kind));
        let num = XmlNode::new("w:num")
            .with_attr("w:numId", num_id.to_string())
            .with_child(
                XmlNode::new("w:abstractNumId").with_attr("w:val", abstract_id.to_string()),
            );

        // abstractNum entries precede every num entry.
        let abstract_at = self
            .last_position("w:abstractNum")
            .or_else(|| self.last_position("w:numPicBullet"))
            .map_or(0, |index| index + 1);
        self.root
            .children
            .insert(abstract_at, XmlChild::Element(abstract_num));

        let num_at = self
            .last_position("w:num")
            .or_else(|| self.last_position("w:abstractNum"))
            .map_or(self.root.children.len(), |index| index + 1);
        self.root.children.insert(num_at, XmlChild::Element(num));

        num_id
    }

    /// Number format of the first level of a num, e.g. `bullet`.
    pub fn format_of(&self, num_id: u32) -> Option<&str> {
        let num_id = num_id.to_string();
        let abstract_id = self
            .root
            .elements()
            .find(|node| node.name == "w:num" && node.attr("w:numId") == Some(num_id.as_str()))?
            .child_attr("w:abstractNumId", "w:val")?;
        self.root
            .elements()
            .find(|node| node.name == "w:abstractNum" && node.attr("w:abstractNumId") == Some(abstract_id))?
            .child("w:lvl")?
            .child_attr("w:numFmt", "w:val")
    }

    fn next_id(&self, element: &str, attr: &str) -> u32 {
        self.root
            .elements()
            .filter(|node| node.name == element)
            .filter_map(|node| node.attr(attr)?.parse::<u32>().ok())
            .max()
            .map_or(1, |max| max + 1)
    }

    fn last_position(&self, name: &str) -> Option<usize> {
        self.root
            .children
            .iter()
            .rposition(|child| matches!(child, XmlChild::Element(node) if node.name == name))
    }
}

fn level(kind: ListKind) -> XmlNode {
    let (format, text) = match kind {
        ListKind::Bullet => ("bullet", "\u{2022}"),
        ListKind::Decimal => ("decimal", "%1."),
    };
    let mut lvl = XmlNode::new("w:lvl")
        .with_attr("w:ilvl", "0")
        .with_child(XmlNode::new("w:start").with_attr("w:val", "1"))
        .with_child(XmlNode::new("w:numFmt").with_attr("w:val", format))
        .with_child(XmlNode::new("w:lvlText").with_attr("w:val", text))
        .with_child(XmlNode::new("w:lvlJc").with_attr("w:val", "left"))
        .with_child(
            XmlNode::new("w:pPr").with_child(
                XmlNode::new("w:ind")
                    .with_attr("w:left", "720")
                    .with_attr("w:hanging", "360"),
            ),
        );
    if kind == ListKind::Bullet {
        lvl = lvl.with_child(
            XmlNode::new("w:rPr").with_child(
                XmlNode::new("w:rFonts")
                    .with_attr("w:ascii", "Symbol")
                    .with_attr("w:hAnsi", "Symbol")
                    .with_attr("w:hint", "default"),
            ),
        );
    }
    lvl
}
