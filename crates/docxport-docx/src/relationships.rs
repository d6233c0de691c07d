//! Package relationships (`*.rels` parts).

use crate::xml::{XmlChild, XmlNode};

const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const REL_NUMBERING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
pub const REL_HEADER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
pub const REL_FOOTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// One `Relationship` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship<'a> {
    pub id: &'a str,
    pub rel_type: &'a str,
    pub target: &'a str,
}

/// A relationships part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationships {
    root: XmlNode,
}

impl Default for Relationships {
    fn default() -> Self {
        Self {
            root: XmlNode::new("Relationships").with_attr("xmlns", NS_RELATIONSHIPS),
        }
    }
}

impl Relationships {
    pub(crate) fn from_xml(root: XmlNode) -> Self {
        Self { root }
    }

    pub(crate) fn to_xml(&self) -> &XmlNode {
        &self.root
    }

    pub fn iter(&self) -> impl Iterator<Item = Relationship<'_>> {
        self.root.elements().filter_map(|node| {
            Some(Relationship {
                id: node.attr("Id")?,
                rel_type: node.attr("Type")?,
                target: node.attr("Target")?,
            })
        })
    }

    /// Targets of all relationships of the given type.
    pub fn targets_of(&self, rel_type: &str) -> Vec<String> {
        self.iter()
            .filter(|rel| rel.rel_type == rel_type)
            .map(|rel| rel.target.to_owned())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Relationship<'_>> {
        self.iter().find(|rel| rel.id == id)
    }

    /// Add an internal relationship and return its id.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        self.push(rel_type, target, false)
    }

    /// Add an external hyperlink relationship and return its id.
    pub fn add_hyperlink(&mut self, url: &str) -> String {
        self.push(REL_HYPERLINK, url, true)
    }

    fn push(&mut self, rel_type: &str, target: &str, external: bool) -> String {
        let id = format!("rId{}", self.next_number());
        let mut node = XmlNode::new("Relationship")
            .with_attr("Id", id.clone())
            .with_attr("Type", rel_type)
            .with_attr("Target", target);
        if external {
            node.set_attr("TargetMode", "External");
        }
        self.root.children.push(XmlChild::Element(node));
        id
    }

    /// One past the largest numeric `rIdN`.
    fn next_number(&self) -> u32 {
        self.iter()
            .filter_map(|rel| rel.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .map_or(1, |max| max + 1)
    }
}

/// Resolve a relationship target against the directory of its source part.
///
/// `word/document.xml` + `media/image1.png` → `word/media/image1.png`.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_owned();
    }
    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();
    for segment in target.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Path of the relationships part for a source part.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_continues_after_largest_id() {
        let source = br#"<Relationships xmlns="urn:r"><Relationship Id="rId3" Type="t" Target="a.xml"/><Relationship Id="rId10" Type="t" Target="b.xml"/><Relationship Id="custom" Type="t" Target="c.xml"/></Relationships>"#;
        let mut rels = Relationships::from_xml(xml::parse(source).unwrap());

        let id = rels.add_hyperlink("https://example.org/a b");

        assert_eq!(id, "rId11");
        let rel = rels.get("rId11").unwrap();
        assert_eq!(rel.rel_type, REL_HYPERLINK);
        assert_eq!(rel.target, "https://example.org/a b");
        let node = rels.to_xml().elements().last().unwrap();
        assert_eq!(node.attr("TargetMode"), Some("External"));
    }

    #[test]
    fn test_first_id_in_empty_part() {
        let mut rels = Relationships::default();
        assert_eq!(rels.add(REL_IMAGE, "media/image1.png"), "rId1");
        assert_eq!(rels.targets_of(REL_IMAGE), vec!["media/image1.png"]);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word/document.xml", "header1.xml"), "word/header1.xml");
        assert_eq!(resolve_target("word/document.xml", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
        assert_eq!(resolve_target("word/document.xml", "/word/footer1.xml"), "word/footer1.xml");
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(rels_path_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_path_for(""), "_rels/.rels");
    }
}
