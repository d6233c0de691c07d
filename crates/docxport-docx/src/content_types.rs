//! `[Content_Types].xml`.

use crate::xml::{XmlChild, XmlNode};

const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub const CT_NUMBERING: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
pub const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
pub const CT_HEADER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
pub const CT_FOOTER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
pub const CT_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypes {
    root: XmlNode,
}

impl Default for ContentTypes {
    fn default() -> Self {
        let root = XmlNode::new("Types")
            .with_attr("xmlns", NS_CONTENT_TYPES)
            .with_child(default_entry("rels", CT_RELATIONSHIPS))
            .with_child(default_entry("xml", "application/xml"));
        Self { root }
    }
}

impl ContentTypes {
    pub(crate) fn from_xml(root: XmlNode) -> Self {
        Self { root }
    }

    pub(crate) fn to_xml(&self) -> &XmlNode {
        &self.root
    }

    /// Register a content type for a file extension unless one exists.
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        let exists = self.root.elements().any(|node| {
            node.name == "Default"
                && node
                    .attr("Extension")
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        });
        if !exists {
            // Defaults precede overrides.
            let at = self
                .root
                .children
                .iter()
                .position(|child| matches!(child, XmlChild::Element(node) if node.name == "Override"))
                .unwrap_or(self.root.children.len());
            self.root
                .children
                .insert(at, XmlChild::Element(default_entry(extension, content_type)));
        }
    }

    /// Register a content type for one part, replacing any previous one.
    pub fn ensure_override(&mut self, part: &str, content_type: &str) {
        let part_name = format!("/{}", part.trim_start_matches('/'));
        if let Some(node) = self
            .root
            .elements_mut()
            .find(|node| node.name == "Override" && node.attr("PartName") == Some(part_name.as_str()))
        {
            node.set_attr("ContentType", content_type);
            return;
        }
        self.root.children.push(XmlChild::Element(
            XmlNode::new("Override")
                .with_attr("PartName", part_name)
                .with_attr("ContentType", content_type),
        ));
    }

    /// Content type registered for a part, by override then by extension.
    pub fn content_type_of(&self, part: &str) -> Option<&str> {
        let part_name = format!("/{}", part.trim_start_matches('/'));
        let by_override = self
            .root
            .elements()
            .find(|node| node.name == "Override" && node.attr("PartName") == Some(part_name.as_str()))
            .and_then(|node| node.attr("ContentType"));
        by_override.or_else(|| {
            let extension = part.rsplit_once('.')?.1;
            self.root
                .elements()
                .find(|node| {
                    node.name == "Default"
                        && node
                            .attr("Extension")
                            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
                })
                .and_then(|node| node.attr("ContentType"))
        })
    }
}

fn default_entry(extension: &str, content_type: &str) -> XmlNode {
    XmlNode::new("Default")
        .with_attr("Extension", extension)
        .with_attr("ContentType", content_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ensure_default_is_idempotent() {
        let mut types = ContentTypes::default();
        types.ensure_override("word/document.xml", CT_DOCUMENT);
        types.ensure_default("png", "image/png");
        types.ensure_default("PNG", "image/png");

        let names: Vec<&str> = types.to_xml().elements().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Default", "Default", "Default", "Override"]);
        assert_eq!(types.content_type_of("word/media/image1.png"), Some("image/png"));
    }

    #[test]
    fn test_override_wins_over_default() {
        let mut types = ContentTypes::default();
        types.ensure_override("/word/numbering.xml", CT_NUMBERING);
        assert_eq!(types.content_type_of("word/numbering.xml"), Some(CT_NUMBERING));
        assert_eq!(types.content_type_of("word/other.xml"), Some("application/xml"));
    }
}
