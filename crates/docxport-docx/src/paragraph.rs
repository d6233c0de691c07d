//! Paragraphs, hyperlinks and runs.

use crate::props::{ParagraphProps, RunProps};
use crate::xml::{XmlChild, XmlNode};

/// A `w:p` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    /// Attributes of the `w:p` element (revision ids and the like).
    pub attrs: Vec<(String, String)>,
    pub props: ParagraphProps,
    pub content: Vec<Inline>,
}

/// Content of a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Run(Run),
    Hyperlink(Hyperlink),
    /// Anything else (bookmarks, fields, content controls), kept verbatim.
    Raw(XmlNode),
}

/// A `w:hyperlink` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hyperlink {
    pub attrs: Vec<(String, String)>,
    pub runs: Vec<Run>,
}

impl Hyperlink {
    /// External hyperlink bound to a relationship id.
    #[must_use]
    pub fn external(relationship_id: &str) -> Self {
        Self {
            attrs: vec![("r:id".to_owned(), relationship_id.to_owned())],
            runs: Vec::new(),
        }
    }

    pub fn relationship_id(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == "r:id")
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }
}

/// A `w:r` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub attrs: Vec<(String, String)>,
    pub props: RunProps,
    pub content: Vec<RunContent>,
}

/// Content of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    /// A `w:t` text segment.
    Text(String),
    Break(BreakKind),
    Tab,
    Drawing(XmlNode),
    Raw(XmlNode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    Line,
    Page,
}

impl Paragraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paragraph with the given style.
    #[must_use]
    pub fn styled(style: &str) -> Self {
        let mut paragraph = Self::default();
        paragraph.props.set_style(style);
        paragraph
    }

    /// Builder-style run append.
    #[must_use]
    pub fn with_run(mut self, run: Run) -> Self {
        self.content.push(Inline::Run(run));
        self
    }

    pub fn push_run(&mut self, run: Run) {
        self.content.push(Inline::Run(run));
    }

    pub fn push_hyperlink(&mut self, hyperlink: Hyperlink) {
        self.content.push(Inline::Hyperlink(hyperlink));
    }

    /// Runs directly in the paragraph, excluding hyperlink runs.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|inline| match inline {
            Inline::Run(run) => Some(run),
            Inline::Hyperlink(_) | Inline::Raw(_) => None,
        })
    }

    pub fn last_run_mut(&mut self) -> Option<&mut Run> {
        self.content.iter_mut().rev().find_map(|inline| match inline {
            Inline::Run(run) => Some(run),
            Inline::Hyperlink(_) | Inline::Raw(_) => None,
        })
    }

    /// Visible text, hyperlinks included.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for inline in &self.content {
            match inline {
                Inline::Run(run) => out.push_str(&run.text()),
                Inline::Hyperlink(link) => out.push_str(&link.text()),
                Inline::Raw(_) => {}
            }
        }
        out
    }

    /// Whether the paragraph has no inline content at all.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub(crate) fn from_xml(node: XmlNode) -> Self {
        let mut paragraph = Self {
            attrs: node.attrs,
            ..Self::default()
        };
        for child in node.children {
            let XmlChild::Element(element) = child else {
                continue;
            };
            match element.name.as_str() {
                "w:pPr" => paragraph.props = ParagraphProps::from_xml(element),
                "w:r" => paragraph.content.push(Inline::Run(Run::from_xml(element))),
                "w:hyperlink" => paragraph
                    .content
                    .push(Inline::Hyperlink(Hyperlink::from_xml(element))),
                _ => paragraph.content.push(Inline::Raw(element)),
            }
        }
        paragraph
    }

    pub(crate) fn to_xml(&self) -> XmlNode {
        let mut node = XmlNode::new("w:p");
        node.attrs.clone_from(&self.attrs);
        if let Some(props) = self.props.to_xml() {
            node.children.push(XmlChild::Element(props));
        }
        for inline in &self.content {
            let element = match inline {
                Inline::Run(run) => run.to_xml(),
                Inline::Hyperlink(link) => link.to_xml(),
                Inline::Raw(raw) => raw.clone(),
            };
            node.children.push(XmlChild::Element(element));
        }
        node
    }
}

impl Hyperlink {
    fn from_xml(node: XmlNode) -> Self {
        let runs = node
            .children
            .into_iter()
            .filter_map(|child| match child {
                XmlChild::Element(element) if element.name == "w:r" => Some(Run::from_xml(element)),
                _ => None,
            })
            .collect();
        Self {
            attrs: node.attrs,
            runs,
        }
    }

    fn to_xml(&self) -> XmlNode {
        let mut node = XmlNode::new("w:hyperlink");
        node.attrs.clone_from(&self.attrs);
        node.children
            .extend(self.runs.iter().map(|run| XmlChild::Element(run.to_xml())));
        node
    }
}

impl Run {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run holding a single text segment.
    #[must_use]
    pub fn text_run(text: impl Into<String>) -> Self {
        Self {
            content: vec![RunContent::Text(text.into())],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.props.set_bold(true);
        self
    }

    #[must_use]
    pub fn italic(mut self) -> Self {
        self.props.set_italic(true);
        self
    }

    #[must_use]
    pub fn size(mut self, points: u32) -> Self {
        self.props.set_size(points);
        self
    }

    #[must_use]
    pub fn color(mut self, color: &str) -> Self {
        self.props.set_color(color);
        self
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.content.push(RunContent::Text(text.into()));
    }

    pub fn push_break(&mut self) {
        self.content.push(RunContent::Break(BreakKind::Line));
    }

    /// Concatenated text segments.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|content| match content {
                RunContent::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_drawing(&self) -> bool {
        self.content
            .iter()
            .any(|content| matches!(content, RunContent::Drawing(_)))
    }

    pub(crate) fn from_xml(node: XmlNode) -> Self {
        let mut run = Self {
            attrs: node.attrs,
            ..Self::default()
        };
        for child in node.children {
            let XmlChild::Element(element) = child else {
                continue;
            };
            let content = match element.name.as_str() {
                "w:rPr" => {
                    run.props = RunProps::from_xml(element);
                    continue;
                }
                "w:t" => RunContent::Text(element.text_content()),
                "w:tab" if element.attrs.is_empty() => RunContent::Tab,
                "w:br" => match element.attr("w:type") {
                    None | Some("textWrapping") if element.attrs.len() <= 1 => {
                        RunContent::Break(BreakKind::Line)
                    }
                    Some("page") if element.attrs.len() == 1 => RunContent::Break(BreakKind::Page),
                    _ => RunContent::Raw(element),
                },
                "w:drawing" => RunContent::Drawing(element),
                _ => RunContent::Raw(element),
            };
            run.content.push(content);
        }
        run
    }

    pub(crate) fn to_xml(&self) -> XmlNode {
        let mut node = XmlNode::new("w:r");
        node.attrs.clone_from(&self.attrs);
        if let Some(props) = self.props.to_xml() {
            node.children.push(XmlChild::Element(props));
        }
        for content in &self.content {
            let element = match content {
                RunContent::Text(text) => XmlNode::new("w:t")
                    .with_attr("xml:space", "preserve")
                    .with_text(text.clone()),
                RunContent::Break(BreakKind::Line) => XmlNode::new("w:br"),
                RunContent::Break(BreakKind::Page) => {
                    XmlNode::new("w:br").with_attr("w:type", "page")
                }
                RunContent::Tab => XmlNode::new("w:tab"),
                RunContent::Drawing(raw) | RunContent::Raw(raw) => raw.clone(),
            };
            node.children.push(XmlChild::Element(element));
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_paragraph_from_xml() {
        let source = br#"<w:p w14:paraId="01"><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:bookmarkStart w:id="0"/><w:r><w:rPr><w:b/></w:rPr><w:t>Hello </w:t><w:br/><w:t>world</w:t></w:r><w:hyperlink r:id="rId9"><w:r><w:t>link</w:t></w:r></w:hyperlink></w:p>"#;
        let paragraph = Paragraph::from_xml(xml::parse(source).unwrap());

        assert_eq!(paragraph.props.style(), Some("Title"));
        assert_eq!(paragraph.content.len(), 3);
        assert!(matches!(paragraph.content[0], Inline::Raw(_)));
        let run = paragraph.runs().next().unwrap();
        assert!(run.props.is_bold());
        assert_eq!(
            run.content,
            vec![
                RunContent::Text("Hello ".to_owned()),
                RunContent::Break(BreakKind::Line),
                RunContent::Text("world".to_owned()),
            ]
        );
        assert_eq!(paragraph.text(), "Hello worldlink");
    }

    #[test]
    fn test_paragraph_round_trip() {
        let source = br#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t xml:space="preserve"> a </w:t><w:tab/></w:r><w:hyperlink r:id="rId3"><w:r><w:t xml:space="preserve">b</w:t></w:r></w:hyperlink></w:p>"#;
        let node = xml::parse(source).unwrap();
        let paragraph = Paragraph::from_xml(node.clone());
        assert_eq!(paragraph.to_xml(), node);
    }

    #[test]
    fn test_page_break_run() {
        let run = Run::from_xml(xml::parse(br#"<w:r><w:br w:type="page"/></w:r>"#).unwrap());
        assert_eq!(run.content, vec![RunContent::Break(BreakKind::Page)]);
    }

    #[test]
    fn test_run_builders() {
        let run = Run::text_run("x").bold().size(12).color("116a78");
        assert!(run.props.is_bold());
        assert_eq!(run.props.size(), Some(12));
        assert_eq!(run.props.color(), Some("116a78"));
        assert_eq!(run.text(), "x");
    }
}
