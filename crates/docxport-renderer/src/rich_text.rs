//! HTML to paragraph conversion.
//!
//! Rich-text values are HTML fragments. They are parsed with `kuchiki` and
//! walked depth first; a [`ConverterState`] tracks the paragraph being
//! written, the open inline formatting and the list nesting.
//!
//! Block tags (`p`, shallow `div`, `blockquote`, `li`, and the end of `ul` /
//! `ol`) move to a new paragraph. A paragraph the converter created that is
//! still empty is reused instead of leaving an empty one behind.

use std::sync::LazyLock;

use docxport_docx::{
    Block, Hyperlink, Inline, Justification, ListKind, Paragraph, ParagraphProps, Resources, Run,
    VerticalAlign,
};
use kuchiki::NodeRef;
use kuchiki::iter::NodeEdge;
use kuchiki::traits::TendrilSink;
use regex::Regex;
use url::Url;

/// Twips of indentation per nesting level.
pub const INDENT_STEP: i64 = 400;
const BLOCKQUOTE_INDENT: i64 = 400;
const BASE_FONT_SIZE: u32 = 11;
const SMALL_FONT_SIZE: u32 = 8;
const LINK_COLOR: &str = "0000FF";

static DIV_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<div.*?>").expect("invalid div regex"));

/// Where converted content goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Start a fresh paragraph at the end of the container.
    Append,
    /// Continue writing into the paragraph at this index; new paragraphs
    /// are spliced right after it.
    After(usize),
}

/// Normalize HTML before parsing: newlines become `<br>`. Table cells also
/// flatten `div`s into line breaks.
pub fn prepare_html(html: &str, in_table: bool) -> String {
    let html = if in_table {
        DIV_OPEN.replace_all(html, "\n").replace("</div>", "")
    } else {
        html.to_owned()
    };
    html.replace('\n', "<br>")
}

/// Convert `html` into paragraphs inside `blocks`.
///
/// `indentation` is the nesting depth; paragraphs are indented by
/// [`INDENT_STEP`] twips per level. Returns the index of the last paragraph
/// written.
pub fn insert_html(
    resources: &mut Resources,
    blocks: &mut Vec<Block>,
    at: Insertion,
    html: &str,
    indentation: i64,
) -> usize {
    let (current, fresh) = match at {
        Insertion::After(index)
            if blocks.get(index).and_then(Block::as_paragraph).is_some() =>
        {
            (index, false)
        }
        Insertion::After(index) => {
            let index = (index + 1).min(blocks.len());
            blocks.insert(index, indented(indentation * INDENT_STEP).into());
            (index, true)
        }
        Insertion::Append => {
            blocks.push(indented(indentation * INDENT_STEP).into());
            (blocks.len() - 1, true)
        }
    };

    let paragraph = match blocks.get_mut(current) {
        Some(Block::Paragraph(paragraph)) => std::mem::take(paragraph),
        _ => Paragraph::new(),
    };
    let mut state = ConverterState {
        resources,
        blocks,
        current,
        paragraph,
        fresh,
        base_indent: indentation * INDENT_STEP,
        format: Formatting::default(),
        link: None,
        pending_breaks: 0,
        lists: Vec::new(),
    };

    let document = kuchiki::parse_html().one(html);
    for edge in document.traverse() {
        match edge {
            NodeEdge::Start(node) => state.enter(&node),
            NodeEdge::End(node) => state.exit(&node),
        }
    }
    state.finish()
}

fn indented(twips: i64) -> Paragraph {
    let mut paragraph = Paragraph::new();
    paragraph.props.set_indent_left(twips);
    paragraph
}

/// Counters for open inline formatting tags.
#[derive(Debug, Default)]
struct Formatting {
    italic: u32,
    bold: u32,
    underline: u32,
    small: u32,
    strike: u32,
    mark: u32,
    subscript: u32,
    superscript: u32,
    caps: u32,
    /// One entry per open `font`; `None` when it had no colour.
    colors: Vec<Option<String>>,
    /// Heading font sizes, innermost last.
    sizes: Vec<u32>,
}

impl Formatting {
    fn apply(&self, run: &mut Run) {
        let size = self.sizes.last().copied().unwrap_or(if self.small > 0 {
            SMALL_FONT_SIZE
        } else {
            BASE_FONT_SIZE
        });
        run.props.set_size(size);
        if self.italic > 0 {
            run.props.set_italic(true);
        }
        if self.bold > 0 {
            run.props.set_bold(true);
        }
        if self.underline > 0 {
            run.props.set_underline(true);
        }
        if self.strike > 0 {
            run.props.set_strike(true);
        }
        if self.caps > 0 {
            run.props.set_caps(true);
        }
        if self.mark > 0 {
            run.props.set_highlight("yellow");
        }
        if self.superscript > 0 {
            run.props.set_vertical_align(VerticalAlign::Superscript);
        } else if self.subscript > 0 {
            run.props.set_vertical_align(VerticalAlign::Subscript);
        }
        if let Some(color) = self.colors.iter().rev().find_map(Option::as_deref) {
            run.props.set_color(color);
        }
    }

    fn heading(&mut self, level: u8, open: bool) {
        let (size, bold, caps) = match level {
            1 => (24, false, false),
            2 => (20, false, false),
            3 => (16, false, false),
            4 => (14, true, false),
            5 => (14, false, false),
            _ => (11, true, true),
        };
        if open {
            self.sizes.push(size);
        } else {
            self.sizes.pop();
        }
        if bold {
            toggle(&mut self.bold, open);
        }
        if caps {
            toggle(&mut self.caps, open);
        }
    }
}

fn toggle(counter: &mut u32, open: bool) {
    if open {
        *counter += 1;
    } else {
        *counter = counter.saturating_sub(1);
    }
}

/// State threaded through the traversal.
struct ConverterState<'a> {
    resources: &'a mut Resources,
    blocks: &'a mut Vec<Block>,
    /// Index of the paragraph being written.
    current: usize,
    /// The paragraph being written. Its slot in `blocks` holds an empty
    /// placeholder until [`ConverterState::commit`] puts it back.
    paragraph: Paragraph,
    /// Whether the current paragraph was created by this conversion.
    fresh: bool,
    base_indent: i64,
    format: Formatting,
    /// Index of the open hyperlink inside the current paragraph.
    link: Option<usize>,
    pending_breaks: usize,
    /// Num ids of the open lists, innermost last.
    lists: Vec<u32>,
}

impl ConverterState<'_> {
    fn enter(&mut self, node: &NodeRef) {
        if is_blank(node) {
            return;
        }
        if let Some(text) = node.as_text() {
            let text = collapse_whitespace(&text.borrow());
            self.push_text(&text);
            return;
        }
        let Some(element) = node.as_element() else {
            return;
        };
        let attributes = element.attributes.borrow();
        match &*element.name.local {
            "i" | "em" => self.format.italic += 1,
            "b" | "strong" => self.format.bold += 1,
            "u" | "ins" => self.format.underline += 1,
            "small" => self.format.small += 1,
            "del" | "strike" | "strikethrough" | "s" => self.format.strike += 1,
            "mark" => self.format.mark += 1,
            "sub" => self.format.subscript += 1,
            "sup" => self.format.superscript += 1,
            "font" => self.format.colors.push(
                attributes
                    .get("color")
                    .map(|color| color.trim_start_matches('#').to_owned()),
            ),
            "h1" => self.format.heading(1, true),
            "h2" => self.format.heading(2, true),
            "h3" => self.format.heading(3, true),
            "h4" => self.format.heading(4, true),
            "h5" => self.format.heading(5, true),
            "h6" => self.format.heading(6, true),
            "p" => {
                let align = attributes.get("align").and_then(Justification::from_html);
                self.open_paragraph(self.base_indent, align);
            }
            "div" if is_shallow(node) => {
                let align = attributes.get("align").and_then(Justification::from_html);
                self.open_paragraph(self.base_indent, align);
            }
            "blockquote" => self.open_paragraph(BLOCKQUOTE_INDENT, None),
            "ul" => self.open_list(ListKind::Bullet),
            "ol" => self.open_list(ListKind::Decimal),
            "li" => self.open_list_item(),
            "a" => {
                if let Some(href) = attributes.get("href") {
                    self.open_link(href);
                }
            }
            "br" => self.pending_breaks += 1,
            _ => {}
        }
    }

    fn exit(&mut self, node: &NodeRef) {
        if is_blank(node) {
            return;
        }
        let Some(element) = node.as_element() else {
            return;
        };
        match &*element.name.local {
            "i" | "em" => toggle(&mut self.format.italic, false),
            "b" | "strong" => toggle(&mut self.format.bold, false),
            "u" | "ins" => toggle(&mut self.format.underline, false),
            "small" => toggle(&mut self.format.small, false),
            "del" | "strike" | "strikethrough" | "s" => toggle(&mut self.format.strike, false),
            "mark" => toggle(&mut self.format.mark, false),
            "sub" => toggle(&mut self.format.subscript, false),
            "sup" => toggle(&mut self.format.superscript, false),
            "font" => {
                self.format.colors.pop();
            }
            "h1" => self.format.heading(1, false),
            "h2" => self.format.heading(2, false),
            "h3" => self.format.heading(3, false),
            "h4" => self.format.heading(4, false),
            "h5" => self.format.heading(5, false),
            "h6" => self.format.heading(6, false),
            "p" | "blockquote" => self.open_paragraph(self.base_indent, None),
            "div" if is_shallow(node) => self.open_paragraph(self.base_indent, None),
            "ul" | "ol" => {
                self.open_paragraph(self.base_indent, None);
                self.lists.pop();
            }
            "a" => self.link = None,
            _ => {}
        }
    }

    /// Write the current paragraph back into its slot.
    fn commit(&mut self) {
        let paragraph = std::mem::take(&mut self.paragraph);
        match self.blocks.get_mut(self.current) {
            Some(slot) => *slot = paragraph.into(),
            None => {
                self.blocks.push(paragraph.into());
                self.current = self.blocks.len() - 1;
            }
        }
    }

    fn push_run(&mut self, run: Run) {
        let link = self.link;
        let paragraph = &mut self.paragraph;
        if let Some(Inline::Hyperlink(hyperlink)) = link.and_then(|i| paragraph.content.get_mut(i)) {
            hyperlink.runs.push(run);
        } else {
            paragraph.push_run(run);
        }
    }

    fn new_run(&mut self) -> Run {
        let mut run = Run::new();
        self.format.apply(&mut run);
        if self.link.is_some() {
            run.props.set_color(LINK_COLOR);
            run.props.set_underline(true);
        }
        for _ in 0..std::mem::take(&mut self.pending_breaks) {
            run.push_break();
        }
        run
    }

    fn push_text(&mut self, text: &str) {
        let mut run = self.new_run();
        run.push_text(text);
        self.push_run(run);
    }

    fn flush_breaks(&mut self) {
        if self.pending_breaks > 0 {
            let run = self.new_run();
            self.push_run(run);
        }
    }

    /// Move to a new paragraph with spacing 0 and the given left indent.
    fn open_paragraph(&mut self, indent: i64, align: Option<Justification>) {
        self.open_paragraph_with(indent, align, None);
    }

    fn open_paragraph_with(
        &mut self,
        indent: i64,
        align: Option<Justification>,
        num_id: Option<u32>,
    ) {
        self.flush_breaks();
        self.link = None;

        let reuse = self.fresh && self.paragraph.is_empty();
        if reuse {
            self.paragraph.props = ParagraphProps::default();
        } else {
            self.commit();
            let index = (self.current + 1).min(self.blocks.len());
            self.blocks.insert(index, Paragraph::new().into());
            self.current = index;
            self.fresh = true;
        }

        let paragraph = &mut self.paragraph;
        paragraph.props.set_spacing(Some(0), Some(0));
        paragraph.props.set_indent_left(indent);
        if let Some(align) = align {
            paragraph.props.set_justification(align);
        }
        if let Some(num_id) = num_id {
            paragraph.props.set_numbering(num_id, 0);
        }
    }

    fn open_list(&mut self, kind: ListKind) {
        let num_id = self.resources.numbering.add_list(kind);
        self.lists.push(num_id);
    }

    fn open_list_item(&mut self) {
        let level = i64::try_from(self.lists.len().saturating_sub(1)).unwrap_or(0);
        let num_id = self.lists.last().copied();
        self.open_paragraph_with(level * INDENT_STEP + self.base_indent, None, num_id);
    }

    fn open_link(&mut self, href: &str) {
        let Some(uri) = normalize_uri(href) else {
            tracing::warn!(href, "Cannot create hyperlink");
            self.push_text(&format!("{href} "));
            return;
        };
        let relationship_id = self.resources.add_hyperlink(&uri);
        self.flush_breaks();
        let paragraph = &mut self.paragraph;
        paragraph.push_hyperlink(Hyperlink::external(&relationship_id));
        self.link = Some(paragraph.content.len() - 1);
    }

    fn finish(mut self) -> usize {
        self.flush_breaks();
        self.commit();
        self.current
    }
}

/// Whether a node has no visible text and no line break.
fn is_blank(node: &NodeRef) -> bool {
    let has_break = node
        .inclusive_descendants()
        .any(|n| n.as_element().is_some_and(|e| &*e.name.local == "br"));
    !has_break && node.text_contents().trim().is_empty()
}

/// A `div` whose grandchildren are all leaves; deeper `div`s only group blocks.
fn is_shallow(node: &NodeRef) -> bool {
    !node
        .children()
        .flat_map(|child| child.children())
        .any(|grandchild| grandchild.first_child().is_some())
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Parse a hyperlink target as an absolute URL. Characters a URL cannot
/// carry literally, such as spaces and non-ASCII, come back percent-encoded.
pub(crate) fn normalize_uri(href: &str) -> Option<String> {
    Url::parse(href.trim()).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docxport_docx::{Document, RunContent};
    use pretty_assertions::assert_eq;

    fn convert(html: &str) -> (Document, Vec<Block>, usize) {
        let mut document = Document::new();
        let mut blocks = Vec::new();
        let last = insert_html(
            &mut document.resources,
            &mut blocks,
            Insertion::Append,
            &prepare_html(html, false),
            0,
        );
        (document, blocks, last)
    }

    fn paragraphs(blocks: &[Block]) -> Vec<&Paragraph> {
        blocks.iter().filter_map(Block::as_paragraph).collect()
    }

    fn texts(blocks: &[Block]) -> Vec<String> {
        paragraphs(blocks).iter().map(|p| p.text()).collect()
    }

    #[test]
    fn test_line_break_joins_two_runs() {
        let (_, blocks, last) = convert("line1\nline2");

        assert_eq!(blocks.len(), 1);
        assert_eq!(last, 0);
        let runs: Vec<&Run> = paragraphs(&blocks)[0].runs().collect();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].content, vec![RunContent::Text("line1".to_owned())]);
        assert_eq!(
            runs[1].content,
            vec![
                RunContent::Break(docxport_docx::BreakKind::Line),
                RunContent::Text("line2".to_owned())
            ]
        );
    }

    #[test]
    fn test_paragraphs_do_not_leave_empty_ones() {
        let (_, blocks, _) = convert("<p>first</p><p>second</p>");

        assert_eq!(texts(&blocks), vec!["first", "second", ""]);
        let first = paragraphs(&blocks)[0];
        assert_eq!(first.props.spacing_before(), Some(0));
        assert_eq!(first.props.spacing_after(), Some(0));
    }

    #[test]
    fn test_text_after_block_starts_new_paragraph() {
        let (_, blocks, last) = convert("<p>a</p>b");
        assert_eq!(texts(&blocks), vec!["a", "b"]);
        assert_eq!(last, 1);
    }

    #[test]
    fn test_nested_formatting_accumulates() {
        let (_, blocks, _) = convert("<b>bold <i>both</i></b> plain");

        let runs: Vec<&Run> = paragraphs(&blocks)[0].runs().collect();
        assert_eq!(runs.len(), 3);
        assert!(runs[0].props.is_bold() && !runs[0].props.is_italic());
        assert!(runs[1].props.is_bold() && runs[1].props.is_italic());
        assert!(!runs[2].props.is_bold() && !runs[2].props.is_italic());
        assert!(runs.iter().all(|r| r.props.size() == Some(11)));
    }

    #[test]
    fn test_inline_tags() {
        let (_, blocks, _) = convert(
            "<small>s</small><u>u</u><s>x</s><mark>m</mark><sup>2</sup><font color=\"#ff0000\">red</font><h6>cap</h6>",
        );
        let all: Vec<&Run> = paragraphs(&blocks).into_iter().flat_map(Paragraph::runs).collect();

        let by_text = |t: &str| *all.iter().find(|r| r.text() == t).unwrap();
        assert_eq!(by_text("s").props.size(), Some(8));
        assert!(by_text("u").props.is_underlined());
        assert!(by_text("x").props.is_strike());
        assert_eq!(by_text("m").props.highlight(), Some("yellow"));
        assert_eq!(by_text("2").props.vertical_align(), Some("superscript"));
        assert_eq!(by_text("red").props.color(), Some("ff0000"));
        assert!(by_text("cap").props.is_bold());
        assert_eq!(by_text("cap").props.size(), Some(11));
    }

    #[test]
    fn test_heading_sizes() {
        let (_, blocks, _) = convert("<h1>a</h1><h4>b</h4>");
        let all: Vec<&Run> = paragraphs(&blocks).into_iter().flat_map(Paragraph::runs).collect();
        assert_eq!(all[0].props.size(), Some(24));
        assert_eq!(all[1].props.size(), Some(14));
        assert!(all[1].props.is_bold());
    }

    #[test]
    fn test_lists_get_their_own_numbering() {
        let (document, blocks, _) = convert("<ul><li>one</li><li>two</li></ul><ol><li>first</li></ol>");

        let items: Vec<&Paragraph> = paragraphs(&blocks)
            .into_iter()
            .filter(|p| p.props.num_id().is_some())
            .collect();
        assert_eq!(items.len(), 3);
        let bullets = items[0].props.num_id().unwrap();
        let decimals = items[2].props.num_id().unwrap();
        assert_eq!(items[1].props.num_id(), Some(bullets));
        assert_ne!(bullets, decimals);
        assert_eq!(document.resources.numbering.format_of(bullets), Some("bullet"));
        assert_eq!(document.resources.numbering.format_of(decimals), Some("decimal"));
        assert_eq!(items[0].props.indent_left(), Some(0));
    }

    #[test]
    fn test_nested_list_indent() {
        let mut document = Document::new();
        let mut blocks = Vec::new();
        insert_html(
            &mut document.resources,
            &mut blocks,
            Insertion::Append,
            "<ul><li>a<ul><li>b</li></ul></li></ul>",
            1,
        );
        let b = paragraphs(&blocks).into_iter().find(|p| p.text() == "b").unwrap();
        assert_eq!(b.props.indent_left(), Some(800));
    }

    #[test]
    fn test_hyperlink() {
        let (document, blocks, _) = convert(r#"see <a href="https://example.org/a b">site</a>"#);

        let paragraph = paragraphs(&blocks)[0];
        let Some(Inline::Hyperlink(link)) = paragraph.content.last() else {
            panic!("expected hyperlink, got {:?}", paragraph.content);
        };
        assert_eq!(link.text(), "site");
        assert_eq!(link.runs[0].props.color(), Some("0000FF"));
        assert!(link.runs[0].props.is_underlined());
        let rel = document
            .resources
            .relationships
            .get(link.relationship_id().unwrap())
            .unwrap();
        assert_eq!(rel.target, "https://example.org/a%20b");
    }

    #[test]
    fn test_invalid_href_becomes_text() {
        let (document, blocks, _) = convert(r#"<a href="bad<uri>">x</a>"#);
        assert_eq!(paragraphs(&blocks)[0].text(), "bad<uri> x");
        assert!(document.resources.relationships.targets_of(docxport_docx::REL_HYPERLINK).is_empty());
    }

    #[test]
    fn test_blockquote_indent() {
        let (_, blocks, _) = convert("<blockquote>quoted</blockquote>");
        let quoted = paragraphs(&blocks).into_iter().find(|p| p.text() == "quoted").unwrap();
        assert_eq!(quoted.props.indent_left(), Some(400));
    }

    #[test]
    fn test_alignment() {
        let (_, blocks, _) = convert(r#"<p align="justify">j</p>"#);
        assert_eq!(paragraphs(&blocks)[0].props.justification(), Some("both"));
    }

    #[test]
    fn test_whitespace_only_nodes_are_skipped() {
        let (_, blocks, _) = convert("<p>  </p>\t<b> </b>");
        assert_eq!(texts(&blocks), vec![""]);
    }

    #[test]
    fn test_cursor_mode_splices_after_anchor() {
        let mut document = Document::new();
        let mut blocks: Vec<Block> = vec![
            Paragraph::styled("Title").into(),
            Paragraph::styled("Anchor").into(),
            Paragraph::styled("After").into(),
        ];

        let last = insert_html(
            &mut document.resources,
            &mut blocks,
            Insertion::After(1),
            "intro<p>one</p><p>two</p>",
            0,
        );

        let styles: Vec<Option<&str>> = paragraphs(&blocks).iter().map(|p| p.props.style()).collect();
        assert_eq!(
            styles,
            vec![Some("Title"), Some("Anchor"), None, None, None, Some("After")]
        );
        assert_eq!(texts(&blocks), vec!["", "intro", "one", "two", "", ""]);
        assert_eq!(last, 4);
    }

    #[test]
    fn test_table_preparation_flattens_divs() {
        assert_eq!(
            prepare_html("<div class=\"x\">a</div><div>b</div>", true),
            "<br>a<br>b"
        );
        assert_eq!(prepare_html("<div>a</div>", false), "<div>a</div>");
    }

    #[test]
    fn test_uri_validation() {
        assert_eq!(
            normalize_uri(" https://example.org/x?y=1#z ").as_deref(),
            Some("https://example.org/x?y=1#z")
        );
        assert_eq!(
            normalize_uri("https://example.org/a b").as_deref(),
            Some("https://example.org/a%20b")
        );
        assert_eq!(
            normalize_uri("https://example.org/é").as_deref(),
            Some("https://example.org/%C3%A9")
        );
        assert_eq!(normalize_uri("www.example.org/x"), None);
        assert_eq!(normalize_uri("https://exa mple.org/x"), None);
        assert_eq!(normalize_uri("http://[::1/x"), None);
    }

    #[test]
    fn test_scheme_less_href_becomes_text() {
        let (document, blocks, _) = convert(r#"<a href="www.example.org">site</a>"#);

        let paragraph = paragraphs(&blocks)[0];
        assert!(paragraph.content.iter().all(|inline| matches!(inline, Inline::Run(_))));
        assert_eq!(paragraph.text(), "www.example.org site");
        assert!(document.resources.relationships.targets_of(docxport_docx::REL_HYPERLINK).is_empty());
    }

    #[test]
    fn test_malformed_host_becomes_text() {
        let (document, blocks, _) = convert(r#"<a href="https://exa mple.org">x</a>"#);
        assert_eq!(paragraphs(&blocks)[0].text(), "https://exa mple.org x");
        assert!(document.resources.relationships.targets_of(docxport_docx::REL_HYPERLINK).is_empty());
    }

    #[test]
    fn test_insertion_after_table_opens_paragraph() {
        let mut document = Document::new();
        let mut blocks: Vec<Block> = vec![
            Paragraph::styled("Title").into(),
            docxport_docx::Table::full_width().into(),
        ];

        let last = insert_html(
            &mut document.resources,
            &mut blocks,
            Insertion::After(1),
            "<p>one</p>two",
            0,
        );

        assert_eq!(blocks.len(), 4);
        assert!(matches!(blocks[1], Block::Table(_)));
        assert_eq!(texts(&blocks), vec!["", "one", "two"]);
        assert_eq!(last, 3);
    }

    #[test]
    fn test_anchor_content_is_kept() {
        let mut document = Document::new();
        let mut anchor = Paragraph::new();
        anchor.push_run(Run::text_run("Label: "));
        let mut blocks: Vec<Block> = vec![anchor.into()];

        let last = insert_html(&mut document.resources, &mut blocks, Insertion::After(0), "value", 0);

        assert_eq!(last, 0);
        assert_eq!(texts(&blocks), vec!["Label: value"]);
    }
}
