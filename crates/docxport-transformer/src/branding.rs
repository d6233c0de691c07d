//! The "Powered by" branding block of the default templates.
//!
//! Templates end their first page with a logo paragraph followed by a
//! paragraph whose first text segment reads "Powered by". Rendered content
//! is appended to the body, so the pair is detached first and put back at
//! the very end once rendering is done.

use docxport_docx::{Block, Paragraph, RunContent};

const MARKER: &str = "Powered by";

/// Index of the logo paragraph preceding the "Powered by" paragraph.
pub fn find_branding(body: &[Block]) -> Option<usize> {
    body.iter()
        .position(|block| block.as_paragraph().is_some_and(is_marker))?
        .checked_sub(1)
}

/// Removes the branding pair from `body`.
pub fn detach_branding(body: &mut Vec<Block>) -> Option<Vec<Block>> {
    let pos = find_branding(body)?;
    Some(body.drain(pos..=pos + 1).collect())
}

/// Appends the detached branding after the rendered content.
///
/// The trailing paragraph loses its page break so the branding stays on the
/// last page.
pub fn reattach_branding(body: &mut Vec<Block>, branding: Vec<Block>) {
    if let Some(last) = body.iter_mut().rev().find_map(Block::as_paragraph_mut) {
        last.props.set_page_break_before(false);
    }
    body.extend(branding);
}

fn is_marker(paragraph: &Paragraph) -> bool {
    paragraph.runs().any(|run| {
        run.content.iter().find_map(|content| match content {
            RunContent::Text(text) => Some(text.as_str()),
            _ => None,
        }) == Some(MARKER)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docxport_docx::Run;
    use pretty_assertions::assert_eq;

    fn text(value: &str) -> Block {
        Paragraph::new().with_run(Run::text_run(value)).into()
    }

    fn texts(body: &[Block]) -> Vec<String> {
        body.iter()
            .filter_map(Block::as_paragraph)
            .map(Paragraph::text)
            .collect()
    }

    #[test]
    fn test_find_branding() {
        let body = vec![text("Title"), text("logo"), text("Powered by")];
        assert_eq!(find_branding(&body), Some(1));
    }

    #[test]
    fn test_marker_must_match_first_segment_exactly() {
        let body = vec![text("logo"), text("Powered by OpenCDMP")];
        assert_eq!(find_branding(&body), None);
    }

    #[test]
    fn test_marker_in_first_paragraph_is_ignored() {
        let body = vec![text("Powered by"), text("Title")];
        assert_eq!(find_branding(&body), None);
    }

    #[test]
    fn test_branding_moves_to_end() {
        let mut body = vec![text("Title"), text("logo"), text("Powered by")];
        let branding = detach_branding(&mut body).unwrap();
        assert_eq!(texts(&body), vec!["Title"]);

        let mut breaking = Paragraph::new();
        breaking.props.set_page_break_before(true);
        body.push(text("Section"));
        body.push(breaking.into());
        reattach_branding(&mut body, branding);

        assert_eq!(texts(&body), vec!["Title", "Section", "", "logo", "Powered by"]);
        assert!(!body[2].as_paragraph().unwrap().props.page_break_before());
    }
}
