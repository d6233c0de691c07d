//! Placeholder tokens split across runs.
//!
//! Word splits typed text into runs whenever formatting, spell checking or
//! revision marks change, so a token such as `'{OPENCDMP.PLAN.TITLE}'` may
//! be spread over several `w:t` segments. [`find_token`] searches the
//! concatenated text of consecutive text segments; any non-text run content
//! (a break, a drawing) or a non-run inline breaks the candidate.

use std::collections::VecDeque;

use docxport_docx::{Inline, Paragraph, Run, RunContent};

/// Position of a character inside a paragraph.
///
/// `offset` is the byte offset of the character within its text segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextPos {
    /// Index into `Paragraph::content`.
    pub inline: usize,
    /// Index into the run's content.
    pub segment: usize,
    pub offset: usize,
}

/// A token occurrence: positions of its first and last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub begin: TextPos,
    pub end: TextPos,
}

/// Find the first occurrence of `token` at or after `from`.
pub fn find_token(paragraph: &Paragraph, token: &str, from: TextPos) -> Option<TokenSpan> {
    let needle: Vec<char> = token.chars().collect();
    if needle.is_empty() {
        return None;
    }

    let mut window: VecDeque<(TextPos, char)> = VecDeque::with_capacity(needle.len());
    for (inline, content) in paragraph.content.iter().enumerate() {
        let Inline::Run(run) = content else {
            window.clear();
            continue;
        };
        for (segment, run_content) in run.content.iter().enumerate() {
            let RunContent::Text(text) = run_content else {
                window.clear();
                continue;
            };
            for (offset, ch) in text.char_indices() {
                let pos = TextPos {
                    inline,
                    segment,
                    offset,
                };
                if pos < from {
                    continue;
                }
                if window.len() == needle.len() {
                    window.pop_front();
                }
                window.push_back((pos, ch));
                if window.len() == needle.len() && window.iter().map(|(_, c)| *c).eq(needle.iter().copied()) {
                    return Some(TokenSpan {
                        begin: window[0].0,
                        end: pos,
                    });
                }
            }
        }
    }
    None
}

/// Whether `token` occurs anywhere in the paragraph.
pub fn contains_token(paragraph: &Paragraph, token: &str) -> bool {
    find_token(paragraph, token, TextPos::default()).is_some()
}

/// Replace every occurrence of `token`, returning how many were replaced.
///
/// The run holding the first character keeps its formatting and receives
/// the replacement; `font_size` overrides its size when given. Runs lying
/// entirely inside the token are removed.
pub fn replace_token(
    paragraph: &mut Paragraph,
    token: &str,
    replacement: &str,
    font_size: Option<u32>,
) -> usize {
    let mut from = TextPos::default();
    let mut replaced = 0;
    while let Some(span) = find_token(paragraph, token, from) {
        from = splice(paragraph, span, replacement);
        if let Some(size) = font_size {
            if let Some(run) = run_mut(paragraph, span.begin.inline) {
                run.props.set_size(size);
            }
        }
        replaced += 1;
    }
    replaced
}

/// Rewrite one span and return the position right after the replacement.
fn splice(paragraph: &mut Paragraph, span: TokenSpan, replacement: &str) -> TextPos {
    let TokenSpan { begin, end } = span;
    let prefix = segment_text(paragraph, begin)
        .map(|text| text[..begin.offset].to_owned())
        .unwrap_or_default();
    let suffix = segment_text(paragraph, end)
        .map(|text| {
            let tail = &text[end.offset..];
            let width = tail.chars().next().map_or(0, char::len_utf8);
            tail[width..].to_owned()
        })
        .unwrap_or_default();
    let resume = TextPos {
        offset: prefix.len() + replacement.len(),
        ..begin
    };

    if begin.inline == end.inline {
        if let Some(run) = run_mut(paragraph, begin.inline) {
            if begin.segment == end.segment {
                run.content[begin.segment] =
                    RunContent::Text(format!("{prefix}{replacement}{suffix}"));
            } else {
                run.content[begin.segment] = RunContent::Text(prefix + replacement);
                run.content[end.segment] = RunContent::Text(suffix);
                run.content.drain(begin.segment + 1..end.segment);
            }
        }
        return resume;
    }

    if let Some(run) = run_mut(paragraph, end.inline) {
        run.content[end.segment] = RunContent::Text(suffix);
        run.content.drain(..end.segment);
    }
    paragraph.content.drain(begin.inline + 1..end.inline);
    if let Some(run) = run_mut(paragraph, begin.inline) {
        run.content[begin.segment] = RunContent::Text(prefix + replacement);
        run.content.truncate(begin.segment + 1);
    }
    resume
}

fn run_mut(paragraph: &mut Paragraph, inline: usize) -> Option<&mut Run> {
    match paragraph.content.get_mut(inline) {
        Some(Inline::Run(run)) => Some(run),
        _ => None,
    }
}

fn segment_text(paragraph: &Paragraph, pos: TextPos) -> Option<&str> {
    match paragraph.content.get(pos.inline)? {
        Inline::Run(run) => match run.content.get(pos.segment)? {
            RunContent::Text(text) => Some(text),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docxport_docx::Hyperlink;
    use pretty_assertions::assert_eq;

    const TITLE: &str = "'{OPENCDMP.PLAN.TITLE}'";

    fn paragraph_of(pieces: &[&str]) -> Paragraph {
        let mut paragraph = Paragraph::new();
        for piece in pieces {
            paragraph.push_run(Run::text_run(*piece));
        }
        paragraph
    }

    fn run_texts(paragraph: &Paragraph) -> Vec<String> {
        paragraph.runs().map(Run::text).collect()
    }

    #[test]
    fn test_find_within_single_run() {
        let paragraph = paragraph_of(&["Title: '{OPENCDMP.PLAN.TITLE}'!"]);
        let span = find_token(&paragraph, TITLE, TextPos::default()).unwrap();

        assert_eq!(span.begin, TextPos { inline: 0, segment: 0, offset: 7 });
        assert_eq!(span.end, TextPos { inline: 0, segment: 0, offset: 29 });
    }

    #[test]
    fn test_find_across_runs() {
        let paragraph = paragraph_of(&["x'{OPEN", "CDMP.PLAN.", "TITLE}'y"]);
        let span = find_token(&paragraph, TITLE, TextPos::default()).unwrap();

        assert_eq!(span.begin, TextPos { inline: 0, segment: 0, offset: 1 });
        assert_eq!(span.end, TextPos { inline: 2, segment: 0, offset: 6 });
    }

    #[test]
    fn test_candidate_restarts_after_mismatch() {
        let paragraph = paragraph_of(&["aab"]);
        let span = find_token(&paragraph, "ab", TextPos::default()).unwrap();
        assert_eq!(span.begin.offset, 1);
    }

    #[test]
    fn test_break_interrupts_match() {
        let mut run = Run::text_run("'{OPENCDMP.PLAN.");
        run.push_break();
        run.push_text("TITLE}'");
        let paragraph = Paragraph::new().with_run(run);

        assert!(!contains_token(&paragraph, TITLE));
    }

    #[test]
    fn test_hyperlink_interrupts_match() {
        let mut paragraph = paragraph_of(&["'{OPENCDMP.PLAN."]);
        paragraph.push_hyperlink(Hyperlink::external("rId9"));
        paragraph.push_run(Run::text_run("TITLE}'"));

        assert!(!contains_token(&paragraph, TITLE));
    }

    #[test]
    fn test_replace_in_place() {
        let mut paragraph = paragraph_of(&["Title: '{OPENCDMP.PLAN.TITLE}'."]);

        assert_eq!(replace_token(&mut paragraph, TITLE, "My plan", None), 1);
        assert_eq!(paragraph.text(), "Title: My plan.");
    }

    #[test]
    fn test_replace_split_token_removes_inner_runs() {
        let mut paragraph = paragraph_of(&["Plan ", "'{OPEN", "CDMP.", "PLAN.", "TITLE}'", " end"]);

        replace_token(&mut paragraph, TITLE, "Soil", None);

        assert_eq!(run_texts(&paragraph), vec!["Plan ", "Soil", "", " end"]);
        assert_eq!(paragraph.text(), "Plan Soil end");
    }

    #[test]
    fn test_replace_keeps_prefix_and_suffix_in_edge_runs() {
        let mut paragraph = paragraph_of(&["a'{OPENCDMP.PLAN", ".TITLE}'b"]);

        replace_token(&mut paragraph, TITLE, "X", None);

        assert_eq!(run_texts(&paragraph), vec!["aX", "b"]);
    }

    #[test]
    fn test_replace_every_occurrence() {
        let mut paragraph = paragraph_of(&["'{A}' and '{", "A}'"]);

        assert_eq!(replace_token(&mut paragraph, "'{A}'", "1", None), 2);
        assert_eq!(paragraph.text(), "1 and 1");
    }

    #[test]
    fn test_replacement_containing_token_does_not_loop() {
        let mut paragraph = paragraph_of(&["'{A}'"]);

        assert_eq!(replace_token(&mut paragraph, "'{A}'", "'{A}''{A}'", None), 1);
        assert_eq!(paragraph.text(), "'{A}''{A}'");
    }

    #[test]
    fn test_font_size_applies_to_begin_run() {
        let mut paragraph = paragraph_of(&["x", "'{A", "}'"]);

        replace_token(&mut paragraph, "'{A}'", "Grant", Some(15));

        let sizes: Vec<Option<u32>> = paragraph.runs().map(|run| run.props.size()).collect();
        assert_eq!(sizes, vec![None, Some(15), None]);
    }

    #[test]
    fn test_multibyte_text_around_token() {
        let mut paragraph = paragraph_of(&["Ωμέγα '{A", "}' τέλος"]);

        replace_token(&mut paragraph, "'{A}'", "ΑΒΓ", None);

        assert_eq!(paragraph.text(), "Ωμέγα ΑΒΓ τέλος");
    }

    #[test]
    fn test_missing_token_is_untouched() {
        let mut paragraph = paragraph_of(&["nothing here"]);
        let before = paragraph.clone();

        assert_eq!(replace_token(&mut paragraph, TITLE, "x", Some(15)), 0);
        assert_eq!(paragraph, before);
    }
}
