//! Template compositor.
//!
//! Walks a description template (pages, sections, field-sets, fields)
//! against its value tree and appends the rendered blocks to a container.
//! Sections and field-sets are rendered into detached buffers that are only
//! committed when something inside produced a value, so hidden or empty
//! subtrees leave no headings behind.

use docxport_config::ReferenceCodes;
use docxport_docx::{Block, Cell, Hyperlink, Justification, Paragraph, Resources, Row, Run, Table};
use docxport_lookup::PidLinks;
use docxport_model::{
    Field, FieldData, FieldSet, FieldSetItem, FieldValue, FileEnvelope, Page, Properties,
    Reference, Section, UploadData, VisibilityMap,
};

use crate::measure::{Media, is_image_mime};
use crate::rich_text::{INDENT_STEP, Insertion, insert_html, normalize_uri, prepare_html};

const TEXT_SIZE: u32 = 11;
const HEADER_SIZE: u32 = 12;
const CELL_SPACING_BEFORE: u32 = 100;
const HEADER_FIRST_LINE: i64 = 50;
const LINK_COLOR: &str = "0000FF";
const BULLET: &str = "• ";
const ORCID_URL: &str = "https://orcid.org/";
const PID_TYPE_FIELD: &str = "pidTypeField";

/// Renders description templates into document blocks.
///
/// One compositor serves a whole export: the [`Media`] it owns numbers
/// image captions across every template it composes.
pub struct TemplateCompositor<'a> {
    codes: &'a ReferenceCodes,
    pid_links: &'a PidLinks,
    media: Media<'a>,
}

/// Inputs shared by one `compose` call.
struct Pass<'p> {
    resources: &'p mut Resources,
    properties: &'p Properties,
    visibility: &'p VisibilityMap,
}

/// Heading number prefix and indentation of the nodes being rendered.
struct Outline<'o> {
    page: i32,
    /// Dotted section path of the parent, empty at page level.
    path: &'o str,
    depth: i64,
}

impl Outline<'_> {
    fn child_path(&self, ordinal: i32) -> String {
        if self.path.is_empty() {
            (ordinal + 1).to_string()
        } else {
            format!("{}.{}", self.path, ordinal + 1)
        }
    }
}

impl<'a> TemplateCompositor<'a> {
    #[must_use]
    pub fn new(codes: &'a ReferenceCodes, pid_links: &'a PidLinks, media: Media<'a>) -> Self {
        Self {
            codes,
            pid_links,
            media,
        }
    }

    /// Media shared with other renderers of the same export.
    pub fn media_mut(&mut self) -> &mut Media<'a> {
        &mut self.media
    }

    /// Append the rendering of `pages` to `out`.
    ///
    /// A page heading is written for every page that has sections; the
    /// sections themselves only when the page is visible.
    pub fn compose(
        &mut self,
        resources: &mut Resources,
        out: &mut Vec<Block>,
        pages: &[Page],
        properties: &Properties,
        visibility: &VisibilityMap,
    ) {
        let mut pass = Pass {
            resources,
            properties,
            visibility,
        };
        for page in by_ordinal(pages, |page| page.ordinal) {
            if page.sections.is_empty() {
                continue;
            }
            let number = page.ordinal + 1;
            out.push(heading("Heading5", format!("{number} {}", page.title), 0));
            if !pass.visibility.is_visible(&page.id, None) {
                continue;
            }
            let outline = Outline {
                page: number,
                path: "",
                depth: 1,
            };
            let rendered = self.sections(&mut pass, out, &page.sections, &outline);
            tracing::debug!(page = %page.id, rendered, "Composed page");
        }
    }

    fn sections(
        &mut self,
        pass: &mut Pass<'_>,
        out: &mut Vec<Block>,
        sections: &[Section],
        outline: &Outline<'_>,
    ) -> bool {
        let mut any = false;
        for section in by_ordinal(sections, |section| section.ordinal) {
            if !pass.visibility.is_visible(&section.id, None) {
                continue;
            }
            let path = outline.child_path(section.ordinal);
            let mut buffer = vec![heading(
                "Heading5",
                format!("{}.{path} {}", outline.page, section.title),
                outline.depth,
            )];
            let inner = Outline {
                page: outline.page,
                path: &path,
                depth: outline.depth + 1,
            };
            let nested = self.sections(pass, &mut buffer, &section.sections, &inner);
            let fields = self.field_sets(pass, &mut buffer, &section.field_sets, &inner);
            if nested || fields {
                out.append(&mut buffer);
                any = true;
            }
        }
        any
    }

    fn field_sets(
        &mut self,
        pass: &mut Pass<'_>,
        out: &mut Vec<Block>,
        field_sets: &[FieldSet],
        outline: &Outline<'_>,
    ) -> bool {
        let properties = pass.properties;
        let visibility = pass.visibility;
        let mut any = false;
        for field_set in by_ordinal(field_sets, |field_set| field_set.ordinal) {
            let items: Vec<&FieldSetItem> = properties
                .sorted_items(&field_set.id)
                .into_iter()
                .filter(|item| visibility.is_visible(&field_set.id, Some(item.ordinal)))
                .collect();
            if items.is_empty() {
                continue;
            }

            let mut buffer = Vec::new();
            if let Some(title) = field_set.heading_title() {
                buffer.push(heading(
                    "Heading6",
                    format!(
                        "{}.{}.{} {title}",
                        outline.page,
                        outline.path,
                        field_set.ordinal + 1
                    ),
                    outline.depth,
                ));
            }

            let mut has_value = if field_set.is_table_view() {
                self.table(pass, &mut buffer, field_set, &items)
            } else {
                self.free_flow(pass, &mut buffer, field_set, &items, outline.depth)
            };

            let comment = properties
                .field_sets
                .get(&field_set.id)
                .and_then(|value| value.comment());
            if let Some(comment) = comment {
                let html = prepare_html(&format!("<i>Comment:</i>\n{comment}"), false);
                insert_html(
                    pass.resources,
                    &mut buffer,
                    Insertion::Append,
                    &html,
                    outline.depth,
                );
                has_value = true;
            }

            if has_value {
                out.append(&mut buffer);
                any = true;
            }
        }
        any
    }

    /// Items one after another, lettered `a. `, `b. ` when there are several.
    fn free_flow(
        &mut self,
        pass: &mut Pass<'_>,
        out: &mut Vec<Block>,
        field_set: &FieldSet,
        items: &[&FieldSetItem],
        depth: i64,
    ) -> bool {
        let lettered = field_set.multiplicity.is_some() && items.len() > 1;
        let mut markers: Vec<usize> = Vec::new();
        let mut any = false;

        for item in items {
            let mut buffer = Vec::new();
            let marker = if lettered {
                buffer.push(marker_paragraph(markers.len(), depth).into());
                Some(0)
            } else {
                None
            };
            if self.item_fields(pass, &mut buffer, field_set, item, depth, marker) {
                if lettered {
                    markers.push(out.len());
                }
                out.append(&mut buffer);
                any = true;
            }
        }

        // A lone survivor needs no letter, nor a paragraph the letter held alone.
        if let [only] = markers[..] {
            if let Some(paragraph) = out.get_mut(only).and_then(Block::as_paragraph_mut) {
                if !paragraph.content.is_empty() {
                    paragraph.content.remove(0);
                }
                if paragraph.content.is_empty() {
                    out.remove(only);
                }
            }
        }
        any
    }

    fn item_fields(
        &mut self,
        pass: &mut Pass<'_>,
        out: &mut Vec<Block>,
        field_set: &FieldSet,
        item: &FieldSetItem,
        depth: i64,
        mut marker: Option<usize>,
    ) -> bool {
        let mut has_value = false;
        for field in by_ordinal(&field_set.fields, |field| field.ordinal) {
            if !field.include_in_export || !pass.visibility.is_visible(&field.id, Some(item.ordinal))
            {
                continue;
            }
            let (Some(data), Some(value)) = (&field.data, item.fields.get(&field.id)) else {
                continue;
            };
            has_value |= self.field(pass, out, data, value, depth, &mut marker);
        }
        has_value
    }

    /// Render one field value. `marker` is the pending item marker paragraph
    /// that receives the first value.
    fn field(
        &mut self,
        pass: &mut Pass<'_>,
        out: &mut Vec<Block>,
        data: &FieldData,
        value: &FieldValue,
        depth: i64,
        marker: &mut Option<usize>,
    ) -> bool {
        match data {
            FieldData::Upload(upload) => self.upload(pass, out, upload, value, depth, marker),
            FieldData::ReferenceTypes(reference) if self.is_linked(&reference.reference_type.code) => {
                let references = value.references.as_deref().unwrap_or_default();
                let bulleted = data.multiple_select() && references.len() > 1;
                for reference in references {
                    self.linked_reference(pass, out, reference, bulleted, depth, marker);
                }
                !references.is_empty()
            }
            _ => {
                let values = extract_values(data, value);
                let rich = matches!(data, FieldData::RichTextArea(_));
                let researcher = self.is_researcher(data);
                for text in &values {
                    let orcid = if researcher { split_orcid(text) } else { None };
                    let mut shown = orcid
                        .as_ref()
                        .map_or_else(|| text.clone(), |(head, _)| head.clone());
                    if values.len() > 1 {
                        shown.insert_str(0, BULLET);
                    }
                    let index = if rich {
                        let at = marker.take().map_or(Insertion::Append, Insertion::After);
                        insert_html(pass.resources, out, at, &prepare_html(&shown, false), depth)
                    } else {
                        write_text(out, &shown, depth, marker)
                    };
                    if let Some((_, id)) = orcid {
                        if let Some(paragraph) = out.get_mut(index).and_then(Block::as_paragraph_mut) {
                            push_orcid(pass.resources, paragraph, id);
                        }
                    }
                }
                !values.is_empty()
            }
        }
    }

    fn upload(
        &mut self,
        pass: &mut Pass<'_>,
        out: &mut Vec<Block>,
        upload: &UploadData,
        value: &FieldValue,
        depth: i64,
        marker: &mut Option<usize>,
    ) -> bool {
        if !value.has_upload() {
            return false;
        }
        let Some(file) = &value.file else {
            return false;
        };
        if accepts_images(upload) {
            match self.media.picture(pass.resources, file) {
                Ok(paragraphs) => {
                    *marker = None;
                    out.extend(paragraphs.map(Block::from));
                    return true;
                }
                Err(error) => tracing::error!(
                    filename = file.display_name().unwrap_or_default(),
                    error = %error,
                    "Failed to embed image, rendering its filename"
                ),
            }
        }
        match file.display_name() {
            Some(name) => {
                write_text(out, name, depth, marker);
                true
            }
            None => false,
        }
    }

    /// A reference rendered as a link to its persistent identifier resolver,
    /// or as plain text when no link can be built.
    fn linked_reference(
        &self,
        pass: &mut Pass<'_>,
        out: &mut Vec<Block>,
        reference: &Reference,
        bulleted: bool,
        depth: i64,
        marker: &mut Option<usize>,
    ) {
        let label = reference.display_label().unwrap_or_default();
        let url = reference
            .definition_value(PID_TYPE_FIELD)
            .zip(reference.reference.as_deref())
            .and_then(|(pid_type, pid)| self.pid_links.link_for(pid_type, pid))
            .and_then(|url| normalize_uri(&url));

        let Some(url) = url else {
            let text = if bulleted {
                format!("{BULLET}{label}")
            } else {
                label.to_owned()
            };
            write_text(out, &text, depth, marker);
            return;
        };

        let index = marker.take().unwrap_or_else(|| {
            out.push(indented(depth).into());
            out.len() - 1
        });
        let Some(paragraph) = out.get_mut(index).and_then(Block::as_paragraph_mut) else {
            return;
        };
        if bulleted {
            paragraph.push_run(Run::text_run(BULLET));
        }
        let relationship_id = pass.resources.add_hyperlink(&url);
        let mut link = Hyperlink::external(&relationship_id);
        link.runs.push(link_run(label).size(TEXT_SIZE));
        paragraph.push_hyperlink(link);
    }

    /// One table per field-set: a header row from the first item, then a
    /// row for every item that shows a value.
    fn table(
        &mut self,
        pass: &mut Pass<'_>,
        out: &mut Vec<Block>,
        field_set: &FieldSet,
        items: &[&FieldSetItem],
    ) -> bool {
        let Some(first) = items.first() else {
            return false;
        };
        let columns: Vec<&Field> = by_ordinal(&field_set.fields, |field| field.ordinal)
            .into_iter()
            .filter(|field| {
                field.include_in_export && pass.visibility.is_visible(&field.id, Some(first.ordinal))
            })
            .collect();
        if columns.is_empty() {
            return false;
        }

        let mut table = Table::full_width();
        if let Some(header) = header_row(&columns) {
            table.rows.push(header);
        }

        let mut data_rows = 0;
        for item in items {
            let mut row = Row::default();
            let mut has_value = false;
            for field in &columns {
                let mut cell = Cell::centered();
                if pass.visibility.is_visible(&field.id, Some(item.ordinal)) {
                    if let (Some(data), Some(value)) = (&field.data, item.fields.get(&field.id)) {
                        has_value |= self.cell(pass, &mut cell, data, value);
                    }
                }
                if cell.blocks.is_empty() {
                    cell.blocks.push(Paragraph::new().into());
                }
                row.cells.push(cell);
            }
            if has_value {
                table.rows.push(row);
                data_rows += 1;
            }
        }

        if data_rows == 0 {
            return false;
        }
        out.push(table.into());
        out.push(Paragraph::new().into());
        true
    }

    fn cell(
        &self,
        pass: &mut Pass<'_>,
        cell: &mut Cell,
        data: &FieldData,
        value: &FieldValue,
    ) -> bool {
        let mut written = Vec::new();
        match data {
            FieldData::Upload(upload) => {
                let name = value
                    .file
                    .as_ref()
                    .and_then(FileEnvelope::display_name)
                    .filter(|_| value.has_upload());
                let Some(name) = name else {
                    return false;
                };
                let mut run = Run::text_run(name).size(TEXT_SIZE);
                if accepts_images(upload) {
                    run.props.set_italic(true);
                }
                cell.blocks.push(Paragraph::new().with_run(run).into());
                written.push(cell.blocks.len() - 1);
            }
            _ => {
                let values = extract_values(data, value);
                let rich = matches!(data, FieldData::RichTextArea(_));
                let researcher = self.is_researcher(data);
                for text in &values {
                    let orcid = if researcher { split_orcid(text) } else { None };
                    let mut shown = orcid
                        .as_ref()
                        .map_or_else(|| text.clone(), |(head, _)| head.clone());
                    if values.len() > 1 {
                        shown.insert_str(0, BULLET);
                    }
                    let index = if rich {
                        let html = prepare_html(&shown, true);
                        insert_html(pass.resources, &mut cell.blocks, Insertion::Append, &html, 0)
                    } else {
                        let run = Run::text_run(shown).size(TEXT_SIZE);
                        cell.blocks.push(Paragraph::new().with_run(run).into());
                        cell.blocks.len() - 1
                    };
                    if let Some((_, id)) = orcid {
                        if let Some(paragraph) =
                            cell.blocks.get_mut(index).and_then(Block::as_paragraph_mut)
                        {
                            push_orcid(pass.resources, paragraph, id);
                        }
                    }
                    written.push(index);
                }
            }
        }

        for index in &written {
            if let Some(paragraph) = cell.blocks.get_mut(*index).and_then(Block::as_paragraph_mut) {
                paragraph.props.set_justification(Justification::Center);
                paragraph.props.set_spacing(Some(CELL_SPACING_BEFORE), None);
            }
        }
        !written.is_empty()
    }

    fn is_linked(&self, code: &str) -> bool {
        code == self.codes.organization || code == self.codes.dataset || code == self.codes.publication
    }

    fn is_researcher(&self, data: &FieldData) -> bool {
        matches!(data, FieldData::ReferenceTypes(reference) if reference.reference_type.code == self.codes.researcher)
    }
}

/// Display strings for a field value, by field kind.
pub fn extract_values(data: &FieldData, value: &FieldValue) -> Vec<String> {
    match data {
        FieldData::ReferenceTypes(_) => value
            .references
            .iter()
            .flatten()
            .filter_map(Reference::display_label)
            .map(str::to_owned)
            .collect(),
        FieldData::Tags(_) => value.text_list_value.clone().unwrap_or_default(),
        FieldData::Select(select) => {
            let Some(chosen) = &value.text_list_value else {
                return Vec::new();
            };
            select
                .options
                .iter()
                .filter(|option| chosen.contains(&option.value) || chosen.contains(&option.label))
                .map(|option| option.label.clone())
                .collect()
        }
        FieldData::BooleanDecision(_) => value
            .boolean_value
            .map(|yes| if yes { "Yes" } else { "No" }.to_owned())
            .into_iter()
            .collect(),
        FieldData::RadioBox(radio) => value
            .text_value
            .as_deref()
            .and_then(|chosen| {
                radio
                    .options
                    .iter()
                    .find(|option| option.value == chosen || option.label == chosen)
            })
            .map(|option| option.label.clone())
            .into_iter()
            .collect(),
        FieldData::CheckBox(check) => {
            if value.boolean_value == Some(true) && !check.label.is_empty() {
                vec![check.label.clone()]
            } else {
                Vec::new()
            }
        }
        FieldData::DatePicker(_) => value
            .date_value
            .map(|date| date.format("%Y-%m-%d").to_string())
            .into_iter()
            .collect(),
        FieldData::FreeText(_) | FieldData::TextArea(_) | FieldData::RichTextArea(_) => {
            value.text().map(str::to_owned).into_iter().collect()
        }
        FieldData::DatasetIdentifier(_) | FieldData::Validation(_) => value
            .external_identifier
            .as_ref()
            .map(|identifier| {
                format!(
                    "id: {}, Type: {}",
                    identifier.identifier.as_deref().unwrap_or_default(),
                    identifier.identifier_type.as_deref().unwrap_or_default()
                )
            })
            .into_iter()
            .collect(),
        FieldData::Upload(_)
        | FieldData::InternalEntriesPlans(_)
        | FieldData::InternalEntriesDescriptions(_) => Vec::new(),
    }
}

/// Split `"Name (orcid:0000-0001)"` into the text up to the last `orcid:`
/// (plus a space) and the identifier before the closing parenthesis.
fn split_orcid(value: &str) -> Option<(String, &str)> {
    const PREFIX: &str = "orcid:";
    let start = value.rfind(PREFIX)? + PREFIX.len();
    let close = start + value[start..].find(')')?;
    Some((format!("{} ", &value[..start]), &value[start..close]))
}

fn push_orcid(resources: &mut Resources, paragraph: &mut Paragraph, orcid: &str) {
    let relationship_id = resources.add_hyperlink(&format!("{ORCID_URL}{orcid}"));
    let mut link = Hyperlink::external(&relationship_id);
    link.runs.push(link_run(orcid));
    paragraph.push_hyperlink(link);
    paragraph.push_run(Run::text_run(")"));
}

fn link_run(text: &str) -> Run {
    let mut run = Run::text_run(text).color(LINK_COLOR);
    run.props.set_underline(true);
    run
}

fn accepts_images(upload: &UploadData) -> bool {
    upload.types.iter().any(|option| is_image_mime(&option.value))
}

fn header_row(columns: &[&Field]) -> Option<Row> {
    let mut row = Row::default();
    let mut labelled = false;
    for field in columns {
        let mut paragraph = Paragraph::new();
        let label = field.data.as_ref().map_or("", FieldData::header_label);
        if !label.trim().is_empty() {
            paragraph.props.set_indent_first_line(HEADER_FIRST_LINE);
            paragraph.props.set_justification(Justification::Center);
            paragraph.props.set_spacing(Some(CELL_SPACING_BEFORE), None);
            paragraph.push_run(Run::text_run(label).bold().size(HEADER_SIZE));
            labelled = true;
        }
        let mut cell = Cell::centered();
        cell.blocks.push(paragraph.into());
        row.cells.push(cell);
    }
    labelled.then_some(row)
}

/// Write a size-11 text value: into the pending marker paragraph if there
/// is one, otherwise as a new indented paragraph. Returns its index.
fn write_text(out: &mut Vec<Block>, text: &str, depth: i64, marker: &mut Option<usize>) -> usize {
    let run = Run::text_run(text).size(TEXT_SIZE);
    if let Some(index) = marker.take() {
        if let Some(paragraph) = out.get_mut(index).and_then(Block::as_paragraph_mut) {
            paragraph.push_run(run);
            return index;
        }
    }
    out.push(indented(depth).with_run(run).into());
    out.len() - 1
}

fn marker_paragraph(index: usize, depth: i64) -> Paragraph {
    indented(depth).with_run(Run::text_run(format!("{}. ", letters(index))).size(TEXT_SIZE))
}

/// `a`..`z`, then `aa`, `ab`, and so on.
fn letters(mut index: usize) -> String {
    const ALPHABET: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        out.push(char::from(ALPHABET[index % 26]));
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    out.into_iter().rev().collect()
}

fn heading(style: &str, text: String, depth: i64) -> Block {
    let mut paragraph = Paragraph::styled(style).with_run(Run::text_run(text));
    paragraph.props.set_indent_left(INDENT_STEP * depth);
    paragraph.into()
}

fn indented(depth: i64) -> Paragraph {
    let mut paragraph = Paragraph::new();
    paragraph.props.set_indent_left(INDENT_STEP * depth);
    paragraph
}

fn by_ordinal<T>(nodes: &[T], ordinal: impl Fn(&T) -> i32) -> Vec<&T> {
    let mut sorted: Vec<&T> = nodes.iter().collect();
    sorted.sort_by_key(|node| ordinal(node));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::png_bytes;
    use docxport_docx::{Document, Inline, REL_HYPERLINK};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    const A4_BOX: (i64, i64) = (451, 698);

    struct Rendered {
        document: Document,
        blocks: Vec<Block>,
    }

    impl Rendered {
        fn texts(&self) -> Vec<String> {
            self.blocks
                .iter()
                .filter_map(Block::as_paragraph)
                .map(Paragraph::text)
                .collect()
        }

        fn paragraph(&self, text: &str) -> &Paragraph {
            self.blocks
                .iter()
                .filter_map(Block::as_paragraph)
                .find(|paragraph| paragraph.text() == text)
                .unwrap_or_else(|| panic!("no paragraph {text:?} in {:?}", self.texts()))
        }

        fn hyperlink_target(&self, link: &Hyperlink) -> String {
            let id = link.relationship_id().unwrap();
            self.document.resources.relationships.get(id).unwrap().target.to_owned()
        }
    }

    fn compose_with(pages: Value, properties: Properties, visibility: &VisibilityMap) -> Rendered {
        let pages: Vec<Page> = serde_json::from_value(pages).unwrap();
        let codes = ReferenceCodes::default();
        let mut document = Document::new();
        let mut blocks = Vec::new();
        let mut compositor = TemplateCompositor::new(&codes, PidLinks::builtin(), Media::new(A4_BOX));
        compositor.compose(
            &mut document.resources,
            &mut blocks,
            &pages,
            &properties,
            visibility,
        );
        Rendered { document, blocks }
    }

    fn compose(pages: Value, properties: Value, visibility: &VisibilityMap) -> Rendered {
        compose_with(pages, serde_json::from_value(properties).unwrap(), visibility)
    }

    fn show(entries: &[(&str, Option<i32>)]) -> VisibilityMap {
        entries
            .iter()
            .fold(VisibilityMap::default(), |map, (id, ordinal)| {
                map.with(*id, *ordinal, true)
            })
    }

    /// Page 1 > section "General" > field-set `fs` with the given fields.
    fn single_field_set(field_set: Value) -> Value {
        json!([{
            "id": "p1", "ordinal": 0, "title": "Plan",
            "sections": [{"id": "s1", "ordinal": 0, "title": "General", "fieldSets": [field_set]}]
        }])
    }

    fn field(id: &str, ordinal: i32, data: Value) -> Value {
        json!({"id": id, "ordinal": ordinal, "includeInExport": true, "data": data})
    }

    fn items(values: &[Value]) -> Value {
        let items: Vec<Value> = values
            .iter()
            .enumerate()
            .map(|(ordinal, fields)| json!({"ordinal": ordinal, "fields": fields}))
            .collect();
        json!({"fieldSets": {"fs": {"items": items}}})
    }

    fn visible_items(fields: &[&str], count: i32) -> VisibilityMap {
        let mut entries = vec![("p1", None), ("s1", None)];
        for ordinal in 0..count {
            entries.push(("fs", Some(ordinal)));
            for field in fields {
                entries.push((field, Some(ordinal)));
            }
        }
        show(&entries)
    }

    fn freetext_set(title: &str, multiplicity: Option<Value>) -> Value {
        let mut field_set = json!({
            "id": "fs", "ordinal": 0, "title": title,
            "fields": [field("name", 0, json!({"fieldType": "freetext", "label": "Name"}))]
        });
        if let Some(multiplicity) = multiplicity {
            field_set["multiplicity"] = multiplicity;
        }
        field_set
    }

    #[test]
    fn test_headings_and_indentation() {
        let rendered = compose(
            single_field_set(freetext_set("Identity", None)),
            items(&[json!({"name": {"textValue": "Soil survey"}})]),
            &visible_items(&["name"], 1),
        );

        assert_eq!(
            rendered.texts(),
            vec!["1 Plan", "1.1 General", "1.1.1 Identity", "Soil survey"]
        );
        let styles: Vec<Option<&str>> = rendered
            .blocks
            .iter()
            .filter_map(Block::as_paragraph)
            .map(|paragraph| paragraph.props.style())
            .collect();
        assert_eq!(styles, vec![Some("Heading5"), Some("Heading5"), Some("Heading6"), None]);
        let indents: Vec<Option<i64>> = rendered
            .blocks
            .iter()
            .filter_map(Block::as_paragraph)
            .map(|paragraph| paragraph.props.indent_left())
            .collect();
        assert_eq!(indents, vec![Some(0), Some(400), Some(800), Some(800)]);
    }

    #[test]
    fn test_nested_section_numbering() {
        let pages = json!([{
            "id": "p1", "ordinal": 1, "title": "Data",
            "sections": [{
                "id": "s1", "ordinal": 0, "title": "Outer",
                "sections": [{
                    "id": "s2", "ordinal": 2, "title": "Inner",
                    "fieldSets": [freetext_set("Identity", None)]
                }]
            }]
        }]);
        let visibility = show(&[
            ("p1", None),
            ("s1", None),
            ("s2", None),
            ("fs", Some(0)),
            ("name", Some(0)),
        ]);

        let rendered = compose(pages, items(&[json!({"name": {"textValue": "x"}})]), &visibility);

        assert_eq!(
            rendered.texts(),
            vec!["2 Data", "2.1 Outer", "2.1.3 Inner", "2.1.3.1 Identity", "x"]
        );
        assert_eq!(rendered.paragraph("x").props.indent_left(), Some(1200));
    }

    #[test]
    fn test_invisible_field_prunes_whole_section() {
        let visibility = show(&[("p1", None), ("s1", None), ("fs", Some(0))]);
        let rendered = compose(
            single_field_set(freetext_set("Identity", None)),
            items(&[json!({"name": {"textValue": "hidden"}})]),
            &visibility,
        );

        assert_eq!(rendered.texts(), vec!["1 Plan"]);
    }

    #[test]
    fn test_invisible_page_keeps_only_its_heading() {
        let mut visibility = visible_items(&["name"], 1);
        visibility = visibility.with("p1", None, false);
        let rendered = compose(
            single_field_set(freetext_set("Identity", None)),
            items(&[json!({"name": {"textValue": "value"}})]),
            &visibility,
        );

        assert_eq!(rendered.texts(), vec!["1 Plan"]);
    }

    #[test]
    fn test_page_without_sections_is_silent() {
        let rendered = compose(
            json!([{"id": "p1", "ordinal": 0, "title": "Empty"}]),
            json!({}),
            &show(&[("p1", None)]),
        );
        assert!(rendered.blocks.is_empty());
    }

    #[test]
    fn test_funding_table_drops_empty_row() {
        let field_set = json!({
            "id": "fs", "ordinal": 0, "title": "Funding",
            "multiplicity": {"tableView": true},
            "fields": [
                field("grant", 0, json!({"fieldType": "referenceTypes", "label": "",
                    "referenceType": {"name": "Grants", "code": "grants"}})),
                field("amount", 1, json!({"fieldType": "freetext", "label": "Amount"}))
            ]
        });
        let rendered = compose(
            single_field_set(field_set),
            items(&[
                json!({"grant": {"references": [{"label": "EU-H2020"}]}, "amount": {"textValue": "1000"}}),
                json!({}),
            ]),
            &visible_items(&["grant", "amount"], 2),
        );

        assert_eq!(rendered.texts(), vec!["1 Plan", "1.1 General", "1.1.1 Funding", ""]);
        let Block::Table(table) = &rendered.blocks[3] else {
            panic!("expected a table, got {:?}", rendered.blocks[3]);
        };
        let rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .map(|cell| {
                        cell.blocks
                            .iter()
                            .filter_map(Block::as_paragraph)
                            .map(Paragraph::text)
                            .collect()
                    })
                    .collect()
            })
            .collect();
        assert_eq!(rows, vec![vec!["Grants", "Amount"], vec!["EU-H2020", "1000"]]);

        let header = table.rows[0].cells[0].blocks[0].as_paragraph().unwrap();
        assert_eq!(header.props.justification(), Some("center"));
        assert!(header.runs().all(|run| run.props.is_bold() && run.props.size() == Some(12)));
        let value = table.rows[1].cells[1].blocks[0].as_paragraph().unwrap();
        assert_eq!(value.props.spacing_before(), Some(100));
    }

    #[test]
    fn test_table_without_values_is_dropped() {
        let field_set = json!({
            "id": "fs", "ordinal": 0, "title": "Funding",
            "multiplicity": {"tableView": true},
            "fields": [field("amount", 0, json!({"fieldType": "freetext", "label": "Amount"}))]
        });
        let rendered = compose(
            single_field_set(field_set),
            items(&[json!({}), json!({"amount": {"textValue": "  "}})]),
            &visible_items(&["amount"], 2),
        );

        assert_eq!(rendered.texts(), vec!["1 Plan"]);
    }

    #[test]
    fn test_markers_skip_empty_items() {
        let rendered = compose(
            single_field_set(freetext_set("Contacts", Some(json!({})))),
            items(&[
                json!({"name": {"textValue": "Ann"}}),
                json!({}),
                json!({"name": {"textValue": "Bob"}}),
            ]),
            &visible_items(&["name"], 3),
        );

        assert_eq!(
            rendered.texts(),
            vec!["1 Plan", "1.1 General", "1.1.1 Contacts", "a. Ann", "b. Bob"]
        );
    }

    #[test]
    fn test_single_surviving_marker_is_removed() {
        let rendered = compose(
            single_field_set(freetext_set("", Some(json!({})))),
            items(&[json!({}), json!({"name": {"textValue": "Only"}})]),
            &visible_items(&["name"], 2),
        );

        assert_eq!(rendered.texts(), vec!["1 Plan", "1.1 General", "Only"]);
        assert_eq!(rendered.paragraph("Only").content.len(), 1);
    }

    #[test]
    fn test_markers_past_z() {
        assert_eq!(letters(0), "a");
        assert_eq!(letters(25), "z");
        assert_eq!(letters(26), "aa");
        assert_eq!(letters(27), "ab");
        assert_eq!(letters(701), "zz");
        assert_eq!(letters(702), "aaa");
        assert_eq!(marker_paragraph(26, 0).text(), "aa. ");
    }

    #[test]
    fn test_twenty_eight_items_are_lettered_in_order() {
        let values: Vec<Value> = (0..28)
            .map(|n| json!({"name": {"textValue": format!("v{n}")}}))
            .collect();
        let rendered = compose(
            single_field_set(freetext_set("Contacts", Some(json!({})))),
            items(&values),
            &visible_items(&["name"], 28),
        );

        let texts = rendered.texts();
        assert_eq!(texts[3 + 25], "z. v25");
        assert_eq!(texts[3 + 26], "aa. v26");
        assert_eq!(texts[3 + 27], "ab. v27");
    }

    /// Values shown for a two-column field set with one invisible, one empty
    /// and two filled items, rendered as a table or in free flow.
    fn shown_values(table_view: bool) -> Vec<String> {
        let field_set = json!({
            "id": "fs", "ordinal": 0, "title": "People",
            "multiplicity": {"min": 0, "max": 10, "tableView": table_view},
            "fields": [
                field("name", 0, json!({"fieldType": "freetext", "label": "Name"})),
                field("role", 1, json!({"fieldType": "freetext", "label": "Role"}))
            ]
        });
        let visibility = visible_items(&["name", "role"], 4).with("fs", Some(1), false);
        let rendered = compose(
            single_field_set(field_set),
            items(&[
                json!({"name": {"textValue": "Ann"}, "role": {"textValue": "PI"}}),
                json!({"name": {"textValue": "Hidden"}, "role": {"textValue": "Ghost"}}),
                json!({}),
                json!({"name": {"textValue": "Bob"}}),
            ]),
            &visibility,
        );

        let paragraphs: Vec<&Paragraph> = if table_view {
            rendered
                .blocks
                .iter()
                .filter_map(|block| match block {
                    Block::Table(table) => Some(table),
                    _ => None,
                })
                .flat_map(|table| table.rows.iter().skip(1))
                .flat_map(|row| row.cells.iter())
                .flat_map(|cell| cell.blocks.iter().filter_map(Block::as_paragraph))
                .collect()
        } else {
            rendered
                .blocks
                .iter()
                .filter_map(Block::as_paragraph)
                .filter(|paragraph| paragraph.props.style().is_none())
                .collect()
        };
        let markers = [letters(0) + ". ", letters(1) + ". "];
        let mut values: Vec<String> = paragraphs
            .into_iter()
            .flat_map(Paragraph::runs)
            .map(Run::text)
            .filter(|text| !text.is_empty() && !markers.contains(text))
            .collect();
        values.sort();
        values
    }

    #[test]
    fn test_table_and_free_flow_show_same_values() {
        let table = shown_values(true);
        assert_eq!(table, vec!["Ann", "Bob", "PI"]);
        assert_eq!(shown_values(false), table);
    }

    #[test]
    fn test_free_flow_letters_match_table_rows() {
        let rendered = compose(
            single_field_set(json!({
                "id": "fs", "ordinal": 0, "title": "People",
                "multiplicity": {"tableView": false},
                "fields": [field("name", 0, json!({"fieldType": "freetext", "label": "Name"}))]
            })),
            items(&[
                json!({"name": {"textValue": "Ann"}}),
                json!({"name": {"textValue": "Hidden"}}),
                json!({}),
                json!({"name": {"textValue": "Bob"}}),
            ]),
            &visible_items(&["name"], 4).with("fs", Some(1), false),
        );

        assert_eq!(
            rendered.texts(),
            vec!["1 Plan", "1.1 General", "1.1.1 People", "a. Ann", "b. Bob"]
        );
    }

    #[test]
    fn test_invisible_item_is_skipped() {
        let mut visibility = visible_items(&["name"], 2);
        visibility = visibility.with("fs", Some(1), false);
        let rendered = compose(
            single_field_set(freetext_set("People", Some(json!({})))),
            items(&[
                json!({"name": {"textValue": "Ann"}}),
                json!({"name": {"textValue": "Bob"}}),
            ]),
            &visibility,
        );

        assert_eq!(rendered.texts(), vec!["1 Plan", "1.1 General", "1.1.1 People", "Ann"]);
    }

    #[test]
    fn test_multiple_values_are_bulleted() {
        let field_set = json!({
            "id": "fs", "ordinal": 0,
            "fields": [field("tags", 0, json!({"fieldType": "tags", "label": "Keywords"}))]
        });
        let rendered = compose(
            single_field_set(field_set),
            items(&[json!({"tags": {"textListValue": ["soil", "water"]}})]),
            &visible_items(&["tags"], 1),
        );

        assert_eq!(rendered.texts(), vec!["1 Plan", "1.1 General", "• soil", "• water"]);
    }

    #[test]
    fn test_researcher_orcid_link() {
        let field_set = json!({
            "id": "fs", "ordinal": 0,
            "fields": [field("people", 0, json!({"fieldType": "referenceTypes", "label": "People",
                "referenceType": {"name": "Researchers", "code": "researchers"}}))]
        });
        let rendered = compose(
            single_field_set(field_set),
            items(&[json!({"people": {"references": [{"label": "Jane Doe (orcid:0000-0002-1825-0097)"}]}})]),
            &visible_items(&["people"], 1),
        );

        let paragraph = rendered.paragraph("Jane Doe (orcid: 0000-0002-1825-0097)");
        let [Inline::Run(head), Inline::Hyperlink(link), Inline::Run(tail)] = &paragraph.content[..] else {
            panic!("unexpected inlines {:?}", paragraph.content);
        };
        assert_eq!(head.text(), "Jane Doe (orcid: ");
        assert_eq!(tail.text(), ")");
        assert_eq!(
            rendered.hyperlink_target(link),
            "https://orcid.org/0000-0002-1825-0097"
        );
        assert_eq!(link.runs[0].props.color(), Some("0000FF"));
        assert!(link.runs[0].props.is_underlined());
    }

    #[test]
    fn test_organization_pid_links() {
        let field_set = json!({
            "id": "fs", "ordinal": 0,
            "fields": [field("orgs", 0, json!({"fieldType": "referenceTypes", "label": "Partners",
                "multipleSelect": true,
                "referenceType": {"name": "Organizations", "code": "organizations"}}))]
        });
        let references = json!([
            {"label": "CERN", "reference": "01ggx4157",
             "definition": {"fields": [{"code": "pidTypeField", "value": "ror"}]}},
            {"label": "Local lab"}
        ]);
        let rendered = compose(
            single_field_set(field_set),
            items(&[json!({"orgs": {"references": references}})]),
            &visible_items(&["orgs"], 1),
        );

        let linked = rendered.paragraph("• CERN");
        let [Inline::Run(bullet), Inline::Hyperlink(link)] = &linked.content[..] else {
            panic!("unexpected inlines {:?}", linked.content);
        };
        assert_eq!(bullet.text(), "• ");
        assert_eq!(rendered.hyperlink_target(link), "https://ror.org/01ggx4157");
        assert_eq!(link.runs[0].props.size(), Some(11));
        assert_eq!(rendered.paragraph("• Local lab").content.len(), 1);
        assert_eq!(
            rendered.document.resources.relationships.targets_of(REL_HYPERLINK),
            vec!["https://ror.org/01ggx4157".to_owned()]
        );
    }

    fn upload_set() -> Value {
        json!({
            "id": "fs", "ordinal": 0,
            "fields": [field("file", 0, json!({"fieldType": "upload", "label": "Figure",
                "types": [{"label": "PNG", "value": "image/png"}]}))]
        })
    }

    #[test]
    fn test_upload_embeds_image_with_caption() {
        let mut properties: Properties =
            serde_json::from_value(items(&[json!({"file": {"textValue": "f-1"}})])).unwrap();
        properties.field_sets.get_mut("fs").unwrap().items[0]
            .fields
            .get_mut("file")
            .unwrap()
            .file = Some(FileEnvelope {
            mime_type: Some("image/png".to_owned()),
            ..FileEnvelope::inline("chart.png", png_bytes(20, 10))
        });

        let rendered = compose_with(single_field_set(upload_set()), properties, &visible_items(&["file"], 1));

        assert_eq!(rendered.texts(), vec!["1 Plan", "1.1 General", "", "Image 1"]);
        let image = rendered.blocks[2].as_paragraph().unwrap();
        assert!(image.runs().any(Run::has_drawing));
        assert_eq!(rendered.paragraph("Image 1").props.style(), Some("Caption"));
    }

    #[test]
    fn test_lone_image_item_leaves_no_empty_paragraph() {
        let mut field_set = upload_set();
        field_set["multiplicity"] = json!({});
        let mut properties: Properties =
            serde_json::from_value(items(&[json!({}), json!({"file": {"textValue": "f-1"}})])).unwrap();
        properties.field_sets.get_mut("fs").unwrap().items[1]
            .fields
            .get_mut("file")
            .unwrap()
            .file = Some(FileEnvelope {
            mime_type: Some("image/png".to_owned()),
            ..FileEnvelope::inline("chart.png", png_bytes(20, 10))
        });

        let rendered = compose_with(single_field_set(field_set), properties, &visible_items(&["file"], 2));

        assert_eq!(rendered.texts(), vec!["1 Plan", "1.1 General", "", "Image 1"]);
        let image = rendered.blocks[2].as_paragraph().unwrap();
        assert!(image.runs().any(Run::has_drawing));
    }

    #[test]
    fn test_upload_without_bytes_renders_filename() {
        let rendered = compose(
            single_field_set(upload_set()),
            items(&[json!({"file": {"textValue": "f-1",
                "file": {"filename": "chart.png", "mimeType": "image/png"}}})]),
            &visible_items(&["file"], 1),
        );

        assert_eq!(rendered.texts(), vec!["1 Plan", "1.1 General", "chart.png"]);
    }

    #[test]
    fn test_comment_counts_as_content() {
        let properties = json!({"fieldSets": {"fs": {
            "items": [{"ordinal": 0, "fields": {}}],
            "comment": "Checked by <b>PI</b>"
        }}});
        let rendered = compose(
            single_field_set(freetext_set("Review", None)),
            properties,
            &visible_items(&["name"], 1),
        );

        let texts = rendered.texts();
        assert_eq!(texts[..3].to_vec(), vec!["1 Plan", "1.1 General", "1.1.1 Review"]);
        assert!(texts.contains(&"Comment:Checked by PI".to_owned()), "{texts:?}");
    }

    #[test]
    fn test_extract_values_by_kind() {
        let data = |value: Value| -> FieldData { serde_json::from_value(value).unwrap() };
        let value = |value: Value| -> FieldValue { serde_json::from_value(value).unwrap() };

        let select = data(json!({"fieldType": "select", "label": "Kind",
            "options": [{"label": "Raw", "value": "raw"}, {"label": "Derived", "value": "derived"}]}));
        assert_eq!(
            extract_values(&select, &value(json!({"textListValue": ["derived", "Raw"]}))),
            vec!["Raw", "Derived"]
        );

        let decision = data(json!({"fieldType": "boolean_decision", "label": "Open?"}));
        assert_eq!(extract_values(&decision, &value(json!({"booleanValue": false}))), vec!["No"]);

        let radio = data(json!({"fieldType": "radiobox", "label": "Licence",
            "options": [{"label": "CC-BY", "value": "ccby"}]}));
        assert_eq!(extract_values(&radio, &value(json!({"textValue": "ccby"}))), vec!["CC-BY"]);

        let check = data(json!({"fieldType": "checkBox", "label": "Sensitive"}));
        assert_eq!(extract_values(&check, &value(json!({"booleanValue": true}))), vec!["Sensitive"]);
        assert!(extract_values(&check, &value(json!({"booleanValue": false}))).is_empty());

        let date = data(json!({"fieldType": "datePicker", "label": "Start"}));
        assert_eq!(
            extract_values(&date, &value(json!({"dateValue": "2024-03-05T10:00:00Z"}))),
            vec!["2024-03-05"]
        );

        let identifier = data(json!({"fieldType": "datasetIdentifier", "label": "PID"}));
        assert_eq!(
            extract_values(
                &identifier,
                &value(json!({"externalIdentifier": {"identifier": "10.1/x", "type": "doi"}}))
            ),
            vec!["id: 10.1/x, Type: doi"]
        );

        let upload = data(json!({"fieldType": "upload", "label": "File"}));
        assert!(extract_values(&upload, &value(json!({"textValue": "x"}))).is_empty());
    }

    #[test]
    fn test_split_orcid() {
        assert_eq!(
            split_orcid("A B (orcid:0000-1)"),
            Some(("A B (orcid: ".to_owned(), "0000-1"))
        );
        assert_eq!(
            split_orcid("Dr: Ada Lovelace (orcid:0000-0002-1825-0097)"),
            Some(("Dr: Ada Lovelace (orcid: ".to_owned(), "0000-0002-1825-0097"))
        );
        assert_eq!(split_orcid("A B (orcid:0000-1"), None);
        assert_eq!(split_orcid("A B"), None);
    }
}
