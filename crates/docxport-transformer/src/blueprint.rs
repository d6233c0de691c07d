//! Plan blueprint rendering.
//!
//! Each blueprint section becomes a numbered heading, its fields in ordinal
//! order and the descriptions attached to it.

use chrono::{DateTime, Utc};
use docxport_config::ReferenceCodes;
use docxport_docx::{Block, Paragraph, Resources, Run};
use docxport_model::{
    BlueprintField, BlueprintSection, Description, DescriptionInternalStatus, ExtraField,
    ExtraFieldDataType, Plan, Properties, ReferenceTypeField, SystemField, SystemFieldType,
    UploadField,
};
use docxport_renderer::{Insertion, TemplateCompositor, insert_html, is_image_mime, prepare_html};
use uuid::Uuid;

const LABEL_COLOR: &str = "000000";
const VALUE_COLOR: &str = "116a78";
const DESCRIPTION_TITLE_SIZE: u32 = 15;
/// Line spacing in 240ths of a line.
const SINGLE_LINE: u32 = 240;
const ONE_AND_HALF_LINE: u32 = 360;

/// Renders the blueprint sections of a plan.
pub struct PlanRenderer<'a> {
    plan: &'a Plan,
    codes: &'a ReferenceCodes,
    compositor: TemplateCompositor<'a>,
    now: DateTime<Utc>,
}

impl<'a> PlanRenderer<'a> {
    pub fn new(
        plan: &'a Plan,
        codes: &'a ReferenceCodes,
        compositor: TemplateCompositor<'a>,
    ) -> Self {
        Self {
            plan,
            codes,
            compositor,
            now: Utc::now(),
        }
    }

    /// Evaluate public visibility at `now` instead of the current time.
    #[must_use]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Append every section to `body`, in the order given.
    pub fn render(
        &mut self,
        resources: &mut Resources,
        body: &mut Vec<Block>,
        sections: &[BlueprintSection],
    ) {
        for section in sections {
            self.section(resources, body, section);
        }
    }

    fn section(&mut self, resources: &mut Resources, body: &mut Vec<Block>, section: &BlueprintSection) {
        body.push(heading(
            "Heading1",
            &format!(
                "{}. {}",
                section.ordinal,
                section.label.as_deref().unwrap_or_default()
            ),
        ));

        let mut fields: Vec<&BlueprintField> = section.fields.iter().collect();
        fields.sort_by_key(|field| field.ordinal());
        for field in fields {
            match field {
                BlueprintField::System(field) => self.system_field(resources, body, field),
                BlueprintField::Extra(field) => self.extra_field(resources, body, field),
                BlueprintField::ReferenceType(field) => self.reference_field(body, field),
                BlueprintField::Upload(field) => self.upload_field(resources, body, field),
            }
        }

        let descriptions = self.section_descriptions(section.id);
        if descriptions.is_empty() {
            return;
        }
        body.push(heading("Heading2", "Descriptions"));
        for description in descriptions {
            self.description(resources, body, description);
        }
    }

    /// Descriptions of a section in creation order.
    ///
    /// Cancelled descriptions are never listed; a finalized or public plan
    /// only lists finalized ones.
    fn section_descriptions(&self, section_id: Option<Uuid>) -> Vec<&'a Description> {
        let plan = self.plan;
        let finalized_only = plan.is_finalized() || plan.is_public_at(self.now);
        let mut descriptions: Vec<&Description> = plan
            .descriptions
            .iter()
            .filter(|d| d.internal_status() != Some(DescriptionInternalStatus::Canceled))
            .filter(|d| {
                !finalized_only || d.internal_status() == Some(DescriptionInternalStatus::Finalized)
            })
            .filter(|d| d.section_id.is_some() && d.section_id == section_id)
            .collect();
        descriptions.sort_by_key(|d| d.created_at);
        descriptions
    }

    fn description(&mut self, resources: &mut Resources, body: &mut Vec<Block>, description: &Description) {
        let mut title = Paragraph::styled("Heading4");
        title.props.set_line_spacing(ONE_AND_HALF_LINE);
        title.push_run(
            Run::text_run(description.label.clone().unwrap_or_default())
                .size(DESCRIPTION_TITLE_SIZE),
        );
        body.push(title.into());

        body.push(Paragraph::new().into());
        append_html(resources, body, description.description.as_deref());

        let template = description.description_template.as_ref();
        body.push(
            labelled(
                "Template: ",
                template.and_then(|t| t.label.as_deref()).unwrap_or_default(),
            )
            .into(),
        );
        body.push(
            labelled("Type: ", description.template_type_name().unwrap_or_default()).into(),
        );
        body.push(Paragraph::new().into());

        match template.and_then(|t| t.definition.as_ref()) {
            Some(definition) => {
                let empty = Properties::default();
                let properties = description.properties.as_ref().unwrap_or(&empty);
                self.compositor.compose(
                    resources,
                    body,
                    &definition.pages,
                    properties,
                    &description.visibility(),
                );
            }
            None => tracing::error!(
                description = ?description.id,
                "Description has no template definition"
            ),
        }

        let mut page_break = Paragraph::new();
        page_break.props.set_page_break_before(true);
        body.push(page_break.into());
    }

    fn system_field(&self, resources: &mut Resources, body: &mut Vec<Block>, field: &SystemField) {
        let kind = field.system_field_type;
        if matches!(kind, SystemFieldType::Language | SystemFieldType::User) {
            return;
        }
        let label = field
            .label
            .as_deref()
            .filter(|label| !label.trim().is_empty())
            .unwrap_or(kind.default_label());
        let mut paragraph = Paragraph::new().with_run(label_run(label));

        let plan = self.plan;
        let mut html = None;
        match kind {
            SystemFieldType::Title => {
                paragraph.push_run(value_run(plan.label.as_deref().unwrap_or_default()));
            }
            SystemFieldType::Description => html = plan.description.as_deref(),
            SystemFieldType::AccessRights => {
                if let Some(access) = plan.access_type {
                    paragraph.push_run(value_run(access.as_str()));
                }
            }
            SystemFieldType::Contact => {
                let contacts = contact_list(plan);
                if !contacts.is_empty() {
                    paragraph.push_run(value_run(&contacts));
                }
            }
            SystemFieldType::Language | SystemFieldType::User => {}
        }
        body.push(paragraph.into());
        append_html(resources, body, html);
    }

    fn extra_field(&self, resources: &mut Resources, body: &mut Vec<Block>, field: &ExtraField) {
        let mut paragraph = Paragraph::new();
        paragraph.props.set_line_spacing(SINGLE_LINE);
        paragraph.push_run(label_run(field.label.as_deref().unwrap_or_default()));

        let mut html = None;
        if let Some(value) = field.id.and_then(|id| self.plan.blueprint_value(id)) {
            let text = match field.data_type {
                ExtraFieldDataType::RichText => {
                    html = value.text();
                    None
                }
                ExtraFieldDataType::Number => value.number_value.map(format_number),
                ExtraFieldDataType::Date => value
                    .date_value
                    .map(|date| date.format("%Y-%m-%d").to_string()),
                ExtraFieldDataType::Text => value.text().map(str::to_owned),
            };
            if let Some(text) = text {
                paragraph.push_run(value_run(&text));
            }
        }
        body.push(paragraph.into());
        append_html(resources, body, html);
    }

    fn reference_field(&self, body: &mut Vec<Block>, field: &ReferenceTypeField) {
        let label = field
            .label
            .as_deref()
            .filter(|label| !label.trim().is_empty())
            .unwrap_or(&field.reference_type.name);
        let mut paragraph = Paragraph::new().with_run(label_run(label));

        let code = field.reference_type.code.as_str();
        let on_new_line = code.eq_ignore_ascii_case(&self.codes.researcher)
            || code.eq_ignore_ascii_case(&self.codes.organization);
        let show_identifier = code.eq_ignore_ascii_case(&self.codes.licence);
        for reference in self.plan.references_of_type(code, field.id) {
            let mut run = Run::new().color(VALUE_COLOR);
            if on_new_line {
                run.push_break();
            }
            let text = if show_identifier {
                reference.reference.as_deref()
            } else {
                reference.label.as_deref()
            };
            run.push_text(text.unwrap_or_default());
            paragraph.push_run(run);
        }
        body.push(paragraph.into());
    }

    fn upload_field(&mut self, resources: &mut Resources, body: &mut Vec<Block>, field: &UploadField) {
        let mut paragraph = Paragraph::new();
        paragraph.props.set_line_spacing(SINGLE_LINE);
        paragraph.push_run(label_run(field.label.as_deref().unwrap_or_default()));

        let file = field
            .id
            .and_then(|id| self.plan.blueprint_value(id))
            .filter(|value| value.text().is_some())
            .and_then(|value| value.file.as_ref());
        let Some(file) = file else {
            body.push(paragraph.into());
            return;
        };

        if file.mime_type.as_deref().is_some_and(is_image_mime) {
            match self.compositor.media_mut().picture(resources, file) {
                Ok(picture) => {
                    body.push(paragraph.into());
                    body.extend(picture.map(Block::from));
                    return;
                }
                Err(error) => tracing::error!(
                    filename = file.display_name().unwrap_or_default(),
                    error = %error,
                    "Failed to embed blueprint image, rendering its filename"
                ),
            }
        }
        if let Some(name) = file.display_name() {
            paragraph.push_run(value_run(name));
        }
        body.push(paragraph.into());
    }
}

fn heading(style: &str, text: &str) -> Block {
    let mut paragraph = Paragraph::styled(style).with_run(Run::text_run(text));
    paragraph.props.set_indent_left(0);
    paragraph.into()
}

fn label_run(label: &str) -> Run {
    Run::text_run(format!("{label}: ")).color(LABEL_COLOR)
}

fn value_run(text: &str) -> Run {
    Run::text_run(text).color(VALUE_COLOR)
}

/// A black label followed by a coloured value.
fn labelled(label: &str, value: &str) -> Paragraph {
    Paragraph::new()
        .with_run(Run::text_run(label).color(LABEL_COLOR))
        .with_run(value_run(value))
}

fn append_html(resources: &mut Resources, body: &mut Vec<Block>, html: Option<&str>) {
    if let Some(html) = html.filter(|html| !html.is_empty()) {
        insert_html(resources, body, Insertion::Append, &prepare_html(html, false), 0);
    }
}

/// Contacts as "Last First (email)", comma separated.
fn contact_list(plan: &Plan) -> String {
    plan.contacts()
        .iter()
        .map(|contact| {
            let mut text = format!(
                "{} {}",
                contact.last_name.as_deref().unwrap_or_default(),
                contact.first_name.as_deref().unwrap_or_default()
            );
            if let Some(email) = contact.email.as_deref().filter(|e| !e.is_empty()) {
                text = format!("{text} ({email})");
            }
            text.trim().to_owned()
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Number with thousands grouping and at most three fraction digits.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.3}", value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((&fixed, ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && (grouped != "0" || !fraction.is_empty());
    let sign = if negative { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docxport_docx::{Document, RunContent};
    use docxport_lookup::PidLinks;
    use docxport_model::FileEnvelope;
    use docxport_renderer::Media;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    const FIELD_A: &str = "11111111-1111-4111-8111-111111111111";
    const FIELD_B: &str = "22222222-2222-4222-8222-222222222222";
    const SECTION_A: &str = "aaaaaaaa-aaaa-4aaa-8aaa-aaaaaaaaaaaa";
    const SECTION_B: &str = "bbbbbbbb-bbbb-4bbb-8bbb-bbbbbbbbbbbb";

    fn render(plan: &Plan, sections: Value) -> Document {
        let sections: Vec<BlueprintSection> = serde_json::from_value(sections).unwrap();
        let codes = ReferenceCodes::default();
        let mut document = Document::new();
        let media = Media::new(document.geometry().content_box_pt());
        let compositor = TemplateCompositor::new(&codes, PidLinks::builtin(), media);
        PlanRenderer::new(plan, &codes, compositor).render(
            &mut document.resources,
            &mut document.body,
            &sections,
        );
        document
    }

    fn texts(document: &Document) -> Vec<String> {
        document
            .body
            .iter()
            .filter_map(Block::as_paragraph)
            .map(Paragraph::text)
            .collect()
    }

    fn plan(value: Value) -> Plan {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_system_fields() {
        let plan = plan(json!({
            "label": "Soil DMP",
            "accessType": "Restricted",
            "properties": {"contacts": [
                {"firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.org"},
                {"firstName": "Grace", "lastName": "Hopper"}
            ]}
        }));
        let document = render(
            &plan,
            json!([{"label": "Main", "ordinal": 1, "fields": [
                {"category": "System", "ordinal": 3, "systemFieldType": "Contact"},
                {"category": "System", "ordinal": 0, "systemFieldType": "Language"},
                {"category": "System", "ordinal": 1, "label": "Name", "systemFieldType": "Title"},
                {"category": "System", "ordinal": 2, "label": " ", "systemFieldType": "AccessRights"},
                {"category": "System", "ordinal": 4, "systemFieldType": "User"}
            ]}]),
        );

        assert_eq!(
            texts(&document),
            vec![
                "1. Main",
                "Name: Soil DMP",
                "Access Rights: Restricted",
                "Contact: Lovelace Ada (ada@example.org), Hopper Grace",
            ]
        );
        let heading = document.body[0].as_paragraph().unwrap();
        assert_eq!(heading.props.style(), Some("Heading1"));
        let title = document.body[1].as_paragraph().unwrap();
        let colors: Vec<Option<&str>> = title.runs().map(|run| run.props.color()).collect();
        assert_eq!(colors, vec![Some(LABEL_COLOR), Some(VALUE_COLOR)]);
    }

    #[test]
    fn test_description_system_field_writes_rich_text() {
        let plan = plan(json!({"description": "<p>Goals</p>"}));
        let document = render(
            &plan,
            json!([{"label": "Main", "ordinal": 1, "fields": [
                {"category": "System", "ordinal": 0, "systemFieldType": "Description"}
            ]}]),
        );
        let texts = texts(&document);
        assert_eq!(texts[..2].to_vec(), vec!["1. Main", "Description: "]);
        assert!(texts.contains(&"Goals".to_owned()));
    }

    #[test]
    fn test_extra_fields() {
        let plan = plan(json!({"properties": {"planBlueprintValues": [
            {"fieldId": FIELD_A, "numberValue": 1_234_567.5},
            {"fieldId": FIELD_B, "dateValue": "2024-05-01T00:00:00Z"}
        ]}}));
        let document = render(
            &plan,
            json!([{"label": "Extra", "ordinal": 2, "fields": [
                {"category": "Extra", "id": FIELD_A, "label": "Budget", "ordinal": 0, "dataType": "Number"},
                {"category": "Extra", "id": FIELD_B, "label": "Start", "ordinal": 1, "dataType": "Date"},
                {"category": "Extra", "label": "Notes", "ordinal": 2, "dataType": "Text"}
            ]}]),
        );
        assert_eq!(
            texts(&document),
            vec!["2. Extra", "Budget: 1,234,567.5", "Start: 2024-05-01", "Notes: "]
        );
    }

    #[test]
    fn test_reference_fields() {
        let plan = plan(json!({"references": [
            {"reference": {"label": "Ada", "type": {"code": "researchers"}},
             "data": {"blueprintFieldId": FIELD_A}},
            {"reference": {"label": "CC BY", "reference": "https://creativecommons.org/licenses/by/4.0/",
                "type": {"code": "licenses"}}},
            {"reference": {"label": "Other researcher", "type": {"code": "researchers"}},
             "data": {"blueprintFieldId": FIELD_B}}
        ]}));
        let document = render(
            &plan,
            json!([{"label": "People", "ordinal": 1, "fields": [
                {"category": "ReferenceType", "id": FIELD_A, "ordinal": 0,
                 "referenceType": {"name": "Researchers", "code": "researchers"}},
                {"category": "ReferenceType", "label": "Licence", "ordinal": 1,
                 "referenceType": {"name": "Licenses", "code": "licenses"}}
            ]}]),
        );

        assert_eq!(
            texts(&document),
            vec![
                "1. People",
                "Researchers: Ada",
                "Licence: https://creativecommons.org/licenses/by/4.0/"
            ]
        );
        let researchers = document.body[1].as_paragraph().unwrap();
        let value = researchers.runs().nth(1).unwrap();
        assert_eq!(value.content[0], RunContent::Break(docxport_docx::BreakKind::Line));
    }

    #[test]
    fn test_upload_field_shows_filename_for_documents() {
        let mut plan = plan(json!({"properties": {"planBlueprintValues": [
            {"fieldId": FIELD_A, "value": "upload-1"}
        ]}}));
        plan.properties.as_mut().unwrap().plan_blueprint_values[0].file = Some(FileEnvelope {
            mime_type: Some("application/pdf".to_owned()),
            ..FileEnvelope::inline("budget.pdf", b"%PDF".to_vec())
        });
        let document = render(
            &plan,
            json!([{"label": "Files", "ordinal": 1, "fields": [
                {"category": "Upload", "id": FIELD_A, "label": "Budget", "ordinal": 0}
            ]}]),
        );
        assert_eq!(texts(&document), vec!["1. Files", "Budget: budget.pdf"]);
    }

    #[test]
    fn test_upload_field_embeds_image() {
        let mut png = std::io::Cursor::new(Vec::new());
        image::RgbImage::new(40, 20)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let mut plan = plan(json!({"properties": {"planBlueprintValues": [
            {"fieldId": FIELD_A, "value": "upload-1"}
        ]}}));
        plan.properties.as_mut().unwrap().plan_blueprint_values[0].file = Some(FileEnvelope {
            mime_type: Some("image/png".to_owned()),
            ..FileEnvelope::inline("chart.png", png.into_inner())
        });
        let document = render(
            &plan,
            json!([{"label": "Files", "ordinal": 1, "fields": [
                {"category": "Upload", "id": FIELD_A, "label": "Chart", "ordinal": 0}
            ]}]),
        );

        assert_eq!(texts(&document), vec!["1. Files", "Chart: ", "", "Image 1"]);
        let picture = document.body[2].as_paragraph().unwrap();
        assert!(picture.runs().any(Run::has_drawing));
    }

    #[test]
    fn test_finalized_plan_lists_finalized_descriptions_in_creation_order() {
        let plan = plan(json!({
            "status": {"internalStatus": "Finalized"},
            "descriptions": [
                {"label": "Later", "sectionId": SECTION_A, "createdAt": "2024-02-01T00:00:00Z",
                 "status": {"internalStatus": "Finalized"},
                 "descriptionTemplate": {"label": "Dataset", "type": {"name": "Data"}}},
                {"label": "Draft", "sectionId": SECTION_A, "createdAt": "2024-01-15T00:00:00Z",
                 "status": {"internalStatus": "Draft"}},
                {"label": "Earlier", "sectionId": SECTION_A, "createdAt": "2024-01-01T00:00:00Z",
                 "status": {"internalStatus": "Finalized"}},
                {"label": "Elsewhere", "sectionId": SECTION_B,
                 "status": {"internalStatus": "Finalized"}}
            ]
        }));
        let document = render(
            &plan,
            json!([{"id": SECTION_A, "label": "Data", "ordinal": 1, "fields": []}]),
        );

        let titles: Vec<String> = document
            .body
            .iter()
            .filter_map(Block::as_paragraph)
            .filter(|p| p.props.style() == Some("Heading4"))
            .map(Paragraph::text)
            .collect();
        assert_eq!(titles, vec!["Earlier", "Later"]);

        let texts = texts(&document);
        assert_eq!(texts[1], "Descriptions");
        assert!(texts.contains(&"Template: Dataset".to_owned()));
        assert!(texts.contains(&"Type: Data".to_owned()));
        let last = document.body.last().unwrap().as_paragraph().unwrap();
        assert!(last.props.page_break_before());
    }

    #[test]
    fn test_draft_plan_skips_only_cancelled_descriptions() {
        let plan = plan(json!({
            "descriptions": [
                {"label": "Draft", "sectionId": SECTION_A, "status": {"internalStatus": "Draft"}},
                {"label": "Gone", "sectionId": SECTION_A, "status": {"internalStatus": "Canceled"}}
            ]
        }));
        let document = render(
            &plan,
            json!([{"id": SECTION_A, "label": "Data", "ordinal": 1}]),
        );
        let texts = texts(&document);
        assert!(texts.contains(&"Draft".to_owned()));
        assert!(!texts.contains(&"Gone".to_owned()));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(1234.5), "1,234.5");
        assert_eq!(format_number(-9_876_543.2109), "-9,876,543.211");
        assert_eq!(format_number(0.0001), "0");
    }
}
