//! Placeholder token filling.
//!
//! Templates carry tokens of the form `'{OPENCDMP.PLAN.TITLE}'` in their
//! first page, tables, headers and footers. Reference tokens name a
//! reference type code, e.g. `'{OPENCDMP.PLAN-REFERENCE.GRANTS}'`; the
//! codes are discovered by scanning the document before filling.

use chrono::{DateTime, Utc};
use docxport_docx::{Block, Document, Paragraph};
use docxport_lookup::Languages;
use docxport_model::{AccessType, Description, Plan, Properties, Reference};
use docxport_renderer::{Insertion, insert_html, prepare_html, replace_token};

const DATE_FORMAT: &str = "%d/%m/%Y";
/// Font size of reference lists written into the body.
const REFERENCE_SIZE: u32 = 15;
const PLAN_REFERENCE: &str = "PLAN-REFERENCE";
const DESCRIPTION_REFERENCE: &str = "DESCRIPTION-REFERENCE";
const PLAN_DESCRIPTION: &str = "PLAN.DESCRIPTION";
const DESCRIPTION_DESCRIPTION: &str = "DESCRIPTION.DESCRIPTION";

fn token(name: &str) -> String {
    format!("'{{OPENCDMP.{name}}}'")
}

#[derive(Debug, Clone, Copy)]
struct Mode {
    /// Footers and headers show "-" for missing values and only the first
    /// reference identifier.
    footer: bool,
    /// Replace description tokens with raw text instead of leaving them
    /// for rich text insertion.
    description_text: bool,
}

impl Mode {
    const BODY: Self = Self {
        footer: false,
        description_text: false,
    };
    const CELL: Self = Self {
        footer: false,
        description_text: true,
    };
    const FOOTER: Self = Self {
        footer: true,
        description_text: true,
    };
}

struct Replacement {
    token: String,
    value: String,
    size: Option<u32>,
}

impl Replacement {
    fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            token: token(name),
            value: value.into(),
            size: None,
        }
    }

    fn apply(&self, paragraph: &mut Paragraph) {
        replace_token(paragraph, &self.token, &self.value, self.size);
    }
}

/// Fills template tokens from a plan and, for description exports, the
/// description being exported.
pub struct TokenFiller<'a> {
    plan: &'a Plan,
    description: Option<&'a Description>,
    languages: &'a Languages,
}

impl<'a> TokenFiller<'a> {
    pub fn new(plan: &'a Plan, languages: &'a Languages) -> Self {
        Self {
            plan,
            description: None,
            languages,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: &'a Description) -> Self {
        self.description = Some(description);
        self
    }

    /// Fill body paragraphs and top-level table cells.
    ///
    /// The paragraph holding the description token is emptied and the plan
    /// description (or the description's own text) is written there as
    /// rich text.
    pub fn fill_first_page(&self, document: &mut Document) {
        let codes = reference_codes(document, true);

        let body = self.replacements(&codes, Mode::BODY);
        let description_tokens = [token(PLAN_DESCRIPTION), token(DESCRIPTION_DESCRIPTION)];
        let mut description_at = None;
        for (index, block) in document.body.iter_mut().enumerate() {
            let Some(paragraph) = block.as_paragraph_mut() else {
                continue;
            };
            for replacement in &body {
                replacement.apply(paragraph);
            }
            for description_token in &description_tokens {
                if replace_token(paragraph, description_token, "", None) > 0 {
                    description_at = Some(index);
                }
            }
        }
        if let (Some(index), Some(html)) = (description_at, self.first_page_text()) {
            insert_html(
                &mut document.resources,
                &mut document.body,
                Insertion::After(index),
                &prepare_html(html, false),
                0,
            );
        }

        let cells = self.replacements(&codes, Mode::CELL);
        for block in &mut document.body {
            let Block::Table(table) = block else {
                continue;
            };
            for cell in table.cells_mut() {
                fill_blocks(&mut cell.blocks, &cells);
            }
        }
    }

    pub fn fill_footers(&self, document: &mut Document) {
        let replacements = self.replacements(&reference_codes(document, false), Mode::FOOTER);
        for footer in &mut document.footers {
            fill_blocks(&mut footer.blocks, &replacements);
        }
    }

    pub fn fill_headers(&self, document: &mut Document) {
        let replacements = self.replacements(&reference_codes(document, false), Mode::FOOTER);
        for header in &mut document.headers {
            fill_blocks(&mut header.blocks, &replacements);
        }
    }

    fn first_page_text(&self) -> Option<&str> {
        match self.description {
            Some(description) => description.description.as_deref(),
            None => self.plan.description.as_deref(),
        }
    }

    fn replacements(&self, codes: &[String], mode: Mode) -> Vec<Replacement> {
        let plan = self.plan;
        let description = self.description;
        let missing = if mode.footer { "-" } else { "" };
        let date = |value: Option<DateTime<Utc>>| {
            value.map_or_else(|| "-".to_owned(), |d| d.format(DATE_FORMAT).to_string())
        };

        let mut out = vec![
            Replacement::new("PLAN.TITLE", plan.label.clone().unwrap_or_default()),
            Replacement::new(
                "PLAN.VERSION",
                plan.version.as_ref().map(ToString::to_string).unwrap_or_default(),
            ),
            Replacement::new(
                "PLAN.STATUS",
                plan.status
                    .as_ref()
                    .and_then(|s| s.name.clone())
                    .unwrap_or_default(),
            ),
            Replacement::new(
                "PLAN.ID",
                plan.id.as_ref().map(ToString::to_string).unwrap_or_default(),
            ),
            Replacement::new("PLAN.LANGUAGE", self.language()),
            Replacement::new(
                "PLAN.ACCESS-TYPE",
                plan.access_type.map(AccessType::as_str).unwrap_or_default(),
            ),
            Replacement::new(
                "PLAN.BLUEPRINT.NAME",
                plan.plan_blueprint
                    .as_ref()
                    .and_then(|b| b.label.clone())
                    .unwrap_or_default(),
            ),
            Replacement::new("PLAN.CREATED-AT", date(plan.created_at)),
            Replacement::new("PLAN.UPDATED-AT", date(plan.updated_at)),
            Replacement::new("PLAN.FINALIZED-AT", date(plan.finalized_at)),
            Replacement::new(
                "PLAN.DEPOSIT-IDENTIFIERS",
                plan.entity_dois
                    .first()
                    .and_then(|d| d.doi.as_deref())
                    .unwrap_or(missing),
            ),
            Replacement::new(
                "PLAN.CREATOR.NAME",
                plan.creator
                    .as_ref()
                    .and_then(|c| c.name.as_deref())
                    .filter(|name| !name.is_empty())
                    .unwrap_or(missing),
            ),
            Replacement::new(
                "DESCRIPTION.ID",
                description
                    .and_then(|d| d.id)
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            ),
            Replacement::new(
                "DESCRIPTION.TITLE",
                description
                    .and_then(|d| d.label.clone())
                    .unwrap_or_default(),
            ),
            Replacement::new(
                "DESCRIPTION.STATUS",
                description
                    .and_then(|d| d.status.as_ref())
                    .and_then(|s| s.name.clone())
                    .unwrap_or_default(),
            ),
            Replacement::new(
                "DESCRIPTION.TEMPLATE.NAME",
                description
                    .and_then(|d| d.description_template.as_ref())
                    .and_then(|t| t.label.clone())
                    .unwrap_or_default(),
            ),
            Replacement::new(
                "DESCRIPTION.CREATED-AT",
                date(description.and_then(|d| d.created_at)),
            ),
            Replacement::new("DESCRIPTION.SECTION", self.section_label()),
        ];

        for code in codes {
            let references: Vec<&Reference> = plan
                .references
                .iter()
                .filter_map(|plan_ref| plan_ref.reference.as_ref())
                .filter(|reference| has_code(reference, code))
                .collect();
            out.push(reference_replacement(PLAN_REFERENCE, code, &references, mode));
        }
        if let Some(description) = description {
            for code in codes {
                let references: Vec<&Reference> = description
                    .properties
                    .iter()
                    .flat_map(Properties::all_references)
                    .filter(|reference| has_code(reference, code))
                    .collect();
                out.push(reference_replacement(DESCRIPTION_REFERENCE, code, &references, mode));
            }
        }

        out.push(Replacement::new(
            "PLAN.USERS",
            or_missing(self.users(false), missing),
        ));
        out.push(Replacement::new(
            "PLAN.USERS-WITH-ROLES",
            or_missing(self.users(true), missing),
        ));
        out.push(Replacement::new(
            "PLAN.CONTACTS",
            or_missing(self.contacts(), missing),
        ));

        if mode.description_text {
            out.push(Replacement::new(
                PLAN_DESCRIPTION,
                plan.description.clone().unwrap_or_default(),
            ));
            out.push(Replacement::new(
                DESCRIPTION_DESCRIPTION,
                description
                    .and_then(|d| d.description.clone())
                    .unwrap_or_default(),
            ));
        }
        out
    }

    /// Language name, or the raw code when the dictionary does not know it.
    fn language(&self) -> String {
        self.plan
            .language
            .as_deref()
            .map(|code| self.languages.name_of(code).unwrap_or(code).to_owned())
            .unwrap_or_default()
    }

    fn section_label(&self) -> String {
        let Some(section_id) = self.description.and_then(|d| d.section_id) else {
            return String::new();
        };
        self.plan
            .plan_blueprint
            .as_ref()
            .and_then(|b| b.definition.as_ref())
            .and_then(|d| d.sections.as_ref())
            .and_then(|sections| sections.iter().find(|s| s.id == Some(section_id)))
            .and_then(|section| section.label.clone())
            .unwrap_or_default()
    }

    fn users(&self, with_roles: bool) -> String {
        self.plan
            .users
            .iter()
            .filter_map(|plan_user| {
                let name = plan_user.user.as_ref()?.name.as_deref().unwrap_or_default();
                Some(match (&plan_user.role, with_roles) {
                    (Some(role), true) => format!("{name} ({role})"),
                    _ => name.to_owned(),
                })
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn contacts(&self) -> String {
        self.plan
            .contacts()
            .iter()
            .map(|contact| {
                let name = format!(
                    "{} {}",
                    contact.first_name.as_deref().unwrap_or_default(),
                    contact.last_name.as_deref().unwrap_or_default()
                );
                let name = name.trim();
                match contact.email.as_deref() {
                    Some(email) => format!("{name} ({email})"),
                    None => name.to_owned(),
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn or_missing(value: String, missing: &str) -> String {
    if value.is_empty() {
        missing.to_owned()
    } else {
        value
    }
}

fn has_code(reference: &Reference, code: &str) -> bool {
    reference
        .type_code()
        .is_some_and(|type_code| type_code.eq_ignore_ascii_case(code))
}

fn reference_replacement(
    kind: &str,
    code: &str,
    references: &[&Reference],
    mode: Mode,
) -> Replacement {
    let name = format!("{kind}.{}", code.to_uppercase());
    if mode.footer {
        let first = references
            .first()
            .map(|reference| reference.reference.as_deref().unwrap_or_default())
            .unwrap_or("-");
        return Replacement::new(&name, first);
    }
    let labels = references
        .iter()
        .filter_map(|reference| reference.label.as_deref())
        .collect::<Vec<_>>()
        .join(", ");
    Replacement {
        size: Some(REFERENCE_SIZE),
        ..Replacement::new(&name, labels)
    }
}

fn fill_blocks(blocks: &mut [Block], replacements: &[Replacement]) {
    for paragraph in blocks.iter_mut().filter_map(Block::as_paragraph_mut) {
        for replacement in replacements {
            replacement.apply(paragraph);
        }
    }
}

/// Reference type codes named by reference tokens anywhere in the document.
///
/// Body paragraphs are scanned only when `include_body` is set.
pub fn reference_codes(document: &Document, include_body: bool) -> Vec<String> {
    let mut codes = Vec::new();
    let paragraphs = |blocks: &[Block]| -> Vec<String> {
        blocks
            .iter()
            .filter_map(Block::as_paragraph)
            .map(Paragraph::text)
            .collect()
    };

    if include_body {
        for text in paragraphs(&document.body) {
            extract_codes(&text, &mut codes);
        }
    }
    for block in &document.body {
        if let Block::Table(table) = block {
            for cell in table.cells() {
                for text in paragraphs(&cell.blocks) {
                    extract_codes(&text, &mut codes);
                }
            }
        }
    }
    for part in document.footers.iter().chain(&document.headers) {
        for text in paragraphs(&part.blocks) {
            extract_codes(&text, &mut codes);
        }
    }
    codes
}

/// Collect the codes of the reference tokens in `text` into `codes`.
pub fn extract_codes(text: &str, codes: &mut Vec<String>) {
    let has_token = text.contains(&format!("'{{OPENCDMP.{PLAN_REFERENCE}."))
        || text.contains(&format!("'{{OPENCDMP.{DESCRIPTION_REFERENCE}."));
    if !has_token || !text.contains("}'") {
        return;
    }
    let parts: Vec<&str> = text.split('.').collect();
    for pair in parts.windows(2) {
        if pair[0] != PLAN_REFERENCE && pair[0] != DESCRIPTION_REFERENCE {
            continue;
        }
        let Some((code, _)) = pair[1].split_once("}'") else {
            continue;
        };
        if !code.is_empty() && !codes.iter().any(|known| known == code) {
            codes.push(code.to_owned());
        }
    }
}
