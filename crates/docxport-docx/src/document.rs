//! A `.docx` document: body, headers, footers and the resources they share.

use std::collections::BTreeSet;

use crate::block::{Block, blocks_from_children, blocks_to_children};
use crate::content_types::{self, ContentTypes};
use crate::drawing::{self, InlinePicture, NS_R, NS_WP};
use crate::error::DocxError;
use crate::geometry::PageGeometry;
use crate::numbering::Numbering;
use crate::package::Package;
use crate::relationships::{self, Relationships, rels_path_for, resolve_target};
use crate::xml::{self, XmlChild, XmlNode};

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const PACKAGE_RELS_PART: &str = "_rels/.rels";
const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";

/// Which header/footer slot a part fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFooterKind {
    Header,
    Footer,
}

/// A header or footer part.
#[derive(Debug, Clone)]
pub struct HeaderFooter {
    pub part: String,
    /// Root element with its block children removed.
    root: XmlNode,
    pub blocks: Vec<Block>,
}

/// State shared by every part of the document: numbering, relationships,
/// content types and embedded media.
#[derive(Debug, Clone)]
pub struct Resources {
    pub numbering: Numbering,
    pub relationships: Relationships,
    pub content_types: ContentTypes,
    document_part: String,
    media: Vec<(String, Vec<u8>)>,
    taken_parts: BTreeSet<String>,
    next_drawing_id: u32,
}

impl Resources {
    /// Register an external hyperlink and return its relationship id.
    pub fn add_hyperlink(&mut self, url: &str) -> String {
        self.relationships.add_hyperlink(url)
    }

    /// Store image bytes as a media part and return the image relationship id.
    pub fn add_image(&mut self, data: Vec<u8>, extension: &str, content_type: &str) -> String {
        let extension = extension.to_ascii_lowercase();
        let (target, part) = (1..)
            .map(|n| {
                let target = format!("media/image{n}.{extension}");
                let part = resolve_target(&self.document_part, &target);
                (target, part)
            })
            .find(|(_, part)| !self.taken_parts.contains(part))
            .unwrap_or_default();

        self.content_types.ensure_default(&extension, content_type);
        self.taken_parts.insert(part.clone());
        self.media.push((part, data));
        self.relationships.add(relationships::REL_IMAGE, &target)
    }

    /// Embed an image and return the `w:drawing` element showing it.
    pub fn inline_image(
        &mut self,
        data: Vec<u8>,
        extension: &str,
        content_type: &str,
        name: &str,
        size_emu: (i64, i64),
    ) -> XmlNode {
        let relationship_id = self.add_image(data, extension, content_type);
        let id = self.next_drawing_id();
        InlinePicture {
            relationship_id: &relationship_id,
            id,
            name,
            width_emu: size_emu.0,
            height_emu: size_emu.1,
        }
        .to_drawing()
    }

    fn next_drawing_id(&mut self) -> u32 {
        let id = self.next_drawing_id;
        self.next_drawing_id += 1;
        id
    }
}

/// An editable `.docx` document.
#[derive(Debug, Clone)]
pub struct Document {
    package: Package,
    /// `w:document` element with the body children removed.
    root: XmlNode,
    numbering_part: Option<String>,
    pub body: Vec<Block>,
    /// Final `w:sectPr` of the body.
    pub section: Option<XmlNode>,
    pub headers: Vec<HeaderFooter>,
    pub footers: Vec<HeaderFooter>,
    pub resources: Resources,
}

impl Document {
    /// Parse a `.docx` package.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let package = Package::read(bytes)?;

        let content_types = ContentTypes::from_xml(parse_part(&package, CONTENT_TYPES_PART)?);
        let document_part = if package.contains(PACKAGE_RELS_PART) {
            Relationships::from_xml(parse_part(&package, PACKAGE_RELS_PART)?)
                .targets_of(relationships::REL_OFFICE_DOCUMENT)
                .first()
                .map_or_else(
                    || DEFAULT_DOCUMENT_PART.to_owned(),
                    |target| resolve_target("", target),
                )
        } else {
            DEFAULT_DOCUMENT_PART.to_owned()
        };

        let mut root = parse_part(&package, &document_part)?;
        let mut next_drawing_id = drawing::max_drawing_id(&root);
        let body_node = root
            .child_mut("w:body")
            .ok_or_else(|| DocxError::malformed(&document_part, "no w:body element"))?;
        let (body, section) = split_section(std::mem::take(&mut body_node.children));

        let rels_part = rels_path_for(&document_part);
        let document_rels = if package.contains(&rels_part) {
            Relationships::from_xml(parse_part(&package, &rels_part)?)
        } else {
            Relationships::default()
        };

        let numbering_part = document_rels
            .targets_of(relationships::REL_NUMBERING)
            .first()
            .map(|target| resolve_target(&document_part, target))
            .filter(|part| package.contains(part));
        let numbering = match &numbering_part {
            Some(part) => Numbering::from_xml(parse_part(&package, part)?),
            None => Numbering::default(),
        };

        let mut load_parts = |rel_type: &str| -> Result<Vec<HeaderFooter>, DocxError> {
            let mut parts = Vec::new();
            for target in document_rels.targets_of(rel_type) {
                let part = resolve_target(&document_part, &target);
                if !package.contains(&part) {
                    tracing::warn!(part = %part, "Relationship points to a missing part");
                    continue;
                }
                let mut root = parse_part(&package, &part)?;
                next_drawing_id = next_drawing_id.max(drawing::max_drawing_id(&root));
                let blocks = blocks_from_children(std::mem::take(&mut root.children));
                parts.push(HeaderFooter { part, root, blocks });
            }
            Ok(parts)
        };
        let headers = load_parts(relationships::REL_HEADER)?;
        let footers = load_parts(relationships::REL_FOOTER)?;

        let taken_parts = package.names().map(str::to_owned).collect();
        Ok(Self {
            package,
            root,
            numbering_part,
            body,
            section,
            headers,
            footers,
            resources: Resources {
                numbering,
                relationships: document_rels,
                content_types,
                document_part,
                media: Vec::new(),
                taken_parts,
                next_drawing_id: next_drawing_id + 1,
            },
        })
    }

    /// An empty A4 document.
    pub fn new() -> Self {
        let mut types = ContentTypes::default();
        types.ensure_override(DEFAULT_DOCUMENT_PART, content_types::CT_DOCUMENT);
        types.ensure_override("word/styles.xml", content_types::CT_STYLES);

        let mut package_rels = Relationships::default();
        package_rels.add(relationships::REL_OFFICE_DOCUMENT, DEFAULT_DOCUMENT_PART);
        let mut document_rels = Relationships::default();
        document_rels.add(relationships::REL_STYLES, "styles.xml");

        let mut package = Package::default();
        // Placeholder keeps the content types part first in the archive.
        package.set(CONTENT_TYPES_PART, Vec::new());
        package.set(PACKAGE_RELS_PART, xml::serialize(package_rels.to_xml()));
        package.set(
            "word/styles.xml",
            xml::serialize(&XmlNode::new("w:styles").with_attr("xmlns:w", NS_W)),
        );

        let geometry = PageGeometry::default();
        let section = XmlNode::new("w:sectPr")
            .with_child(
                XmlNode::new("w:pgSz")
                    .with_attr("w:w", geometry.width.to_string())
                    .with_attr("w:h", geometry.height.to_string()),
            )
            .with_child(
                XmlNode::new("w:pgMar")
                    .with_attr("w:top", geometry.margin_top.to_string())
                    .with_attr("w:right", geometry.margin_right.to_string())
                    .with_attr("w:bottom", geometry.margin_bottom.to_string())
                    .with_attr("w:left", geometry.margin_left.to_string()),
            );

        let taken_parts = package.names().map(str::to_owned).collect();
        Self {
            package,
            root: XmlNode::new("w:document")
                .with_attr("xmlns:w", NS_W)
                .with_attr("xmlns:r", NS_R)
                .with_child(XmlNode::new("w:body")),
            numbering_part: None,
            body: Vec::new(),
            section: Some(section),
            headers: Vec::new(),
            footers: Vec::new(),
            resources: Resources {
                numbering: Numbering::default(),
                relationships: document_rels,
                content_types: types,
                document_part: DEFAULT_DOCUMENT_PART.to_owned(),
                media: Vec::new(),
                taken_parts,
                next_drawing_id: 1,
            },
        }
    }

    /// Page geometry of the final body section.
    pub fn geometry(&self) -> PageGeometry {
        self.section
            .as_ref()
            .map(PageGeometry::from_section)
            .unwrap_or_default()
    }

    /// Add a default header or footer holding `blocks`.
    pub fn add_header_footer(&mut self, kind: HeaderFooterKind, blocks: Vec<Block>) {
        let (stem, root_name, rel_type, content_type, reference) = match kind {
            HeaderFooterKind::Header => (
                "header",
                "w:hdr",
                relationships::REL_HEADER,
                content_types::CT_HEADER,
                "w:headerReference",
            ),
            HeaderFooterKind::Footer => (
                "footer",
                "w:ftr",
                relationships::REL_FOOTER,
                content_types::CT_FOOTER,
                "w:footerReference",
            ),
        };
        let resources = &mut self.resources;
        let (target, part) = (1..)
            .map(|n| {
                let target = format!("{stem}{n}.xml");
                let part = resolve_target(&resources.document_part, &target);
                (target, part)
            })
            .find(|(_, part)| !resources.taken_parts.contains(part))
            .unwrap_or_default();
        resources.taken_parts.insert(part.clone());
        resources.content_types.ensure_override(&part, content_type);
        let id = resources.relationships.add(rel_type, &target);

        let section = self.section.get_or_insert_with(|| XmlNode::new("w:sectPr"));
        section.children.insert(
            0,
            XmlChild::Element(
                XmlNode::new(reference)
                    .with_attr("w:type", "default")
                    .with_attr("r:id", id),
            ),
        );

        let root = XmlNode::new(root_name)
            .with_attr("xmlns:w", NS_W)
            .with_attr("xmlns:r", NS_R);
        let entry = HeaderFooter { part, root, blocks };
        match kind {
            HeaderFooterKind::Header => self.headers.push(entry),
            HeaderFooterKind::Footer => self.footers.push(entry),
        }
    }

    /// Serialize the document into `.docx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut package = self.package.clone();
        let mut resources = self.resources.clone();

        let mut root = self.root.clone();
        ensure_namespace(&mut root, "xmlns:w", NS_W);
        ensure_namespace(&mut root, "xmlns:r", NS_R);
        ensure_namespace(&mut root, "xmlns:wp", NS_WP);
        let body = root
            .child_mut("w:body")
            .ok_or_else(|| DocxError::malformed(&resources.document_part, "no w:body element"))?;
        body.children = blocks_to_children(&self.body);
        if let Some(section) = &self.section {
            body.children.push(XmlChild::Element(section.clone()));
        }
        package.set(&resources.document_part, xml::serialize(&root));

        for part in self.headers.iter().chain(&self.footers) {
            let mut root = part.root.clone();
            ensure_namespace(&mut root, "xmlns:wp", NS_WP);
            root.children = blocks_to_children(&part.blocks);
            package.set(&part.part, xml::serialize(&root));
        }

        if let Some(part) = &self.numbering_part {
            package.set(part, xml::serialize(resources.numbering.to_xml()));
        } else if !resources.numbering.is_empty() {
            let part = resolve_target(&resources.document_part, "numbering.xml");
            resources
                .content_types
                .ensure_override(&part, content_types::CT_NUMBERING);
            resources
                .relationships
                .add(relationships::REL_NUMBERING, "numbering.xml");
            package.set(&part, xml::serialize(resources.numbering.to_xml()));
        }

        for (part, data) in resources.media {
            package.set(&part, data);
        }
        package.set(
            &rels_path_for(&resources.document_part),
            xml::serialize(resources.relationships.to_xml()),
        );
        package.set(
            CONTENT_TYPES_PART,
            xml::serialize(resources.content_types.to_xml()),
        );

        package.write()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_part(package: &Package, name: &str) -> Result<XmlNode, DocxError> {
    let bytes = package
        .get(name)
        .ok_or_else(|| DocxError::MissingPart(name.to_owned()))?;
    xml::parse(bytes).map_err(|e| DocxError::xml(name, e))
}

/// Split body children into blocks and the trailing `w:sectPr`.
fn split_section(children: Vec<XmlChild>) -> (Vec<Block>, Option<XmlNode>) {
    let mut section = None;
    let mut rest = Vec::with_capacity(children.len());
    for child in children {
        match child {
            XmlChild::Element(node) if node.name == "w:sectPr" => section = Some(node),
            other => rest.push(other),
        }
    }
    (blocks_from_children(rest), section)
}

fn ensure_namespace(root: &mut XmlNode, prefix: &str, uri: &str) {
    if root.attr(prefix).is_none() {
        root.set_attr(prefix, uri);
    }
}
