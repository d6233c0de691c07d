//! Block-level content: paragraphs, tables and preserved XML.

use crate::paragraph::Paragraph;
use crate::xml::{XmlChild, XmlNode};

/// A block in the body, a header/footer or a table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    /// Unknown block content, kept verbatim.
    Raw(XmlNode),
}

impl Block {
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Self::Paragraph(paragraph) => Some(paragraph),
            Self::Table(_) | Self::Raw(_) => None,
        }
    }

    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Self::Paragraph(paragraph) => Some(paragraph),
            Self::Table(_) | Self::Raw(_) => None,
        }
    }

    pub(crate) fn from_xml(node: XmlNode) -> Self {
        match node.name.as_str() {
            "w:p" => Self::Paragraph(Paragraph::from_xml(node)),
            "w:tbl" => Self::Table(Table::from_xml(node)),
            _ => Self::Raw(node),
        }
    }

    pub(crate) fn to_xml(&self) -> XmlNode {
        match self {
            Self::Paragraph(paragraph) => paragraph.to_xml(),
            Self::Table(table) => table.to_xml(),
            Self::Raw(raw) => raw.clone(),
        }
    }
}

impl From<Paragraph> for Block {
    fn from(paragraph: Paragraph) -> Self {
        Self::Paragraph(paragraph)
    }
}

impl From<Table> for Block {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

/// Parse the element children of a container into blocks.
pub(crate) fn blocks_from_children(children: Vec<XmlChild>) -> Vec<Block> {
    children
        .into_iter()
        .filter_map(|child| match child {
            XmlChild::Element(element) => Some(Block::from_xml(element)),
            XmlChild::Text(_) => None,
        })
        .collect()
}

pub(crate) fn blocks_to_children(blocks: &[Block]) -> Vec<XmlChild> {
    blocks
        .iter()
        .map(|block| XmlChild::Element(block.to_xml()))
        .collect()
}

/// A `w:tbl` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub attrs: Vec<(String, String)>,
    pub props: XmlNode,
    pub grid: Option<XmlNode>,
    pub rows: Vec<Row>,
    /// Other table-level children (bookmarks and the like), written after the rows.
    pub extra: Vec<XmlNode>,
}

/// A `w:tr` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub attrs: Vec<(String, String)>,
    /// `w:tblPrEx` and `w:trPr`, in their original order.
    pub props: Vec<XmlNode>,
    pub cells: Vec<Cell>,
}

/// A `w:tc` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub props: Option<XmlNode>,
    pub blocks: Vec<Block>,
}

impl Table {
    /// A table spanning the full content width, centred on the page.
    #[must_use]
    pub fn full_width() -> Self {
        let props = XmlNode::new("w:tblPr")
            .with_child(
                XmlNode::new("w:tblW")
                    .with_attr("w:w", "5000")
                    .with_attr("w:type", "pct"),
            )
            .with_child(XmlNode::new("w:jc").with_attr("w:val", "center"))
            .with_child(table_borders());
        Self {
            attrs: Vec::new(),
            props,
            grid: None,
            rows: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// Number of columns: the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|row| row.cells.len()).max().unwrap_or(0)
    }

    /// Every cell in row order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flat_map(|row| &row.cells)
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.rows.iter_mut().flat_map(|row| &mut row.cells)
    }

    fn from_xml(node: XmlNode) -> Self {
        let mut table = Self {
            attrs: node.attrs,
            props: XmlNode::new("w:tblPr"),
            grid: None,
            rows: Vec::new(),
            extra: Vec::new(),
        };
        for child in node.children {
            let XmlChild::Element(element) = child else {
                continue;
            };
            match element.name.as_str() {
                "w:tblPr" => table.props = element,
                "w:tblGrid" => table.grid = Some(element),
                "w:tr" => table.rows.push(Row::from_xml(element)),
                _ => table.extra.push(element),
            }
        }
        table
    }

    fn to_xml(&self) -> XmlNode {
        let mut node = XmlNode::new("w:tbl");
        node.attrs.clone_from(&self.attrs);
        node.children.push(XmlChild::Element(self.props.clone()));
        let grid = self.grid.clone().unwrap_or_else(|| self.generated_grid());
        node.children.push(XmlChild::Element(grid));
        for row in &self.rows {
            node.children.push(XmlChild::Element(row.to_xml()));
        }
        node.children
            .extend(self.extra.iter().cloned().map(XmlChild::Element));
        node
    }

    /// Equal-width grid; Word rescales columns of a percentage-width table.
    fn generated_grid(&self) -> XmlNode {
        let columns = self.column_count().max(1);
        let width = (9000 / columns).to_string();
        let mut grid = XmlNode::new("w:tblGrid");
        for _ in 0..columns {
            grid = grid.with_child(XmlNode::new("w:gridCol").with_attr("w:w", width.clone()));
        }
        grid
    }
}

fn table_borders() -> XmlNode {
    let mut borders = XmlNode::new("w:tblBorders");
    for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        borders = borders.with_child(
            XmlNode::new(side)
                .with_attr("w:val", "single")
                .with_attr("w:sz", "4")
                .with_attr("w:space", "0")
                .with_attr("w:color", "auto"),
        );
    }
    borders
}

impl Row {
    fn from_xml(node: XmlNode) -> Self {
        let mut row = Self {
            attrs: node.attrs,
            ..Self::default()
        };
        for child in node.children {
            let XmlChild::Element(element) = child else {
                continue;
            };
            if element.name == "w:tc" {
                row.cells.push(Cell::from_xml(element));
            } else {
                row.props.push(element);
            }
        }
        row
    }

    fn to_xml(&self) -> XmlNode {
        let mut node = XmlNode::new("w:tr");
        node.attrs.clone_from(&self.attrs);
        node.children
            .extend(self.props.iter().cloned().map(XmlChild::Element));
        node.children
            .extend(self.cells.iter().map(|cell| XmlChild::Element(cell.to_xml())));
        node
    }
}

impl Cell {
    /// Cell with vertically centred content.
    #[must_use]
    pub fn centered() -> Self {
        Self {
            props: Some(
                XmlNode::new("w:tcPr")
                    .with_child(XmlNode::new("w:vAlign").with_attr("w:val", "center")),
            ),
            blocks: Vec::new(),
        }
    }

    /// Whether any paragraph in the cell carries inline content.
    pub fn has_content(&self) -> bool {
        self.blocks.iter().any(|block| match block {
            Block::Paragraph(paragraph) => !paragraph.is_empty(),
            Block::Table(table) => table.cells().any(Cell::has_content),
            Block::Raw(_) => true,
        })
    }

    fn from_xml(node: XmlNode) -> Self {
        let mut cell = Self::default();
        let mut children = Vec::new();
        for child in node.children {
            match child {
                XmlChild::Element(element) if element.name == "w:tcPr" => {
                    cell.props = Some(element);
                }
                other => children.push(other),
            }
        }
        cell.blocks = blocks_from_children(children);
        cell
    }

    fn to_xml(&self) -> XmlNode {
        let mut node = XmlNode::new("w:tc");
        if let Some(props) = &self.props {
            node.children.push(XmlChild::Element(props.clone()));
        }
        node.children.extend(blocks_to_children(&self.blocks));
        // A cell must end with a paragraph.
        if !matches!(self.blocks.last(), Some(Block::Paragraph(_))) {
            node.children.push(XmlChild::Element(XmlNode::new("w:p")));
        }
        node
    }
}
