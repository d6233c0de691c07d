//! Page geometry read from the body section properties.

use crate::xml::XmlNode;

/// Twips per point.
const DXA_PER_POINT: f64 = 20.0;

/// Page size and margins in dxa (twentieths of a point).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub width: i64,
    pub height: i64,
    pub margin_top: i64,
    pub margin_right: i64,
    pub margin_bottom: i64,
    pub margin_left: i64,
}

/// A4 portrait with one-inch margins.
impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 11_906,
            height: 16_838,
            margin_top: 1_440,
            margin_right: 1_440,
            margin_bottom: 1_440,
            margin_left: 1_440,
        }
    }
}

impl PageGeometry {
    /// Read `w:pgSz` and `w:pgMar` from a `w:sectPr`. Missing values keep the A4 defaults.
    pub fn from_section(section: &XmlNode) -> Self {
        let mut geometry = Self::default();
        let read = |node: &str, attr: &str| -> Option<i64> {
            section.child_attr(node, attr)?.trim().parse::<i64>().ok()
        };
        if let Some(w) = read("w:pgSz", "w:w") {
            geometry.width = w;
        }
        if let Some(h) = read("w:pgSz", "w:h") {
            geometry.height = h;
        }
        if let Some(top) = read("w:pgMar", "w:top") {
            geometry.margin_top = top.abs();
        }
        if let Some(right) = read("w:pgMar", "w:right") {
            geometry.margin_right = right;
        }
        if let Some(bottom) = read("w:pgMar", "w:bottom") {
            geometry.margin_bottom = bottom.abs();
        }
        if let Some(left) = read("w:pgMar", "w:left") {
            geometry.margin_left = left;
        }
        geometry
    }

    /// Content box `(width, height)` in whole points.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn content_box_pt(&self) -> (i64, i64) {
        let width = (self.width - self.margin_left - self.margin_right) as f64 / DXA_PER_POINT;
        let height = (self.height - self.margin_top - self.margin_bottom) as f64 / DXA_PER_POINT;
        (width.round() as i64, height.round() as i64)
    }
}
