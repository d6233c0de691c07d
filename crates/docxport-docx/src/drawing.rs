//! Inline picture markup (`w:drawing` / `wp:inline`).

use crate::xml::XmlNode;

pub(crate) const NS_WP: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub(crate) const NS_R: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

/// English Metric Units per point.
pub const EMU_PER_POINT: i64 = 12_700;

/// Description of a picture to place inline.
#[derive(Debug, Clone)]
pub struct InlinePicture<'a> {
    /// Relationship id of the image part.
    pub relationship_id: &'a str,
    /// Unique drawing object id within the document.
    pub id: u32,
    pub name: &'a str,
    pub width_emu: i64,
    pub height_emu: i64,
}

impl InlinePicture<'_> {
    /// Build the `w:drawing` element.
    pub fn to_drawing(&self) -> XmlNode {
        let cx = self.width_emu.to_string();
        let cy = self.height_emu.to_string();
        let id = self.id.to_string();

        let blip_fill = XmlNode::new("pic:blipFill")
            .with_child(XmlNode::new("a:blip").with_attr("r:embed", self.relationship_id))
            .with_child(XmlNode::new("a:stretch").with_child(XmlNode::new("a:fillRect")));
        let shape_props = XmlNode::new("pic:spPr")
            .with_child(
                XmlNode::new("a:xfrm")
                    .with_child(XmlNode::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                    .with_child(
                        XmlNode::new("a:ext")
                            .with_attr("cx", cx.clone())
                            .with_attr("cy", cy.clone()),
                    ),
            )
            .with_child(
                XmlNode::new("a:prstGeom")
                    .with_attr("prst", "rect")
                    .with_child(XmlNode::new("a:avLst")),
            );
        let picture = XmlNode::new("pic:pic")
            .with_attr("xmlns:pic", NS_PIC)
            .with_child(
                XmlNode::new("pic:nvPicPr")
                    .with_child(
                        XmlNode::new("pic:cNvPr")
                            .with_attr("id", "0")
                            .with_attr("name", self.name),
                    )
                    .with_child(XmlNode::new("pic:cNvPicPr")),
            )
            .with_child(blip_fill)
            .with_child(shape_props);

        let graphic = XmlNode::new("a:graphic").with_attr("xmlns:a", NS_A).with_child(
            XmlNode::new("a:graphicData")
                .with_attr("uri", NS_PIC)
                .with_child(picture),
        );

        let inline = XmlNode::new("wp:inline")
            .with_attr("distT", "0")
            .with_attr("distB", "0")
            .with_attr("distL", "0")
            .with_attr("distR", "0")
            .with_child(XmlNode::new("wp:extent").with_attr("cx", cx).with_attr("cy", cy))
            .with_child(
                XmlNode::new("wp:effectExtent")
                    .with_attr("l", "0")
                    .with_attr("t", "0")
                    .with_attr("r", "0")
                    .with_attr("b", "0"),
            )
            .with_child(
                XmlNode::new("wp:docPr")
                    .with_attr("id", id)
                    .with_attr("name", self.name),
            )
            .with_child(
                XmlNode::new("wp:cNvGraphicFramePr").with_child(
                    XmlNode::new("a:graphicFrameLocks")
                        .with_attr("xmlns:a", NS_A)
                        .with_attr("noChangeAspect", "1"),
                ),
            )
            .with_child(graphic);

        XmlNode::new("w:drawing").with_child(inline)
    }
}

/// Largest `wp:docPr` id used under a node.
pub(crate) fn max_drawing_id(node: &XmlNode) -> u32 {
    let own = if node.name == "wp:docPr" {
        node.attr("id").and_then(|id| id.parse().ok()).unwrap_or(0)
    } else {
        0
    };
    node.elements().map(max_drawing_id).fold(own, u32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_drawing_extent_and_embed() {
        let picture = InlinePicture {
            relationship_id: "rId7",
            id: 3,
            name: "logo.png",
            width_emu: 100 * EMU_PER_POINT,
            height_emu: 50 * EMU_PER_POINT,
        };
        let drawing = picture.to_drawing();
        let inline = drawing.child("wp:inline").unwrap();

        assert_eq!(inline.child_attr("wp:extent", "cx"), Some("1270000"));
        assert_eq!(inline.child_attr("wp:extent", "cy"), Some("635000"));
        assert_eq!(inline.child_attr("wp:docPr", "id"), Some("3"));
        let blip = inline
            .child("a:graphic")
            .and_then(|g| g.child("a:graphicData"))
            .and_then(|d| d.child("pic:pic"))
            .and_then(|p| p.child("pic:blipFill"))
            .and_then(|b| b.child("a:blip"))
            .unwrap();
        assert_eq!(blip.attr("r:embed"), Some("rId7"));
        assert_eq!(max_drawing_id(&drawing), 3);
    }
}
