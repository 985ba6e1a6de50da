//! Slide part generation.

use super::parts::{relative_target, REL_IMAGE, REL_SLIDE_LAYOUT};
use crate::domain::model::{Crop, Rect, TextStyle};
use crate::utils::error::{DeckError, Result};
use quick_xml::escape::escape;
use std::fmt::Write as FmtWrite;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Rectangle rounded to whole EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EmuRect {
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
}

impl From<Rect> for EmuRect {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.left.round() as i64,
            y: rect.top.round() as i64,
            cx: rect.width.round().max(1.0) as i64,
            cy: rect.height.round().max(1.0) as i64,
        }
    }
}

#[derive(Debug, Clone)]
enum ShapeDraft {
    TextBox {
        rect: EmuRect,
        text: String,
        style: TextStyle,
    },
    Picture {
        rect: EmuRect,
        rel_id: String,
        description: String,
        crop: Option<Crop>,
    },
}

/// A slide being assembled in memory, serialised on save.
#[derive(Debug, Clone)]
pub(crate) struct SlideDraft {
    pub part_name: String,
    pub slide_id: u32,
    /// Relationship id of this slide in `presentation.xml.rels`.
    pub presentation_rel: String,
    shapes: Vec<ShapeDraft>,
    /// Media part names, in slide relationship order starting at `rId2`.
    images: Vec<String>,
}

impl SlideDraft {
    pub fn new(part_name: String, slide_id: u32, presentation_rel: String) -> Self {
        Self {
            part_name,
            slide_id,
            presentation_rel,
            shapes: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn rels_part_name(&self) -> String {
        match self.part_name.rsplit_once('/') {
            Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
            None => format!("_rels/{}.rels", self.part_name),
        }
    }

    pub fn add_text_box(&mut self, rect: Rect, text: &str, style: &TextStyle) {
        self.shapes.push(ShapeDraft::TextBox {
            rect: rect.into(),
            text: text.to_string(),
            style: style.clone(),
        });
    }

    pub fn add_picture(
        &mut self,
        rect: Rect,
        media_part: String,
        description: String,
        crop: Option<Crop>,
    ) {
        // rId1 is the slide layout.
        let rel_id = format!("rId{}", self.images.len() + 2);
        self.images.push(media_part);
        self.shapes.push(ShapeDraft::Picture {
            rect: rect.into(),
            rel_id,
            description,
            crop,
        });
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(1024 + self.shapes.len() * 768);
        xml.push_str(XML_DECLARATION);
        xml.push_str(concat!(
            r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
            r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#
        ));
        xml.push_str("<p:cSld><p:spTree>");
        xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
        xml.push_str(concat!(
            "<p:grpSpPr><a:xfrm>",
            r#"<a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
            r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/>"#,
            "</a:xfrm></p:grpSpPr>"
        ));

        for (offset, shape) in self.shapes.iter().enumerate() {
            let shape_id = offset + 2;
            let written = match shape {
                ShapeDraft::TextBox { rect, text, style } => {
                    write_text_box(&mut xml, shape_id, rect, text, style)
                }
                ShapeDraft::Picture {
                    rect,
                    rel_id,
                    description,
                    crop,
                } => write_picture(&mut xml, shape_id, rect, rel_id, description, crop.as_ref()),
            };
            written.map_err(|e| DeckError::xml(&self.part_name, e))?;
        }

        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
        xml.push_str("</p:sld>");
        Ok(xml)
    }

    /// Relationships of this slide: its layout first, then each picture.
    pub fn rels_xml(&self, layout_part: &str) -> Result<String> {
        let mut xml = String::with_capacity(256 + self.images.len() * 160);
        xml.push_str(XML_DECLARATION);
        xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
        let layout_target = relative_target(&self.part_name, layout_part);
        write_relationship(&mut xml, "rId1", REL_SLIDE_LAYOUT, &layout_target)
            .map_err(|e| DeckError::xml(self.rels_part_name(), e))?;
        for (index, media) in self.images.iter().enumerate() {
            let rel_id = format!("rId{}", index + 2);
            let target = relative_target(&self.part_name, media);
            write_relationship(&mut xml, &rel_id, REL_IMAGE, &target)
                .map_err(|e| DeckError::xml(self.rels_part_name(), e))?;
        }
        xml.push_str("</Relationships>");
        Ok(xml)
    }
}

fn write_relationship(xml: &mut String, id: &str, kind: &str, target: &str) -> std::fmt::Result {
    write!(
        xml,
        r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
        id,
        kind,
        escape(target)
    )
}

fn write_xfrm(xml: &mut String, rect: &EmuRect) -> std::fmt::Result {
    xml.push_str("<a:xfrm>");
    write!(xml, r#"<a:off x="{}" y="{}"/>"#, rect.x, rect.y)?;
    write!(xml, r#"<a:ext cx="{}" cy="{}"/>"#, rect.cx, rect.cy)?;
    xml.push_str("</a:xfrm>");
    Ok(())
}

fn write_text_box(
    xml: &mut String,
    shape_id: usize,
    rect: &EmuRect,
    text: &str,
    style: &TextStyle,
) -> std::fmt::Result {
    xml.push_str("<p:sp><p:nvSpPr>");
    write!(xml, r#"<p:cNvPr id="{}" name="TextBox {}"/>"#, shape_id, shape_id - 1)?;
    xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#);

    xml.push_str("<p:spPr>");
    write_xfrm(xml, rect)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/>"#);
    xml.push_str("</p:spPr>");

    xml.push_str("<p:txBody>");
    xml.push_str(r#"<a:bodyPr wrap="square" rtlCol="0"><a:spAutoFit/></a:bodyPr><a:lstStyle/>"#);
    xml.push_str("<a:p><a:r>");
    xml.push_str("<a:rPr");
    if !style.language.is_empty() {
        write!(xml, r#" lang="{}""#, escape(style.language.as_str()))?;
    }
    write!(xml, r#" sz="{}""#, (style.size_pt * 100.0).round() as u32)?;
    if style.bold {
        xml.push_str(r#" b="1""#);
    }
    xml.push_str(r#" dirty="0">"#);
    let font = escape(style.font_family.as_str());
    write!(xml, r#"<a:latin typeface="{}"/><a:ea typeface="{}"/>"#, font, font)?;
    xml.push_str("</a:rPr>");
    write!(xml, "<a:t>{}</a:t>", escape(text))?;
    xml.push_str("</a:r></a:p></p:txBody></p:sp>");
    Ok(())
}

fn write_picture(
    xml: &mut String,
    shape_id: usize,
    rect: &EmuRect,
    rel_id: &str,
    description: &str,
    crop: Option<&Crop>,
) -> std::fmt::Result {
    xml.push_str("<p:pic><p:nvPicPr>");
    write!(
        xml,
        r#"<p:cNvPr id="{}" name="Picture {}" descr="{}"/>"#,
        shape_id,
        shape_id - 1,
        escape(description)
    )?;
    xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#);

    xml.push_str("<p:blipFill>");
    write!(xml, r#"<a:blip r:embed="{}"/>"#, rel_id)?;
    if let Some(crop) = crop {
        write_src_rect(xml, crop)?;
    }
    xml.push_str("<a:stretch><a:fillRect/></a:stretch></p:blipFill>");

    xml.push_str("<p:spPr>");
    write_xfrm(xml, rect)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    xml.push_str("</p:spPr></p:pic>");
    Ok(())
}

/// `a:srcRect` edges are thousandths of a percent of the source image.
fn write_src_rect(xml: &mut String, crop: &Crop) -> std::fmt::Result {
    xml.push_str("<a:srcRect");
    for (name, fraction) in [
        ("l", crop.left),
        ("t", crop.top),
        ("r", crop.right),
        ("b", crop.bottom),
    ] {
        let value = (fraction * 100_000.0).round() as i64;
        if value != 0 {
            write!(xml, r#" {}="{}""#, name, value)?;
        }
    }
    xml.push_str("/>");
    Ok(())
}
