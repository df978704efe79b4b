// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page overlays: text and images drawn on top of an existing PDF page.
//
// Everything drawn for one page goes into a single Form XObject with its own
// resources (Helvetica faces, image XObjects). The page gets one new resource
// entry and its content is bracketed as `q <original> Q q /Overlay Do Q`, so
// the original graphics state cannot leak into the overlay.
//
// Field geometry is millimetres from the top-left corner of the page; PDF
// space is points from the bottom-left of the MediaBox.

use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use stampwerk_core::error::{Result, StampwerkError};
use tracing::{debug, instrument};

use super::reader::{inherited_attribute, media_box};

const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Helvetica ascent as a fraction of the font size.
const ASCENT: f32 = 0.718;

/// Line advance as a fraction of the font size.
const LEADING: f32 = 1.2;

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

/// Axis-aligned box in millimetres, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl MmRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Collects drawing operations for one page, then attaches them.
pub struct PageOverlay<'a> {
    doc: &'a mut Document,
    page_id: ObjectId,
    media_box: [f32; 4],
    operations: Vec<Operation>,
    images: Dictionary,
}

impl<'a> PageOverlay<'a> {
    pub fn new(doc: &'a mut Document, page_id: ObjectId) -> Self {
        let media_box = media_box(doc, page_id);
        Self {
            doc,
            page_id,
            media_box,
            operations: Vec::new(),
            images: Dictionary::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Lower-left corner of `rect` in PDF space, plus its size in points.
    fn place(&self, rect: MmRect) -> (f32, f32, f32, f32) {
        let [llx, _, _, ury] = self.media_box;
        let width = mm_to_pt(rect.width);
        let height = mm_to_pt(rect.height);
        let x = llx + mm_to_pt(rect.x);
        let y = ury - mm_to_pt(rect.y) - height;
        (x, y, width, height)
    }

    /// Left-aligned text starting at the top of `rect`; `\n` breaks lines.
    /// Characters outside Latin-1 are drawn as `?`.
    pub fn text(&mut self, rect: MmRect, text: &str, font_size_pt: f32, bold: bool) {
        if text.is_empty() {
            return;
        }
        let [llx, _, _, ury] = self.media_box;
        let x = llx + mm_to_pt(rect.x);
        let baseline = ury - mm_to_pt(rect.y) - font_size_pt * ASCENT;
        let font = if bold { BOLD_FONT } else { REGULAR_FONT };

        let ops = &mut self.operations;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![font.into(), font_size_pt.into()]));
        ops.push(Operation::new("TL", vec![(font_size_pt * LEADING).into()]));
        ops.push(Operation::new("Td", vec![x.into(), baseline.into()]));
        for (index, line) in text.lines().enumerate() {
            if index > 0 {
                ops.push(Operation::new("T*", vec![]));
            }
            ops.push(Operation::new("Tj", vec![Object::String(win_ansi(line), StringFormat::Literal)]));
        }
        ops.push(Operation::new("ET", vec![]));
    }

    /// Draw `image` stretched to `rect`.
    pub fn image(&mut self, rect: MmRect, image: &RgbaImage) {
        let name = format!("Im{}", self.images.len());
        let id = embed_image(self.doc, image);
        self.images.set(name.as_bytes().to_vec(), Object::Reference(id));

        let (x, y, width, height) = self.place(rect);
        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new(
            "cm",
            vec![width.into(), 0.into(), 0.into(), height.into(), x.into(), y.into()],
        ));
        self.operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        self.operations.push(Operation::new("Q", vec![]));
    }

    /// Write the overlay into the document. Does nothing when nothing was
    /// drawn.
    #[instrument(skip(self), fields(page = ?self.page_id, ops = self.operations.len()))]
    pub fn finish(self) -> Result<()> {
        if self.operations.is_empty() {
            return Ok(());
        }
        let content = Content {
            operations: self.operations,
        }
        .encode()
        .map_err(|err| StampwerkError::PdfError(format!("failed to encode overlay content: {}", err)))?;

        let [llx, lly, urx, ury] = self.media_box;
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => Object::Array(vec![llx.into(), lly.into(), urx.into(), ury.into()]),
                "Resources" => dictionary! {
                    "Font" => dictionary! {
                        REGULAR_FONT => standard_font("Helvetica"),
                        BOLD_FONT => standard_font("Helvetica-Bold"),
                    },
                    "XObject" => self.images,
                },
            },
            content,
        );
        let form_id = self.doc.add_object(form);

        let name = register_xobject(self.doc, self.page_id, form_id)?;
        bracket_page_contents(self.doc, self.page_id, &name)?;
        debug!(overlay = %name, "Overlay attached");
        Ok(())
    }
}

fn standard_font(base: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// WinAnsi agrees with Latin-1 for every printable character we emit.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            code @ 0x20..=0x7E | code @ 0xA0..=0xFF => code as u8,
            _ => b'?',
        })
        .collect()
}

/// RGB image XObject, with a DeviceGray soft mask when any pixel is not
/// fully opaque.
fn embed_image(doc: &mut Document, image: &RgbaImage) -> ObjectId {
    let (width, height) = image.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in image.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };
    if alpha.iter().any(|&a| a < u8::MAX) {
        let smask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        );
        dict.set("SMask", doc.add_object(smask));
    }
    doc.add_object(Stream::new(dict, rgb))
}

/// Add `form_id` to the page's XObject resources under a fresh name.
///
/// Resources may be inline, referenced, or inherited from the page tree; an
/// inherited dictionary is copied onto the page so siblings are unaffected.
fn register_xobject(doc: &mut Document, page_id: ObjectId, form_id: ObjectId) -> Result<String> {
    let page_resources = doc
        .get_dictionary(page_id)
        .map_err(|err| StampwerkError::PdfError(format!("page {:?} is not a dictionary: {}", page_id, err)))?
        .get(b"Resources")
        .ok()
        .cloned();

    let resources_id = match page_resources {
        Some(Object::Reference(id)) => Some(id),
        Some(Object::Dictionary(_)) => None,
        _ => {
            let inherited = match inherited_attribute(doc, page_id, b"Resources") {
                Some(Object::Reference(id)) => doc.get_dictionary(id).ok().cloned(),
                Some(Object::Dictionary(dict)) => Some(dict),
                _ => None,
            };
            set_page_entry(doc, page_id, "Resources", Object::Dictionary(inherited.unwrap_or_default()))?;
            None
        }
    };

    // Snapshot XObject entries behind a reference so the mutable borrow
    // below only touches the resources dictionary.
    let referenced_xobjects = {
        let resources = match resources_id {
            Some(id) => doc.get_dictionary(id),
            None => doc.get_dictionary(page_id).and_then(|page| page.get(b"Resources")?.as_dict()),
        }
        .map_err(|err| StampwerkError::PdfError(format!("unreadable page resources: {}", err)))?;
        match resources.get(b"XObject") {
            Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok().cloned(),
            _ => None,
        }
    };

    let resources = match resources_id {
        Some(id) => doc.get_dictionary_mut(id),
        None => doc
            .get_dictionary_mut(page_id)
            .and_then(|page| page.get_mut(b"Resources")?.as_dict_mut()),
    }
    .map_err(|err| StampwerkError::PdfError(format!("unwritable page resources: {}", err)))?;

    if let Some(dict) = referenced_xobjects {
        resources.set("XObject", Object::Dictionary(dict));
    }
    if !matches!(resources.get(b"XObject"), Ok(Object::Dictionary(_))) {
        resources.set("XObject", Object::Dictionary(Dictionary::new()));
    }
    let xobjects = resources
        .get_mut(b"XObject")
        .and_then(Object::as_dict_mut)
        .map_err(|err| StampwerkError::PdfError(format!("unwritable XObject resources: {}", err)))?;

    let name = (0..)
        .map(|n| format!("StampwerkOverlay{n}"))
        .find(|candidate| !xobjects.has(candidate.as_bytes()))
        .unwrap_or_else(|| "StampwerkOverlay".to_owned());
    xobjects.set(name.as_bytes().to_vec(), Object::Reference(form_id));
    Ok(name)
}

fn set_page_entry(doc: &mut Document, page_id: ObjectId, key: &str, value: Object) -> Result<()> {
    doc.get_dictionary_mut(page_id)
        .map_err(|err| StampwerkError::PdfError(format!("page {:?} is not a dictionary: {}", page_id, err)))?
        .set(key, value);
    Ok(())
}

/// Wrap the existing page content in `q`/`Q` and append the overlay call.
fn bracket_page_contents(doc: &mut Document, page_id: ObjectId, name: &str) -> Result<()> {
    let existing = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Contents").ok().cloned());
    let mut contents = match existing {
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(id)],
        },
        Some(Object::Array(items)) => items,
        _ => Vec::new(),
    };

    let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let close = doc.add_object(Stream::new(
        Dictionary::new(),
        format!("\nQ\nq /{name} Do Q\n").into_bytes(),
    ));
    contents.insert(0, Object::Reference(open));
    contents.push(Object::Reference(close));
    set_page_entry(doc, page_id, "Contents", Object::Array(contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{PdfReader, PdfWriter};
    use image::Rgba;
    use stampwerk_core::types::PaperSize;

    fn blank_doc() -> (Document, ObjectId) {
        let bytes = PdfWriter::new(PaperSize::A4).blank().unwrap();
        let doc = PdfReader::from_bytes(&bytes).unwrap().into_document();
        let page = *doc.get_pages().get(&1).unwrap();
        (doc, page)
    }

    fn overlay_stream(doc: &Document, page: ObjectId) -> Stream {
        let resources = doc.get_dictionary(page).unwrap().get(b"Resources").unwrap();
        let resources = match resources {
            Object::Reference(id) => doc.get_dictionary(*id).unwrap(),
            other => other.as_dict().unwrap(),
        };
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let form_id = xobjects.get(b"StampwerkOverlay0").unwrap().as_reference().unwrap();
        doc.get_object(form_id).unwrap().as_stream().unwrap().clone()
    }

    #[test]
    fn millimetres_to_points() {
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-4);
        assert!((mm_to_pt(210.0) - 595.28).abs() < 0.01);
    }

    #[test]
    fn text_encoding_replaces_unsupported_chars() {
        assert_eq!(win_ansi("Zoë"), b"Zo\xEB".to_vec());
        assert_eq!(win_ansi("\u{4e2d}x"), b"?x".to_vec());
    }

    #[test]
    fn overlay_attaches_form_with_text_and_image() {
        let (mut doc, page) = blank_doc();
        let mut overlay = PageOverlay::new(&mut doc, page);
        overlay.text(MmRect::new(10.0, 10.0, 50.0, 10.0), "Signed", 13.0, true);
        let img = RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 128]));
        overlay.image(MmRect::new(0.0, 0.0, 20.0, 10.0), &img);
        overlay.finish().unwrap();

        let form = overlay_stream(&doc, page);
        let content = Content::decode(&form.content).unwrap();
        let ops: Vec<&str> = content.operations.iter().map(|o| o.operator.as_str()).collect();
        assert!(ops.contains(&"Tj"));
        assert!(ops.contains(&"Do"));

        // Image is placed at the top-left corner of the page.
        let cm = content.operations.iter().find(|o| o.operator == "cm").unwrap();
        let f = |i: usize| cm.operands[i].as_float().unwrap();
        assert!((f(0) - mm_to_pt(20.0)).abs() < 0.01);
        assert!((f(5) + mm_to_pt(10.0) - 841.89).abs() < 0.5);

        let contents = doc.get_dictionary(page).unwrap().get(b"Contents").unwrap().as_array().unwrap();
        assert!(contents.len() >= 2);
    }

    #[test]
    fn translucent_images_get_a_soft_mask() {
        let (mut doc, _) = blank_doc();
        let opaque = embed_image(&mut doc, &RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])));
        let translucent = embed_image(&mut doc, &RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 10])));
        let has_mask = |id| doc.get_object(id).unwrap().as_stream().unwrap().dict.has(b"SMask");
        assert!(!has_mask(opaque));
        assert!(has_mask(translucent));
    }

    #[test]
    fn empty_overlay_leaves_page_alone() {
        let (mut doc, page) = blank_doc();
        let before = doc.get_dictionary(page).unwrap().clone();
        PageOverlay::new(&mut doc, page).finish().unwrap();
        assert_eq!(format!("{:?}", doc.get_dictionary(page).unwrap()), format!("{before:?}"));
    }
}
