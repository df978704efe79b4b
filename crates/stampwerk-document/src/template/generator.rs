// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Generator: flatten a template (base PDF + positioned fields) into PDF
// bytes, once per input record.

use std::collections::BTreeMap;

use stampwerk_core::config::QrStyle;
use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_core::template::{BasePdf, DEFAULT_FONT_SIZE, DocumentTemplate, FieldContent, FieldInputs, FieldSpec};
use tracing::{debug, info, instrument};

use crate::image::ImageProcessor;
use crate::pdf::{MmRect, PageOverlay, PdfReader, PdfWriter};
use crate::qr::QrStyler;

/// Raster resolution for QR fields.
const QR_DPI: f32 = 300.0;

/// Smallest QR raster edge, whatever the field size.
const QR_MIN_PX: u32 = 64;

/// Largest QR raster edge; bigger fields are scaled up by the PDF viewer.
const QR_MAX_PX: u32 = 2048;

/// Render `template` to PDF.
///
/// With no `inputs`, one record is produced from the fields' own contents.
/// Each input record overrides field contents by name (read-only date
/// fields keep theirs) and yields one filled copy of the base document;
/// copies are concatenated in input order.
#[instrument(skip_all, fields(fields = template.fields.len(), records = inputs.len()))]
pub fn generate(template: &DocumentTemplate, inputs: &[FieldInputs]) -> Result<Vec<u8>> {
    template.validate()?;

    let base = match &template.base_pdf {
        BasePdf::Blank(paper) => PdfWriter::new(*paper).blank()?,
        BasePdf::Document(asset) => asset.decode_bytes()?,
    };

    let page_count = PdfReader::from_bytes(&base)?.page_count();
    if let Some(field) = template.fields.iter().find(|f| f.page as usize > page_count) {
        return Err(StampwerkError::Template(format!(
            "field `{}` is on page {} but the base document has {} page(s)",
            field.name, field.page, page_count
        )));
    }

    let no_overrides = [FieldInputs::new()];
    let records = if inputs.is_empty() { &no_overrides[..] } else { inputs };

    let mut filled = Vec::with_capacity(records.len());
    for record in records {
        filled.push(fill_record(&base, template, record)?);
    }

    let output = match filled.split_first() {
        Some((first, [])) => first.clone(),
        Some((first, rest)) => {
            let rest: Vec<&[u8]> = rest.iter().map(Vec::as_slice).collect();
            PdfReader::from_bytes(first)?.merge(&rest)?
        }
        None => return Err(StampwerkError::Template("nothing to generate".into())),
    };

    info!(bytes = output.len(), pages = page_count * records.len(), "Document generated");
    Ok(output)
}

fn fill_record(base: &[u8], template: &DocumentTemplate, record: &FieldInputs) -> Result<Vec<u8>> {
    let reader = PdfReader::from_bytes(base)?;
    let mut by_page: BTreeMap<u32, Vec<&FieldSpec>> = BTreeMap::new();
    for field in &template.fields {
        by_page.entry(field.page).or_default().push(field);
    }
    let page_ids = by_page
        .keys()
        .map(|&page| Ok((page, reader.page_id(page)?)))
        .collect::<Result<Vec<_>>>()?;

    let mut doc = reader.into_document();
    for (page, page_id) in page_ids {
        let mut overlay = PageOverlay::new(&mut doc, page_id);
        for field in by_page.get(&page).into_iter().flatten() {
            draw_field(&mut overlay, field, record.get(&field.name).map(String::as_str))?;
        }
        overlay.finish()?;
    }

    doc.compress();
    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|err| StampwerkError::PdfError(format!("failed to serialise generated PDF: {}", err)))?;
    Ok(output)
}

fn draw_field(overlay: &mut PageOverlay<'_>, field: &FieldSpec, input: Option<&str>) -> Result<()> {
    let rect = MmRect::new(field.position.x, field.position.y, field.width, field.height);
    match &field.content {
        FieldContent::Text { content, font_size } => {
            overlay.text(rect, input.unwrap_or(content), *font_size, false);
        }
        FieldContent::DateTime { content, read_only, .. } => {
            let value = if *read_only { content.as_str() } else { input.unwrap_or(content) };
            overlay.text(rect, value, DEFAULT_FONT_SIZE, false);
        }
        FieldContent::Image { content } => {
            let url = input.unwrap_or(content);
            if url.is_empty() {
                debug!(field = %field.name, "image field empty, skipped");
                return Ok(());
            }
            let image = ImageProcessor::from_data_url(url)?.into_rgba();
            overlay.image(rect, &image);
        }
        FieldContent::QrCode { content } => {
            let payload = input.unwrap_or(content);
            if payload.is_empty() {
                debug!(field = %field.name, "QR field empty, skipped");
                return Ok(());
            }
            let size_px = qr_raster_edge(field.width.min(field.height));
            let tile = QrStyler::new(QrStyle {
                size_px,
                data: payload.to_owned(),
                margin_modules: 0,
                ..QrStyle::default()
            })
            .render()?;
            overlay.image(rect, &tile);
        }
    }
    Ok(())
}

/// Pixel edge of the QR raster for a field edge in millimetres.
fn qr_raster_edge(edge_mm: f32) -> u32 {
    ((edge_mm / 25.4 * QR_DPI).round() as u32).clamp(QR_MIN_PX, QR_MAX_PX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::RasterFormat;
    use image::{Rgba, RgbaImage};
    use lopdf::{Document, dictionary};
    use lopdf::content::Content;
    use stampwerk_core::data_url::DataUrl;
    use stampwerk_core::presets::{PHOTO_FIELD, TemplatePreset};
    use stampwerk_core::session::SessionSnapshot;
    use stampwerk_core::template::Position;
    use stampwerk_core::types::{EncodedAsset, ImageDimensions, PaperSize};

    fn photo_url() -> String {
        ImageProcessor::from_rgba(RgbaImage::from_pixel(50, 30, Rgba([200, 10, 10, 255])))
            .to_data_url(RasterFormat::Png)
            .unwrap()
    }

    fn stamp_card() -> DocumentTemplate {
        let mut snapshot = SessionSnapshot::default();
        snapshot.base_image = Some(EncodedAsset::image(photo_url(), ImageDimensions::new(50, 30)));
        TemplatePreset::StampCard.template(&snapshot, PaperSize::A4)
    }

    /// Every string shown with `Tj` in overlay forms.
    fn shown_text(pdf: &[u8]) -> Vec<String> {
        let mut doc = Document::load_mem(pdf).unwrap();
        doc.decompress();
        let mut out = Vec::new();
        for object in doc.objects.values() {
            let Ok(stream) = object.as_stream() else { continue };
            let is_form = stream
                .dict
                .get(b"Subtype")
                .and_then(|s| s.as_name())
                .is_ok_and(|name| name == b"Form");
            if !is_form {
                continue;
            }
            for op in Content::decode(&stream.content).unwrap().operations {
                if op.operator == "Tj"
                    && let Ok(bytes) = op.operands[0].as_str()
                {
                    out.push(String::from_utf8_lossy(bytes).into_owned());
                }
            }
        }
        out
    }

    #[test]
    fn stamp_card_generates_single_page() {
        let pdf = generate(&stamp_card(), &[]).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        let reader = PdfReader::from_bytes(&pdf).unwrap();
        assert_eq!(reader.page_count(), 1);
        assert!(shown_text(&pdf).contains(&"Signer Name".to_owned()));
    }

    #[test]
    fn each_input_record_adds_a_copy() {
        let mut a = FieldInputs::new();
        a.insert("Text".into(), "Ada".into());
        let mut b = FieldInputs::new();
        b.insert("Text".into(), "Grace".into());

        let pdf = generate(&stamp_card(), &[a, b]).unwrap();
        assert_eq!(PdfReader::from_bytes(&pdf).unwrap().page_count(), 2);
        let text = shown_text(&pdf);
        assert!(text.contains(&"Ada".to_owned()));
        assert!(text.contains(&"Grace".to_owned()));
        assert!(!text.contains(&"Signer Name".to_owned()));
    }

    #[test]
    fn uploaded_base_keeps_its_pages() {
        let base = PdfWriter::new(PaperSize::Letter).blank_pages(3).unwrap();
        let asset = EncodedAsset::pdf(DataUrl::encode("application/pdf", &base));
        let template = DocumentTemplate::with_optional_base(
            Some(asset),
            PaperSize::A4,
            vec![FieldSpec::text("note", Position::new(10.0, 10.0), 50.0, 8.0, "page three").on_page(3)],
        );
        let pdf = generate(&template, &[]).unwrap();
        assert_eq!(PdfReader::from_bytes(&pdf).unwrap().page_count(), 3);
        assert_eq!(shown_text(&pdf), ["page three"]);
    }

    #[test]
    fn annotated_base_repeats_per_record() {
        let blank = PdfWriter::new(PaperSize::A4).blank().unwrap();
        let mut doc = Document::load_mem(&blank).unwrap();
        let page_id = doc.page_iter().next().unwrap();
        let link = doc.add_object(lopdf::dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "P" => lopdf::Object::Reference(page_id),
        });
        doc.get_dictionary_mut(page_id)
            .unwrap()
            .set("Annots", lopdf::Object::Array(vec![lopdf::Object::Reference(link)]));
        let mut base = Vec::new();
        doc.save_to(&mut base).unwrap();

        let template = DocumentTemplate::with_optional_base(
            Some(EncodedAsset::pdf(DataUrl::encode("application/pdf", &base))),
            PaperSize::A4,
            vec![FieldSpec::text("name", Position::new(10.0, 10.0), 50.0, 8.0, "base")],
        );
        let records: Vec<FieldInputs> = ["Ada", "Grace"]
            .iter()
            .map(|name| FieldInputs::from([("name".to_owned(), (*name).to_owned())]))
            .collect();
        let pdf = generate(&template, &records).unwrap();
        assert_eq!(PdfReader::from_bytes(&pdf).unwrap().page_count(), 2);
    }

    #[test]
    fn field_beyond_last_page_is_rejected() {
        let template = DocumentTemplate::new(
            BasePdf::Blank(PaperSize::A4),
            vec![FieldSpec::text("late", Position::default(), 10.0, 10.0, "x").on_page(2)],
        );
        assert!(matches!(generate(&template, &[]), Err(StampwerkError::Template(_))));
    }

    #[test]
    fn read_only_date_ignores_inputs() {
        let mut field = FieldSpec::date_time("when", Position::new(5.0, 5.0), 40.0, 8.0, "2024/11/19 13:28");
        if let FieldContent::DateTime { read_only, .. } = &mut field.content {
            *read_only = true;
        }
        let template = DocumentTemplate::new(BasePdf::default(), vec![field]);
        let mut input = FieldInputs::new();
        input.insert("when".into(), "1999/01/01 00:00".into());
        let pdf = generate(&template, &[input]).unwrap();
        assert_eq!(shown_text(&pdf), ["2024/11/19 13:28"]);
    }

    #[test]
    fn broken_image_content_fails_generation() {
        let template = DocumentTemplate::new(
            BasePdf::default(),
            vec![FieldSpec::image(PHOTO_FIELD, Position::default(), 20.0, 20.0, "data:image/png;base64,AAAA")],
        );
        assert!(matches!(generate(&template, &[]), Err(StampwerkError::DecodeFailure(_))));
    }

    #[test]
    fn qr_raster_edge_is_bounded() {
        assert_eq!(qr_raster_edge(1.0), QR_MIN_PX);
        assert_eq!(qr_raster_edge(25.4), 300);
        assert_eq!(qr_raster_edge(4000.0), QR_MAX_PX);
    }

    #[test]
    fn empty_fields_are_skipped() {
        let template = TemplatePreset::PhotoOnly.template(&SessionSnapshot::default(), PaperSize::A5);
        let pdf = generate(&template, &[]).unwrap();
        assert_eq!(PdfReader::from_bytes(&pdf).unwrap().page_count(), 1);
        assert!(shown_text(&pdf).is_empty());
    }
}
