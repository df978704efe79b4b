// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Template presets: the field layouts offered by the designer screen.

use serde::{Deserialize, Serialize};

use crate::session::SessionSnapshot;
use crate::template::{DEFAULT_DATE_FORMAT, DocumentTemplate, FieldSpec, Position, format_now};
use crate::types::{ImageDimensions, PaperSize};

/// Name of the image field that receives the stamp or uploaded photo.
pub const PHOTO_FIELD: &str = "photo";

/// Photo box used when the image dimensions are still unknown.
const PHOTO_BOX_MM: (f32, f32) = (60.66, 93.78);

/// Widest the image may be drawn in the signature block.
const SIGNATURE_WIDTH_MM: f32 = 80.0;

/// A named field layout for the designer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplatePreset {
    /// Signer text, verification QR code, photo, and date.
    #[default]
    StampCard,
    /// Just the photo field.
    PhotoOnly,
    /// Stamp image sized from its aspect ratio, with name and date below.
    SignatureBlock,
}

impl TemplatePreset {
    pub const ALL: [TemplatePreset; 3] = [Self::StampCard, Self::PhotoOnly, Self::SignatureBlock];

    pub fn label(&self) -> &'static str {
        match self {
            Self::StampCard => "Stamp card",
            Self::PhotoOnly => "Photo only",
            Self::SignatureBlock => "Signature block",
        }
    }

    /// Route segment for the designer page.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::StampCard => "stamp-card",
            Self::PhotoOnly => "photo-only",
            Self::SignatureBlock => "signature-block",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.slug() == slug)
    }

    /// Field list for this preset, filled from `snapshot`.
    ///
    /// The image field carries the session's base image, or stays empty
    /// when nothing has been uploaded or generated yet.
    pub fn fields(&self, snapshot: &SessionSnapshot) -> Vec<FieldSpec> {
        let image = snapshot
            .base_image
            .as_ref()
            .filter(|asset| asset.is_usable())
            .map(|asset| asset.data_url.clone())
            .unwrap_or_default();
        let stamp = &snapshot.stamp_fields;

        match self {
            Self::StampCard => vec![
                FieldSpec::text("Text", Position::new(100.0, 60.0), 10.0, 10.0, stamp.signer_name.clone()),
                FieldSpec::qr_code("qrCode", Position::new(100.0, 70.0), 30.0, stamp.url.clone()),
                FieldSpec::image(PHOTO_FIELD, Position::new(24.99, 65.61), PHOTO_BOX_MM.0, PHOTO_BOX_MM.1, image),
                FieldSpec::date_time(
                    "dateTime",
                    Position::new(50.0, 200.0),
                    45.0,
                    10.0,
                    format_now(DEFAULT_DATE_FORMAT),
                ),
            ],
            Self::PhotoOnly => vec![FieldSpec::image(
                PHOTO_FIELD,
                Position::new(24.99, 65.61),
                PHOTO_BOX_MM.0,
                PHOTO_BOX_MM.1,
                image,
            )],
            Self::SignatureBlock => {
                let (width, height) = fit_width(snapshot.image_dimensions, SIGNATURE_WIDTH_MM);
                let top = 200.0;
                vec![
                    FieldSpec::image(PHOTO_FIELD, Position::new(110.0, top), width, height, image),
                    FieldSpec::text(
                        "signerName",
                        Position::new(110.0, top + height + 2.0),
                        width,
                        7.0,
                        stamp.signer_name.clone(),
                    ),
                    FieldSpec::date_time(
                        "dateTime",
                        Position::new(110.0, top + height + 10.0),
                        45.0,
                        7.0,
                        format_now(DEFAULT_DATE_FORMAT),
                    ),
                ]
            }
        }
    }

    /// Template on the uploaded document, or on a blank page of `paper`.
    pub fn template(&self, snapshot: &SessionSnapshot, paper: PaperSize) -> DocumentTemplate {
        DocumentTemplate::with_optional_base(snapshot.base_document.clone(), paper, self.fields(snapshot))
    }
}

/// Scale `dims` to `width_mm`, keeping the aspect ratio. Unknown dimensions
/// get a 3:1 box.
fn fit_width(dims: ImageDimensions, width_mm: f32) -> (f32, f32) {
    if !dims.is_known() {
        return (width_mm, width_mm / 3.0);
    }
    let ratio = dims.height as f32 / dims.width as f32;
    (width_mm, width_mm * ratio)
}
