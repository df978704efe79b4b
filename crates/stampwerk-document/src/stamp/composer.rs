// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stamp composer: lays out a QR tile next to the signer text, rasterizes the
// result to PNG, and publishes it into the session's image slot.
//
// Layout: width = min(longest line + padding, max width), height fixed by
// configuration. The QR tile sits at the left margin, the text block follows
// one margin later; both are centred vertically.

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use stampwerk_core::config::{AppConfig, Color, QrStyle, StampConfig};
use stampwerk_core::data_url::DataUrl;
use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_core::integrity::hash_bytes;
use stampwerk_core::session::SessionStore;
use stampwerk_core::types::{RenderedStamp, StampFields};
use tracing::{debug, info, instrument, warn};

use super::text::{BitmapTextRenderer, TextRenderer, TrueTypeTextRenderer};
use crate::image::{ImageProcessor, RasterFormat};
use crate::qr::QrStyler;

const PLACEHOLDER_FILL: Rgba<u8> = Rgba([230, 230, 230, 255]);
const PLACEHOLDER_BORDER: Rgba<u8> = Rgba([160, 160, 160, 255]);

/// One line of the text block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampLine {
    pub text: String,
    pub bold: bool,
}

/// Pixel size of a composed stamp. Derived on every call, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampLayout {
    pub width: u32,
    pub height: u32,
}

/// Builds stamp images from stamp fields.
#[derive(Clone)]
pub struct StampComposer {
    config: StampConfig,
    qr_style: QrStyle,
    text: Arc<dyn TextRenderer>,
}

impl std::fmt::Debug for StampComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StampComposer")
            .field("config", &self.config)
            .field("qr_style", &self.qr_style)
            .finish_non_exhaustive()
    }
}

impl StampComposer {
    /// Composer using the configured TrueType font, or the built-in bitmap
    /// font when none is configured.
    pub fn new(config: StampConfig, qr_style: QrStyle) -> Result<Self> {
        let text: Arc<dyn TextRenderer> = match &config.font_path {
            Some(path) => Arc::new(TrueTypeTextRenderer::load(
                path,
                config.bold_font_path.as_deref(),
                config.font_size_px,
            )?),
            None => Arc::new(BitmapTextRenderer::new(config.font_size_px)),
        };
        Ok(Self::with_renderer(config, qr_style, text))
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.stamp.clone(), config.qr.clone())
    }

    pub fn with_renderer(config: StampConfig, qr_style: QrStyle, text: Arc<dyn TextRenderer>) -> Self {
        Self { config, qr_style, text }
    }

    pub fn config(&self) -> &StampConfig {
        &self.config
    }

    /// Text block lines, top to bottom. Empty lines are left out.
    pub fn lines(&self, fields: &StampFields) -> Vec<StampLine> {
        let contact = [fields.email.trim(), fields.phone.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" | ");
        let candidates = [
            (fields.signer_name.trim().to_owned(), true),
            (contact, false),
            (fields.timestamp.trim().to_owned(), false),
            (fields.url.trim().to_owned(), false),
        ];
        candidates
            .into_iter()
            .filter(|(text, _)| !text.is_empty())
            .map(|(text, bold)| StampLine { text, bold })
            .collect()
    }

    pub fn layout(&self, fields: &StampFields) -> StampLayout {
        let widest = self
            .lines(fields)
            .iter()
            .map(|line| self.text.measure(&line.text, line.bold))
            .max()
            .unwrap_or(0);
        let width = widest
            .saturating_add(self.config.padding_px())
            .min(self.config.max_width_px);
        StampLayout {
            width,
            height: self.config.height_px,
        }
    }

    /// Draw the stamp. Never fails: a QR code that cannot be produced is
    /// replaced by a placeholder tile.
    #[instrument(skip_all)]
    pub fn compose(&self, fields: &StampFields) -> RgbaImage {
        let layout = self.layout(fields);
        let background = if self.config.opaque_background {
            self.config.background_color
        } else {
            Color::TRANSPARENT
        };
        let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, Rgba(background.0));

        let margin = self.config.margin_px as i64;
        let qr = self.qr_tile(&fields.url);
        let qr_y = (layout.height as i64 - qr.height() as i64) / 2;
        image::imageops::overlay(&mut canvas, &qr, margin, qr_y);

        let lines = self.lines(fields);
        let line_height = self.text.line_height() as i32;
        let gap = self.config.line_gap_px as i32;
        let count = lines.len() as i32;
        let block_height = count * line_height + (count - 1).max(0) * gap;
        let text_x = (self.config.qr_size_px + 2 * self.config.margin_px) as i32;
        let mut y = (layout.height as i32 - block_height) / 2;
        let color = Rgba(self.config.text_color.0);
        for line in &lines {
            self.text.draw(&mut canvas, text_x, y, &line.text, line.bold, color);
            y += line_height + gap;
        }

        debug!(width = layout.width, height = layout.height, lines = lines.len(), "Stamp composed");
        canvas
    }

    fn qr_tile(&self, payload: &str) -> RgbaImage {
        let size = self.config.qr_size_px;
        if payload.trim().is_empty() {
            return placeholder(size);
        }
        let styler = QrStyler::new(QrStyle {
            size_px: size,
            data: payload.to_owned(),
            ..self.qr_style.clone()
        });
        match styler.render() {
            Ok(tile) => tile,
            Err(err) => {
                warn!(%err, "QR code unavailable, drawing placeholder");
                placeholder(size)
            }
        }
    }

    /// Compose and encode as PNG.
    #[instrument(skip_all, fields(signer = %fields.signer_name))]
    pub fn rasterize(&self, fields: &StampFields) -> Result<RenderedStamp> {
        let image = self.compose(fields);
        let (width, height) = image.dimensions();
        let png = ImageProcessor::from_rgba(image)
            .to_png_bytes()
            .map_err(|err| StampwerkError::RasterizationFailure(format!("{}", err)))?;
        let digest = hash_bytes(&png);
        info!(width, height, digest = %digest, "Stamp rasterized");
        Ok(RenderedStamp {
            image_data_url: DataUrl::encode(RasterFormat::Png.mime_type(), &png),
            width,
            height,
            digest,
        })
    }

    /// Compose and encode in any raster download format.
    pub fn encode_as(&self, fields: &StampFields, format: RasterFormat) -> Result<Vec<u8>> {
        ImageProcessor::from_rgba(self.compose(fields))
            .encode(format)
            .map_err(|err| StampwerkError::RasterizationFailure(format!("{}", err)))
    }

    /// Render from the current session fields and publish the result into
    /// the image slot. A render overtaken by a newer one is returned but not
    /// published.
    pub fn generate(&self, session: &SessionStore) -> Result<RenderedStamp> {
        let ticket = session.begin_render();
        let fields = session.stamp_fields();
        let stamp = self.rasterize(&fields)?;
        session.publish_stamp(ticket, &stamp);
        Ok(stamp)
    }
}

/// Light grey tile with a border, drawn where the QR code would go.
fn placeholder(size: u32) -> RgbaImage {
    let mut tile = RgbaImage::from_pixel(size.max(1), size.max(1), PLACEHOLDER_FILL);
    if size > 2 {
        draw_hollow_rect_mut(&mut tile, Rect::at(0, 0).of_size(size, size), PLACEHOLDER_BORDER);
    }
    tile
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampwerk_core::types::{ImageDimensions, StampField};

    fn composer() -> StampComposer {
        StampComposer::new(StampConfig::default(), QrStyle::default()).unwrap()
    }

    fn fields(name: &str) -> StampFields {
        StampFields {
            signer_name: name.into(),
            email: "a@b.c".into(),
            phone: String::new(),
            timestamp: "2024/11/19 13:28".into(),
            url: "https://example.com/v".into(),
        }
    }

    #[test]
    fn lines_skip_empty_parts() {
        let composer = composer();
        let lines = composer.lines(&fields("Ada"));
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["Ada", "a@b.c", "2024/11/19 13:28", "https://example.com/v"]);
        assert!(lines[0].bold);
        assert!(lines[1..].iter().all(|l| !l.bold));

        let mut both = fields("Ada");
        both.phone = "+1 555".into();
        assert_eq!(composer.lines(&both)[1].text, "a@b.c | +1 555");
    }

    #[test]
    fn layout_width_is_monotone_and_bounded() {
        let composer = composer();
        let max = composer.config().max_width_px;
        let mut previous = 0;
        for len in 0..60 {
            let mut f = fields(&"W".repeat(len));
            f.url.clear();
            f.timestamp.clear();
            let width = composer.layout(&f).width;
            assert!(width >= previous, "len {len}");
            assert!(width <= max);
            previous = width;
        }
        assert_eq!(previous, max);
    }

    #[test]
    fn layout_is_idempotent_and_height_fixed() {
        let composer = composer();
        let f = fields("Grace Hopper");
        let first = composer.layout(&f);
        assert_eq!(first, composer.layout(&f));
        assert_eq!(first.height, composer.config().height_px);
    }

    #[test]
    fn rasterize_is_repeatable() {
        let composer = composer();
        let f = fields("Ada Lovelace");
        let a = composer.rasterize(&f).unwrap();
        let b = composer.rasterize(&f).unwrap();
        assert_eq!((a.width, a.height), (b.width, b.height));
        assert_eq!(a.digest, b.digest);
        assert!(a.image_data_url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn missing_qr_payload_uses_placeholder() {
        let composer = composer();
        let mut f = fields("Ada");
        f.url.clear();
        let image = composer.compose(&f);
        let margin = composer.config().margin_px;
        let qr = composer.config().qr_size_px;
        let top = (image.height() - qr) / 2;
        assert_eq!(image.get_pixel(margin + qr / 2, top + qr / 2), &PLACEHOLDER_FILL);
        assert_eq!(image.get_pixel(margin, top), &PLACEHOLDER_BORDER);
    }

    #[test]
    fn transparent_background_when_configured() {
        let config = StampConfig {
            opaque_background: false,
            ..StampConfig::default()
        };
        let composer = StampComposer::new(config, QrStyle::default()).unwrap();
        let image = composer.compose(&fields("Ada"));
        let corner = image.get_pixel(image.width() - 1, 0);
        assert_eq!(corner.0[3], 0);
    }

    #[test]
    fn generate_publishes_into_session() {
        let composer = composer();
        let session = SessionStore::default();
        session.set_stamp_field(StampField::SignerName, "Ada");
        let stamp = composer.generate(&session).unwrap();
        let slot = session.base_image().unwrap();
        assert_eq!(slot.data_url, stamp.image_data_url);
        assert_eq!(session.image_dimensions(), ImageDimensions::new(stamp.width, stamp.height));
    }

    #[test]
    fn encode_as_jpeg() {
        let bytes = composer().encode_as(&fields("Ada"), RasterFormat::Jpeg).unwrap();
        assert!(bytes.starts_with(&[0xFF, 0xD8]));
    }
}
