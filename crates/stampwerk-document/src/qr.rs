// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// QR styling engine: renders a payload as a styled QR code (dot shape,
// colours, quiet zone, optional centred logo) and exports it as SVG, PNG,
// JPEG, or WebP. Error-correction encoding itself is done by `qrcode`.

use std::fmt::Write as _;

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use stampwerk_core::config::{Color, DotShape, QrStyle};
use stampwerk_core::data_url::DataUrl;
use stampwerk_core::error::{Result, StampwerkError};
use tracing::{debug, instrument, warn};

use crate::image::{ImageProcessor, RasterFormat};

/// Light background kept clear around a centred logo, in modules.
const LOGO_PADDING_MODULES: f32 = 1.0;

/// Download formats of the QR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrExportFormat {
    Svg,
    Png,
    Jpeg,
    WebP,
}

impl QrExportFormat {
    pub const ALL: [QrExportFormat; 4] = [Self::Svg, Self::Png, Self::Jpeg, Self::WebP];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    fn raster(&self) -> Option<RasterFormat> {
        match self {
            Self::Svg => None,
            Self::Png => Some(RasterFormat::Png),
            Self::Jpeg => Some(RasterFormat::Jpeg),
            Self::WebP => Some(RasterFormat::WebP),
        }
    }
}

/// Module matrix of an encoded payload.
struct Matrix {
    width: usize,
    dark: Vec<bool>,
}

impl Matrix {
    fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.dark[y * self.width + x]
    }
}

/// A configured QR code that can be re-rendered after `update`.
#[derive(Debug, Clone)]
pub struct QrStyler {
    style: QrStyle,
}

impl QrStyler {
    pub fn new(style: QrStyle) -> Self {
        Self { style }
    }

    /// Replace the whole configuration. The next render uses it.
    pub fn update(&mut self, style: QrStyle) {
        debug!(size = style.size_px, shape = ?style.dot_shape, "QR style updated");
        self.style = style;
    }

    pub fn style(&self) -> &QrStyle {
        &self.style
    }

    fn encode(&self) -> Result<Matrix> {
        if self.style.data.is_empty() {
            return Err(StampwerkError::QrEncode("nothing to encode".into()));
        }
        // A logo hides modules, so the code needs the highest redundancy.
        let level = if self.style.logo.is_some() { EcLevel::H } else { EcLevel::M };
        let code = QrCode::with_error_correction_level(self.style.data.as_bytes(), level)
            .map_err(|err| StampwerkError::QrEncode(format!("{}", err)))?;
        let dark = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();
        Ok(Matrix {
            width: code.width(),
            dark,
        })
    }

    /// Render to an RGBA raster of `size_px` x `size_px`.
    #[instrument(skip(self), fields(size = self.style.size_px, data_len = self.style.data.len()))]
    pub fn render(&self) -> Result<RgbaImage> {
        let size = self.style.size_px;
        if size == 0 {
            return Err(StampwerkError::QrEncode("size must be positive".into()));
        }
        let matrix = self.encode()?;
        let total = matrix.width as u32 + 2 * self.style.margin_modules;
        let cell = size as f32 / total as f32;
        let margin = self.style.margin_modules as f32;
        let dot = rgba(self.style.dot_color);

        let mut canvas = RgbaImage::from_pixel(size, size, rgba(self.style.background_color));

        for y in 0..matrix.width {
            for x in 0..matrix.width {
                if !matrix.is_dark(x, y) {
                    continue;
                }
                let left = ((x as f32 + margin) * cell).round() as i32;
                let top = ((y as f32 + margin) * cell).round() as i32;
                let right = ((x as f32 + margin + 1.0) * cell).round() as i32;
                let bottom = ((y as f32 + margin + 1.0) * cell).round() as i32;
                let (w, h) = ((right - left).max(1) as u32, (bottom - top).max(1) as u32);
                let center = ((left + right) / 2, (top + bottom) / 2);

                match self.style.dot_shape {
                    DotShape::Square => {
                        draw_filled_rect_mut(&mut canvas, Rect::at(left, top).of_size(w, h), dot);
                    }
                    DotShape::Dots => {
                        let radius = ((cell * 0.45).round() as i32).max(1);
                        draw_filled_circle_mut(&mut canvas, center, radius, dot);
                    }
                    DotShape::Rounded => {
                        let radius = ((cell / 2.0).floor() as i32).max(1);
                        draw_filled_circle_mut(&mut canvas, center, radius, dot);
                        // Bridge towards dark neighbours so runs read as one shape.
                        if matrix.is_dark(x + 1, y) {
                            let span = (right - center.0 + (w as i32) / 2).max(1) as u32;
                            draw_filled_rect_mut(&mut canvas, Rect::at(center.0, top).of_size(span, h), dot);
                        }
                        if matrix.is_dark(x, y + 1) {
                            let span = (bottom - center.1 + (h as i32) / 2).max(1) as u32;
                            draw_filled_rect_mut(&mut canvas, Rect::at(left, center.1).of_size(w, span), dot);
                        }
                    }
                }
            }
        }

        if let Some(logo) = &self.style.logo {
            self.draw_logo(&mut canvas, logo, cell)?;
        }
        Ok(canvas)
    }

    fn draw_logo(&self, canvas: &mut RgbaImage, logo: &str, cell: f32) -> Result<()> {
        let size = canvas.width();
        let edge = ((size as f32) * self.style.logo_ratio.clamp(0.05, 0.3)).round() as u32;
        if edge == 0 {
            warn!("logo too small to draw, skipped");
            return Ok(());
        }
        let logo = ImageProcessor::from_data_url(logo)?.resize(edge, edge).into_rgba();

        let pad = (LOGO_PADDING_MODULES * cell).round() as u32;
        let bw = logo.width() + 2 * pad;
        let bh = logo.height() + 2 * pad;
        let bx = (size.saturating_sub(bw) / 2) as i32;
        let by = (size.saturating_sub(bh) / 2) as i32;
        draw_filled_rect_mut(canvas, Rect::at(bx, by).of_size(bw, bh), rgba(self.style.background_color));

        let lx = (size.saturating_sub(logo.width()) / 2) as i64;
        let ly = (size.saturating_sub(logo.height()) / 2) as i64;
        image::imageops::overlay(canvas, &logo, lx, ly);
        Ok(())
    }

    /// Vector rendering with the same geometry as `render`, in module units.
    pub fn to_svg(&self) -> Result<String> {
        let matrix = self.encode()?;
        let margin = self.style.margin_modules as usize;
        let total = matrix.width + 2 * margin;
        let size = self.style.size_px;

        let mut svg = String::new();
        // Writing into a String cannot fail.
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {total} {total}" shape-rendering="crispEdges">"#
        );
        let _ = write!(
            svg,
            r#"<rect width="{total}" height="{total}" {}/>"#,
            svg_fill(self.style.background_color)
        );
        let _ = write!(svg, "<g {}>", svg_fill(self.style.dot_color));
        for y in 0..matrix.width {
            for x in 0..matrix.width {
                if !matrix.is_dark(x, y) {
                    continue;
                }
                let (px, py) = (x + margin, y + margin);
                match self.style.dot_shape {
                    DotShape::Square => {
                        let _ = write!(svg, r#"<rect x="{px}" y="{py}" width="1" height="1"/>"#);
                    }
                    DotShape::Dots => {
                        let _ = write!(svg, r#"<circle cx="{}.5" cy="{}.5" r="0.45"/>"#, px, py);
                    }
                    DotShape::Rounded => {
                        let _ = write!(svg, r#"<rect x="{px}" y="{py}" width="1" height="1" rx="0.5"/>"#);
                        if matrix.is_dark(x + 1, y) {
                            let _ = write!(svg, r#"<rect x="{}.5" y="{py}" width="1" height="1"/>"#, px);
                        }
                        if matrix.is_dark(x, y + 1) {
                            let _ = write!(svg, r#"<rect x="{px}" y="{}.5" width="1" height="1"/>"#, py);
                        }
                    }
                }
            }
        }
        svg.push_str("</g>");

        if let Some(logo) = &self.style.logo {
            // Re-emit the logo in canonical base64 form, escaped for the attribute.
            let href = xml_attr_escape(&DataUrl::parse(logo)?.to_string());
            let edge = total as f32 * self.style.logo_ratio.clamp(0.05, 0.3);
            let pos = (total as f32 - edge) / 2.0;
            let pad = LOGO_PADDING_MODULES;
            let _ = write!(
                svg,
                r#"<rect x="{}" y="{}" width="{}" height="{}" {}/>"#,
                pos - pad,
                pos - pad,
                edge + 2.0 * pad,
                edge + 2.0 * pad,
                svg_fill(self.style.background_color)
            );
            let _ = write!(
                svg,
                r#"<image href="{href}" x="{pos}" y="{pos}" width="{edge}" height="{edge}" preserveAspectRatio="xMidYMid meet"/>"#
            );
        }
        svg.push_str("</svg>");
        Ok(svg)
    }

    /// Encoded file contents for a download in `format`.
    #[instrument(skip(self))]
    pub fn download_as(&self, format: QrExportFormat) -> Result<Vec<u8>> {
        match format.raster() {
            None => Ok(self.to_svg()?.into_bytes()),
            Some(raster) => ImageProcessor::from_rgba(self.render()?).encode(raster),
        }
    }
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba(color.0)
}

fn xml_attr_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

fn svg_fill(color: Color) -> String {
    let [r, g, b, a] = color.0;
    if a == 255 {
        format!(r##"fill="#{r:02x}{g:02x}{b:02x}""##)
    } else {
        format!(r##"fill="#{r:02x}{g:02x}{b:02x}" fill-opacity="{:.3}""##, a as f32 / 255.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(data: &str) -> QrStyle {
        QrStyle {
            size_px: 120,
            data: data.into(),
            ..QrStyle::default()
        }
    }

    fn count_dark(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| p.0[0] < 128).count()
    }

    #[test]
    fn render_has_requested_size_and_quiet_zone() {
        let img = QrStyler::new(style("https://example.com/verify")).render().unwrap();
        assert_eq!(img.dimensions(), (120, 120));
        // Quiet zone corner stays background.
        assert_eq!(img.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert!(count_dark(&img) > 0);
    }

    #[test]
    fn dot_shapes_change_the_raster() {
        let mut styler = QrStyler::new(style("shape test"));
        let square = styler.render().unwrap();
        for shape in [DotShape::Dots, DotShape::Rounded] {
            styler.update(QrStyle {
                dot_shape: shape,
                ..style("shape test")
            });
            let other = styler.render().unwrap();
            assert_ne!(count_dark(&square), count_dark(&other), "{shape:?}");
        }
    }

    #[test]
    fn colours_are_applied() {
        let styler = QrStyler::new(QrStyle {
            dot_color: Color::rgb(200, 0, 0),
            background_color: Color::rgb(0, 0, 200),
            ..style("colours")
        });
        let img = styler.render().unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgba([0, 0, 200, 255]));
        assert!(img.pixels().any(|p| p == &Rgba([200, 0, 0, 255])));
    }

    #[test]
    fn logo_is_centred() {
        let logo = ImageProcessor::from_rgba(RgbaImage::from_pixel(10, 10, Rgba([0, 200, 0, 255])))
            .to_data_url(RasterFormat::Png)
            .unwrap();
        let img = QrStyler::new(QrStyle {
            logo: Some(logo),
            ..style("https://example.com/with-logo")
        })
        .render()
        .unwrap();
        let centre = img.get_pixel(60, 60).0;
        assert!(centre[1] > 150 && centre[0] < 50, "{centre:?}");
    }

    #[test]
    fn svg_logo_href_is_well_formed() {
        let styler = QrStyler::new(QrStyle {
            logo: Some(r#"data:image/p"ng,a"b&c"#.into()),
            ..style("https://example.com/svg-logo")
        });
        let svg = styler.to_svg().unwrap();
        let href = svg.split(r#"<image href=""#).nth(1).unwrap();
        let href = &href[..href.find('"').unwrap()];
        assert_eq!(href, "data:image/p&quot;ng;base64,YSJiJmM=");
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn svg_rejects_malformed_logo() {
        let styler = QrStyler::new(QrStyle {
            logo: Some("not a data url".into()),
            ..style("https://example.com/svg-logo")
        });
        assert!(matches!(styler.to_svg(), Err(StampwerkError::InvalidDataUrl(_))));
    }

    #[test]
    fn empty_payload_is_rejected() {
        let result = QrStyler::new(style("")).render();
        assert!(matches!(result, Err(StampwerkError::QrEncode(_))));
    }

    #[test]
    fn downloads_carry_format_signatures() {
        let styler = QrStyler::new(style("https://example.com/"));
        let svg = styler.download_as(QrExportFormat::Svg).unwrap();
        assert!(svg.starts_with(b"<svg"));
        assert!(svg.ends_with(b"</svg>"));
        let png = styler.download_as(QrExportFormat::Png).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        let jpeg = styler.download_as(QrExportFormat::Jpeg).unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8]));
        let webp = styler.download_as(QrExportFormat::WebP).unwrap();
        assert_eq!(&webp[..4], b"RIFF");
    }
}
