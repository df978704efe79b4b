// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text renderers for the stamp. The same renderer measures and draws, so a
// layout computed from `measure` always matches the pixels.

use std::path::Path;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use stampwerk_core::error::{Result, StampwerkError};
use tracing::{debug, instrument};

/// Measures and paints single lines of text.
pub trait TextRenderer: Send + Sync {
    /// Width in pixels of `text` exactly as `draw` paints it.
    fn measure(&self, text: &str, bold: bool) -> u32;

    /// Vertical advance of one line.
    fn line_height(&self) -> u32;

    /// Paint `text` with its top-left corner at (`x`, `y`). Pixels outside
    /// the canvas are dropped.
    fn draw(&self, canvas: &mut RgbaImage, x: i32, y: i32, text: &str, bold: bool, color: Rgba<u8>);
}

// ---------------------------------------------------------------------------
// Built-in 8x8 bitmap font
// ---------------------------------------------------------------------------

const GLYPH_EDGE: u32 = 8;

/// Scaled 8x8 bitmap font. Always available, no font file needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapTextRenderer {
    scale: u32,
}

impl BitmapTextRenderer {
    /// Nearest integer scale of the 8 px glyph to `size_px`, at least 1.
    pub fn new(size_px: f32) -> Self {
        let scale = (size_px / GLYPH_EDGE as f32).round().max(1.0) as u32;
        Self { scale }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    fn glyph(c: char) -> [u8; 8] {
        BASIC_FONTS
            .get(c)
            .or_else(|| LATIN_FONTS.get(c))
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8])
    }

    fn advance(&self) -> u32 {
        GLYPH_EDGE * self.scale
    }
}

impl TextRenderer for BitmapTextRenderer {
    fn measure(&self, text: &str, bold: bool) -> u32 {
        let count = text.chars().count() as u32;
        if count == 0 {
            return 0;
        }
        // Bold is a double strike one pixel to the right.
        count * self.advance() + u32::from(bold)
    }

    fn line_height(&self) -> u32 {
        GLYPH_EDGE * self.scale
    }

    fn draw(&self, canvas: &mut RgbaImage, x: i32, y: i32, text: &str, bold: bool, color: Rgba<u8>) {
        let step = self.scale as i32;
        let strikes: &[i32] = if bold { &[0, 1] } else { &[0] };
        for (index, c) in text.chars().enumerate() {
            let origin_x = x + index as i32 * self.advance() as i32;
            for (row, bits) in Self::glyph(c).iter().enumerate() {
                for col in 0..GLYPH_EDGE as i32 {
                    if bits >> col & 1 == 0 {
                        continue;
                    }
                    for offset in strikes {
                        let px = origin_x + col * step + offset;
                        let py = y + row as i32 * step;
                        draw_filled_rect_mut(canvas, Rect::at(px, py).of_size(self.scale, self.scale), color);
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TrueType fonts
// ---------------------------------------------------------------------------

/// TrueType/OpenType renderer. Without a bold face, bold is a double strike.
pub struct TrueTypeTextRenderer {
    regular: FontVec,
    bold: Option<FontVec>,
    scale: PxScale,
}

impl TrueTypeTextRenderer {
    pub fn from_bytes(regular: Vec<u8>, bold: Option<Vec<u8>>, size_px: f32) -> Result<Self> {
        let parse = |bytes: Vec<u8>| {
            FontVec::try_from_vec(bytes).map_err(|err| StampwerkError::Font(format!("{}", err)))
        };
        Ok(Self {
            regular: parse(regular)?,
            bold: bold.map(parse).transpose()?,
            scale: PxScale::from(size_px),
        })
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path, bold_path: Option<&Path>, size_px: f32) -> Result<Self> {
        let read = |p: &Path| {
            std::fs::read(p).map_err(|err| StampwerkError::Font(format!("{}: {}", p.display(), err)))
        };
        let regular = read(path)?;
        let bold = bold_path.map(read).transpose()?;
        debug!(has_bold = bold.is_some(), "Font loaded");
        Self::from_bytes(regular, bold, size_px)
    }

    fn face(&self, bold: bool) -> (&FontVec, bool) {
        match (&self.bold, bold) {
            (Some(face), true) => (face, false),
            (None, true) => (&self.regular, true),
            _ => (&self.regular, false),
        }
    }
}

impl TextRenderer for TrueTypeTextRenderer {
    fn measure(&self, text: &str, bold: bool) -> u32 {
        if text.is_empty() {
            return 0;
        }
        let (font, double_strike) = self.face(bold);
        text_size(self.scale, font, text).0 + u32::from(double_strike)
    }

    fn line_height(&self) -> u32 {
        self.regular.as_scaled(self.scale).height().ceil() as u32
    }

    fn draw(&self, canvas: &mut RgbaImage, x: i32, y: i32, text: &str, bold: bool, color: Rgba<u8>) {
        let (font, double_strike) = self.face(bold);
        draw_text_mut(canvas, color, x, y, self.scale, font, text);
        if double_strike {
            draw_text_mut(canvas, color, x + 1, y, self.scale, font, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn inked_columns(img: &RgbaImage) -> Option<(u32, u32)> {
        let cols: Vec<u32> = (0..img.width())
            .filter(|&x| (0..img.height()).any(|y| img.get_pixel(x, y) == &INK))
            .collect();
        Some((*cols.first()?, *cols.last()?))
    }

    #[test]
    fn bitmap_scale_follows_font_size() {
        assert_eq!(BitmapTextRenderer::new(16.0).scale(), 2);
        assert_eq!(BitmapTextRenderer::new(3.0).scale(), 1);
        assert_eq!(BitmapTextRenderer::new(16.0).line_height(), 16);
    }

    #[test]
    fn bitmap_measure_counts_chars_and_bold() {
        let font = BitmapTextRenderer::new(8.0);
        assert_eq!(font.measure("", false), 0);
        assert_eq!(font.measure("abc", false), 24);
        assert_eq!(font.measure("abc", true), 25);
        assert_eq!(font.measure("äöü", false), 24);
    }

    #[test]
    fn bitmap_draw_stays_within_measured_width() {
        let font = BitmapTextRenderer::new(16.0);
        let mut img = RgbaImage::from_pixel(200, 20, Rgba([255, 255, 255, 255]));
        font.draw(&mut img, 0, 0, "Ada", true, INK);
        let (first, last) = inked_columns(&img).unwrap();
        assert!(last < font.measure("Ada", true));
        assert!(first < 16);
    }

    #[test]
    fn unknown_glyphs_still_draw_something() {
        let font = BitmapTextRenderer::new(8.0);
        let mut img = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
        font.draw(&mut img, 0, 0, "\u{4e2d}", false, INK);
        assert!(inked_columns(&img).is_some());
    }

    #[test]
    fn drawing_off_canvas_is_clipped() {
        let font = BitmapTextRenderer::new(8.0);
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        font.draw(&mut img, -20, -20, "clipped", false, INK);
        font.draw(&mut img, 2, 2, "WWWW", true, INK);
    }

    #[test]
    fn broken_font_data_is_a_font_error() {
        let result = TrueTypeTextRenderer::from_bytes(b"not a font".to_vec(), None, 16.0);
        assert!(matches!(result, Err(StampwerkError::Font(_))));
        let result = TrueTypeTextRenderer::load(Path::new("/nonexistent/font.ttf"), None, 16.0);
        assert!(matches!(result, Err(StampwerkError::Font(_))));
    }
}
