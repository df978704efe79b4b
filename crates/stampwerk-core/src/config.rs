// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration: stamp layout constants, QR styling defaults,
// stamp field defaults, and export file names.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StampwerkError;
use crate::types::{PaperSize, StampFields};

/// An RGBA colour, serialised as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const TRANSPARENT: Color = Color([255, 255, 255, 0]);

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// Parse `#rrggbb`, `rrggbb`, or the same with a trailing alpha byte.
    pub fn from_hex(hex: &str) -> Result<Self, StampwerkError> {
        let digits = hex.trim().trim_start_matches('#');
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return Err(StampwerkError::ImageError(format!("invalid colour `{hex}`")));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| StampwerkError::ImageError(format!("invalid colour `{hex}`")))
        };
        let alpha = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self([channel(0)?, channel(2)?, channel(4)?, alpha]))
    }

    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

impl TryFrom<String> for Color {
    type Error = StampwerkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_hex()
    }
}

/// How individual QR modules are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DotShape {
    #[default]
    Square,
    Dots,
    Rounded,
}

/// Styling options handed to the QR engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QrStyle {
    /// Output edge length in pixels.
    pub size_px: u32,
    /// Payload encoded into the code.
    pub data: String,
    /// Quiet zone in modules.
    pub margin_modules: u32,
    pub dot_color: Color,
    pub background_color: Color,
    pub dot_shape: DotShape,
    /// Optional centred logo as an image data URL.
    pub logo: Option<String>,
    /// Logo edge as a fraction of the code edge.
    pub logo_ratio: f32,
}

impl Default for QrStyle {
    fn default() -> Self {
        Self {
            size_px: 300,
            data: "https://example.com/verify".into(),
            margin_modules: 2,
            dot_color: Color::BLACK,
            background_color: Color::WHITE,
            dot_shape: DotShape::Square,
            logo: None,
            logo_ratio: 0.2,
        }
    }
}

/// Layout constants for the composed stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StampConfig {
    /// Edge of the QR tile inside the stamp.
    pub qr_size_px: u32,
    /// Outer margin and the gap between QR tile and text.
    pub margin_px: u32,
    /// The stamp never grows wider than this.
    pub max_width_px: u32,
    /// Fixed stamp height.
    pub height_px: u32,
    pub font_size_px: f32,
    pub line_gap_px: u32,
    pub text_color: Color,
    pub background_color: Color,
    /// Fill the background; otherwise leave it transparent.
    pub opaque_background: bool,
    /// TrueType font used for measurement and drawing; the built-in bitmap
    /// font is used when unset.
    pub font_path: Option<PathBuf>,
    pub bold_font_path: Option<PathBuf>,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            qr_size_px: 100,
            margin_px: 10,
            max_width_px: 520,
            height_px: 120,
            font_size_px: 16.0,
            line_gap_px: 6,
            text_color: Color::BLACK,
            background_color: Color::WHITE,
            opaque_background: true,
            font_path: None,
            bold_font_path: None,
        }
    }
}

impl StampConfig {
    /// Horizontal space that is not text: both margins, the QR tile, and the
    /// gap after it.
    pub fn padding_px(&self) -> u32 {
        self.qr_size_px + 3 * self.margin_px
    }
}

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Paper size for templates without an uploaded base document.
    pub paper_size: PaperSize,
    pub stamp: StampConfig,
    pub qr: QrStyle,
    /// Initial values for the stamp fields.
    pub stamp_defaults: StampFields,
    /// chrono strftime pattern for the stamp timestamp line.
    pub timestamp_format: String,
    /// Fixed file name for stamp image downloads.
    pub stamp_file_name: String,
    /// Fixed file name for generated documents.
    pub document_file_name: String,
    /// Sub-directory of the data directory that receives downloads.
    pub downloads_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            stamp: StampConfig::default(),
            qr: QrStyle::default(),
            stamp_defaults: StampFields::default(),
            timestamp_format: "%Y/%m/%d %H:%M".into(),
            stamp_file_name: "stamp.png".into(),
            document_file_name: "document.pdf".into(),
            downloads_dir: "downloads".into(),
        }
    }
}
