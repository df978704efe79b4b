// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document templates: a base document plus positioned content fields.
//
// The JSON shape follows the designer interchange format: each field carries
// a `type` tag (`text`, `image`, `qrcode`, `dateTime`) next to its position
// and size, with camelCase option keys. Positions and sizes are millimetres
// measured from the top-left corner of the page.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StampwerkError};
use crate::types::{EncodedAsset, PaperSize};

/// Per-record content overrides for generation, keyed by field name.
pub type FieldInputs = BTreeMap<String, String>;

/// Default designer date format (date-fns tokens).
pub const DEFAULT_DATE_FORMAT: &str = "yyyy/MM/dd HH:mm";

/// Default text size in points.
pub const DEFAULT_FONT_SIZE: f32 = 13.0;

fn first_page() -> u32 {
    1
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_owned()
}

/// Top-left corner of a field in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Type-specific payload of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum FieldContent {
    #[serde(rename = "text")]
    Text {
        content: String,
        #[serde(default = "default_font_size")]
        font_size: f32,
    },
    /// `content` is an image data URL; empty means "nothing to draw yet".
    #[serde(rename = "image")]
    Image { content: String },
    /// `content` is the payload encoded into the QR code.
    #[serde(rename = "qrcode")]
    QrCode { content: String },
    /// `content` is already formatted according to `format`.
    #[serde(rename = "dateTime")]
    DateTime {
        content: String,
        #[serde(default = "default_date_format")]
        format: String,
        #[serde(default)]
        placeholder: String,
        #[serde(default)]
        read_only: bool,
    },
}

impl FieldContent {
    /// The `type` tag as it appears in template JSON.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::QrCode { .. } => "qrcode",
            Self::DateTime { .. } => "dateTime",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Text { content, .. }
            | Self::Image { content }
            | Self::QrCode { content }
            | Self::DateTime { content, .. } => content,
        }
    }

    pub fn set_content(&mut self, value: impl Into<String>) {
        match self {
            Self::Text { content, .. }
            | Self::Image { content }
            | Self::QrCode { content }
            | Self::DateTime { content, .. } => *content = value.into(),
        }
    }
}

/// One positioned field of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// 1-based page index.
    #[serde(default = "first_page")]
    pub page: u32,
    pub position: Position,
    pub width: f32,
    pub height: f32,
    #[serde(flatten)]
    pub content: FieldContent,
}

impl FieldSpec {
    pub fn new(
        name: impl Into<String>,
        position: Position,
        width: f32,
        height: f32,
        content: FieldContent,
    ) -> Self {
        Self {
            name: name.into(),
            page: 1,
            position,
            width,
            height,
            content,
        }
    }

    pub fn text(name: impl Into<String>, position: Position, width: f32, height: f32, content: impl Into<String>) -> Self {
        Self::new(
            name,
            position,
            width,
            height,
            FieldContent::Text {
                content: content.into(),
                font_size: DEFAULT_FONT_SIZE,
            },
        )
    }

    pub fn image(name: impl Into<String>, position: Position, width: f32, height: f32, data_url: impl Into<String>) -> Self {
        Self::new(name, position, width, height, FieldContent::Image { content: data_url.into() })
    }

    pub fn qr_code(name: impl Into<String>, position: Position, size: f32, payload: impl Into<String>) -> Self {
        Self::new(name, position, size, size, FieldContent::QrCode { content: payload.into() })
    }

    pub fn date_time(name: impl Into<String>, position: Position, width: f32, height: f32, content: impl Into<String>) -> Self {
        Self::new(
            name,
            position,
            width,
            height,
            FieldContent::DateTime {
                content: content.into(),
                format: DEFAULT_DATE_FORMAT.to_owned(),
                placeholder: "Select Date and Time".to_owned(),
                read_only: false,
            },
        )
    }

    pub fn on_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.content.type_name()
    }
}

/// The document every field is drawn onto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BasePdf {
    /// A single empty page of the given size.
    Blank(PaperSize),
    /// An uploaded PDF.
    Document(EncodedAsset),
}

impl Default for BasePdf {
    fn default() -> Self {
        Self::Blank(PaperSize::A4)
    }
}

/// A base document plus its positioned fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTemplate {
    pub base_pdf: BasePdf,
    pub fields: Vec<FieldSpec>,
}

impl DocumentTemplate {
    pub fn new(base_pdf: BasePdf, fields: Vec<FieldSpec>) -> Self {
        Self { base_pdf, fields }
    }

    /// Use the uploaded document when there is one, else a blank page.
    pub fn with_optional_base(base: Option<EncodedAsset>, paper: PaperSize, fields: Vec<FieldSpec>) -> Self {
        let base_pdf = match base {
            Some(asset) if asset.is_usable() => BasePdf::Document(asset),
            _ => BasePdf::Blank(paper),
        };
        Self { base_pdf, fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldSpec> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Reject templates the generator cannot place.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(StampwerkError::Template("field with empty name".into()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(StampwerkError::Template(format!(
                    "duplicate field name `{}`",
                    field.name
                )));
            }
            if field.page == 0 {
                return Err(StampwerkError::Template(format!(
                    "field `{}` has page 0 (pages are 1-based)",
                    field.name
                )));
            }
            if !(field.width > 0.0 && field.height > 0.0) {
                return Err(StampwerkError::Template(format!(
                    "field `{}` must have a positive size",
                    field.name
                )));
            }
        }
        Ok(())
    }

    /// Same field count, names, types, pages, and positions, in order.
    /// Contents are deliberately not compared.
    pub fn same_structure(&self, other: &DocumentTemplate) -> bool {
        self.fields.len() == other.fields.len()
            && self.fields.iter().zip(&other.fields).all(|(a, b)| {
                a.name == b.name
                    && a.type_name() == b.type_name()
                    && a.page == b.page
                    && a.position == b.position
                    && a.width == b.width
                    && a.height == b.height
            })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Translate a designer date pattern (`yyyy/MM/dd HH:mm`) into chrono's
/// strftime syntax. Unknown letters are copied through literally.
pub fn to_strftime(pattern: &str) -> String {
    const TOKENS: [(&str, &str); 12] = [
        ("yyyy", "%Y"),
        ("yy", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("dd", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("EEEE", "%A"),
        ("a", "%p"),
    ];

    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;
    'outer: while !rest.is_empty() {
        for (token, replacement) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            if c == '%' {
                out.push_str("%%");
            } else {
                out.push(c);
            }
        }
        rest = chars.as_str();
    }
    out
}

/// Current local time formatted with a designer date pattern.
pub fn format_now(pattern: &str) -> String {
    chrono::Local::now().format(&to_strftime(pattern)).to_string()
}
