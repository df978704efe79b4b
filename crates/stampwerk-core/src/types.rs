// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for stamp cards: encoded uploads, stamp text fields,
// rendered stamps, and paper sizes.

use serde::{Deserialize, Serialize};

use crate::data_url::DataUrl;
use crate::error::Result;

/// Which upload slot an encoded file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Pdf,
    Image,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => f.write_str("pdf"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// Pixel dimensions of a decoded image. Zero until an image has been decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both sides are non-zero.
    pub fn is_known(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// A user-provided file converted into a self-describing data URL.
///
/// For [`AssetKind::Image`] the asset only becomes usable once its pixel
/// dimensions are known, which requires an actual decode of the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedAsset {
    pub kind: AssetKind,
    pub data_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl EncodedAsset {
    /// A PDF (or any other non-image) asset.
    pub fn pdf(data_url: impl Into<String>) -> Self {
        Self {
            kind: AssetKind::Pdf,
            data_url: data_url.into(),
            width: None,
            height: None,
        }
    }

    /// An image asset whose dimensions were obtained by decoding it.
    pub fn image(data_url: impl Into<String>, dimensions: ImageDimensions) -> Self {
        Self {
            kind: AssetKind::Image,
            data_url: data_url.into(),
            width: Some(dimensions.width),
            height: Some(dimensions.height),
        }
    }

    /// Whether downstream consumers may rely on this asset.
    pub fn is_usable(&self) -> bool {
        if self.data_url.is_empty() {
            return false;
        }
        match self.kind {
            AssetKind::Pdf => true,
            AssetKind::Image => self.dimensions().is_some_and(|d| d.is_known()),
        }
    }

    pub fn dimensions(&self) -> Option<ImageDimensions> {
        match (self.width, self.height) {
            (Some(width), Some(height)) => Some(ImageDimensions { width, height }),
            _ => None,
        }
    }

    /// Declared media type, read from the data URL prefix without decoding.
    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.data_url.strip_prefix("data:")?;
        let end = rest.find([';', ','])?;
        Some(&rest[..end])
    }

    /// Parse the data URL and return the binary payload.
    pub fn decode(&self) -> Result<DataUrl> {
        DataUrl::parse(&self.data_url)
    }

    /// Binary payload of the data URL.
    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.decode()?.into_bytes())
    }
}

/// Identifies one of the text fields printed on a stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StampField {
    SignerName,
    Email,
    Phone,
    Timestamp,
    Url,
}

impl StampField {
    pub const ALL: [StampField; 5] = [
        Self::SignerName,
        Self::Email,
        Self::Phone,
        Self::Timestamp,
        Self::Url,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::SignerName => "Signer name",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Timestamp => "Timestamp",
            Self::Url => "URL",
        }
    }
}

/// Signer metadata printed next to the QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StampFields {
    pub signer_name: String,
    pub email: String,
    pub phone: String,
    pub timestamp: String,
    pub url: String,
}

impl Default for StampFields {
    fn default() -> Self {
        Self {
            signer_name: "Signer Name".into(),
            email: "signer@example.com".into(),
            phone: "+00 000 000 000".into(),
            timestamp: String::new(),
            url: "https://example.com/verify".into(),
        }
    }
}

impl StampFields {
    pub fn get(&self, field: StampField) -> &str {
        match field {
            StampField::SignerName => &self.signer_name,
            StampField::Email => &self.email,
            StampField::Phone => &self.phone,
            StampField::Timestamp => &self.timestamp,
            StampField::Url => &self.url,
        }
    }

    /// Uniform update contract: every field is set the same way.
    pub fn set(&mut self, field: StampField, value: impl Into<String>) {
        let value = value.into();
        match field {
            StampField::SignerName => self.signer_name = value,
            StampField::Email => self.email = value,
            StampField::Phone => self.phone = value,
            StampField::Timestamp => self.timestamp = value,
            StampField::Url => self.url = value,
        }
    }

    /// Fill the timestamp with the current local time in `format`
    /// (chrono strftime syntax).
    pub fn stamp_now(&mut self, format: &str) {
        self.timestamp = chrono::Local::now().format(format).to_string();
    }
}

/// The rasterized stamp, ready to be embedded or downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedStamp {
    /// `data:image/png;base64,...`
    pub image_data_url: String,
    pub width: u32,
    pub height: u32,
    /// SHA-256 hex digest of the encoded image bytes.
    pub digest: String,
}

impl RenderedStamp {
    pub fn dimensions(&self) -> ImageDimensions {
        ImageDimensions::new(self.width, self.height)
    }

    /// View the stamp as an image asset for the session's base-image slot.
    pub fn to_asset(&self) -> EncodedAsset {
        EncodedAsset::image(self.image_data_url.clone(), self.dimensions())
    }
}

/// Standard paper sizes for blank base documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::A3 => "A3",
            Self::A5 => "A5",
            Self::Letter => "Letter",
            Self::Legal => "Legal",
            Self::Custom { .. } => "Custom",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "A4" => Some(Self::A4),
            "A3" => Some(Self::A3),
            "A5" => Some(Self::A5),
            "Letter" => Some(Self::Letter),
            "Legal" => Some(Self::Legal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_asset_without_dimensions_is_not_usable() {
        let mut asset = EncodedAsset::image("data:image/png;base64,AAAA", ImageDimensions::new(2, 2));
        assert!(asset.is_usable());
        asset.width = None;
        assert!(!asset.is_usable());
        asset.width = Some(0);
        assert!(!asset.is_usable());
    }

    #[test]
    fn pdf_asset_is_usable_once_encoded() {
        assert!(EncodedAsset::pdf("data:application/pdf;base64,JVBERi0=").is_usable());
        assert!(!EncodedAsset::pdf("").is_usable());
    }

    #[test]
    fn mime_type_read_from_prefix() {
        let asset = EncodedAsset::pdf("data:application/pdf;base64,JVBERi0=");
        assert_eq!(asset.mime_type(), Some("application/pdf"));
        let asset = EncodedAsset::pdf("not a data url");
        assert_eq!(asset.mime_type(), None);
    }

    #[test]
    fn stamp_fields_share_one_update_contract() {
        let mut fields = StampFields::default();
        for field in StampField::ALL {
            fields.set(field, format!("value for {}", field.label()));
        }
        for field in StampField::ALL {
            assert_eq!(fields.get(field), format!("value for {}", field.label()));
        }
    }

    #[test]
    fn stamp_now_fills_timestamp() {
        let mut fields = StampFields::default();
        fields.stamp_now("%Y");
        assert_eq!(fields.timestamp.len(), 4);
    }

    #[test]
    fn paper_size_labels_round_trip() {
        for size in [PaperSize::A4, PaperSize::A3, PaperSize::A5, PaperSize::Letter, PaperSize::Legal] {
            assert_eq!(PaperSize::from_label(size.label()), Some(size));
        }
    }
}
