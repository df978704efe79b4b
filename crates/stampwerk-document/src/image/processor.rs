// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode uploaded pictures, scale them, and encode raster
// output (PNG, JPEG, WebP) as bytes or data URLs. Operates on in-memory
// images using the `image` crate.

use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use stampwerk_core::data_url::DataUrl;
use stampwerk_core::error::StampwerkError;
use stampwerk_core::types::ImageDimensions;
use tracing::{debug, info, instrument};

/// JPEG quality used for stamp and QR downloads.
const JPEG_QUALITY: u8 = 92;

/// Raster formats offered for downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    Png,
    Jpeg,
    WebP,
}

impl RasterFormat {
    pub const ALL: [RasterFormat; 3] = [Self::Png, Self::Jpeg, Self::WebP];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }
}

/// Image pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so
/// calls chain:
///
/// ```ignore
/// let url = ImageProcessor::from_bytes(&upload)?
///     .resize(64, 64)
///     .to_data_url(RasterFormat::Png)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (JPEG, PNG, WebP, ...).
    ///
    /// Anything the `image` crate cannot decode is a `DecodeFailure`: the
    /// bytes claimed to be a picture but are not one.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, StampwerkError> {
        let img = image::load_from_memory(data)
            .map_err(|err| StampwerkError::DecodeFailure(format!("failed to decode image: {}", err)))?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(Self { image: img })
    }

    /// Decode the payload of an image data URL.
    pub fn from_data_url(data_url: &str) -> Result<Self, StampwerkError> {
        let parsed = DataUrl::parse(data_url)?;
        Self::from_bytes(parsed.bytes())
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> ImageDimensions {
        ImageDimensions::new(self.image.width(), self.image.height())
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image.into_rgba8()
    }

    // -- Transformations ------------------------------------------------------

    /// Resize to fit within `max_width` x `max_height`, preserving aspect
    /// ratio. Uses Lanczos3 filtering.
    #[instrument(skip(self), fields(max_width, max_height))]
    pub fn resize(self, max_width: u32, max_height: u32) -> Self {
        info!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            max_width,
            max_height,
            "Resizing image"
        );
        let resized = self
            .image
            .resize(max_width, max_height, image::imageops::FilterType::Lanczos3);
        debug!(new_w = resized.width(), new_h = resized.height(), "Resize complete");
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    pub fn to_png_bytes(&self) -> Result<Vec<u8>, StampwerkError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// JPEG has no alpha channel; transparent pixels keep their colour
    /// channels.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, StampwerkError> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| StampwerkError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Lossless WebP.
    pub fn to_webp_bytes(&self) -> Result<Vec<u8>, StampwerkError> {
        let rgba = DynamicImage::ImageRgba8(self.image.to_rgba8());
        encode_to_format(&rgba, ImageFormat::WebP)
    }

    pub fn encode(&self, format: RasterFormat) -> Result<Vec<u8>, StampwerkError> {
        match format {
            RasterFormat::Png => self.to_png_bytes(),
            RasterFormat::Jpeg => self.to_jpeg_bytes(JPEG_QUALITY),
            RasterFormat::WebP => self.to_webp_bytes(),
        }
    }

    /// Encode and wrap the bytes as `data:<mime>;base64,...`.
    pub fn to_data_url(&self, format: RasterFormat) -> Result<String, StampwerkError> {
        let bytes = self.encode(format)?;
        Ok(DataUrl::encode(format.mime_type(), &bytes))
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, StampwerkError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| StampwerkError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
