// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Encoding utility: turn a user-selected file into an `EncodedAsset` (a data
// URL plus, for images, decoded pixel dimensions) and publish it into the
// session.

use std::path::Path;

use stampwerk_core::data_url::DataUrl;
use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_core::session::SessionStore;
use stampwerk_core::types::{AssetKind, EncodedAsset};
use tracing::{info, instrument, warn};

use crate::image::ImageProcessor;

/// Media type used when the file carries no declared type.
pub const UNDECLARED_MIME: &str = "application/octet-stream";

/// A file handed over by the file picker: name, declared type, and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// Declared media type, `None` when the picker did not provide one.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.map(str::to_owned),
            bytes,
        }
    }

    /// Read a file from disk, declaring its type from the extension.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(mime_from_extension)
            .map(str::to_owned);
        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }

    /// Declared type, or the generic binary type.
    pub fn declared_mime(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(UNDECLARED_MIME)
    }
}

/// Guess a media type from a file extension (case-insensitive).
pub fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "svg" => Some("image/svg+xml"),
        "txt" => Some("text/plain"),
        "json" => Some("application/json"),
        _ => None,
    }
}

/// Encode `file` for the given upload slot.
///
/// PDF slot: any content is accepted as-is. Image slot: the declared type
/// must be `image/*` and the bytes must decode, which is also how the
/// dimensions are obtained.
#[instrument(skip(file), fields(name = %file.name, bytes = file.bytes.len()))]
pub fn encode(file: &SelectedFile, kind: AssetKind) -> Result<EncodedAsset> {
    let mime = file.declared_mime();
    match kind {
        AssetKind::Pdf => Ok(EncodedAsset::pdf(DataUrl::encode(mime, &file.bytes))),
        AssetKind::Image => {
            if !mime.to_ascii_lowercase().starts_with("image/") {
                return Err(StampwerkError::InvalidMimeType(mime.to_owned()));
            }
            let dimensions = ImageProcessor::from_bytes(&file.bytes)?.dimensions();
            if !dimensions.is_known() {
                return Err(StampwerkError::DecodeFailure(format!(
                    "{} decoded to an empty image",
                    file.name
                )));
            }
            Ok(EncodedAsset::image(DataUrl::encode(mime, &file.bytes), dimensions))
        }
    }
}

/// Encode `file` and store it in the matching session slot. On failure the
/// session is left as it was.
pub fn encode_and_publish(file: &SelectedFile, kind: AssetKind, session: &SessionStore) -> Result<EncodedAsset> {
    match encode(file, kind) {
        Ok(asset) => {
            match kind {
                AssetKind::Pdf => session.set_base_document(asset.clone()),
                AssetKind::Image => session.set_base_image(asset.clone()),
            }
            info!(name = %file.name, %kind, "upload published");
            Ok(asset)
        }
        Err(err) => {
            warn!(name = %file.name, %kind, %err, "upload rejected");
            Err(err)
        }
    }
}
