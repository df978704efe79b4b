// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export orchestrator: the two user-triggered exports (stamp image download
// and document generation) plus the save boundary they write through.

use std::path::{Path, PathBuf};

use stampwerk_core::config::AppConfig;
use stampwerk_core::error::Result;
use stampwerk_core::integrity::hash_bytes;
use stampwerk_core::session::SessionStore;
use stampwerk_core::template::{DocumentTemplate, FieldInputs};
use tracing::{info, instrument, warn};

use crate::image::RasterFormat;
use crate::qr::{QrExportFormat, QrStyler};
use crate::stamp::StampComposer;
use crate::template::{Designer, generate};

/// Where finished exports are written.
pub trait SaveTarget: Send + Sync {
    /// Store `bytes` as `file_name`, replacing an existing file of that name.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes exports into one directory, created on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveTarget for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub file_name: String,
    pub location: PathBuf,
    pub bytes: usize,
    /// SHA-256 of the written bytes.
    pub digest: String,
}

pub struct ExportOrchestrator<S: SaveTarget> {
    session: SessionStore,
    designer: Option<Designer>,
    target: S,
    stamp_file_name: String,
    document_file_name: String,
}

impl<S: SaveTarget> ExportOrchestrator<S> {
    /// Orchestrator with the default file names (`stamp.png`, `document.pdf`).
    pub fn new(session: SessionStore, target: S) -> Self {
        Self::from_config(session, target, &AppConfig::default())
    }

    pub fn from_config(session: SessionStore, target: S, config: &AppConfig) -> Self {
        Self {
            session,
            designer: None,
            target,
            stamp_file_name: config.stamp_file_name.clone(),
            document_file_name: config.document_file_name.clone(),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn target(&self) -> &S {
        &self.target
    }

    // -- Designer lifecycle ---------------------------------------------------

    /// Mount a designer for `template`, destroying any previous one.
    pub fn mount(&mut self, template: DocumentTemplate) -> Result<()> {
        let designer = Designer::new(template)?;
        if let Some(previous) = self.designer.replace(designer) {
            previous.destroy();
        }
        Ok(())
    }

    pub fn unmount(&mut self) {
        if let Some(designer) = self.designer.take() {
            designer.destroy();
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.designer.is_some()
    }

    pub fn designer(&self) -> Option<&Designer> {
        self.designer.as_ref()
    }

    pub fn designer_mut(&mut self) -> Option<&mut Designer> {
        self.designer.as_mut()
    }

    // -- Exports --------------------------------------------------------------

    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<ExportReceipt> {
        let location = self.target.save(file_name, bytes)?;
        let receipt = ExportReceipt {
            file_name: file_name.to_owned(),
            location,
            bytes: bytes.len(),
            digest: hash_bytes(bytes),
        };
        info!(
            file = %receipt.file_name,
            location = %receipt.location.display(),
            bytes = receipt.bytes,
            digest = %receipt.digest,
            "Export saved"
        );
        Ok(receipt)
    }

    /// Rasterize the current stamp fields and save them as PNG under the
    /// configured stamp file name. The session is not modified.
    #[instrument(skip_all)]
    pub fn download_stamp(&self, composer: &StampComposer) -> Result<ExportReceipt> {
        let bytes = composer.encode_as(&self.session.stamp_fields(), RasterFormat::Png)?;
        self.save(&self.stamp_file_name, &bytes)
    }

    /// Like `download_stamp` in another raster format; the extension of the
    /// stamp file name follows the format.
    #[instrument(skip_all, fields(format = ?format))]
    pub fn download_stamp_as(&self, composer: &StampComposer, format: RasterFormat) -> Result<ExportReceipt> {
        if format == RasterFormat::Png {
            return self.download_stamp(composer);
        }
        let bytes = composer.encode_as(&self.session.stamp_fields(), format)?;
        let name = with_extension(&self.stamp_file_name, format.extension());
        self.save(&name, &bytes)
    }

    /// Save the styled QR code as `qr-code.<ext>`.
    #[instrument(skip_all, fields(format = ?format))]
    pub fn download_qr(&self, styler: &QrStyler, format: QrExportFormat) -> Result<ExportReceipt> {
        let bytes = styler.download_as(format)?;
        self.save(&format!("qr-code.{}", format.extension()), &bytes)
    }

    /// Generate the mounted designer's template with its own contents.
    ///
    /// Without a mounted designer this logs and returns `Ok(None)`.
    pub fn generate_document(&self) -> Result<Option<ExportReceipt>> {
        self.generate_document_with(&[])
    }

    /// Generate one copy per input record and save the result.
    #[instrument(skip_all, fields(records = inputs.len()))]
    pub fn generate_document_with(&self, inputs: &[FieldInputs]) -> Result<Option<ExportReceipt>> {
        let Some(designer) = &self.designer else {
            warn!("document generation requested without a mounted designer, nothing to do");
            return Ok(None);
        };
        let template = designer.get_template();
        let pdf = generate(&template, inputs)?;
        self.save(&self.document_file_name, &pdf).map(Some)
    }
}

/// `stamp.png` + `jpg` -> `stamp.jpg`.
fn with_extension(file_name: &str, extension: &str) -> String {
    Path::new(file_name)
        .with_extension(extension)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{SelectedFile, encode_and_publish};
    use crate::image::ImageProcessor;
    use crate::pdf::PdfReader;
    use image::{Rgba, RgbaImage};
    use stampwerk_core::config::{QrStyle, StampConfig};
    use stampwerk_core::error::StampwerkError;
    use stampwerk_core::presets::{PHOTO_FIELD, TemplatePreset};
    use stampwerk_core::types::{AssetKind, ImageDimensions, PaperSize, StampField};

    fn composer() -> StampComposer {
        StampComposer::new(StampConfig::default(), QrStyle::default()).unwrap()
    }

    fn photo_png() -> Vec<u8> {
        let img = RgbaImage::from_pixel(500, 300, Rgba([40, 90, 160, 255]));
        ImageProcessor::from_rgba(img).encode(RasterFormat::Png).unwrap()
    }

    fn orchestrator(dir: &Path) -> ExportOrchestrator<DirectorySink> {
        ExportOrchestrator::new(SessionStore::default(), DirectorySink::new(dir.join("downloads")))
    }

    #[test]
    fn photo_upload_to_stamp_in_session() {
        let session = SessionStore::default();
        let photo = SelectedFile::new("photo.png", Some("image/png"), photo_png());
        let asset = encode_and_publish(&photo, AssetKind::Image, &session).unwrap();
        assert_eq!(asset.dimensions(), Some(ImageDimensions::new(500, 300)));

        let composer = composer();
        let layout = composer.layout(&session.stamp_fields());
        assert!(layout.width <= composer.config().max_width_px);

        let stamp = composer.generate(&session).unwrap();
        let slot = session.base_image().unwrap();
        assert!(slot.data_url.starts_with("data:image/png;"));
        assert_eq!(slot.data_url, stamp.image_data_url);
        assert_eq!(session.image_dimensions(), ImageDimensions::new(layout.width, layout.height));
    }

    #[test]
    fn notes_upload_keeps_previous_image() {
        let session = SessionStore::default();
        let photo = SelectedFile::new("photo.png", Some("image/png"), photo_png());
        let before = encode_and_publish(&photo, AssetKind::Image, &session).unwrap();

        let notes = SelectedFile::new("notes.txt", Some("text/plain"), b"todo".to_vec());
        let err = encode_and_publish(&notes, AssetKind::Image, &session).unwrap_err();
        assert!(matches!(err, StampwerkError::InvalidMimeType(_)));
        assert_eq!(session.base_image(), Some(before));
    }

    #[test]
    fn generation_without_designer_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(dir.path());
        assert!(!orchestrator.is_mounted());
        assert_eq!(orchestrator.generate_document().unwrap(), None);
        assert!(!dir.path().join("downloads").exists());
    }

    #[test]
    fn stamp_download_uses_fixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(dir.path());
        orchestrator.session().set_stamp_field(StampField::SignerName, "Ada");
        let revision = orchestrator.session().revision();

        let receipt = orchestrator.download_stamp(&composer()).unwrap();
        assert_eq!(receipt.file_name, "stamp.png");
        let written = std::fs::read(&receipt.location).unwrap();
        assert!(written.starts_with(&[0x89, b'P', b'N', b'G']));
        assert_eq!(receipt.digest, hash_bytes(&written));
        assert_eq!(orchestrator.session().revision(), revision);

        let again = orchestrator.download_stamp(&composer()).unwrap();
        assert_eq!(again.location, receipt.location);
    }

    #[test]
    fn stamp_download_in_other_formats() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(dir.path());
        let jpeg = orchestrator.download_stamp_as(&composer(), RasterFormat::Jpeg).unwrap();
        assert_eq!(jpeg.file_name, "stamp.jpg");
        let webp = orchestrator.download_stamp_as(&composer(), RasterFormat::WebP).unwrap();
        assert_eq!(webp.file_name, "stamp.webp");
    }

    #[test]
    fn qr_download_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(dir.path());
        let receipt = orchestrator
            .download_qr(&QrStyler::new(QrStyle::default()), QrExportFormat::Svg)
            .unwrap();
        assert_eq!(receipt.file_name, "qr-code.svg");
    }

    #[test]
    fn mounted_designer_generates_pdf_with_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator = orchestrator(dir.path());
        composer().generate(orchestrator.session()).unwrap();

        let template = TemplatePreset::StampCard.template(&orchestrator.session().snapshot(), PaperSize::A4);
        assert!(!template.field(PHOTO_FIELD).unwrap().content.content().is_empty());
        orchestrator.mount(template).unwrap();

        let receipt = orchestrator.generate_document().unwrap().unwrap();
        assert_eq!(receipt.file_name, "document.pdf");
        let pdf = std::fs::read(&receipt.location).unwrap();
        assert_eq!(PdfReader::from_bytes(&pdf).unwrap().page_count(), 1);

        orchestrator.unmount();
        assert_eq!(orchestrator.generate_document().unwrap(), None);
    }
}
