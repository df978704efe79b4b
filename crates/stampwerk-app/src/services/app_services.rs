// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: owns the session store, the stamp composer, the QR
// styler and the export orchestrator, and exposes them to the Dioxus UI.
//
// Rendering and PDF generation are CPU-bound, so the async wrappers move
// them onto tokio's blocking pool. Everything shared is behind `Arc<Mutex<>>`;
// locks are only held for the duration of one call.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_core::presets::TemplatePreset;
use stampwerk_core::types::{AssetKind, EncodedAsset, RenderedStamp, StampField};
use stampwerk_core::{AppConfig, SessionStore};
use stampwerk_document::{
    BitmapTextRenderer, DirectorySink, ExportOrchestrator, ExportReceipt, FieldSummary, QrExportFormat, QrStyler,
    RasterFormat, SelectedFile, StampComposer, encode_and_publish,
};
use tracing::{info, warn};

use super::data_dir;

type Exports = ExportOrchestrator<DirectorySink>;

/// Shared application services accessible from all Dioxus components via
/// `use_context::<AppServices>()`.
#[derive(Clone)]
pub struct AppServices {
    session: SessionStore,
    composer: Arc<Mutex<StampComposer>>,
    qr: Arc<Mutex<QrStyler>>,
    exports: Arc<Mutex<Exports>>,
    data_dir: PathBuf,
    config: Arc<Mutex<AppConfig>>,
}

impl AppServices {
    /// Initialise all services in the platform data directory.
    pub fn init() -> Self {
        Self::open(data_dir::data_dir())
    }

    /// Initialise all services rooted at `dir`. A missing or unreadable
    /// `config.json` falls back to the defaults.
    pub fn open(dir: PathBuf) -> Self {
        info!(path = %dir.display(), "initialising app services");
        let config = load_config(&dir).unwrap_or_default();
        let session = SessionStore::new(config.stamp_defaults.clone());
        let exports = build_exports(&dir, session.clone(), &config);

        Self {
            composer: Arc::new(Mutex::new(build_composer(&config))),
            qr: Arc::new(Mutex::new(QrStyler::new(config.qr.clone()))),
            exports: Arc::new(Mutex::new(exports)),
            session,
            data_dir: dir,
            config: Arc::new(Mutex::new(config)),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // -- Uploads --------------------------------------------------------------

    /// Read, encode and publish a picked file into the `kind` slot.
    pub fn upload(&self, path: &Path, kind: AssetKind) -> Result<EncodedAsset> {
        let file = SelectedFile::from_path(path)?;
        encode_and_publish(&file, kind, &self.session)
    }

    // -- Stamp ----------------------------------------------------------------

    pub fn set_stamp_field(&self, field: StampField, value: String) {
        self.session.set_stamp_field(field, value);
    }

    /// Fill the timestamp field with the current time.
    pub fn stamp_now(&self) {
        let format = lock(&self.config).timestamp_format.clone();
        let mut fields = self.session.stamp_fields();
        fields.stamp_now(&format);
        self.session.set_stamp_field(StampField::Timestamp, fields.timestamp);
    }

    /// Rasterize the current fields and publish the stamp into the image
    /// slot. A render overtaken by a newer one is computed but not published.
    pub async fn generate_stamp(&self) -> Result<RenderedStamp> {
        let composer = lock(&self.composer).clone();
        let session = self.session.clone();
        tokio::task::spawn_blocking(move || composer.generate(&session))
            .await
            .map_err(|e| StampwerkError::RasterizationFailure(e.to_string()))?
    }

    pub fn download_stamp(&self, format: RasterFormat) -> Result<ExportReceipt> {
        let composer = lock(&self.composer).clone();
        lock(&self.exports).download_stamp_as(&composer, format)
    }

    /// Save the styled QR code for the current URL field.
    pub fn download_qr(&self, format: QrExportFormat) -> Result<ExportReceipt> {
        let url = self.session.stamp_fields().url;
        let mut styler = lock(&self.qr);
        if !url.is_empty() && styler.style().data != url {
            let mut style = styler.style().clone();
            style.data = url;
            styler.update(style);
        }
        lock(&self.exports).download_qr(&styler, format)
    }

    // -- Document designer ----------------------------------------------------

    /// Mount a designer for `preset`, built from the current session.
    pub fn mount_preset(&self, preset: TemplatePreset) -> Result<()> {
        let paper = lock(&self.config).paper_size;
        let template = preset.template(&self.session.snapshot(), paper);
        lock(&self.exports).mount(template)
    }

    pub fn unmount_designer(&self) {
        lock(&self.exports).unmount();
    }

    pub fn designer_fields(&self) -> Vec<FieldSummary> {
        lock(&self.exports)
            .designer()
            .map(|d| d.fields())
            .unwrap_or_default()
    }

    pub fn set_designer_field(&self, name: &str, content: String) -> Result<()> {
        match lock(&self.exports).designer_mut() {
            Some(designer) => designer.set_field_content(name, content),
            None => Err(StampwerkError::EngineUnavailable),
        }
    }

    /// Generate the mounted template. `Ok(None)` when nothing is mounted.
    pub async fn generate_document(&self) -> Result<Option<ExportReceipt>> {
        let exports = Arc::clone(&self.exports);
        tokio::task::spawn_blocking(move || {
            let exports = lock(&exports);
            exports.generate_document()
        })
        .await
        .map_err(|e| StampwerkError::Template(format!("generation task failed: {e}")))?
    }

    pub fn downloads_dir(&self) -> PathBuf {
        lock(&self.exports).target().dir().to_path_buf()
    }

    // -- Config Persistence ---------------------------------------------------

    pub fn config(&self) -> AppConfig {
        lock(&self.config).clone()
    }

    /// Persist `config` and rebuild the services that depend on it. A mounted
    /// designer keeps its working template.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        persist_config(&self.data_dir, config)?;
        *lock(&self.config) = config.clone();
        *lock(&self.composer) = build_composer(config);
        lock(&self.qr).update(config.qr.clone());

        let mut exports = lock(&self.exports);
        let mounted = exports.designer().map(|d| d.get_template());
        exports.unmount();
        *exports = build_exports(&self.data_dir, self.session.clone(), config);
        if let Some(template) = mounted {
            exports.mount(template)?;
        }
        info!("config saved");
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Composer for `config`; an unloadable font falls back to the bitmap font.
fn build_composer(config: &AppConfig) -> StampComposer {
    StampComposer::from_config(config).unwrap_or_else(|e| {
        warn!(error = %e, "stamp font unavailable, using built-in font");
        StampComposer::with_renderer(
            config.stamp.clone(),
            config.qr.clone(),
            Arc::new(BitmapTextRenderer::new(config.stamp.font_size_px)),
        )
    })
}

fn build_exports(dir: &Path, session: SessionStore, config: &AppConfig) -> Exports {
    let downloads = data_dir::subdir(dir, &config.downloads_dir);
    ExportOrchestrator::from_config(session, DirectorySink::new(downloads), config)
}

// -- Config file persistence --------------------------------------------------

const CONFIG_FILE: &str = "config.json";

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "ignoring unreadable config");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampwerk_core::types::PaperSize;

    fn services() -> (tempfile::TempDir, AppServices) {
        let dir = tempfile::tempdir().unwrap();
        let svc = AppServices::open(dir.path().to_path_buf());
        (dir, svc)
    }

    #[test]
    fn starts_from_defaults_without_config_file() {
        let (_dir, svc) = services();
        assert_eq!(svc.config(), AppConfig::default());
        assert!(svc.downloads_dir().is_dir());
    }

    #[test]
    fn saved_config_is_loaded_on_next_start() {
        let (dir, svc) = services();
        let mut config = svc.config();
        config.paper_size = PaperSize::Letter;
        config.stamp_defaults.signer_name = "Ada Lovelace".into();
        svc.save_config(&config).unwrap();

        let reopened = AppServices::open(dir.path().to_path_buf());
        assert_eq!(reopened.config().paper_size, PaperSize::Letter);
        assert_eq!(reopened.session().signer_name(), "Ada Lovelace");
    }

    #[test]
    fn broken_font_path_falls_back_to_builtin_font() {
        let (_dir, svc) = services();
        let mut config = svc.config();
        config.stamp.font_path = Some(PathBuf::from("/nonexistent/font.ttf"));
        svc.save_config(&config).unwrap();
        let receipt = svc.download_stamp(RasterFormat::Png).unwrap();
        assert_eq!(receipt.file_name, "stamp.png");
    }

    #[test]
    fn stamp_now_fills_timestamp_field() {
        let (_dir, svc) = services();
        svc.stamp_now();
        assert!(!svc.session().stamp_fields().timestamp.is_empty());
    }

    #[test]
    fn designer_lifecycle() {
        let (_dir, svc) = services();
        assert!(svc.designer_fields().is_empty());
        assert!(matches!(
            svc.set_designer_field("Text", "x".into()),
            Err(StampwerkError::EngineUnavailable)
        ));

        svc.mount_preset(TemplatePreset::StampCard).unwrap();
        assert_eq!(svc.designer_fields().len(), 4);
        svc.set_designer_field("Text", "Grace".into()).unwrap();

        svc.unmount_designer();
        assert!(svc.designer_fields().is_empty());
    }

    #[tokio::test]
    async fn generated_document_lands_in_downloads() {
        let (_dir, svc) = services();
        assert!(svc.generate_document().await.unwrap().is_none());

        svc.mount_preset(TemplatePreset::StampCard).unwrap();
        let receipt = svc.generate_document().await.unwrap().unwrap();
        assert_eq!(receipt.location, svc.downloads_dir().join("document.pdf"));
    }

    #[tokio::test]
    async fn generated_stamp_is_published() {
        let (_dir, svc) = services();
        let stamp = svc.generate_stamp().await.unwrap();
        let slot = svc.session().base_image().unwrap();
        assert_eq!(slot.data_url, stamp.image_data_url);
    }

    #[test]
    fn qr_download_follows_url_field() {
        let (_dir, svc) = services();
        svc.set_stamp_field(StampField::Url, "https://example.org/doc/42".into());
        let receipt = svc.download_qr(QrExportFormat::Svg).unwrap();
        assert_eq!(receipt.file_name, "qr-code.svg");
        let svg = std::fs::read_to_string(&receipt.location).unwrap();
        assert!(svg.contains("<svg"));
    }
}
