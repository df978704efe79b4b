// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// stampwerk-document: everything that touches pixels or PDF bytes.
//
// Upload encoding (data URLs, image decoding), the QR styling engine, stamp
// composition and rasterization, the document template engine (designer and
// generator on top of lopdf/printpdf), and the export orchestrator.

pub mod encoding;
pub mod export;
pub mod image;
pub mod pdf;
pub mod qr;
pub mod stamp;
pub mod template;

// Re-export the primary types so callers can use `stampwerk_document::StampComposer` etc.
pub use encoding::{SelectedFile, encode, encode_and_publish};
pub use export::{DirectorySink, ExportOrchestrator, ExportReceipt, SaveTarget};
pub use image::{ImageProcessor, RasterFormat};
pub use pdf::{PdfReader, PdfWriter};
pub use qr::{QrExportFormat, QrStyler};
pub use stamp::{BitmapTextRenderer, StampComposer, StampLayout, TextRenderer, TrueTypeTextRenderer};
pub use template::{Designer, FieldSummary, generate};
