// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: blank base documents for templates without an uploaded PDF,
// built with `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use printpdf::{Mm, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg};
use stampwerk_core::error::StampwerkError;
use stampwerk_core::types::PaperSize;
use tracing::{debug, instrument};

/// Creates new, empty PDF documents.
pub struct PdfWriter {
    paper_size: PaperSize,
    title: Option<String>,
}

impl PdfWriter {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// `pages` empty pages of the configured paper size.
    #[instrument(skip(self), fields(paper = ?self.paper_size))]
    pub fn blank_pages(&self, pages: usize) -> Result<Vec<u8>, StampwerkError> {
        if pages == 0 {
            return Err(StampwerkError::PdfError("a document needs at least one page".into()));
        }
        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("Stampwerk Document");

        let mut doc = PdfDocument::new(title);
        doc.with_pages((0..pages).map(|_| PdfPage::new(page_w, page_h, Vec::new())).collect());

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(pages, bytes = output.len(), warnings = warnings.len(), "Blank PDF created");
        Ok(output)
    }

    /// A single empty page.
    pub fn blank(&self) -> Result<Vec<u8>, StampwerkError> {
        self.blank_pages(1)
    }
}
