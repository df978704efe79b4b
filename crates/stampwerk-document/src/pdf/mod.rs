// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: loading and merging documents, creating blank bases, and
// drawing field overlays onto pages.

pub mod overlay;
pub mod reader;
pub mod writer;

pub use overlay::{MmRect, PageOverlay};
pub use reader::PdfReader;
pub use writer::PdfWriter;
