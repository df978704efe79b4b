// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document template engine: an editable designer session plus the generator
// that flattens templates into PDFs.

pub mod designer;
pub mod generator;

pub use designer::{Designer, FieldSummary};
pub use generator::generate;
