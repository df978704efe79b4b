// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stamp module: text rendering and the stamp composer (QR tile + signer
// text, rasterized to PNG).

pub mod composer;
pub mod text;

pub use composer::{StampComposer, StampLayout, StampLine};
pub use text::{BitmapTextRenderer, TextRenderer, TrueTypeTextRenderer};
