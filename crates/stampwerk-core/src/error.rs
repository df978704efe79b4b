// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Stampwerk.

use thiserror::Error;

/// Top-level error type for all Stampwerk operations.
///
/// None of these are fatal: every variant is recovered by re-running the
/// user action that produced it.
#[derive(Debug, Error)]
pub enum StampwerkError {
    // -- Upload / encoding --
    #[error("expected an image file, got `{0}`")]
    InvalidMimeType(String),

    #[error("image could not be decoded: {0}")]
    DecodeFailure(String),

    #[error("malformed data URL: {0}")]
    InvalidDataUrl(String),

    // -- Stamp composition --
    #[error("stamp rasterization failed: {0}")]
    RasterizationFailure(String),

    #[error("QR code encoding failed: {0}")]
    QrEncode(String),

    #[error("font could not be loaded: {0}")]
    Font(String),

    // -- Document template engine --
    #[error("document template engine is not mounted")]
    EngineUnavailable,

    #[error("invalid template: {0}")]
    Template(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Storage --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StampwerkError>;
