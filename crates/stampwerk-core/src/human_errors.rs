// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the status line.
//
// Every failure in Stampwerk is recoverable by repeating the user action, so
// the mapping mostly decides *which* action to suggest.

use crate::error::StampwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Nothing to fix: trying again is expected to work.
    Transient,
    /// User must do something (pick another file, mount the designer).
    ActionRequired,
    /// The input itself is unusable.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether repeating the same action may succeed.
    pub retriable: bool,
    pub severity: Severity,
}

impl HumanError {
    /// One-line rendering for status bars.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.message, self.suggestion)
    }
}

/// Convert a `StampwerkError` into a `HumanError`.
pub fn humanize_error(err: &StampwerkError) -> HumanError {
    match err {
        StampwerkError::InvalidMimeType(mime) => HumanError {
            message: "That file isn't an image.".into(),
            suggestion: format!("Choose a PNG, JPEG, or WebP picture instead. (File type: {mime})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        StampwerkError::DecodeFailure(_) => HumanError {
            message: "We couldn't open this image.".into(),
            suggestion: "The picture may be damaged or in an unusual format. Try saving it as PNG or JPEG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        StampwerkError::InvalidDataUrl(_) => HumanError {
            message: "The stored file is unreadable.".into(),
            suggestion: "Upload the file again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        StampwerkError::RasterizationFailure(_) => HumanError {
            message: "The stamp couldn't be drawn.".into(),
            suggestion: "Press Generate again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        StampwerkError::QrEncode(_) => HumanError {
            message: "The QR code text is too long.".into(),
            suggestion: "Shorten the URL or text encoded in the QR code.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        StampwerkError::Font(detail) => HumanError {
            message: "The stamp font couldn't be loaded.".into(),
            suggestion: format!("Check the font path in the settings, or clear it to use the built-in font. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        StampwerkError::EngineUnavailable => HumanError {
            message: "The document designer isn't open.".into(),
            suggestion: "Open the designer, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        StampwerkError::Template(detail) => HumanError {
            message: "The template has a problem.".into(),
            suggestion: format!("Fix the field list and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        StampwerkError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try a different base document.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        StampwerkError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "Try saving it as PNG or JPEG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        StampwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or pick a different folder.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        StampwerkError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_file_kind_is_action_required() {
        let human = humanize_error(&StampwerkError::InvalidMimeType("text/plain".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.suggestion.contains("text/plain"));
    }

    #[test]
    fn rasterization_is_retriable() {
        let human = humanize_error(&StampwerkError::RasterizationFailure("png".into()));
        assert!(human.retriable);
        assert_eq!(human.severity, Severity::Transient);
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = StampwerkError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.status_line().is_empty());
    }
}
