// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Global application state: reactive signals for the Dioxus UI.
//
// Session data (uploads, stamp fields, the rendered stamp) lives in the
// `SessionStore`; `AppState` only mirrors the latest snapshot so components
// re-render when it changes.

use stampwerk_core::human_errors::humanize_error;
use stampwerk_core::{AppConfig, SessionSnapshot, StampwerkError};

use crate::services::app_services::AppServices;

/// Shared state accessible to all pages via `use_context`.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Latest session snapshot, refreshed on every store change.
    pub session: SessionSnapshot,
    /// Application settings being edited.
    pub config: AppConfig,
    /// Status message for user feedback.
    pub status_message: Option<String>,
    /// Whether a stamp render is in flight.
    pub rendering: bool,
}

impl AppState {
    /// Create initial state from the backend services.
    pub fn new(svc: &AppServices) -> Self {
        Self {
            session: svc.session().snapshot(),
            config: svc.config(),
            status_message: None,
            rendering: false,
        }
    }

    /// Show `err` in the status line in plain language.
    pub fn report(&mut self, err: &StampwerkError) {
        tracing::warn!(error = %err, "operation failed");
        self.status_message = Some(humanize_error(err).status_line());
    }
}
