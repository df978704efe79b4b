// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stampwerk: core types, session state, and error definitions shared across all crates.

pub mod config;
pub mod data_url;
pub mod error;
pub mod human_errors;
pub mod integrity;
pub mod presets;
pub mod session;
pub mod template;
pub mod types;

pub use config::AppConfig;
pub use data_url::DataUrl;
pub use error::{Result, StampwerkError};
pub use presets::TemplatePreset;
pub use session::{RenderTicket, SessionSnapshot, SessionStore};
pub use template::{BasePdf, DocumentTemplate, FieldContent, FieldInputs, FieldSpec, Position};
pub use types::*;
