// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Settings page: persistent app configuration.

use std::path::PathBuf;

use dioxus::prelude::*;

use stampwerk_core::config::{Color, DotShape};
use stampwerk_core::types::PaperSize;

use crate::services::app_services::AppServices;
use crate::state::AppState;

#[component]
pub fn Settings() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let mut save_msg = use_signal(|| Option::<String>::None);

    let config = state.read().config.clone();
    let font_path = config
        .stamp
        .font_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let dot_color = config.qr.dot_color.to_hex();
    let text_color = config.stamp.text_color.to_hex();
    let downloads = svc.downloads_dir().display().to_string();

    rsx! {
        div {
            h1 { "Settings" }

            section { style: "margin: 16px 0;",
                h3 { "Stamp" }
                NumberRow {
                    label: "Maximum width (px)",
                    value: config.stamp.max_width_px,
                    on_change: move |v: u32| { state.write().config.stamp.max_width_px = v; },
                }
                NumberRow {
                    label: "Height (px)",
                    value: config.stamp.height_px,
                    on_change: move |v: u32| { state.write().config.stamp.height_px = v; },
                }
                NumberRow {
                    label: "QR tile (px)",
                    value: config.stamp.qr_size_px,
                    on_change: move |v: u32| { state.write().config.stamp.qr_size_px = v; },
                }
                TextRow {
                    label: "Text colour",
                    value: text_color,
                    on_change: move |v: String| {
                        if let Ok(color) = Color::from_hex(&v) {
                            state.write().config.stamp.text_color = color;
                        }
                    },
                }
                TextRow {
                    label: "Font file (empty = built-in)",
                    value: font_path,
                    on_change: move |v: String| {
                        let v = v.trim().to_owned();
                        state.write().config.stamp.font_path = (!v.is_empty()).then(|| PathBuf::from(v));
                    },
                }
                SettingRow {
                    label: "Opaque background",
                    checked: config.stamp.opaque_background,
                    on_toggle: move |v: bool| { state.write().config.stamp.opaque_background = v; },
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "QR code" }
                TextRow {
                    label: "Dot colour",
                    value: dot_color,
                    on_change: move |v: String| {
                        if let Ok(color) = Color::from_hex(&v) {
                            state.write().config.qr.dot_color = color;
                        }
                    },
                }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Dot shape" }
                    select {
                        style: "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: dot_shape_label(config.qr.dot_shape),
                        onchange: move |evt| {
                            if let Some(shape) = dot_shape_from_label(&evt.value()) {
                                state.write().config.qr.dot_shape = shape;
                            }
                        },
                        option { value: "square", "Square" }
                        option { value: "dots", "Dots" }
                        option { value: "rounded", "Rounded" }
                    }
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Documents" }
                div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
                    span { "Blank page size" }
                    select {
                        style: "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: config.paper_size.label(),
                        onchange: move |evt| {
                            if let Some(ps) = PaperSize::from_label(&evt.value()) {
                                state.write().config.paper_size = ps;
                            }
                        },
                        option { value: "A4", "A4" }
                        option { value: "A3", "A3" }
                        option { value: "A5", "A5" }
                        option { value: "Letter", "Letter" }
                        option { value: "Legal", "Legal" }
                    }
                }
                TextRow {
                    label: "Timestamp format",
                    value: config.timestamp_format.clone(),
                    on_change: move |v: String| { state.write().config.timestamp_format = v; },
                }
                p { style: "color: #888; font-size: 12px;", "Downloads go to {downloads}" }
            }

            button {
                style: "width: 100%; padding: 12px; border-radius: 8px; border: none; background: #007aff; color: white; font-size: 16px; margin-top: 8px;",
                onclick: {
                    let svc = svc.clone();
                    move |_| {
                        let config = state.read().config.clone();
                        match svc.save_config(&config) {
                            Ok(()) => {
                                tracing::info!("settings saved");
                                save_msg.set(Some("Settings saved.".into()));
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "failed to save settings");
                                save_msg.set(Some(format!("Save failed: {e}")));
                            }
                        }
                    }
                },
                "Save Settings"
            }
            if let Some(ref msg) = *save_msg.read() {
                p { style: "color: #34c759; font-size: 14px; text-align: center; margin-top: 8px;",
                    "{msg}"
                }
            }

            section { style: "margin: 24px 0;",
                h3 { "About" }
                p { style: "color: #666; font-size: 14px;",
                    "Stampwerk v0.1.0"
                    br {}
                    "QR stamp cards for PDF documents"
                    br {}
                    "PMPL-1.0-or-later"
                }
            }
        }
    }
}

#[component]
fn SettingRow(label: &'static str, checked: bool, on_toggle: EventHandler<bool>) -> Element {
    rsx! {
        div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
            span { "{label}" }
            input {
                r#type: "checkbox",
                checked: checked,
                onchange: move |evt| {
                    on_toggle.call(evt.checked());
                },
            }
        }
    }
}

#[component]
fn NumberRow(label: &'static str, value: u32, on_change: EventHandler<u32>) -> Element {
    rsx! {
        div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
            span { "{label}" }
            input {
                r#type: "number",
                style: "width: 80px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px; text-align: right;",
                value: "{value}",
                onchange: move |evt| {
                    if let Ok(v) = evt.value().parse::<u32>()
                        && v > 0
                    {
                        on_change.call(v);
                    }
                },
            }
        }
    }
}

#[component]
fn TextRow(label: &'static str, value: String, on_change: EventHandler<String>) -> Element {
    rsx! {
        div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
            span { "{label}" }
            input {
                style: "width: 200px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                value: "{value}",
                onchange: move |evt| on_change.call(evt.value()),
            }
        }
    }
}

fn dot_shape_label(shape: DotShape) -> &'static str {
    match shape {
        DotShape::Square => "square",
        DotShape::Dots => "dots",
        DotShape::Rounded => "rounded",
    }
}

fn dot_shape_from_label(label: &str) -> Option<DotShape> {
    match label {
        "square" => Some(DotShape::Square),
        "dots" => Some(DotShape::Dots),
        "rounded" => Some(DotShape::Rounded),
        _ => None,
    }
}
