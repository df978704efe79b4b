// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Home page: pick the base PDF and the image, see what the session holds.

use dioxus::prelude::*;

use stampwerk_core::types::AssetKind;

use crate::Route;
use crate::services::app_services::AppServices;
use crate::state::AppState;

#[component]
pub fn Home() -> Element {
    let state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();

    let snapshot = state.read().session.clone();
    let dims = snapshot.image_dimensions;
    let document_line = snapshot.base_document.as_ref().map(|doc| {
        let mime = doc.mime_type().unwrap_or("unknown type");
        format!("{mime}, {} KB encoded", doc.data_url.len() / 1024)
    });

    rsx! {
        div {
            h1 { "Stampwerk" }
            p { style: "color: #666;", "Pick a base document and a picture, then compose a stamp." }

            div { style: "display: grid; grid-template-columns: 1fr 1fr; gap: 12px; margin: 24px 0;",
                UploadButton { kind: AssetKind::Pdf, label: "Base PDF", icon: "\u{1F4C4}" }
                UploadButton { kind: AssetKind::Image, label: "Image", icon: "\u{1F5BC}" }
            }

            h2 { "Session" }
            div { style: "padding: 12px; border: 1px solid #e0e0e0; border-radius: 8px; margin: 8px 0;",
                strong { "Base document" }
                {
                    match document_line {
                        Some(line) => rsx! {
                            p { style: "color: #666; font-size: 14px; margin: 4px 0;", "{line}" }
                        },
                        None => rsx! {
                            p { style: "color: #888; font-size: 14px; margin: 4px 0;", "None: a blank page will be used." }
                        },
                    }
                }
            }

            div { style: "padding: 12px; border: 1px solid #e0e0e0; border-radius: 8px; margin: 8px 0;",
                strong { "Image" }
                {
                    match snapshot.base_image.as_ref().filter(|image| image.is_usable()) {
                        Some(image) => rsx! {
                            p { style: "color: #666; font-size: 14px; margin: 4px 0;",
                                "{dims.width} \u{00D7} {dims.height} px"
                            }
                            img {
                                src: "{image.data_url}",
                                style: "max-width: 100%; max-height: 240px; border: 1px solid #eee; border-radius: 4px;",
                            }
                        },
                        None => rsx! {
                            p { style: "color: #888; font-size: 14px; margin: 4px 0;", "No image yet." }
                        },
                    }
                }
            }

            div { style: "display: flex; gap: 8px; margin-top: 16px;",
                Link { to: Route::Stamp {},
                    style: "flex: 1; text-align: center; padding: 12px; border-radius: 8px; background: #007aff; color: white; text-decoration: none;",
                    "Compose stamp"
                }
                button {
                    style: "padding: 12px 16px; border-radius: 8px; border: 1px solid #ccc; background: white;",
                    onclick: {
                        let svc = svc.clone();
                        move |_| {
                            svc.session().clear();
                            tracing::info!("session cleared from home page");
                        }
                    },
                    "Clear"
                }
            }

            if let Some(ref msg) = state.read().status_message {
                p { style: "color: #ff9500; font-size: 14px; margin-top: 12px;", "{msg}" }
            }
        }
    }
}

#[component]
fn UploadButton(kind: AssetKind, label: &'static str, icon: &'static str) -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();

    rsx! {
        button {
            style: "display: flex; flex-direction: column; align-items: center; justify-content: center; padding: 24px 16px; border: 1px solid #e0e0e0; border-radius: 12px; color: #333; background: white;",
            onclick: move |_| {
                #[cfg(not(any(target_os = "ios", target_os = "android")))]
                {
                    let dialog = match kind {
                        AssetKind::Pdf => rfd::FileDialog::new().add_filter("PDF", &["pdf"]),
                        AssetKind::Image => rfd::FileDialog::new()
                            .add_filter("Images", &["png", "jpg", "jpeg", "webp", "gif", "bmp"]),
                    };
                    if let Some(path) = dialog.pick_file() {
                        match svc.upload(&path, kind) {
                            Ok(asset) => {
                                tracing::info!(file = %path.display(), kind = %kind, "file uploaded");
                                let detail = match asset.dimensions() {
                                    Some(d) => format!(" ({} \u{00D7} {})", d.width, d.height),
                                    None => String::new(),
                                };
                                state.write().status_message = Some(format!("{label} loaded{detail}."));
                            }
                            Err(e) => state.write().report(&e),
                        }
                    }
                }
                #[cfg(any(target_os = "ios", target_os = "android"))]
                {
                    state.write().status_message = Some("File picker not yet wired on mobile".into());
                }
            },
            span { style: "font-size: 32px; margin-bottom: 8px;", "{icon}" }
            span { style: "font-size: 14px;", "{label}" }
        }
    }
}
