// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stamp page: edit the signer fields, render the stamp card, download it or
// the bare QR code.

use dioxus::prelude::*;

use stampwerk_core::types::{RenderedStamp, StampField};
use stampwerk_document::{ExportReceipt, QrExportFormat, RasterFormat};

use crate::Route;
use crate::services::app_services::AppServices;
use crate::state::AppState;

#[component]
pub fn Stamp() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let mut preview = use_signal(|| Option::<RenderedStamp>::None);

    let fields = state.read().session.stamp_fields.clone();
    let rendering = state.read().rendering;

    rsx! {
        div {
            h1 { "Stamp" }

            for field in StampField::ALL {
                {
                    let value = fields.get(field).to_owned();
                    let caption = field.label();
                    let svc_input = svc.clone();
                    let svc_now = svc.clone();
                    rsx! {
                        div { style: "display: flex; flex-direction: column; padding: 8px 0;",
                            label { style: "font-size: 13px; color: #666; margin-bottom: 4px;", "{caption}" }
                            div { style: "display: flex; gap: 8px;",
                                input {
                                    style: "flex: 1; padding: 8px; border: 1px solid #ccc; border-radius: 6px;",
                                    value: "{value}",
                                    oninput: move |evt| svc_input.set_stamp_field(field, evt.value()),
                                }
                                if field == StampField::Timestamp {
                                    button {
                                        style: "padding: 8px 12px; border-radius: 6px; border: 1px solid #ccc; background: white;",
                                        onclick: move |_| svc_now.stamp_now(),
                                        "Now"
                                    }
                                }
                            }
                        }
                    }
                }
            }

            button {
                style: "width: 100%; padding: 12px; border-radius: 8px; border: none; background: #007aff; color: white; font-size: 16px; margin: 16px 0;",
                disabled: rendering,
                onclick: {
                    let svc = svc.clone();
                    move |_| {
                        let svc = svc.clone();
                        state.write().rendering = true;
                        spawn(async move {
                            match svc.generate_stamp().await {
                                Ok(stamp) => {
                                    state.write().status_message =
                                        Some(format!("Stamp ready ({} \u{00D7} {} px).", stamp.width, stamp.height));
                                    preview.set(Some(stamp));
                                }
                                Err(e) => state.write().report(&e),
                            }
                            state.write().rendering = false;
                        });
                    }
                },
                if rendering { "Rendering..." } else { "Generate stamp" }
            }

            if let Some(ref stamp) = *preview.read() {
                div { style: "padding: 12px; border: 1px solid #e0e0e0; border-radius: 8px; text-align: center; background: repeating-conic-gradient(#f4f4f4 0% 25%, white 0% 50%) 50% / 16px 16px;",
                    img { src: "{stamp.image_data_url}", style: "max-width: 100%;" }
                }
                p { style: "color: #888; font-size: 12px; word-break: break-all;", "SHA-256 {stamp.digest}" }
            }

            h3 { "Download" }
            div { style: "display: flex; gap: 8px; flex-wrap: wrap;",
                for format in RasterFormat::ALL {
                    DownloadButton {
                        label: format.extension(),
                        onclick: {
                            let svc = svc.clone();
                            move |_| finish_download(state, svc.download_stamp(format))
                        },
                    }
                }
                for (format, label) in [(QrExportFormat::Svg, "QR svg"), (QrExportFormat::Png, "QR png")] {
                    DownloadButton {
                        label: label,
                        onclick: {
                            let svc = svc.clone();
                            move |_| finish_download(state, svc.download_qr(format))
                        },
                    }
                }
            }

            Link { to: Route::Designer { preset: stampwerk_core::TemplatePreset::StampCard.slug().to_owned() },
                style: "display: block; text-align: center; margin-top: 16px; color: #007aff;",
                "Place on a document \u{2192}"
            }

            if let Some(ref msg) = state.read().status_message {
                p { style: "margin-top: 8px; color: #666; font-size: 14px; text-align: center;", "{msg}" }
            }
        }
    }
}

fn finish_download(mut state: Signal<AppState>, result: stampwerk_core::Result<ExportReceipt>) {
    match result {
        Ok(receipt) => {
            state.write().status_message = Some(format!("Saved {}", receipt.location.display()));
        }
        Err(e) => state.write().report(&e),
    }
}

#[component]
fn DownloadButton(label: &'static str, onclick: EventHandler<MouseEvent>) -> Element {
    rsx! {
        button {
            style: "padding: 8px 12px; border-radius: 8px; border: 1px solid #ccc; background: white; font-size: 14px;",
            onclick: move |evt| onclick.call(evt),
            "\u{2B07} {label}"
        }
    }
}
