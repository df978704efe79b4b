// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Designer page: mounts a template preset built from the session, lists its
// fields, and generates the PDF. The designer is unmounted when the page goes
// away.

use dioxus::prelude::*;

use stampwerk_core::TemplatePreset;
use stampwerk_document::FieldSummary;

use crate::Route;
use crate::services::app_services::AppServices;
use crate::state::AppState;

#[component]
pub fn Designer(preset: String) -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let mut fields = use_signal(Vec::<FieldSummary>::new);
    let mut generating = use_signal(|| false);

    let selected = TemplatePreset::from_slug(&preset).unwrap_or_default();
    let rows = fields.read().clone();
    let field_count = rows.len();

    // Remount whenever the route's preset changes
    let mount_svc = svc.clone();
    use_effect(use_reactive((&selected,), move |(selected,)| {
        match mount_svc.mount_preset(selected) {
            Ok(()) => {
                tracing::info!(preset = selected.slug(), "designer mounted");
                fields.set(mount_svc.designer_fields());
            }
            Err(e) => {
                fields.set(Vec::new());
                state.write().report(&e);
            }
        }
    }));

    let drop_svc = svc.clone();
    use_drop(move || drop_svc.unmount_designer());

    rsx! {
        div {
            h1 { "Document" }

            div { style: "display: flex; gap: 8px; flex-wrap: wrap; margin: 12px 0;",
                for option in TemplatePreset::ALL {
                    {
                        let active = option == selected;
                        let border = if active { "2px solid #007aff" } else { "1px solid #ccc" };
                        let caption = option.label();
                        rsx! {
                            Link { to: Route::Designer { preset: option.slug().to_owned() },
                                style: "padding: 8px 12px; border-radius: 8px; border: {border}; text-decoration: none; color: #333; font-size: 14px;",
                                "{caption}"
                            }
                        }
                    }
                }
            }

            button {
                style: "padding: 8px 12px; border-radius: 8px; border: 1px solid #ccc; background: white; font-size: 14px;",
                onclick: {
                    let svc = svc.clone();
                    move |_| match svc.mount_preset(selected) {
                        Ok(()) => {
                            fields.set(svc.designer_fields());
                            state.write().status_message = Some("Template refreshed from the session.".into());
                        }
                        Err(e) => state.write().report(&e),
                    }
                },
                "Refresh from session"
            }

            h3 { "{field_count} fields" }
            for field in rows {
                {
                    let svc = svc.clone();
                    rsx! {
                        FieldRow { key: "{field.name}", field: field.clone(), on_change: move |_| fields.set(svc.designer_fields()) }
                    }
                }
            }

            button {
                style: "width: 100%; padding: 12px; border-radius: 8px; border: none; background: #34c759; color: white; font-size: 16px; margin-top: 16px;",
                disabled: *generating.read(),
                onclick: {
                    let svc = svc.clone();
                    move |_| {
                        let svc = svc.clone();
                        generating.set(true);
                        spawn(async move {
                            match svc.generate_document().await {
                                Ok(Some(receipt)) => {
                                    state.write().status_message = Some(format!(
                                        "Saved {} ({} KB)",
                                        receipt.location.display(),
                                        receipt.bytes / 1024
                                    ));
                                }
                                Ok(None) => {
                                    state.write().status_message = Some("Open a template first.".into());
                                }
                                Err(e) => state.write().report(&e),
                            }
                            generating.set(false);
                        });
                    }
                },
                if *generating.read() { "Generating..." } else { "Download PDF" }
            }

            if let Some(ref msg) = state.read().status_message {
                p { style: "margin-top: 8px; color: #666; font-size: 14px; text-align: center;", "{msg}" }
            }
        }
    }
}

/// One field of the mounted template. Text-like fields are editable; image
/// fields only report whether they hold a picture.
#[component]
fn FieldRow(field: FieldSummary, on_change: EventHandler<()>) -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let editable = field.kind != "image";
    let status = if field.has_content { "\u{2713}" } else { "empty" };
    let name = field.name.clone();

    rsx! {
        div { style: "display: flex; align-items: center; gap: 8px; padding: 8px 0; border-bottom: 1px solid #f0f0f0;",
            div { style: "flex: 1;",
                strong { "{field.name}" }
                span { style: "color: #888; font-size: 12px; margin-left: 8px;",
                    "{field.kind}, page {field.page}, {status}"
                }
            }
            if editable {
                input {
                    style: "flex: 1; padding: 6px; border: 1px solid #ccc; border-radius: 6px;",
                    placeholder: "override content",
                    onchange: move |evt| {
                        match svc.set_designer_field(&name, evt.value()) {
                            Ok(()) => on_change.call(()),
                            Err(e) => state.write().report(&e),
                        }
                    },
                }
            }
        }
    }
}
