// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared session state: the uploaded base document, the current stamp
// image, its dimensions, and the stamp text fields.
//
// Read discipline: consumers always work on an explicit `SessionSnapshot`
// taken at call time. `subscribe()` only tells a UI surface *when* to take a
// new snapshot; nobody holds a live view into the store.
//
// Ordering discipline: stamp renders and direct writes to the image slot
// (uploads, dimension updates, `clear`) draw from one sequence. A render
// only lands if nothing newer has written the slot since its ticket was
// issued, so a slow render can never replace a newer stamp or upload.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::types::{EncodedAsset, ImageDimensions, RenderedStamp, StampField, StampFields};

/// Point-in-time copy of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub base_document: Option<EncodedAsset>,
    pub base_image: Option<EncodedAsset>,
    pub image_dimensions: ImageDimensions,
    pub stamp_fields: StampFields,
    /// Bumped on every write.
    pub revision: u64,
    /// Sequence number of the latest write to the image slot.
    pub image_slot_sequence: u64,
}

/// Proof that a render was started; newer tickets win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RenderTicket(u64);

impl RenderTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// Process-wide session store. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<SessionSnapshot>>,
    sequence: Arc<AtomicU64>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(StampFields::default())
    }
}

impl SessionStore {
    /// Empty session whose stamp fields start at `defaults`.
    pub fn new(defaults: StampFields) -> Self {
        let initial = SessionSnapshot {
            stamp_fields: defaults,
            ..SessionSnapshot::default()
        };
        let (tx, _rx) = watch::channel(initial);
        Self {
            state: Arc::new(tx),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    // -- Reads ----------------------------------------------------------------

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Change notifications. Call `borrow_and_update()` on the receiver or
    /// `snapshot()` on the store after each change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn base_document(&self) -> Option<EncodedAsset> {
        self.state.borrow().base_document.clone()
    }

    pub fn base_image(&self) -> Option<EncodedAsset> {
        self.state.borrow().base_image.clone()
    }

    pub fn image_dimensions(&self) -> ImageDimensions {
        self.state.borrow().image_dimensions
    }

    pub fn signer_name(&self) -> String {
        self.state.borrow().stamp_fields.signer_name.clone()
    }

    pub fn stamp_fields(&self) -> StampFields {
        self.state.borrow().stamp_fields.clone()
    }

    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    // -- Writes (synchronous, last write wins) --------------------------------

    pub fn set_base_document(&self, asset: EncodedAsset) {
        info!(bytes = asset.data_url.len(), "base document updated");
        self.write(|s| s.base_document = Some(asset));
    }

    /// Replace the image slot and its dimensions together.
    pub fn set_base_image(&self, asset: EncodedAsset) {
        let dims = asset.dimensions().unwrap_or_default();
        info!(width = dims.width, height = dims.height, "base image updated");
        self.write(|s| {
            s.image_dimensions = dims;
            s.base_image = Some(asset);
            s.image_slot_sequence = self.next_sequence();
        });
    }

    pub fn set_image_dimensions(&self, dimensions: ImageDimensions) {
        self.write(|s| {
            s.image_dimensions = dimensions;
            s.image_slot_sequence = self.next_sequence();
        });
    }

    pub fn set_signer_name(&self, name: impl Into<String>) {
        self.set_stamp_field(StampField::SignerName, name);
    }

    pub fn set_stamp_field(&self, field: StampField, value: impl Into<String>) {
        let value = value.into();
        debug!(field = ?field, "stamp field updated");
        self.write(|s| s.stamp_fields.set(field, value));
    }

    pub fn set_stamp_fields(&self, fields: StampFields) {
        self.write(|s| s.stamp_fields = fields);
    }

    /// Drop uploads and stamp output; stamp fields are kept.
    pub fn clear(&self) {
        info!("session cleared");
        self.write(|s| {
            s.image_slot_sequence = self.next_sequence();
            s.base_document = None;
            s.base_image = None;
            s.image_dimensions = ImageDimensions::default();
        });
    }

    // -- Stamp render ordering ------------------------------------------------

    /// Reserve a sequence number before starting a render.
    pub fn begin_render(&self) -> RenderTicket {
        RenderTicket(self.next_sequence())
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Store a finished render in the image slot unless the slot was written
    /// after `ticket` was issued. Returns whether the stamp was accepted.
    pub fn publish_stamp(&self, ticket: RenderTicket, stamp: &RenderedStamp) -> bool {
        let asset = stamp.to_asset();
        let dims = stamp.dimensions();
        let accepted = self.state.send_if_modified(|s| {
            if ticket.0 <= s.image_slot_sequence {
                return false;
            }
            s.image_slot_sequence = ticket.0;
            s.image_dimensions = dims;
            s.base_image = Some(asset);
            s.revision += 1;
            true
        });
        if accepted {
            info!(ticket = ticket.0, digest = %stamp.digest, "stamp published");
        } else {
            debug!(ticket = ticket.0, "stale stamp render discarded");
        }
        accepted
    }

    fn write(&self, apply: impl FnOnce(&mut SessionSnapshot)) {
        self.state.send_modify(|s| {
            apply(s);
            s.revision += 1;
        });
    }
}
