// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: load base documents, inspect page boxes, and merge filled
// records into one file using the `lopdf` crate.

use std::collections::HashMap;

use lopdf::{Document, Object, ObjectId};
use stampwerk_core::error::StampwerkError;
use tracing::{debug, info, instrument, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Fallback page box (A4 in points) when a page declares none.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 595.28, 841.89];

/// Reads existing PDF files and combines them.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, StampwerkError> {
        let document = Document::load_mem(data).map_err(|err| {
            StampwerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    pub fn from_document(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Object id of a 1-based page.
    pub fn page_id(&self, page_number: u32) -> Result<ObjectId, StampwerkError> {
        let pages = self.document.get_pages();
        pages.get(&page_number).copied().ok_or_else(|| {
            StampwerkError::Template(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })
    }

    /// `[llx, lly, urx, ury]` of a page in points, following inheritance.
    pub fn media_box(&self, page_id: ObjectId) -> [f32; 4] {
        media_box(&self.document, page_id)
    }

    // -- Combination ----------------------------------------------------------

    /// Merge this document with one or more other PDF byte-slices, producing a
    /// combined PDF. Pages appear in the order: self, then each supplied
    /// document in order.
    #[instrument(skip_all, fields(additional_count = others.len()))]
    pub fn merge(&self, others: &[&[u8]]) -> Result<Vec<u8>, StampwerkError> {
        info!(
            base_pages = self.page_count(),
            additional_documents = others.len(),
            "Merging PDFs"
        );

        let mut merged = self.document.clone();

        for (index, other_bytes) in others.iter().enumerate() {
            let other_doc = Document::load_mem(other_bytes).map_err(|err| {
                StampwerkError::PdfError(format!("failed to load additional PDF #{}: {}", index + 1, err))
            })?;

            // Page ids are reserved up front so references between pages
            // (annotation /P, link destinations) land on the cloned pages.
            let mut cloned = CloneMap::new();
            // get_pages() is a BTreeMap keyed by page number, so this is page order.
            let page_ids: Vec<ObjectId> = other_doc.get_pages().into_values().collect();
            for &page_id in &page_ids {
                cloned.insert(page_id, merged.new_object_id());
            }
            for page_id in page_ids {
                clone_page_into(&other_doc, &mut merged, page_id, &mut cloned)?;
            }
        }

        let mut output = Vec::new();
        merged
            .save_to(&mut output)
            .map_err(|err| StampwerkError::PdfError(format!("failed to serialise merged PDF: {}", err)))?;

        debug!(output_bytes = output.len(), "Merge complete");
        Ok(output)
    }
}

/// Resolve an inheritable page attribute by walking up the page tree.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = Some(page_id);
    // Bounded walk: malformed trees can contain /Parent cycles.
    for _ in 0..64 {
        let dict = doc.get_dictionary(current?).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let resolved = inherited_attribute(doc, page_id, b"MediaBox").and_then(|obj| match obj {
        Object::Reference(id) => doc.get_object(id).ok().cloned(),
        other => Some(other),
    });
    let parsed = resolved.as_ref().and_then(|obj| {
        let arr = obj.as_array().ok()?;
        if arr.len() != 4 {
            return None;
        }
        let mut out = [0.0f32; 4];
        for (slot, value) in out.iter_mut().zip(arr) {
            *slot = number(value)?;
        }
        Some(out)
    });
    parsed.unwrap_or_else(|| {
        warn!(?page_id, "page has no usable MediaBox, assuming A4");
        DEFAULT_MEDIA_BOX
    })
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f),
        _ => None,
    }
}

/// Clone a single page object (and its referenced resources) from `source` into
/// `target`, appending it as the last page.
///
/// Stream data, fonts, and images referenced by the page dictionary are copied
/// as new objects in the target document. Inherited attributes are copied onto
/// the clone because its new parent does not carry them.
/// Source object id -> id of its copy in the target document.
type CloneMap = HashMap<ObjectId, ObjectId>;

fn clone_page_into(
    source: &Document,
    target: &mut Document,
    page_id: ObjectId,
    cloned: &mut CloneMap,
) -> Result<(), StampwerkError> {
    let mut page_object = source
        .get_object(page_id)
        .map_err(|err| StampwerkError::PdfError(format!("cannot read page object {:?}: {}", page_id, err)))?
        .clone();

    if let Object::Dictionary(dict) = &mut page_object {
        for key in INHERITABLE {
            if !dict.has(key)
                && let Some(value) = inherited_attribute(source, page_id, key)
            {
                dict.set(key.to_vec(), value);
            }
        }
    }

    let cloned_id = match cloned.get(&page_id) {
        Some(id) => *id,
        None => {
            let id = target.new_object_id();
            cloned.insert(page_id, id);
            id
        }
    };
    let cloned_object = deep_clone_object(source, target, &page_object, cloned)?;
    target.objects.insert(cloned_id, cloned_object);

    // Retrieve the document's page tree root (/Pages) and append the new page.
    let pages_id = target
        .catalog()
        .map_err(|err| StampwerkError::PdfError(format!("no catalog: {}", err)))
        .and_then(|catalog| {
            catalog
                .get(b"Pages")
                .map_err(|err| StampwerkError::PdfError(format!("no /Pages: {}", err)))
                .and_then(|pages_ref| match pages_ref {
                    Object::Reference(id) => Ok(*id),
                    _ => Err(StampwerkError::PdfError("/Pages is not a reference".to_string())),
                })
        })?;

    if let Ok(Object::Dictionary(pages_dict)) = target.get_object_mut(pages_id) {
        if let Ok(Object::Array(kids)) = pages_dict.get_mut(b"Kids") {
            kids.push(Object::Reference(cloned_id));
        }
        if let Ok(count_obj) = pages_dict.get_mut(b"Count")
            && let Object::Integer(count) = count_obj
        {
            *count += 1;
        }
    }

    if let Ok(Object::Dictionary(page_dict)) = target.get_object_mut(cloned_id) {
        page_dict.set("Parent", Object::Reference(pages_id));
    }

    Ok(())
}

/// Deep-clone a single lopdf Object, resolving references through `cloned`
/// (except /Parent, which the caller patches).
///
/// Every referenced object is copied once: its target id is reserved before
/// recursing, so reference cycles terminate and shared fonts or images are not
/// duplicated.
fn deep_clone_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    cloned: &mut CloneMap,
) -> Result<Object, StampwerkError> {
    match object {
        Object::Dictionary(dict) => Ok(Object::Dictionary(clone_dictionary(source, target, dict, cloned)?)),
        Object::Array(arr) => {
            let mut new_arr = Vec::with_capacity(arr.len());
            for item in arr {
                new_arr.push(deep_clone_object(source, target, item, cloned)?);
            }
            Ok(Object::Array(new_arr))
        }
        Object::Reference(ref_id) => {
            if let Some(new_id) = cloned.get(ref_id) {
                return Ok(Object::Reference(*new_id));
            }
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    let new_id = target.new_object_id();
                    cloned.insert(*ref_id, new_id);
                    let copy = deep_clone_object(source, target, referenced, cloned)?;
                    target.objects.insert(new_id, copy);
                    Ok(Object::Reference(new_id))
                }
                Err(err) => {
                    warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                    Ok(Object::Null)
                }
            }
        }
        Object::Stream(stream) => {
            let new_dict = clone_dictionary(source, target, &stream.dict, cloned)?;
            Ok(Object::Stream(lopdf::Stream::new(new_dict, stream.content.clone())))
        }
        other => Ok(other.clone()),
    }
}

fn clone_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &lopdf::Dictionary,
    cloned: &mut CloneMap,
) -> Result<lopdf::Dictionary, StampwerkError> {
    let mut new_dict = lopdf::Dictionary::new();
    for (key, value) in dict.iter() {
        if key == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), deep_clone_object(source, target, value, cloned)?);
    }
    Ok(new_dict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::PdfWriter;
    use lopdf::dictionary;
    use stampwerk_core::types::PaperSize;

    #[test]
    fn blank_page_has_paper_media_box() {
        let bytes = PdfWriter::new(PaperSize::A4).blank().unwrap();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 1);
        let [llx, lly, urx, ury] = reader.media_box(reader.page_id(1).unwrap());
        assert!((urx - llx - 595.3).abs() < 1.0, "{urx}");
        assert!((ury - lly - 841.9).abs() < 1.0, "{ury}");
    }

    #[test]
    fn page_out_of_range_is_reported() {
        let bytes = PdfWriter::new(PaperSize::A5).blank().unwrap();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert!(matches!(reader.page_id(2), Err(StampwerkError::Template(_))));
    }

    #[test]
    fn merge_appends_pages() {
        let a = PdfWriter::new(PaperSize::A4).blank().unwrap();
        let b = PdfWriter::new(PaperSize::Letter).blank().unwrap();
        let merged = PdfReader::from_bytes(&a).unwrap().merge(&[&b, &b]).unwrap();
        let reader = PdfReader::from_bytes(&merged).unwrap();
        assert_eq!(reader.page_count(), 3);
        let letter = reader.media_box(reader.page_id(3).unwrap());
        assert!((letter[2] - letter[0] - 612.3).abs() < 1.0);
    }

    /// Blank A4 page whose link annotation points back at the page via /P.
    fn annotated_page() -> Vec<u8> {
        let bytes = PdfWriter::new(PaperSize::A4).blank().unwrap();
        let mut doc = Document::load_mem(&bytes).unwrap();
        let page_id = doc.page_iter().next().unwrap();
        let annot_id = doc.add_object(lopdf::dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Integer(10), Object::Integer(10)]),
            "P" => Object::Reference(page_id),
        });
        doc.get_dictionary_mut(page_id)
            .unwrap()
            .set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn merge_survives_annotation_back_references() {
        let annotated = annotated_page();
        let merged = PdfReader::from_bytes(&annotated)
            .unwrap()
            .merge(&[&annotated, &annotated])
            .unwrap();
        let reader = PdfReader::from_bytes(&merged).unwrap();
        assert_eq!(reader.page_count(), 3);

        // The cloned annotation's /P points at the cloned page, not the original.
        let doc = reader.document();
        let third = reader.page_id(3).unwrap();
        let annots = doc.get_dictionary(third).unwrap().get(b"Annots").unwrap().as_array().unwrap();
        let annot_id = annots[0].as_reference().unwrap();
        let back = doc.get_dictionary(annot_id).unwrap().get(b"P").unwrap().as_reference().unwrap();
        assert_eq!(back, third);
    }

    #[test]
    fn shared_objects_are_cloned_once() {
        let bytes = PdfWriter::new(PaperSize::A4).blank().unwrap();
        let mut doc = Document::load_mem(&bytes).unwrap();
        let page_id = doc.page_iter().next().unwrap();
        let shared = doc.add_object(lopdf::dictionary! { "Type" => "Annot", "Subtype" => "Text" });
        doc.get_dictionary_mut(page_id).unwrap().set(
            "Annots",
            Object::Array(vec![Object::Reference(shared), Object::Reference(shared)]),
        );
        let mut source = Vec::new();
        doc.save_to(&mut source).unwrap();

        let merged = PdfReader::from_bytes(&bytes).unwrap().merge(&[&source]).unwrap();
        let reader = PdfReader::from_bytes(&merged).unwrap();
        let page = reader.page_id(2).unwrap();
        let annots = reader
            .document()
            .get_dictionary(page)
            .unwrap()
            .get(b"Annots")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(annots[0], annots[1]);
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        assert!(matches!(
            PdfReader::from_bytes(b"%PDF-not really"),
            Err(StampwerkError::PdfError(_))
        ));
    }
}
