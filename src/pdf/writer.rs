//! Save-time application of redactions
//!
//! Burns each page's rectangles into the PDF as opaque black fills painted
//! after the existing page content, plus a matching Square annotation so the
//! regions stay identifiable in other tools. Also reads and writes the
//! `page -> rectangles` map as a JSON sidecar.

use std::fs;
use std::path::Path;

use log::{info, warn};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use super::error::{Result, ViewerError};
use super::redaction::{Redaction, RedactionMap};
use super::types::Rect;

fn save_error(e: impl std::fmt::Display) -> ViewerError {
    ViewerError::Save(e.to_string())
}

/// Apply every redaction to a PDF held in memory, returning the new file
pub fn apply_redactions(pdf_bytes: &[u8], redactions: &RedactionMap) -> Result<Vec<u8>> {
    if redactions.values().all(Vec::is_empty) {
        return Ok(pdf_bytes.to_vec());
    }

    let mut doc = Document::load_mem(pdf_bytes).map_err(|e| ViewerError::document(e.to_string()))?;
    let pages = doc.get_pages();

    for (page, list) in redactions {
        if list.is_empty() {
            continue;
        }
        // lopdf numbers pages from 1
        let Some(&page_id) = u32::try_from(*page + 1).ok().and_then(|n| pages.get(&n)) else {
            warn!("Skipping {} redactions for missing page {page}", list.len());
            continue;
        };
        let origin = media_box_origin(&doc, page_id);
        let rects: Vec<Rect> = list
            .iter()
            .map(|r| Rect::new(r.rect.x + origin.0, r.rect.y + origin.1, r.rect.width, r.rect.height))
            .collect();

        paint_over(&mut doc, page_id, &rects)?;
        for rect in &rects {
            add_redaction_annotation(&mut doc, page_id, rect)?;
        }
    }

    let mut output = Vec::new();
    doc.save_to(&mut output).map_err(save_error)?;
    Ok(output)
}

/// Apply redactions and write the result to `path`
pub fn save_redacted(pdf_bytes: &[u8], redactions: &RedactionMap, path: &Path) -> Result<()> {
    let bytes = apply_redactions(pdf_bytes, redactions)?;
    fs::write(path, bytes)?;
    let count: usize = redactions.values().map(Vec::len).sum();
    info!("Saved {} with {count} redactions", path.display());
    Ok(())
}

/// Write the redaction map as JSON
pub fn write_sidecar(redactions: &RedactionMap, path: &Path) -> Result<()> {
    let flat: Vec<&Redaction> = redactions.values().flatten().collect();
    let json = serde_json::to_string_pretty(&flat).map_err(save_error)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read redactions previously written by [`write_sidecar`]
pub fn read_sidecar(path: &Path) -> Result<Vec<Redaction>> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| ViewerError::document(e.to_string()))
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Lower-left corner of the page's own MediaBox; (0, 0) if absent or inherited
fn media_box_origin(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let Ok(Object::Dictionary(page)) = doc.get_object(page_id) else {
        return (0.0, 0.0);
    };
    match page.get(b"MediaBox") {
        Ok(Object::Array(values)) if values.len() == 4 => (
            number(&values[0]).unwrap_or(0.0),
            number(&values[1]).unwrap_or(0.0),
        ),
        _ => (0.0, 0.0),
    }
}

/// Wrap the page content in `q`/`Q` and append black fills after it
fn paint_over(doc: &mut Document, page_id: ObjectId, rects: &[Rect]) -> Result<()> {
    let mut fill = String::from("Q q 0 g\n");
    for r in rects {
        fill.push_str(&format!("{} {} {} {} re f\n", r.x, r.y, r.width, r.height));
    }
    fill.push_str("Q\n");

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let fill_id = doc.add_object(Stream::new(Dictionary::new(), fill.into_bytes()));

    let page = doc.get_object_mut(page_id).map_err(save_error)?;
    let Object::Dictionary(page_dict) = page else {
        return Err(save_error(format!("page object {page_id:?} is not a dictionary")));
    };

    let mut contents = vec![Object::Reference(open_id)];
    match page_dict.get(b"Contents") {
        Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
        Ok(existing @ Object::Reference(_)) => contents.push(existing.clone()),
        _ => {}
    }
    contents.push(Object::Reference(fill_id));
    page_dict.set("Contents", Object::Array(contents));
    Ok(())
}

fn add_redaction_annotation(doc: &mut Document, page_id: ObjectId, rect: &Rect) -> Result<()> {
    let black = || Object::Array(vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)]);
    let annot = dictionary! {
        "Type" => Object::Name(b"Annot".to_vec()),
        "Subtype" => Object::Name(b"Square".to_vec()),
        "Rect" => Object::Array(vec![
            Object::Real(rect.x),
            Object::Real(rect.y),
            Object::Real(rect.max_x()),
            Object::Real(rect.max_y()),
        ]),
        "IC" => black(),
        "C" => black(),
        "Contents" => Object::String(b"Redacted".to_vec(), lopdf::StringFormat::Literal),
    };
    let annot_id = doc.add_object(Object::Dictionary(annot));

    let page = doc.get_object_mut(page_id).map_err(save_error)?;
    if let Object::Dictionary(page_dict) = page {
        if let Ok(Object::Array(arr)) = page_dict.get_mut(b"Annots") {
            arr.push(Object::Reference(annot_id));
        } else {
            page_dict.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
        }
    }
    Ok(())
}
