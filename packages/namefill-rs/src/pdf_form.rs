//! AcroForm fields: listing their names, filling a text field and
//! flattening the form into page content.
use std::collections::BTreeSet;

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::geometry::PageRect;
use crate::layout_fitter::{fit_text, DrawInstruction, FitLimits};
use crate::pdf_page::{draw_text_on, load_document, obj_to_f32, paint_xobject, resolve};
use crate::text_measure::Helvetica;

const MAX_FIELD_DEPTH: usize = 16;
/// Inset between a widget's border and a flattened value.
const WIDGET_PADDING: f32 = 2.0;

/// A terminal form field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    /// Fully qualified name, partial names joined by `.`.
    pub name: String,
    /// Current `/V`, empty when unset.
    pub value: String,
    #[serde(skip)]
    pub kind: Option<String>,
    #[serde(skip)]
    id: Option<ObjectId>,
}

/// Decodes a PDF text string: UTF-16BE with a byte order mark, or a
/// single-byte encoding otherwise.
fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

fn catalog_id(doc: &Document) -> Option<ObjectId> {
    doc.trailer.get(b"Root").and_then(|o| o.as_reference()).ok()
}

fn acroform<'a>(doc: &'a Document) -> Option<&'a Dictionary> {
    let catalog = doc.get_object(catalog_id(doc)?).and_then(|o| o.as_dict()).ok()?;
    match catalog.get(b"AcroForm").ok()? {
        Object::Reference(id) => doc.get_object(*id).and_then(|o| o.as_dict()).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn dict_of(doc: &Document, id: ObjectId) -> Option<&Dictionary> {
    doc.get_object(id).and_then(|o| o.as_dict()).ok()
}

fn text_of(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    let obj = match dict.get(key).ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// References held in an array entry, which may itself be indirect.
fn reference_array(doc: &Document, dict: &Dictionary, key: &[u8]) -> Vec<ObjectId> {
    dict.get(key)
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_array().ok())
        .map(|items| items.iter().filter_map(|i| i.as_reference().ok()).collect())
        .unwrap_or_default()
}

fn collect_fields(
    doc: &Document,
    entries: &[Object],
    prefix: Option<&str>,
    inherited_kind: Option<&str>,
    depth: usize,
    out: &mut Vec<FormField>,
) {
    if depth > MAX_FIELD_DEPTH {
        return;
    }
    for entry in entries {
        let (id, dict) = match entry {
            Object::Reference(id) => match dict_of(doc, *id) {
                Some(dict) => (Some(*id), dict),
                None => continue,
            },
            Object::Dictionary(dict) => (None, dict),
            _ => continue,
        };
        let Some(partial) = text_of(doc, dict, b"T") else {
            continue;
        };
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{partial}"),
            None => partial,
        };
        let kind = text_of(doc, dict, b"FT").or_else(|| inherited_kind.map(str::to_string));

        let kids: Vec<Object> = dict
            .get(b"Kids")
            .and_then(|k| k.as_array())
            .map(|k| k.to_vec())
            .unwrap_or_default();
        let before = out.len();
        collect_fields(doc, &kids, Some(&name), kind.as_deref(), depth + 1, out);
        if out.len() == before {
            out.push(FormField {
                value: text_of(doc, dict, b"V").unwrap_or_default(),
                name,
                kind,
                id,
            });
        }
    }
}

/// Names and values of every terminal AcroForm field, in document order.
pub fn form_fields(doc: &Document) -> Vec<FormField> {
    let Some(form) = acroform(doc) else {
        return Vec::new();
    };
    let roots: Vec<Object> = form
        .get(b"Fields")
        .and_then(|f| f.as_array())
        .map(|f| f.to_vec())
        .unwrap_or_default();
    let mut fields = Vec::new();
    collect_fields(doc, &roots, None, None, 0, &mut fields);
    debug!(count = fields.len(), "read form fields");
    fields
}

/// JSON shape of the field listing.
#[derive(Debug, Clone, Serialize)]
pub struct FieldListing {
    pub fields: Vec<FormField>,
}

/// Parses `bytes` and lists its form fields.
pub fn field_listing(bytes: &[u8]) -> Result<FieldListing> {
    let doc = load_document(bytes)?;
    Ok(FieldListing {
        fields: form_fields(&doc),
    })
}

pub fn field_names(doc: &Document) -> Vec<String> {
    form_fields(doc).into_iter().map(|f| f.name).collect()
}

/// Widget annotations of a terminal field: its untitled kids, or the field
/// itself when field and widget are merged.
fn widget_ids(doc: &Document, field: ObjectId) -> Vec<ObjectId> {
    let Some(dict) = dict_of(doc, field) else {
        return Vec::new();
    };
    let kids: Vec<ObjectId> = reference_array(doc, dict, b"Kids")
        .into_iter()
        .filter(|kid| dict_of(doc, *kid).is_some_and(|k| !k.has(b"T")))
        .collect();
    if kids.is_empty() {
        vec![field]
    } else {
        kids
    }
}

fn widget_page(doc: &Document, widget: ObjectId) -> Option<ObjectId> {
    let dict = dict_of(doc, widget)?;
    if let Ok(page) = dict.get(b"P").and_then(|p| p.as_reference()) {
        return Some(page);
    }
    doc.get_pages().into_values().find(|page| {
        dict_of(doc, *page).is_some_and(|p| reference_array(doc, p, b"Annots").contains(&widget))
    })
}

fn widget_rect(doc: &Document, widget: ObjectId) -> Option<PageRect> {
    let rect = resolve(doc, dict_of(doc, widget)?.get(b"Rect").ok()?)?;
    let v: Vec<f32> = rect
        .as_array()
        .ok()?
        .iter()
        .filter_map(|o| resolve(doc, o).and_then(obj_to_f32))
        .collect();
    if v.len() != 4 {
        return None;
    }
    Some(PageRect {
        x: v[0].min(v[2]),
        y: v[1].min(v[3]),
        width: (v[2] - v[0]).abs(),
        height: (v[3] - v[1]).abs(),
    })
}

/// Normal appearance stream of a widget, picking the `/AS` state when the
/// appearance is state dependent.
fn appearance_stream(doc: &Document, widget: ObjectId) -> Option<ObjectId> {
    let dict = dict_of(doc, widget)?;
    let appearances = resolve(doc, dict.get(b"AP").ok()?)?.as_dict().ok()?;
    let selected = |states: &Dictionary| {
        let state = dict.get(b"AS").and_then(|s| s.as_name()).ok()?;
        states.get(state).and_then(|s| s.as_reference()).ok()
    };
    match appearances.get(b"N").ok()? {
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Stream(_) => Some(*id),
            Object::Dictionary(states) => selected(states),
            _ => None,
        },
        Object::Dictionary(states) => selected(states),
        _ => None,
    }
}

fn mark_form_xobject(doc: &mut Document, stream: ObjectId) {
    if let Ok(Object::Stream(stream)) = doc.get_object_mut(stream) {
        stream.dict.set("Type", "XObject");
        stream.dict.set("Subtype", "Form");
    }
}

/// Placement of a value inside a widget: left-aligned, vertically centred,
/// shrunk to the widget width.
fn widget_instruction(value: &str, rect: PageRect, limits: &FitLimits) -> Result<DrawInstruction> {
    let start_size = limits
        .start_size
        .min(rect.height - 2.0 * WIDGET_PADDING)
        .max(limits.min_size);
    let inside = FitLimits {
        start_size,
        right_margin: WIDGET_PADDING,
        ..*limits
    };
    fit_text(
        rect.x + WIDGET_PADDING,
        rect.y + ((rect.height - start_size) / 2.0).max(0.0),
        value,
        rect.x + rect.width,
        &inside,
        &Helvetica,
    )
}

/// Drops widget references from every page's `/Annots`.
fn remove_annotations(doc: &mut Document, widgets: &BTreeSet<ObjectId>) -> Result<()> {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    for page in pages {
        let indirect = match dict_of(doc, page).map(|p| p.get(b"Annots")) {
            Some(Ok(Object::Reference(id))) => Some(*id),
            Some(Ok(Object::Array(_))) => None,
            _ => continue,
        };
        let annots = match indirect {
            Some(id) => doc.get_object_mut(id).and_then(|o| o.as_array_mut())?,
            None => doc
                .get_object_mut(page)
                .and_then(|o| o.as_dict_mut())
                .and_then(|p| p.get_mut(b"Annots"))
                .and_then(|a| a.as_array_mut())?,
        };
        annots.retain(|item| !matches!(item, Object::Reference(id) if widgets.contains(id)));
    }
    Ok(())
}

/// Turns every field into plain page content and removes the form.
///
/// The field named in `filled` gets its value drawn in Helvetica. Other
/// widgets keep their current normal appearance. Returns the number of
/// widgets removed.
pub fn flatten_form(
    doc: &mut Document,
    filled: Option<(ObjectId, &str)>,
    limits: &FitLimits,
) -> Result<usize> {
    let fields = form_fields(doc);
    let mut removed = BTreeSet::new();
    let mut painted = 0;

    for field in &fields {
        let Some(field_id) = field.id else {
            continue;
        };
        let value = filled.filter(|(id, _)| *id == field_id).map(|(_, v)| v);
        for widget in widget_ids(doc, field_id) {
            removed.insert(widget);
            let (Some(page), Some(rect)) = (widget_page(doc, widget), widget_rect(doc, widget)) else {
                debug!(field = %field.name, "widget has no page or rect, dropping it");
                continue;
            };
            match value {
                Some(value) => {
                    let instruction = widget_instruction(value, rect, limits)?;
                    draw_text_on(doc, page, &instruction)?;
                }
                None => {
                    if let Some(stream) = appearance_stream(doc, widget) {
                        painted += 1;
                        mark_form_xobject(doc, stream);
                        paint_xobject(doc, page, stream, &format!("NfAp{painted}"), rect.x, rect.y)?;
                    }
                }
            }
        }
    }

    remove_annotations(doc, &removed)?;
    if let Some(catalog) = catalog_id(doc) {
        doc.get_object_mut(catalog)
            .and_then(|o| o.as_dict_mut())?
            .remove(b"AcroForm");
    }
    doc.prune_objects();
    info!(
        fields = fields.len(),
        widgets = removed.len(),
        appearances = painted,
        "flattened form"
    );
    Ok(removed.len())
}

/// Writes `value` into the first text field whose name contains "name" and
/// flattens the form. Returns the filled field's name, or `None` without
/// touching the document when there is no such field.
pub fn fill_name_field(doc: &mut Document, value: &str, limits: &FitLimits) -> Result<Option<String>> {
    let target = form_fields(doc).into_iter().find(|f| {
        f.id.is_some()
            && f.kind.as_deref() == Some("Tx")
            && f.name.to_lowercase().contains("name")
    });
    let Some(FormField { name, id: Some(id), .. }) = target else {
        return Ok(None);
    };
    Helvetica::encode(value)?;

    flatten_form(doc, Some((id, value)), limits)?;
    info!(field = %name, "filled form field");
    Ok(Some(name))
}
