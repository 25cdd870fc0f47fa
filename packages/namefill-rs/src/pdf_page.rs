//! Page geometry and text stamping on top of `lopdf`.
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use crate::error::{FillError, Result};
use crate::geometry::PageSize;
use crate::layout_fitter::DrawInstruction;
use crate::text_measure::{Helvetica, TextMeasure};

/// Resource name the stamped font is registered under.
const FONT_KEY: &str = "NfHelv";
/// Page tree depth past which inheritance lookups give up.
const MAX_TREE_DEPTH: usize = 32;

pub fn load_document(bytes: &[u8]) -> Result<Document> {
    Ok(Document::load_mem(bytes)?)
}

pub fn save_document(doc: &mut Document) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

pub fn page_count(doc: &Document) -> usize {
    doc.get_pages().len()
}

/// Object id of the zero-based `page_index`.
pub fn page_id(doc: &Document, page_index: usize) -> Result<ObjectId> {
    let number = u32::try_from(page_index + 1)
        .map_err(|_| FillError::NoInsertionPoint(format!("page {page_index} out of range")))?;
    doc.get_pages().get(&number).copied().ok_or_else(|| {
        FillError::NoInsertionPoint(format!(
            "page {} out of range ({} pages)",
            page_index,
            page_count(doc)
        ))
    })
}

/// Looks up a page attribute, following `Parent` links for inherited keys.
fn inherited_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        let dict = doc.get_object(id).and_then(|o| o.as_dict()).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            return None;
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }
    None
}

pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

pub(crate) fn obj_to_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f as f32),
        _ => None,
    }
}

/// Page width and height from its (possibly inherited) MediaBox.
pub fn page_size(doc: &Document, page_index: usize) -> Result<PageSize> {
    let id = page_id(doc, page_index)?;
    let media_box = inherited_attribute(doc, id, b"MediaBox")
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_array().ok())
        .ok_or_else(|| FillError::NoInsertionPoint(format!("page {page_index} has no MediaBox")))?;
    let coords: Vec<f32> = media_box
        .iter()
        .filter_map(|obj| resolve(doc, obj).and_then(obj_to_f32))
        .collect();
    if coords.len() != 4 {
        return Err(FillError::NoInsertionPoint(format!(
            "page {page_index} has a malformed MediaBox"
        )));
    }
    let size = PageSize {
        width: (coords[2] - coords[0]).abs(),
        height: (coords[3] - coords[1]).abs(),
    };
    if size.width <= 0.0 || size.height <= 0.0 {
        return Err(FillError::NoInsertionPoint(format!(
            "page {page_index} has an empty MediaBox"
        )));
    }
    Ok(size)
}

/// Sets `/Resources/<category>/<key>` on the page itself, copying inherited
/// resources down first.
fn register_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    key: &str,
    value: Object,
) -> Result<()> {
    let mut resources = match inherited_attribute(doc, page_id, b"Resources").and_then(|o| resolve(doc, o)) {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    let mut entries = match resources
        .get(category.as_bytes())
        .ok()
        .and_then(|o| resolve(doc, o))
    {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    entries.set(key, value);
    resources.set(category, entries);

    doc.get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())?
        .set("Resources", resources);
    Ok(())
}

/// Registers Helvetica under [`FONT_KEY`].
fn register_font(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(Helvetica.base_font().as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    });
    register_resource(doc, page_id, "Font", FONT_KEY, font_id.into())
}

/// Appends `operations` after the page's existing content. Existing streams
/// are wrapped in `q`/`Q` first so the new operations start from the default
/// graphics state.
fn append_isolated(doc: &mut Document, page_id: ObjectId, operations: Vec<Operation>) -> Result<()> {
    let existing = doc.get_page_contents(page_id);
    let mut contents: Vec<Object> = Vec::with_capacity(existing.len() + 2);
    let mut stamp = Vec::new();
    if !existing.is_empty() {
        let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        contents.push(open.into());
        contents.extend(existing.into_iter().map(Object::Reference));
        stamp.extend_from_slice(b"\nQ");
    }
    stamp.push(b'\n');
    stamp.extend(Content { operations }.encode()?);
    let stamp_id = doc.add_object(Stream::new(Dictionary::new(), stamp));
    contents.push(stamp_id.into());

    doc.get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())?
        .set("Contents", contents);
    Ok(())
}

/// Draws the instruction's text in black Helvetica on a page given by id.
pub(crate) fn draw_text_on(doc: &mut Document, page_id: ObjectId, instruction: &DrawInstruction) -> Result<()> {
    let encoded = Helvetica::encode(&instruction.text)?;
    register_font(doc, page_id)?;
    append_isolated(
        doc,
        page_id,
        vec![
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_KEY.into(), instruction.font_size.into()]),
            Operation::new("rg", vec![0.0f32.into(), 0.0f32.into(), 0.0f32.into()]),
            Operation::new("Td", vec![instruction.x.into(), instruction.y.into()]),
            Operation::new("Tj", vec![Object::String(encoded, StringFormat::Literal)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    )
}

/// Appends a content stream drawing the instruction's text in black Helvetica.
pub fn draw_text(doc: &mut Document, page_index: usize, instruction: &DrawInstruction) -> Result<()> {
    let id = page_id(doc, page_index)?;
    draw_text_on(doc, id, instruction)?;
    debug!(
        page = page_index,
        x = instruction.x,
        y = instruction.y,
        size = instruction.font_size,
        "drew text"
    );
    Ok(())
}

/// Paints a form XObject with its origin moved to `(x, y)`.
pub(crate) fn paint_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    xobject_id: ObjectId,
    key: &str,
    x: f32,
    y: f32,
) -> Result<()> {
    register_resource(doc, page_id, "XObject", key, xobject_id.into())?;
    append_isolated(
        doc,
        page_id,
        vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(1),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(1),
                    x.into(),
                    y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(key.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    )
}
