//! Low-level page plumbing: resources, fonts and content streams.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::PacketFormError;

/// Resource dictionaries nested deeper than this are treated as absent.
const MAX_INHERIT_DEPTH: usize = 32;

/// Add a standard-14 font object using WinAnsiEncoding.
pub(crate) fn add_standard_font(doc: &mut Document, base_font: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Where a page's resource dictionary lives.
enum ResourceSlot {
    /// An indirect object, possibly shared with other pages.
    Shared(ObjectId),
    /// Directly on the page dictionary.
    Inline,
}

fn load_resources(
    doc: &Document,
    page_id: ObjectId,
) -> Result<(ResourceSlot, Dictionary), PacketFormError> {
    let page = doc.get_dictionary(page_id)?;
    match page.get(b"Resources") {
        Ok(Object::Reference(id)) => Ok((ResourceSlot::Shared(*id), doc.get_dictionary(*id)?.clone())),
        Ok(Object::Dictionary(dict)) => Ok((ResourceSlot::Inline, dict.clone())),
        _ => Ok((
            ResourceSlot::Inline,
            inherited_resources(doc, page).unwrap_or_default(),
        )),
    }
}

/// Resources inherited from the page tree, copied so the page can own them.
fn inherited_resources(doc: &Document, page: &Dictionary) -> Option<Dictionary> {
    let mut node = page;
    for _ in 0..MAX_INHERIT_DEPTH {
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        let parent = doc.get_dictionary(parent_id).ok()?;
        match parent.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => return Some(dict.clone()),
            Ok(Object::Reference(id)) => return doc.get_dictionary(*id).ok().cloned(),
            _ => node = parent,
        }
    }
    None
}

fn store_resources(
    doc: &mut Document,
    page_id: ObjectId,
    slot: ResourceSlot,
    resources: Dictionary,
) -> Result<(), PacketFormError> {
    match slot {
        ResourceSlot::Shared(id) => {
            *doc.get_object_mut(id)? = Object::Dictionary(resources);
        }
        ResourceSlot::Inline => {
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Resources", Object::Dictionary(resources));
        }
    }
    Ok(())
}

/// Register `target` under a resource category (`Font`, `XObject`) of a
/// page and return the resource name to use in content streams.
///
/// An existing entry pointing at the same object is reused; otherwise the
/// first free `{prefix}{n}` name is taken.
pub(crate) fn register_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    prefix: &str,
    target: ObjectId,
) -> Result<String, PacketFormError> {
    let (slot, mut resources) = load_resources(doc, page_id)?;

    let mut entries = match resources.get(category.as_bytes()) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    };

    let existing = entries.iter().find_map(|(key, value)| match value {
        Object::Reference(id) if *id == target => Some(String::from_utf8_lossy(key).into_owned()),
        _ => None,
    });
    if let Some(name) = existing {
        return Ok(name);
    }

    let name = (0u32..)
        .map(|n| format!("{prefix}{n}"))
        .find(|candidate| !entries.has(candidate.as_bytes()))
        .unwrap_or_else(|| prefix.to_string());

    entries.set(name.clone(), Object::Reference(target));
    resources.set(category, Object::Dictionary(entries));
    store_resources(doc, page_id, slot, resources)?;
    Ok(name)
}

/// Append operations to a page, isolated from whatever graphics state the
/// existing content leaves behind.
///
/// Existing content is wrapped in `q … Q` and the new operations run in
/// their own `q … Q` block after it.
pub(crate) fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<(), PacketFormError> {
    let mut ops = Vec::with_capacity(operations.len() + 2);
    ops.push(Operation::new("q", vec![]));
    ops.extend(operations);
    ops.push(Operation::new("Q", vec![]));
    let encoded = Content { operations: ops }.encode()?;

    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(parts)) => parts.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(parts)) => parts.clone(),
        _ => Vec::new(),
    };

    let contents = if existing.is_empty() {
        let overlay_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
        Object::Reference(overlay_id)
    } else {
        let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let mut body = b"\nQ\n".to_vec();
        body.extend_from_slice(&encoded);
        let overlay_id = doc.add_object(Stream::new(Dictionary::new(), body));

        let mut parts = Vec::with_capacity(existing.len() + 2);
        parts.push(Object::Reference(open_id));
        parts.extend(existing);
        parts.push(Object::Reference(overlay_id));
        Object::Array(parts)
    };

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", contents);
    Ok(())
}

/// Page object ids in page order.
pub(crate) fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Read a four-number rectangle (`/Rect`, `/BBox`) normalized so the
/// lower-left corner comes first.
pub(crate) fn read_rect(dict: &Dictionary, key: &[u8]) -> Option<[f32; 4]> {
    let values = dict.get(key).and_then(Object::as_array).ok()?;
    if values.len() != 4 {
        return None;
    }
    let mut nums = [0.0f32; 4];
    for (slot, value) in nums.iter_mut().zip(values) {
        *slot = value.as_float().ok()?;
    }
    Some([
        nums[0].min(nums[2]),
        nums[1].min(nums[3]),
        nums[0].max(nums[2]),
        nums[1].max(nums[3]),
    ])
}
