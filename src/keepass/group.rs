//! Group lookup and creation

use tracing::{debug, info};

use super::{GROUP_TAG, NAME_TAG, ROOT_TAG, text_element, times_element};
use crate::error::Result;
use crate::utils::generate_uuid;
use crate::xml::{Document, Element, NodePath};

/// Icon assigned to created groups (KeePass "folder" icon set)
pub const GROUP_ICON_ID: &str = "49";

/// Timestamp written into every created group's `Times`.
///
/// Groups never get computed times; this literal is kept for output
/// compatibility with earlier exports.
pub const GROUP_TIMESTAMP: &str = "2017-12-20T18:25:28.372Z";

/// Empty KeePass UUID used for `LastTopVisibleEntry`
pub const EMPTY_UUID: &str = "AAAAAAAAAAAAAAAAAAAAAA==";

/// Find the first group (document order) whose `Name` child equals `name`
///
/// An empty name never matches.
pub fn find_group_by_name(doc: &Document, name: &str) -> Option<NodePath> {
    if name.is_empty() {
        return None;
    }
    doc.find_element(|el| {
        el.name == GROUP_TAG && el.child(NAME_TAG).is_some_and(|n| n.text() == name)
    })
}

/// Build a new, empty group element
pub fn create_group(name: &str) -> Element {
    Element::new(GROUP_TAG)
        .with_child(text_element("UUID", &generate_uuid()))
        .with_child(text_element(NAME_TAG, name))
        .with_child(Element::new("Notes"))
        .with_child(text_element("IconID", GROUP_ICON_ID))
        .with_child(times_element(GROUP_TIMESTAMP, GROUP_TIMESTAMP))
        .with_child(text_element("IsExpanded", "False"))
        .with_child(Element::new("DefaultAutoTypeSequence"))
        .with_child(text_element("EnableAutoType", "null"))
        .with_child(text_element("EnableSearching", "null"))
        .with_child(text_element("LastTopVisibleEntry", EMPTY_UUID))
}

/// Path of the `Root` element, appending one to the document element if absent
pub fn root_container(doc: &mut Document) -> Result<NodePath> {
    if let Some(path) = doc.find_element(|el| el.name == ROOT_TAG) {
        return Ok(path);
    }
    debug!("document has no <{}>, adding one", ROOT_TAG);
    doc.append_child(&[], Element::new(ROOT_TAG))
}

/// Find a group by name anywhere in the document, or create it under `parent`
///
/// Returns the group's path and whether it was created.
pub fn ensure_group(doc: &mut Document, name: &str, parent: &[usize]) -> Result<(NodePath, bool)> {
    if let Some(path) = find_group_by_name(doc, name) {
        debug!("found group {:?}", name);
        return Ok((path, false));
    }

    info!("no group found for {:?}, creating it", name);
    let path = doc.append_child(parent, create_group(name))?;
    Ok((path, true))
}
