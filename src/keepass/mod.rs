//! KeePass XML vocabulary
//!
//! Builds `Group` and `Entry` elements and resolves groups inside a
//! KeePass 2.x XML document.

pub mod entry;
pub mod fields;
pub mod group;

pub use entry::create_entry;
pub use fields::{FieldMap, FieldRules};
pub use group::{create_group, ensure_group, find_group_by_name, root_container};

use crate::xml::Element;

/// Element holding the group tree
pub const ROOT_TAG: &str = "Root";
/// Group element
pub const GROUP_TAG: &str = "Group";
/// Entry element
pub const ENTRY_TAG: &str = "Entry";
/// Child element carrying a group's display name
pub const NAME_TAG: &str = "Name";

/// Element with a single text child, e.g. `<IconID>49</IconID>`
pub(crate) fn text_element(name: &str, text: &str) -> Element {
    Element::new(name).with_text(text)
}

/// `<Times>` block shared by groups and entries
///
/// `LastAccessTime` mirrors the modification time.
pub(crate) fn times_element(created: &str, modified: &str) -> Element {
    Element::new("Times")
        .with_child(text_element("CreationTime", created))
        .with_child(text_element("LastModificationTime", modified))
        .with_child(text_element("LastAccessTime", modified))
        .with_child(text_element("Expires", "False"))
        .with_child(text_element("UsageCount", "0"))
}
