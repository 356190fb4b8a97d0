//! Entry construction

use super::fields::{self, CREATED_DATE, FieldMap, MODIFIED_DATE, TITLE, URL};
use super::{ENTRY_TAG, text_element, times_element};
use crate::utils::{format_timestamp, generate_uuid, resolve_timestamp};
use crate::xml::Element;

/// Build an `Entry` element from a normalized field map
///
/// - `Title` defaults to the `URL` value when absent
/// - Empty fields and `*Date` fields are not written as `String`s
/// - Password-like fields get `ProtectInMemory="True"`
/// - `Created Date` / `Modified Date` (epoch seconds) drive `Times`,
///   falling back to the current time
pub fn create_entry(fields: &FieldMap) -> Element {
    let created = resolve_timestamp(fields.first_value(CREATED_DATE).as_deref());
    let modified = resolve_timestamp(fields.first_value(MODIFIED_DATE).as_deref());

    let mut entry = Element::new(ENTRY_TAG)
        .with_child(text_element("UUID", &generate_uuid()))
        .with_child(Element::new("Tags"))
        .with_child(times_element(
            &format_timestamp(&created),
            &format_timestamp(&modified),
        ));

    for (name, value) in fields.iter() {
        if value.is_empty() || fields::is_date_field(name) {
            continue;
        }
        entry.push_child(string_element(name, &value));
    }

    if fields.value(TITLE).is_none() {
        if let Some(url) = fields.value(URL) {
            entry.push_child(string_element(TITLE, &url));
        }
    }

    entry
        .with_child(
            Element::new("AutoType")
                .with_child(text_element("Enabled", "True"))
                .with_child(text_element("DataTransferObfuscation", "0")),
        )
        .with_child(Element::new("History"))
}

/// `<String><Key>..</Key><Value>..</Value></String>`
fn string_element(key: &str, value: &str) -> Element {
    let mut value_el = Element::new("Value");
    if fields::is_protected(key) {
        value_el = value_el.with_attribute("ProtectInMemory", "True");
    }

    Element::new("String")
        .with_child(text_element("Key", key))
        .with_child(value_el.with_text(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keepass::fields::FieldRules;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::collections::HashSet;

    fn strings(entry: &Element) -> HashMap<String, (String, bool)> {
        entry
            .child_elements()
            .filter(|el| el.name == "String")
            .map(|s| {
                let value = s.child("Value").unwrap();
                (
                    s.child("Key").unwrap().text(),
                    (value.text(), value.attribute("ProtectInMemory") == Some("True")),
                )
            })
            .collect()
    }

    fn entry_from(pairs: &[(&str, &str)]) -> Element {
        let map = FieldRules::default().field_map(pairs.iter().copied());
        create_entry(&map)
    }

    #[test]
    fn test_create_entry_basic_fields() {
        let entry = entry_from(&[("url", "https://example.com"), ("user", "alice"), ("pass", "secret123")]);
        let s = strings(&entry);

        assert_eq!(s["URL"], ("https://example.com".to_string(), false));
        assert_eq!(s["UserName"], ("alice".to_string(), false));
        assert_eq!(s["Password"], ("secret123".to_string(), true));
        assert_eq!(s["Title"], ("https://example.com".to_string(), false));
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn test_create_entry_layout() {
        let entry = entry_from(&[("title", "Mail")]);
        let names: Vec<&str> = entry.child_elements().map(|el| el.name.as_str()).collect();
        assert_eq!(names, ["UUID", "Tags", "Times", "String", "AutoType", "History"]);

        let auto_type = entry.child("AutoType").unwrap();
        assert_eq!(auto_type.child("Enabled").unwrap().text(), "True");
        assert_eq!(auto_type.child("DataTransferObfuscation").unwrap().text(), "0");
        assert!(entry.child("History").unwrap().children.is_empty());
    }

    #[test]
    fn test_explicit_title_wins() {
        let entry = entry_from(&[("name", "My Bank"), ("url", "https://bank.example")]);
        let s = strings(&entry);
        assert_eq!(s["Title"].0, "My Bank");
    }

    #[test]
    fn test_no_title_without_url() {
        let entry = entry_from(&[("user", "bob")]);
        assert!(!strings(&entry).contains_key("Title"));
    }

    #[test]
    fn test_dates_drive_times_and_are_not_emitted() {
        let entry = entry_from(&[
            ("title", "x"),
            ("created", "1500000000"),
            ("Modified Date", "1600000000"),
            ("Expiry Date", "2030-01-01"),
        ]);
        let s = strings(&entry);
        assert!(!s.keys().any(|k| k.ends_with("Date")));

        let times = entry.child("Times").unwrap();
        assert_eq!(times.child("CreationTime").unwrap().text(), "2017-07-14T02:40:00.000Z");
        assert_eq!(times.child("LastModificationTime").unwrap().text(), "2020-09-13T12:26:40.000Z");
        assert_eq!(times.child("LastAccessTime").unwrap().text(), "2020-09-13T12:26:40.000Z");
    }

    #[test]
    fn test_old_dates_replaced_with_now() {
        let before = Utc::now();
        let entry = entry_from(&[("title", "x"), ("created", "0")]);
        let after = Utc::now();

        let created = entry
            .child("Times")
            .unwrap()
            .child("CreationTime")
            .unwrap()
            .text();
        let created = chrono::DateTime::parse_from_rfc3339(&created).unwrap();
        // formatted with millisecond precision
        assert!(created.timestamp_millis() >= before.timestamp_millis());
        assert!(created.timestamp_millis() <= after.timestamp_millis());
    }

    #[test]
    fn test_merged_values() {
        let entry = entry_from(&[("notes", "first"), ("comment", "First"), ("note", "second")]);
        assert_eq!(strings(&entry)["Notes"].0, "first\nsecond");
    }

    #[test]
    fn test_empty_values_skipped() {
        let entry = entry_from(&[("title", "t"), ("notes", "  ")]);
        assert!(!strings(&entry).contains_key("Notes"));
    }

    #[test]
    fn test_entry_ids_unique() {
        let map = FieldRules::default().field_map([("title", "t")]);
        let ids: HashSet<String> = (0..1000)
            .map(|_| create_entry(&map).child("UUID").unwrap().text())
            .collect();
        assert_eq!(ids.len(), 1000);
    }
}
