//! Field-name normalization and value merging
//!
//! CSV exports name their columns in many ways (`password`, `PASS`,
//! `login_username`, `Email (work)`). Column names are mapped onto KeePass
//! field names in three steps:
//!
//! 1. Exact alias table, keyed by the lowercase alphanumeric form of the name.
//! 2. If the name contains `word` or `user`, those substrings are stripped
//!    and the remaining stem is looked up in a second table.
//! 3. Otherwise words are split and title-cased, a parenthesized qualifier is
//!    appended as extra words, duplicates are dropped and `Name` is glued to
//!    the word before it (`user name` becomes `UserName`).

/// Entry title
pub const TITLE: &str = "Title";
/// Login name
pub const USER_NAME: &str = "UserName";
/// Password (always protected in memory)
pub const PASSWORD: &str = "Password";
/// Website address
pub const URL: &str = "URL";
/// Free-form notes
pub const NOTES: &str = "Notes";
/// Epoch seconds of entry creation; only used for `Times`
pub const CREATED_DATE: &str = "Created Date";
/// Epoch seconds of last modification; only used for `Times`
pub const MODIFIED_DATE: &str = "Modified Date";

/// Exact aliases, keyed by the lowercase alphanumeric form of a column name
pub const FIELD_ALIASES: &[(&str, &str)] = &[
    ("title", TITLE),
    ("name", TITLE),
    ("user", USER_NAME),
    ("username", USER_NAME),
    ("login", USER_NAME),
    ("loginname", USER_NAME),
    ("loginusername", USER_NAME),
    ("userid", USER_NAME),
    ("pass", PASSWORD),
    ("password", PASSWORD),
    ("passwd", PASSWORD),
    ("pwd", PASSWORD),
    ("loginpassword", PASSWORD),
    ("url", URL),
    ("uri", URL),
    ("website", URL),
    ("loginuri", URL),
    ("notes", NOTES),
    ("note", NOTES),
    ("comments", NOTES),
    ("comment", NOTES),
    ("created", CREATED_DATE),
    ("createddate", CREATED_DATE),
    ("creationtime", CREATED_DATE),
    ("modified", MODIFIED_DATE),
    ("modifieddate", MODIFIED_DATE),
    ("lastmodified", MODIFIED_DATE),
];

/// Aliases for what is left after stripping `word` and `user` from a name
pub const STEM_ALIASES: &[(&str, &str)] = &[
    ("", USER_NAME),
    ("name", USER_NAME),
    ("id", USER_NAME),
    ("login", USER_NAME),
    ("pass", PASSWORD),
];

/// Rule tables used to turn column names into KeePass field names
#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub aliases: &'static [(&'static str, &'static str)],
    pub stem_aliases: &'static [(&'static str, &'static str)],
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            aliases: FIELD_ALIASES,
            stem_aliases: STEM_ALIASES,
        }
    }
}

impl FieldRules {
    /// Map a column name onto its canonical KeePass field name.
    ///
    /// Normalizing a name this function produced returns it unchanged.
    pub fn normalize(&self, raw: &str) -> String {
        if let Some(canonical) = self.lookup(raw) {
            return canonical.to_string();
        }

        let generic = split_words(raw);
        match self.lookup(&generic) {
            Some(canonical) => canonical.to_string(),
            None => generic,
        }
    }

    /// Build a field map from `(column, value)` pairs
    ///
    /// Columns whose name normalizes to nothing are dropped.
    pub fn field_map<'a, I>(&self, pairs: I) -> FieldMap
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = FieldMap::new();
        for (column, value) in pairs {
            let name = self.normalize(column);
            if !name.is_empty() {
                map.push(&name, value);
            }
        }
        map
    }

    fn lookup(&self, name: &str) -> Option<&'static str> {
        let key = compact(name);
        if let Some((_, canonical)) = self.aliases.iter().find(|(k, _)| *k == key) {
            return Some(*canonical);
        }

        if key.contains("word") || key.contains("user") {
            let stem = key.replacen("word", "", 1).replacen("user", "", 1);
            return self
                .stem_aliases
                .iter()
                .find(|(k, _)| *k == stem)
                .map(|(_, canonical)| *canonical);
        }
        None
    }
}

/// Canonical field name → raw values, in first-seen order
///
/// Names are matched case-insensitively, so `Email` and `email` share a slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: Vec<(String, Vec<String>)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw value under an already-normalized field name
    pub fn push(&mut self, name: &str, value: &str) {
        match self
            .fields
            .iter_mut()
            .find(|(existing, _)| same_name(existing, name))
        {
            Some((_, values)) => values.push(value.to_string()),
            None => self.fields.push((name.to_string(), vec![value.to_string()])),
        }
    }

    /// Merged value of a field; `None` if missing or empty after cleanup
    pub fn value(&self, name: &str) -> Option<String> {
        self.raw_values(name)
            .map(merge_values)
            .filter(|v| !v.is_empty())
    }

    /// First non-empty cleaned value of a field
    pub fn first_value(&self, name: &str) -> Option<String> {
        self.raw_values(name)?
            .iter()
            .map(|v| clean_value(v))
            .find(|v| !v.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.raw_values(name).is_some()
    }

    /// Field names and their merged values, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, String)> {
        self.fields
            .iter()
            .map(|(name, values)| (name.as_str(), merge_values(values)))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn raw_values(&self, name: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(existing, _)| same_name(existing, name))
            .map(|(_, values)| values.as_slice())
    }
}

/// Case-insensitive field name comparison, Unicode-aware
fn same_name(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Strip `{(`/`)}` wrappers some exporters put around values, then trim
pub fn clean_value(raw: &str) -> String {
    let value = raw.strip_prefix("{(").unwrap_or(raw);
    let value = value.strip_suffix(")}").unwrap_or(value);
    value.trim().to_string()
}

/// Clean, drop empties, dedupe case-insensitively (first wins), join with newlines
pub fn merge_values(values: &[String]) -> String {
    let mut seen: Vec<String> = Vec::new();
    let mut merged: Vec<String> = Vec::new();

    for value in values.iter().map(|v| clean_value(v)) {
        if value.is_empty() {
            continue;
        }
        let key = value.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            merged.push(value);
        }
    }

    merged.join("\n")
}

/// Whether a field should carry `ProtectInMemory="True"`
pub fn is_protected(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("passw") || lower.ends_with("pass")
}

/// Date fields feed entry timestamps and are never written as strings
pub fn is_date_field(name: &str) -> bool {
    name.to_lowercase().ends_with("date")
}

fn compact(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn split_words(raw: &str) -> String {
    let (base, qualifier) = extract_qualifier(raw);

    let mut seen: Vec<String> = Vec::new();
    let mut words: Vec<String> = Vec::new();
    for word in tokens(&base).into_iter().chain(tokens(&qualifier)) {
        let word = capitalize(&word);
        let key = word.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            words.push(word);
        }
    }

    words.join(" ").replace(" Name", "Name")
}

/// Split off the first `(qualifier)` made of `[A-Za-z0-9_-]`
fn extract_qualifier(raw: &str) -> (String, String) {
    let mut search = 0;
    while let Some(open) = raw[search..].find('(').map(|i| i + search) {
        if let Some(close) = raw[open + 1..].find(')').map(|i| i + open + 1) {
            let inner = &raw[open + 1..close];
            if !inner.is_empty()
                && inner
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return (
                    format!("{} {}", &raw[..open], &raw[close + 1..]),
                    inner.to_string(),
                );
            }
        }
        search = open + 1;
    }
    (raw.to_string(), String::new())
}

fn tokens(s: &str) -> Vec<String> {
    break_before_name(s)
        .split(|c: char| c.is_whitespace() || c == '_' || c == '(' || c == ')')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// `username` → `user Name`, `NAME` → ` Name`
fn break_before_name(s: &str) -> String {
    let lower = s.to_ascii_lowercase();
    let mut out = String::with_capacity(s.len() + 8);
    let mut rest = 0;
    for (idx, _) in lower.match_indices("name") {
        out.push_str(&s[rest..idx]);
        out.push_str(" Name");
        rest = idx + "name".len();
    }
    out.push_str(&s[rest..]);
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
