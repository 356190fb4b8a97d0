//! Import configuration
//!
//! Resolves command-line flag values into an immutable [`ImportConfig`]
//! that the rest of the pipeline reads from.

use std::io::Read;
use std::path::PathBuf;

use csv::{ReaderBuilder, Trim};

use crate::error::{ImportError, Result};

/// Where column names come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSpec {
    /// Take column names from the first CSV row
    Header,
    /// Positional column names (trimmed and lowercased)
    Named(Vec<String>),
}

impl ColumnSpec {
    /// Parse a `--columns` value; an empty value selects the header row
    ///
    /// Empty names between commas are kept so later columns keep their position.
    pub fn parse(value: &str) -> Self {
        if value.trim().is_empty() {
            return ColumnSpec::Header;
        }
        ColumnSpec::Named(
            value
                .split(',')
                .map(|column| column.trim().to_lowercase())
                .collect(),
        )
    }
}

/// Resolved settings for one import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub columns: ColumnSpec,
    /// Existing KeePass XML to extend; `None` uses the bundled template
    pub append: Option<PathBuf>,
    /// Display name of the group receiving entries
    pub group: String,
    /// Column whose value selects a sub-group of `group`
    pub entry_group: Option<String>,
}

impl ImportConfig {
    /// Config with default group and no append target or entry grouping
    pub fn new(columns: ColumnSpec) -> Self {
        Self {
            columns,
            append: None,
            group: crate::DEFAULT_GROUP_NAME.to_string(),
            entry_group: None,
        }
    }

    /// Resolve raw flag values.
    ///
    /// `columns` is `None` when `--columns` was not passed at all, which is
    /// the only configuration error. Empty `group` and `entry_group` values
    /// are treated as absent.
    pub fn from_flags(
        columns: Option<&str>,
        append: Option<PathBuf>,
        group: Option<&str>,
        entry_group: Option<&str>,
    ) -> Result<Self> {
        let columns = columns.map(ColumnSpec::parse).ok_or(ImportError::NoColumns)?;

        let mut config = Self::new(columns);
        config.append = append;
        if let Some(group) = group.map(str::trim).filter(|g| !g.is_empty()) {
            config.group = group.to_string();
        }
        config.entry_group = entry_group
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string);
        Ok(config)
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = group.to_string();
        self
    }

    pub fn with_entry_group(mut self, column: &str) -> Self {
        self.entry_group = Some(column.to_string());
        self
    }

    pub fn with_append(mut self, path: PathBuf) -> Self {
        self.append = Some(path);
        self
    }

    /// CSV reader with the relaxed dialect used for every import:
    /// ragged rows allowed, fields trimmed, backslash escapes
    pub fn csv_reader<R: Read>(&self, input: R) -> csv::Reader<R> {
        ReaderBuilder::new()
            .has_headers(self.columns == ColumnSpec::Header)
            .flexible(true)
            .trim(Trim::All)
            .escape(Some(b'\\'))
            .from_reader(input)
    }
}
