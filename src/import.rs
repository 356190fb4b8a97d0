//! CSV → KeePass import pipeline
//!
//! An [`Importer`] owns the document for the whole run: it is loaded once
//! (bundled template or `--append` file), receives one entry per CSV row,
//! and is serialized once after the input ends.

use std::io::{Read, Write};

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::config::{ColumnSpec, ImportConfig};
use crate::error::Result;
use crate::keepass::{FieldRules, create_entry, ensure_group, root_container};
use crate::xml::{self, Document, NodePath};

/// Counters for one import run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    /// CSV records read (header row excluded)
    pub rows: usize,
    /// Entries appended to the document
    pub entries: usize,
    /// Rows without any non-empty mapped value
    pub skipped: usize,
    /// Groups created, including the target group
    pub groups_created: usize,
}

/// Builds KeePass entries from CSV rows into one document
#[derive(Debug)]
pub struct Importer {
    config: ImportConfig,
    rules: FieldRules,
    document: Document,
    target_group: NodePath,
    stats: ImportStats,
}

impl Importer {
    /// Load the configured document and resolve the target group
    pub fn new(config: ImportConfig) -> Result<Self> {
        let document = match &config.append {
            Some(path) => {
                info!("Reading XML document from {:?}", path);
                Document::load(path)?
            }
            None => {
                info!("Creating new XML document");
                Document::parse_str(crate::DEFAULT_TEMPLATE)?
            }
        };
        Self::with_document(config, document)
    }

    /// Use an already loaded document and resolve the target group in it
    pub fn with_document(config: ImportConfig, mut document: Document) -> Result<Self> {
        match &config.columns {
            ColumnSpec::Header => info!("Columns: taken from the CSV header row"),
            ColumnSpec::Named(columns) => {
                info!("Columns: {:?}", columns);
                warn_missing_entry_group(&config, columns);
            }
        }

        let root = root_container(&mut document)?;
        let (target_group, created) = ensure_group(&mut document, &config.group, &root)?;
        if !created {
            info!("Found group {:?}", config.group);
        }

        Ok(Self {
            config,
            rules: FieldRules::default(),
            document,
            target_group,
            stats: ImportStats {
                groups_created: usize::from(created),
                ..ImportStats::default()
            },
        })
    }

    /// Read every CSV record from `input` and add one entry per usable row
    pub fn import_csv<R: Read>(&mut self, input: R) -> Result<ImportStats> {
        let mut reader = self.config.csv_reader(input);

        let columns: Vec<String> = match &self.config.columns {
            ColumnSpec::Named(columns) => columns.clone(),
            ColumnSpec::Header => {
                let headers = reader.headers()?;
                debug!("CSV header: {:?}", headers);
                let columns: Vec<String> = headers.iter().map(str::to_string).collect();
                warn_missing_entry_group(&self.config, &columns);
                columns
            }
        };

        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            let row: Vec<(&str, &str)> = columns
                .iter()
                .map(String::as_str)
                .zip(record.iter())
                .collect();
            self.add_row(&row)?;
        }

        info!(
            "Imported {} entries from {} rows ({} skipped)",
            self.stats.entries, self.stats.rows, self.stats.skipped
        );
        Ok(self.stats)
    }

    /// Add one row of `(column, value)` pairs.
    ///
    /// Empty values are ignored; a row with nothing left is skipped and
    /// `false` is returned.
    pub fn add_row(&mut self, row: &[(&str, &str)]) -> Result<bool> {
        self.stats.rows += 1;

        let data: Vec<(&str, &str)> = row
            .iter()
            .copied()
            .filter(|(_, value)| !value.is_empty())
            .collect();
        if data.is_empty() {
            debug!("No column values for row #{}", self.stats.rows);
            self.stats.skipped += 1;
            return Ok(false);
        }

        let group = self.group_for(&data)?;
        let entry = create_entry(&self.rules.field_map(data.iter().copied()));
        self.document.append_child(&group, entry)?;
        self.stats.entries += 1;
        Ok(true)
    }

    /// Target group, or the entry-group sub-group named by the row
    fn group_for(&mut self, data: &[(&str, &str)]) -> Result<NodePath> {
        let Some(column) = self.config.entry_group.as_deref() else {
            return Ok(self.target_group.clone());
        };
        let Some((_, name)) = data.iter().find(|(c, _)| same_column(c, column)) else {
            return Ok(self.target_group.clone());
        };

        let (path, created) = ensure_group(&mut self.document, name, &self.target_group)?;
        if created {
            self.stats.groups_created += 1;
        }
        Ok(path)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn stats(&self) -> ImportStats {
        self.stats
    }

    /// Write the document as indented XML
    pub fn write_to<W: Write>(&self, w: W) -> Result<()> {
        xml::write_document(w, &self.document)
    }

    /// Consume the importer, returning the finished document
    pub fn finish(self) -> Document {
        self.document
    }
}

fn same_column(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Log once when the `--entry-group` column is not among `columns`.
/// Returns whether the column was found (always true without the option).
fn warn_missing_entry_group(config: &ImportConfig, columns: &[String]) -> bool {
    let Some(column) = config.entry_group.as_deref() else {
        return true;
    };
    let found = columns.iter().any(|c| same_column(c, column));
    if !found {
        warn!(
            "Entry group column {:?} is not among the columns, all entries go to {:?}",
            column, config.group
        );
    }
    found
}
