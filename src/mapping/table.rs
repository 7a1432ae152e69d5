// src/mapping/table.rs

//! The field-mapping table: raw input field name -> (table, column).
//!
//! # Source format
//!
//! A CSV file with (at least) three named columns, in any order:
//!
//! ```text
//! raw_field,target_table,target_column
//! Address,property,address_line1
//! Beds,property_detail,bedrooms
//! ```
//!
//! Headers and cells are trimmed. Header names match case-insensitively.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info, warn};

use crate::domain::schema::find_attribute;
use crate::errors::EtlError;

const RAW_FIELD: &str = "raw_field";
const TARGET_TABLE: &str = "target_table";
const TARGET_COLUMN: &str = "target_column";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRule {
    pub raw_field: String,
    pub target_table: &'static str,
    pub target_column: &'static str,
}

/// Immutable, loaded once per run.
///
/// Duplicate policy: when several rules share a raw field name (ignoring
/// case) the first one loaded wins; later ones are shadowed and reported
/// at load time.
#[derive(Debug, Default)]
pub struct MappingTable {
    rules: Vec<MappingRule>,
    index: HashMap<String, usize>,
}

impl MappingTable {
    pub fn load(path: &Path) -> Result<Self, EtlError> {
        let file = File::open(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to open mapping file {}: {e}",
                path.display()
            ))
        })?;
        let table = Self::from_reader(file)?;
        info!(
            "Loaded {} mapping rules from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, EtlError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| EtlError::Config(format!("Failed to read mapping headers: {e}")))?
            .clone();

        let position = |name: &str| -> Result<usize, EtlError> {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    EtlError::Config(format!("Mapping source is missing column '{name}'"))
                })
        };
        let raw_idx = position(RAW_FIELD)?;
        let table_idx = position(TARGET_TABLE)?;
        let column_idx = position(TARGET_COLUMN)?;

        let mut table = MappingTable::default();

        for result in reader.records() {
            let row = result
                .map_err(|e| EtlError::Config(format!("Malformed mapping row: {e}")))?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let cell = |idx: usize| row.get(idx).map(str::trim).unwrap_or("");

            let raw_field = cell(raw_idx);
            if raw_field.is_empty() {
                warn!("Mapping line {line}: empty raw_field, rule skipped");
                continue;
            }

            let column = cell(column_idx);
            let Some(attribute) = find_attribute(column) else {
                warn!(
                    "Mapping line {line}: '{raw_field}' targets unknown column '{column}', \
                     rule ignored; the field is kept in property_attribute"
                );
                continue;
            };

            let target_table = cell(table_idx);
            if !target_table.is_empty() && !target_table.eq_ignore_ascii_case(attribute.table) {
                return Err(EtlError::Config(format!(
                    "Mapping line {line}: column '{}' belongs to table '{}', not '{target_table}'",
                    attribute.column, attribute.table
                )));
            }

            table.push(MappingRule {
                raw_field: raw_field.to_string(),
                target_table: attribute.table,
                target_column: attribute.column,
            });
        }

        Ok(table)
    }

    fn push(&mut self, rule: MappingRule) {
        let key = rule.raw_field.to_lowercase();
        if let Some(&first) = self.index.get(&key) {
            warn!(
                "Mapping rule for '{}' shadowed by earlier rule for '{}' -> {}.{}",
                rule.raw_field,
                self.rules[first].raw_field,
                self.rules[first].target_table,
                self.rules[first].target_column,
            );
            return;
        }
        debug!(
            "Mapping '{}' -> {}.{}",
            rule.raw_field, rule.target_table, rule.target_column
        );
        self.index.insert(key, self.rules.len());
        self.rules.push(rule);
    }

    /// Case-insensitive exact match on the raw field name.
    pub fn resolve(&self, raw_field: &str) -> Option<&MappingRule> {
        self.index
            .get(&raw_field.to_lowercase())
            .map(|&i| &self.rules[i])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
