// src/mapping/mapper.rs

use log::warn;
use serde_json::{Map, Value};

use crate::mapping::MappingTable;

/// A raw record split by the mapping table. Purely structural: values are
/// moved across untouched.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct MappedRecord {
    /// target_column -> raw value
    pub mapped: Map<String, Value>,
    /// raw field name (original casing) -> raw value, for fields with no rule
    pub residual: Map<String, Value>,
}

/// Splits `raw` into mapped and residual fields, preserving input order.
///
/// If two raw fields resolve to the same target column, the one that comes
/// later in the record wins. The collision is logged.
pub fn apply(raw: Map<String, Value>, table: &MappingTable) -> MappedRecord {
    let mut out = MappedRecord::default();

    for (key, value) in raw {
        match table.resolve(&key) {
            Some(rule) => {
                if out.mapped.contains_key(rule.target_column) {
                    warn!(
                        "Field '{key}' overwrites an earlier value for '{}'",
                        rule.target_column
                    );
                }
                out.mapped.insert(rule.target_column.to_string(), value);
            }
            None => {
                out.residual.insert(key, value);
            }
        }
    }

    out
}
