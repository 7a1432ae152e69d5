// src/ingest/batch.rs

use std::panic::{self, AssertUnwindSafe};

use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::db::Database;
use crate::domain::PropertyRecord;
use crate::errors::{InputError, RecordError, Stage};
use crate::mapping::{self, MappingTable};

/// One failed input record: where it was and why.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    pub line: usize,
    pub stage: Stage,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Stored { line: usize, property_id: i64 },
    Failed(RowFailure),
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    pub failures: Vec<RowFailure>,
}

/// Map -> validate -> write for a single record.
pub fn process_record(
    db: &mut Database,
    table: &MappingTable,
    raw: Map<String, Value>,
) -> Result<i64, RecordError> {
    let mapped = mapping::apply(raw, table);
    let record = PropertyRecord::build(mapped)?;
    let property_id = db.write_property(&record)?;
    Ok(property_id)
}

/// Runs `f`, turning a panic into a record-level fault.
///
/// Any transaction open when the panic unwinds is dropped uncommitted, so the
/// connection is left clean for the next record.
pub fn catch_fault<F>(f: F) -> Result<i64, RecordError>
where
    F: FnOnce() -> Result<i64, RecordError>,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string());
        Err(RecordError::Internal(message))
    })
}

/// Runs every record through the pipeline, in order, one at a time.
///
/// A record that fails at any stage is logged with its line number, counted
/// and skipped; it never stops the batch. `on_record` sees every outcome as
/// it happens.
pub fn run_batch<I, F>(
    db: &mut Database,
    table: &MappingTable,
    records: I,
    mut on_record: F,
) -> BatchSummary
where
    I: IntoIterator<Item = (usize, Result<Map<String, Value>, InputError>)>,
    F: FnMut(&RecordOutcome),
{
    let mut summary = BatchSummary::default();

    for (line, raw) in records {
        summary.total += 1;

        let result = raw
            .map_err(RecordError::from)
            .and_then(|raw| catch_fault(|| process_record(db, table, raw)));

        let outcome = match result {
            Ok(property_id) => {
                summary.processed += 1;
                debug!("Row {line}: stored as property {property_id}");
                RecordOutcome::Stored { line, property_id }
            }
            Err(e) => {
                summary.failed += 1;
                warn!("Failed to process row {line} ({}): {e}", e.stage());
                let failure = RowFailure {
                    line,
                    stage: e.stage(),
                    reason: e.to_string(),
                };
                summary.failures.push(failure.clone());
                RecordOutcome::Failed(failure)
            }
        };

        on_record(&outcome);
    }

    info!(
        "Batch finished: {} records, {} processed, {} failed",
        summary.total, summary.processed, summary.failed
    );
    summary
}
