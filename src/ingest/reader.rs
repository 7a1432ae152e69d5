// src/ingest/reader.rs

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use serde_json::{Map, Value};

use crate::errors::{EtlError, InputError};

/// Lazy, order-preserving reader over one-JSON-object-per-line input.
///
/// Yields `(line_number, record)` with 1-based line numbers. Blank lines are
/// skipped. A line that fails to parse is yielded as an error so the caller
/// can count it and carry on; an I/O error ends the iteration after being
/// reported once.
pub struct JsonLines<R> {
    lines: Lines<R>,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> JsonLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            done: false,
        }
    }
}

impl JsonLines<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, EtlError> {
        let file = File::open(path).map_err(|e| {
            EtlError::Config(format!("Failed to open input {}: {e}", path.display()))
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for JsonLines<R> {
    type Item = (usize, Result<Map<String, Value>, InputError>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.line_no += 1;
            match self.lines.next()? {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => return Some((self.line_no, parse_record(&line))),
                Err(e) => {
                    self.done = true;
                    return Some((self.line_no, Err(InputError::Io(e))));
                }
            }
        }
    }
}

pub fn parse_record(line: &str) -> Result<Map<String, Value>, InputError> {
    match serde_json::from_str::<Value>(line)? {
        Value::Object(map) => Ok(map),
        Value::Array(_) => Err(InputError::NotAnObject("an array")),
        Value::String(_) => Err(InputError::NotAnObject("a string")),
        Value::Number(_) => Err(InputError::NotAnObject("a number")),
        Value::Bool(_) => Err(InputError::NotAnObject("a boolean")),
        Value::Null => Err(InputError::NotAnObject("null")),
    }
}

/// Counts the records in a file (non-blank lines) to size the progress bar.
pub fn count_records(path: &Path) -> Result<u64, EtlError> {
    let file = File::open(path).map_err(|e| {
        EtlError::Config(format!("Failed to open input {}: {e}", path.display()))
    })?;

    let mut count = 0;
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| {
            EtlError::Config(format!("Failed to read input {}: {e}", path.display()))
        })?;
        if !line.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}
