// errors.rs
use std::fmt;
use thiserror::Error;

/// Fatal, driver-level errors. Any of these aborts the run before
/// a single record is processed.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Schema error: {0}")]
    Schema(String),
}

/// A present value that could not be coerced to the declared type of its
/// attribute, or that breaks a normalization rule.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid value for '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// What went wrong while writing to a given table.
#[derive(Debug, Error)]
pub enum StorageErrorKind {
    /// Uniqueness, foreign key, NOT NULL, CHECK. Carries the store's detail,
    /// e.g. "UNIQUE constraint failed: property.external_id".
    #[error("{0}")]
    Constraint(String),

    #[error(transparent)]
    Sql(rusqlite::Error),
}

/// Failure inside the per-record transaction. The fan-out has been rolled
/// back by the time the caller sees this.
#[derive(Debug, Error)]
#[error("storage error on '{table}': {kind}")]
pub struct StorageError {
    pub table: &'static str,
    #[source]
    pub kind: StorageErrorKind,
}

impl StorageError {
    pub fn new(table: &'static str, err: rusqlite::Error) -> Self {
        let constraint = match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Some(msg.clone().unwrap_or_else(|| "constraint violation".to_string()))
            }
            _ => None,
        };
        let kind = match constraint {
            Some(detail) => StorageErrorKind::Constraint(detail),
            None => StorageErrorKind::Sql(err),
        };
        Self { table, kind }
    }
}

/// A line of the record source that is not a JSON object.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that can sink a single record. The batch driver catches these,
/// counts them and moves on.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A panic raised while handling the record.
    #[error("unexpected fault: {0}")]
    Internal(String),
}

impl RecordError {
    /// Short stage label used in the per-row diagnostic line.
    pub fn stage(&self) -> Stage {
        match self {
            RecordError::Input(_) => Stage::Input,
            RecordError::Validation(_) => Stage::Validation,
            RecordError::Storage(_) => Stage::Storage,
            RecordError::Internal(_) => Stage::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Validation,
    Storage,
    Internal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Input => write!(f, "input"),
            Stage::Validation => write!(f, "validation"),
            Stage::Storage => write!(f, "storage"),
            Stage::Internal => write!(f, "internal"),
        }
    }
}
