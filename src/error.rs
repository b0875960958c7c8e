use thiserror::Error;

/// Failures of the reporting flow: authenticate, fetch, aggregate.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("authentication with Marketing Cloud failed: {0}")]
    Auth(String),

    #[error("could not fetch Data Extension rows: {0}")]
    Fetch(String),

    /// A row came back without one of the fields every record must carry.
    #[error("row {row} is missing required field `{field}`")]
    MissingField { row: usize, field: &'static str },

    #[error("row {row} has an unreadable value for `{field}`: {value}")]
    InvalidField {
        row: usize,
        field: &'static str,
        value: String,
    },
}

/// Failures of the ingestion flow: parse the upload, replace the table.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("the uploaded file has no header row")]
    EmptyUpload,

    #[error("line {line} has {found} fields but the header declares {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("invalid table name `{0}`")]
    InvalidTableName(String),

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
