use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// Rejected before any bytes are read.
    #[error("Unsupported file type '{0}'. Allowed: xls, xlsx, xlsm, xlsb, ods, csv")]
    UnsupportedFormat(String),

    #[error("Could not read workbook: {0}")]
    Decode(String),

    #[error("No attendance records found")]
    NoRecords,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("attendance write rejected: {0}")]
    Rejected(String),
}
