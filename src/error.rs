//! Error taxonomy shared by the ledger, catalog, wishlist and profile services

/// Stable, machine-readable classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidOperation,
    Conflict,
    Forbidden,
    Unauthenticated,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidOperation => "invalid_operation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Internal => "internal",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidOperation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Failures of the underlying store. Never reported to callers as a domain error.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(String),
    #[error("failed to decode record: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("unsupported record schema version {found}, expected {expected}")]
    SchemaVersion { found: u16, expected: u16 },
    #[error("index entry {0} points at a missing record")]
    DanglingIndex(String),
    #[error("failed to generate identifier: {0}")]
    IdGeneration(String),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::NotFound(_) => ErrorKind::NotFound,
            LedgerError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            LedgerError::Conflict(_) => ErrorKind::Conflict,
            LedgerError::Forbidden(_) => ErrorKind::Forbidden,
            LedgerError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            LedgerError::Storage(_) => ErrorKind::Internal,
        }
    }
}

impl From<sled::Error> for LedgerError {
    fn from(value: sled::Error) -> Self {
        LedgerError::Storage(StorageError::Database(value))
    }
}

impl From<sled::transaction::TransactionError<LedgerError>> for LedgerError {
    fn from(value: sled::transaction::TransactionError<LedgerError>) -> Self {
        match value {
            sled::transaction::TransactionError::Abort(err) => err,
            sled::transaction::TransactionError::Storage(err) => err.into(),
        }
    }
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

/// Aborts a sled transaction with a domain or storage error.
pub(crate) fn abort<E: Into<LedgerError>>(
    err: E,
) -> sled::transaction::ConflictableTransactionError<LedgerError> {
    sled::transaction::ConflictableTransactionError::Abort(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_internal() {
        let err: LedgerError = StorageError::Encode("boom".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.kind().as_str(), "internal");
    }

    #[test]
    fn aborted_transaction_keeps_domain_error() {
        let aborted = sled::transaction::TransactionError::Abort(LedgerError::conflict("dup"));
        let err: LedgerError = aborted.into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "dup");
    }
}
