use crate::ports::ServiceError;
use thiserror::Error;

/// Client-facing category of an application error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    Timeout,
    ServiceUnavailable,
    Internal,
}

impl ErrorKind {
    /// Timeouts and unavailable upstreams may succeed when retried.
    pub fn is_retriable(&self) -> bool {
        matches!(self, ErrorKind::Timeout | ErrorKind::ServiceUnavailable)
    }
}

/// Loan application layer error
#[derive(Debug, Error)]
pub enum LoanApplicationError {
    #[error("Member not found")]
    MemberNotFound,

    #[error("Book not found")]
    BookNotFound,

    #[error("Loan not found")]
    LoanNotFound,

    /// No copy left on the shelf
    #[error("Book is not available for loan")]
    BookNotAvailable,

    /// The inventory refused the availability change
    #[error("Book availability could not be updated: {0}")]
    AvailabilityRejected(String),

    /// The loan is not in a status that allows the operation
    #[error("Invalid loan state: {0}")]
    InvalidLoanState(String),

    #[error("Loan has already been extended the maximum number of times ({extensions_count})")]
    ExtensionLimitReached { extensions_count: u8 },

    #[error("Invalid due date: {0}")]
    InvalidDueDate(String),

    #[error("Extension days must be a positive number within range, got {0}")]
    InvalidExtensionDays(i64),

    /// An upstream call exceeded its time budget
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    /// An upstream call failed or its circuit is open
    #[error("{operation} is unavailable")]
    ServiceUnavailable {
        operation: &'static str,
        #[source]
        source: ServiceError,
    },

    /// The loan could not be stored after the book was reserved
    #[error("Loan could not be persisted (book availability compensated: {compensated})")]
    PersistenceFailed {
        compensated: bool,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Loan repository error")]
    Repository(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LoanApplicationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoanApplicationError::MemberNotFound
            | LoanApplicationError::BookNotFound
            | LoanApplicationError::LoanNotFound => ErrorKind::NotFound,
            LoanApplicationError::BookNotAvailable
            | LoanApplicationError::AvailabilityRejected(_)
            | LoanApplicationError::InvalidLoanState(_)
            | LoanApplicationError::ExtensionLimitReached { .. } => ErrorKind::Conflict,
            LoanApplicationError::InvalidDueDate(_)
            | LoanApplicationError::InvalidExtensionDays(_) => ErrorKind::InvalidInput,
            LoanApplicationError::Timeout { .. } => ErrorKind::Timeout,
            LoanApplicationError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            LoanApplicationError::PersistenceFailed { .. }
            | LoanApplicationError::Repository(_) => ErrorKind::Internal,
        }
    }
}

impl From<ServiceError> for LoanApplicationError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Timeout { operation } => LoanApplicationError::Timeout { operation },
            ServiceError::Rejected { message, .. } => {
                LoanApplicationError::AvailabilityRejected(message)
            }
            other => LoanApplicationError::ServiceUnavailable {
                operation: other.operation(),
                source: other,
            },
        }
    }
}

/// Result type of the loan application layer
pub type Result<T> = std::result::Result<T, LoanApplicationError>;
