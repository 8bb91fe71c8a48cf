use super::LoanStatus;

/// Error opening a loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenLoanError {
    /// Due date lies before the issue date
    DueBeforeIssue,
}

/// Error extending a loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendLoanError {
    /// Loan already returned
    AlreadyReturned,
    /// Extension cap reached; carries the current count
    ExtensionLimitExceeded { extensions_count: u8 },
    /// Extension must add at least one day
    InvalidExtensionDays(i64),
}

/// Error returning a book
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnBookError {
    /// Loan is not in a returnable status
    NotReturnable(LoanStatus),
}

/// Error rescheduling a loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateLoanError {
    /// Loan already returned
    AlreadyReturned,
    /// New due date lies before the issue date
    DueBeforeIssue,
}
