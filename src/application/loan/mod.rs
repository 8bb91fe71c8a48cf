mod errors;
mod loan_service;
mod overdue_detection;
mod queries;
mod views;

pub use errors::{ErrorKind, LoanApplicationError, Result};
pub use loan_service::{ServiceDependencies, create_loan, extend_loan, return_book, update_loan};
pub use overdue_detection::list_overdue;
pub use queries::{get_loan, list_member_loans};
pub use views::{BookSummary, ExtendedLoan, LoanDetails, MemberLoan, MemberSummary, OverdueLoan};
