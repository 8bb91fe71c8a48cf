pub mod book_service;
pub mod lending_service;
pub mod loan_repository;
pub mod member_service;
pub mod service_error;

pub use book_service::{AvailabilityOperation, AvailabilityUpdate, Book, BookService};
pub use lending_service::{LendingService, LoanParty, LoanRecord};
pub use loan_repository::{LoanAlreadyReturned, LoanRepository, LoanUnitOfWork};
pub use member_service::{Member, MemberService};
pub use service_error::{HealthState, HealthStatus, ServiceError};
