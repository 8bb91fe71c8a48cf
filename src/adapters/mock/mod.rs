pub mod book_service;
pub mod loan_repository;
pub mod member_service;

pub use book_service::{BookService, MockFailure};
pub use loan_repository::LoanRepository;
pub use member_service::MemberService;
