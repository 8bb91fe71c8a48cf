use crate::domain::value_objects::BookId;
use crate::ports::book_service::{
    AvailabilityOperation, AvailabilityUpdate, Book, BookService as BookServiceTrait, Result,
};
use crate::ports::{HealthStatus, ServiceError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

const OPERATION: &str = "update_book_availability";

/// Failure the mock reports instead of applying a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Timeout,
    CircuitOpen,
    Unavailable,
    /// A typed 4xx refusal from a reachable inventory
    Rejected,
}

impl MockFailure {
    fn into_error(self) -> ServiceError {
        match self {
            MockFailure::Timeout => ServiceError::Timeout {
                operation: OPERATION,
            },
            MockFailure::CircuitOpen => ServiceError::CircuitOpen {
                operation: OPERATION,
            },
            MockFailure::Unavailable => {
                ServiceError::failed(OPERATION, "book service returned 503 Service Unavailable")
            }
            MockFailure::Rejected => ServiceError::Rejected {
                operation: OPERATION,
                message: "Available copies cannot exceed total copies".to_string(),
            },
        }
    }
}

/// In-memory inventory.
///
/// Enforces `0 <= available_copies <= copies` the way the real inventory service does, and
/// records every applied mutation so tests can check what reached the upstream.
pub struct BookService {
    books: Mutex<HashMap<BookId, Book>>,
    applied: Mutex<Vec<(BookId, AvailabilityOperation)>>,
    fail_increment: Mutex<Option<MockFailure>>,
    fail_decrement: Mutex<Option<MockFailure>>,
    reads_down: AtomicBool,
}

impl BookService {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(HashMap::new()),
            applied: Mutex::new(Vec::new()),
            fail_increment: Mutex::new(None),
            fail_decrement: Mutex::new(None),
            reads_down: AtomicBool::new(false),
        }
    }

    /// Registers a book with all copies on the shelf and returns its id.
    pub fn add_book(&self, title: &str, copies: u32) -> BookId {
        let book = Book {
            id: BookId::new(),
            title: title.to_string(),
            author: "Mock Author".to_string(),
            copies,
            available_copies: copies,
        };
        let book_id = book.id;
        self.books.lock().unwrap().insert(book_id, book);
        book_id
    }

    pub fn book(&self, book_id: BookId) -> Option<Book> {
        self.books.lock().unwrap().get(&book_id).cloned()
    }

    pub fn available_copies(&self, book_id: BookId) -> Option<u32> {
        self.book(book_id).map(|b| b.available_copies)
    }

    /// Mutations that were actually applied, in order
    pub fn applied_mutations(&self) -> Vec<(BookId, AvailabilityOperation)> {
        self.applied.lock().unwrap().clone()
    }

    /// Makes every following mutation in `operation`'s direction fail (or succeed again with `None`).
    pub fn fail_mutations(&self, operation: AvailabilityOperation, failure: Option<MockFailure>) {
        let slot = match operation {
            AvailabilityOperation::Increment => &self.fail_increment,
            AvailabilityOperation::Decrement => &self.fail_decrement,
        };
        *slot.lock().unwrap() = failure;
    }

    /// Makes lookups fail with a transport error, as if the upstream were down.
    pub fn set_reads_down(&self, down: bool) {
        self.reads_down.store(down, Ordering::SeqCst);
    }
}

impl Default for BookService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookServiceTrait for BookService {
    async fn get_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        if self.reads_down.load(Ordering::SeqCst) {
            return Err(ServiceError::failed("get_book_by_id", "connection refused"));
        }
        Ok(self.book(book_id))
    }

    async fn mutate_availability(
        &self,
        book_id: BookId,
        operation: AvailabilityOperation,
    ) -> Result<AvailabilityUpdate> {
        let failure = match operation {
            AvailabilityOperation::Increment => *self.fail_increment.lock().unwrap(),
            AvailabilityOperation::Decrement => *self.fail_decrement.lock().unwrap(),
        };
        if let Some(failure) = failure {
            return Err(failure.into_error());
        }

        let mut books = self.books.lock().unwrap();
        let book = books.get_mut(&book_id).ok_or_else(|| ServiceError::Rejected {
            operation: OPERATION,
            message: "Book not found".to_string(),
        })?;

        match operation {
            AvailabilityOperation::Decrement if book.available_copies == 0 => {
                return Err(ServiceError::Rejected {
                    operation: OPERATION,
                    message: "No available copies to decrease".to_string(),
                });
            }
            AvailabilityOperation::Increment if book.available_copies >= book.copies => {
                return Err(ServiceError::Rejected {
                    operation: OPERATION,
                    message: "Available copies cannot exceed total copies".to_string(),
                });
            }
            AvailabilityOperation::Decrement => book.available_copies -= 1,
            AvailabilityOperation::Increment => book.available_copies += 1,
        }

        self.applied.lock().unwrap().push((book_id, operation));
        Ok(AvailabilityUpdate {
            id: book_id,
            available_copies: book.available_copies,
            updated_at: Some(chrono::Utc::now()),
        })
    }

    async fn health(&self) -> HealthStatus {
        if self.reads_down.load(Ordering::SeqCst) {
            HealthStatus::degraded("Book service unavailable")
        } else {
            HealthStatus::ok("Book service is running")
        }
    }
}
