use chrono::{Duration, Utc};
use library_lending::adapters::mock::MockFailure;
use library_lending::application::loan::{
    self, ErrorKind, LoanApplicationError, ServiceDependencies,
};
use library_lending::domain::commands::{CreateLoan, ExtendLoan, ReturnBook, UpdateLoan};
use library_lending::domain::value_objects::{BookId, ExtensionCount, LoanId, MemberId};
use library_lending::domain::{self, Loan, LoanStatus};
use library_lending::ports::{AvailabilityOperation, LoanRepository};

mod common;

use common::{TestContext, t0};

fn create_cmd(member_id: MemberId, book_id: BookId) -> CreateLoan {
    let now = Utc::now();
    CreateLoan {
        member_id,
        book_id,
        due_date: now + Duration::days(14),
        issued_at: now,
    }
}

fn return_cmd(loan_id: LoanId) -> ReturnBook {
    ReturnBook {
        loan_id,
        returned_at: Utc::now(),
    }
}

/// Loan issued `issued_days_ago` before t0 and due `due_days_ago` before t0
fn past_loan(member_id: MemberId, book_id: BookId, issued_days_ago: i64, due_days_ago: i64) -> Loan {
    domain::loan::open_loan(
        member_id,
        book_id,
        t0() - Duration::days(issued_days_ago),
        t0() - Duration::days(due_days_ago),
    )
    .unwrap()
}

async fn stored(deps: &ServiceDependencies, loan_id: LoanId) -> Loan {
    deps.loan_repository
        .get_by_id(loan_id)
        .await
        .unwrap()
        .expect("loan should be stored")
}

// ============================================================================
// createLoan / returnBook
// ============================================================================

#[tokio::test]
async fn test_single_copy_lend_return_lend_again() {
    let ctx = TestContext::new();
    let alice = ctx.members.add_member("Alice");
    let bob = ctx.members.add_member("Bob");
    let book_id = ctx.books.add_book("Dune", 1);

    // First loan takes the only copy
    let first = loan::create_loan(&ctx.deps, create_cmd(alice, book_id))
        .await
        .unwrap();
    assert_eq!(first.status, LoanStatus::Active);
    assert_eq!(first.extension_count.value(), 0);
    assert_eq!(ctx.books.available_copies(book_id), Some(0));

    // Nothing left for the second member
    let err = loan::create_loan(&ctx.deps, create_cmd(bob, book_id))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanApplicationError::BookNotAvailable));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().contains("not available for loan"));

    // Returning puts the copy back
    let returned = loan::return_book(&ctx.deps, return_cmd(first.loan_id))
        .await
        .unwrap();
    assert_eq!(returned.status, LoanStatus::Returned);
    assert!(returned.returned_at.is_some());
    assert_eq!(ctx.books.available_copies(book_id), Some(1));
    assert_eq!(
        stored(&ctx.deps, first.loan_id).await.status,
        LoanStatus::Returned
    );

    // And it can be lent again
    let second = loan::create_loan(&ctx.deps, create_cmd(bob, book_id))
        .await
        .unwrap();
    assert_eq!(second.status, LoanStatus::Active);
    assert_eq!(ctx.books.available_copies(book_id), Some(0));
}

#[tokio::test]
async fn test_create_loan_unknown_member_or_book() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 1);

    let err = loan::create_loan(&ctx.deps, create_cmd(MemberId::new(), book_id))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanApplicationError::MemberNotFound));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = loan::create_loan(&ctx.deps, create_cmd(member_id, BookId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanApplicationError::BookNotFound));

    assert!(ctx.books.applied_mutations().is_empty());
    assert!(ctx.loans.is_empty().await);
}

#[tokio::test]
async fn test_create_loan_rejects_due_date_before_issue() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 1);

    let now = Utc::now();
    let cmd = CreateLoan {
        member_id,
        book_id,
        due_date: now - Duration::days(1),
        issued_at: now,
    };

    let err = loan::create_loan(&ctx.deps, cmd).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(ctx.books.available_copies(book_id), Some(1));
    assert!(ctx.loans.is_empty().await);
}

#[tokio::test]
async fn test_failed_decrement_persists_nothing() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 2);

    ctx.books
        .fail_mutations(AvailabilityOperation::Decrement, Some(MockFailure::Timeout));
    let err = loan::create_loan(&ctx.deps, create_cmd(member_id, book_id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);

    ctx.books
        .fail_mutations(AvailabilityOperation::Decrement, Some(MockFailure::CircuitOpen));
    let err = loan::create_loan(&ctx.deps, create_cmd(member_id, book_id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);

    assert!(ctx.loans.is_empty().await);
    assert_eq!(ctx.loans.insert_attempts(), 0);
    assert_eq!(ctx.books.available_copies(book_id), Some(2));
}

#[tokio::test]
async fn test_failed_increment_leaves_loan_and_availability_unchanged() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 1);
    let created = loan::create_loan(&ctx.deps, create_cmd(member_id, book_id))
        .await
        .unwrap();

    ctx.books
        .fail_mutations(AvailabilityOperation::Increment, Some(MockFailure::Unavailable));
    let err = loan::return_book(&ctx.deps, return_cmd(created.loan_id))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    assert!(err.kind().is_retriable());
    assert_eq!(stored(&ctx.deps, created.loan_id).await, created);
    assert_eq!(ctx.books.available_copies(book_id), Some(0));

    // Retrying once the inventory is back succeeds
    ctx.books
        .fail_mutations(AvailabilityOperation::Increment, None);
    let returned = loan::return_book(&ctx.deps, return_cmd(created.loan_id))
        .await
        .unwrap();
    assert_eq!(returned.status, LoanStatus::Returned);
    assert_eq!(ctx.books.available_copies(book_id), Some(1));
}

#[tokio::test]
async fn test_return_unknown_or_returned_loan() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 1);

    let err = loan::return_book(&ctx.deps, return_cmd(LoanId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanApplicationError::LoanNotFound));

    let created = loan::create_loan(&ctx.deps, create_cmd(member_id, book_id))
        .await
        .unwrap();
    loan::return_book(&ctx.deps, return_cmd(created.loan_id))
        .await
        .unwrap();

    let err = loan::return_book(&ctx.deps, return_cmd(created.loan_id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(ctx.books.available_copies(book_id), Some(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_returns_only_one_wins() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 1);
    let created = loan::create_loan(&ctx.deps, create_cmd(member_id, book_id))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        loan::return_book(&ctx.deps, return_cmd(created.loan_id)),
        loan::return_book(&ctx.deps, return_cmd(created.loan_id)),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(loser.kind(), ErrorKind::Conflict);

    let increments = ctx
        .books
        .applied_mutations()
        .into_iter()
        .filter(|(_, op)| *op == AvailabilityOperation::Increment)
        .count();
    assert_eq!(increments, 1);
    assert_eq!(ctx.books.available_copies(book_id), Some(1));
}

#[tokio::test]
async fn test_refused_increment_on_return_is_retriable() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 1);
    let created = loan::create_loan(&ctx.deps, create_cmd(member_id, book_id))
        .await
        .unwrap();

    ctx.books
        .fail_mutations(AvailabilityOperation::Increment, Some(MockFailure::Rejected));
    let err = loan::return_book(&ctx.deps, return_cmd(created.loan_id))
        .await
        .unwrap_err();

    assert!(matches!(err, LoanApplicationError::ServiceUnavailable { .. }));
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    assert!(err.kind().is_retriable());
    assert_eq!(stored(&ctx.deps, created.loan_id).await, created);

    ctx.books
        .fail_mutations(AvailabilityOperation::Increment, None);
    let returned = loan::return_book(&ctx.deps, return_cmd(created.loan_id))
        .await
        .unwrap();
    assert_eq!(returned.status, LoanStatus::Returned);
    assert_eq!(ctx.books.available_copies(book_id), Some(1));
}

#[tokio::test]
async fn test_availability_stays_within_bounds() {
    let ctx = TestContext::new();
    let book_id = ctx.books.add_book("Dune", 2);
    let members: Vec<MemberId> = ["Alice", "Bob", "Carol"]
        .iter()
        .map(|name| ctx.members.add_member(name))
        .collect();

    let in_bounds = |ctx: &TestContext| {
        let book = ctx.books.book(book_id).unwrap();
        book.available_copies <= book.copies
    };

    let first = loan::create_loan(&ctx.deps, create_cmd(members[0], book_id))
        .await
        .unwrap();
    assert!(in_bounds(&ctx));
    let second = loan::create_loan(&ctx.deps, create_cmd(members[1], book_id))
        .await
        .unwrap();
    assert!(in_bounds(&ctx));
    assert!(
        loan::create_loan(&ctx.deps, create_cmd(members[2], book_id))
            .await
            .is_err()
    );
    assert_eq!(ctx.books.available_copies(book_id), Some(0));

    loan::return_book(&ctx.deps, return_cmd(first.loan_id))
        .await
        .unwrap();
    loan::return_book(&ctx.deps, return_cmd(second.loan_id))
        .await
        .unwrap();
    assert!(
        loan::return_book(&ctx.deps, return_cmd(second.loan_id))
            .await
            .is_err()
    );
    assert!(in_bounds(&ctx));
    assert_eq!(ctx.books.available_copies(book_id), Some(2));
}

// ============================================================================
// Persistence retry and compensation
// ============================================================================

#[tokio::test]
async fn test_transient_insert_failures_are_retried() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 1);
    ctx.loans.fail_next_inserts(2);

    let created = loan::create_loan(&ctx.deps, create_cmd(member_id, book_id))
        .await
        .unwrap();

    assert_eq!(ctx.loans.insert_attempts(), 3);
    assert_eq!(stored(&ctx.deps, created.loan_id).await, created);
    assert_eq!(ctx.books.available_copies(book_id), Some(0));
}

#[tokio::test]
async fn test_persistent_insert_failure_is_compensated() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 1);
    ctx.loans.fail_next_inserts(3);

    let err = loan::create_loan(&ctx.deps, create_cmd(member_id, book_id))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LoanApplicationError::PersistenceFailed {
            compensated: true,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(ctx.loans.is_empty().await);
    assert_eq!(ctx.books.available_copies(book_id), Some(1));
    assert_eq!(
        ctx.books.applied_mutations(),
        vec![
            (book_id, AvailabilityOperation::Decrement),
            (book_id, AvailabilityOperation::Increment),
        ]
    );
}

#[tokio::test]
async fn test_failed_compensation_is_reported() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 1);
    ctx.loans.fail_next_inserts(3);
    ctx.books
        .fail_mutations(AvailabilityOperation::Increment, Some(MockFailure::Timeout));

    let err = loan::create_loan(&ctx.deps, create_cmd(member_id, book_id))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LoanApplicationError::PersistenceFailed {
            compensated: false,
            ..
        }
    ));
    assert_eq!(ctx.books.available_copies(book_id), Some(0));
}

// ============================================================================
// extendLoan / updateLoan
// ============================================================================

#[tokio::test]
async fn test_extend_twice_then_conflict() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 1);
    let created = loan::create_loan(&ctx.deps, create_cmd(member_id, book_id))
        .await
        .unwrap();

    let extend = |days| ExtendLoan {
        loan_id: created.loan_id,
        extension_days: days,
        extended_at: Utc::now(),
    };

    let first = loan::extend_loan(&ctx.deps, extend(7)).await.unwrap();
    assert_eq!(first.original_due_date, created.due_date);
    assert_eq!(first.loan.due_date, created.due_date + Duration::days(7));
    assert_eq!(first.loan.extension_count.value(), 1);

    let second = loan::extend_loan(&ctx.deps, extend(7)).await.unwrap();
    assert_eq!(second.loan.extension_count.value(), 2);

    let err = loan::extend_loan(&ctx.deps, extend(7)).await.unwrap_err();
    assert!(matches!(
        err,
        LoanApplicationError::ExtensionLimitReached {
            extensions_count: 2
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        stored(&ctx.deps, created.loan_id).await.due_date,
        created.due_date + Duration::days(14)
    );
}

#[tokio::test]
async fn test_extend_at_cap_leaves_loan_unchanged() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 1);

    let capped = Loan {
        extension_count: ExtensionCount::try_from(2).unwrap(),
        ..past_loan(member_id, book_id, 10, -4)
    };
    ctx.loans.put(capped.clone()).await;

    let err = loan::extend_loan(
        &ctx.deps,
        ExtendLoan {
            loan_id: capped.loan_id,
            extension_days: 5,
            extended_at: t0(),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().contains('2'));
    let after = stored(&ctx.deps, capped.loan_id).await;
    assert_eq!(after.extension_count.value(), 2);
    assert_eq!(after.due_date, capped.due_date);
}

#[tokio::test]
async fn test_extend_overdue_loan_reactivates_it() {
    let ctx = TestContext::new();
    let overdue = past_loan(MemberId::new(), BookId::new(), 17, 3);
    ctx.loans.put(overdue.clone()).await;

    let extended = loan::extend_loan(
        &ctx.deps,
        ExtendLoan {
            loan_id: overdue.loan_id,
            extension_days: 7,
            extended_at: t0(),
        },
    )
    .await
    .unwrap();

    assert_eq!(extended.loan.status, LoanStatus::Active);
    assert_eq!(extended.loan.due_date, t0() + Duration::days(4));
    assert_eq!(stored(&ctx.deps, overdue.loan_id).await, extended.loan);
}

#[tokio::test]
async fn test_extend_rejects_non_positive_days() {
    let ctx = TestContext::new();
    let open = past_loan(MemberId::new(), BookId::new(), 1, -13);
    ctx.loans.put(open.clone()).await;

    let err = loan::extend_loan(
        &ctx.deps,
        ExtendLoan {
            loan_id: open.loan_id,
            extension_days: 0,
            extended_at: t0(),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, LoanApplicationError::InvalidExtensionDays(0)));
    assert_eq!(stored(&ctx.deps, open.loan_id).await, open);
}

#[tokio::test]
async fn test_extend_rejects_out_of_range_days() {
    let ctx = TestContext::new();
    let open = past_loan(MemberId::new(), BookId::new(), 1, -13);
    ctx.loans.put(open.clone()).await;

    let err = loan::extend_loan(
        &ctx.deps,
        ExtendLoan {
            loan_id: open.loan_id,
            extension_days: 1_000_000_000,
            extended_at: t0(),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        LoanApplicationError::InvalidExtensionDays(1_000_000_000)
    ));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(stored(&ctx.deps, open.loan_id).await, open);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_extends_at_last_slot_only_one_wins() {
    let ctx = TestContext::new();
    let once_extended = Loan {
        extension_count: ExtensionCount::try_from(1).unwrap(),
        ..past_loan(MemberId::new(), BookId::new(), 1, -13)
    };
    ctx.loans.put(once_extended.clone()).await;

    let extend = || ExtendLoan {
        loan_id: once_extended.loan_id,
        extension_days: 7,
        extended_at: t0(),
    };
    let (a, b) = tokio::join!(
        loan::extend_loan(&ctx.deps, extend()),
        loan::extend_loan(&ctx.deps, extend()),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(
        loser,
        LoanApplicationError::ExtensionLimitReached {
            extensions_count: 2
        }
    ));
    assert_eq!(loser.kind(), ErrorKind::Conflict);

    let after = stored(&ctx.deps, once_extended.loan_id).await;
    assert_eq!(after.extension_count.value(), 2);
    assert_eq!(after.due_date, once_extended.due_date + Duration::days(7));
}

#[tokio::test]
async fn test_update_loan_sets_status_from_new_due_date() {
    let ctx = TestContext::new();
    let open = past_loan(MemberId::new(), BookId::new(), 10, -4);
    ctx.loans.put(open.clone()).await;

    let update = |due_date| UpdateLoan {
        loan_id: open.loan_id,
        due_date,
        updated_at: t0(),
    };

    let past = loan::update_loan(&ctx.deps, update(t0() - Duration::days(1)))
        .await
        .unwrap();
    assert_eq!(past.status, LoanStatus::Overdue);

    let future = loan::update_loan(&ctx.deps, update(t0() + Duration::days(5)))
        .await
        .unwrap();
    assert_eq!(future.status, LoanStatus::Active);
    assert_eq!(stored(&ctx.deps, open.loan_id).await.due_date, t0() + Duration::days(5));

    let err = loan::update_loan(&ctx.deps, update(t0() - Duration::days(30)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_update_returned_loan_conflicts() {
    let ctx = TestContext::new();
    let open = past_loan(MemberId::new(), BookId::new(), 10, -4);
    let returned = domain::loan::return_book(&open, t0()).unwrap();
    ctx.loans.put(returned).await;

    let err = loan::update_loan(
        &ctx.deps,
        UpdateLoan {
            loan_id: open.loan_id,
            due_date: t0() + Duration::days(3),
            updated_at: t0(),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_overdue_listing_counts_days() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 3);

    let three_days = past_loan(member_id, book_id, 17, 3);
    let ten_days = past_loan(member_id, book_id, 24, 10);
    let not_due = past_loan(member_id, book_id, 2, -12);
    let returned = domain::loan::return_book(&past_loan(member_id, book_id, 30, 20), t0()).unwrap();
    for fixture in [&three_days, &ten_days, &not_due, &returned] {
        ctx.loans.put(fixture.clone()).await;
    }

    let overdue = loan::list_overdue(&ctx.deps, t0()).await.unwrap();

    let ids: Vec<LoanId> = overdue.iter().map(|o| o.loan.loan_id).collect();
    assert_eq!(ids, vec![ten_days.loan_id, three_days.loan_id]);
    assert_eq!(overdue[1].days_overdue, 3);
    assert_eq!(overdue[0].days_overdue, 10);
    assert!(overdue.iter().all(|o| o.loan.status == LoanStatus::Overdue));
    assert_eq!(overdue[1].member.name, "Alice");
    assert_eq!(overdue[1].book.title, "Dune");

    // Derived, not written back
    assert_eq!(
        stored(&ctx.deps, three_days.loan_id).await.status,
        LoanStatus::Active
    );
}

#[tokio::test]
async fn test_overdue_days_round_up() {
    let ctx = TestContext::new();
    let late = domain::loan::open_loan(
        MemberId::new(),
        BookId::new(),
        t0() - Duration::days(10),
        t0() - Duration::days(2) - Duration::hours(1),
    )
    .unwrap();
    ctx.loans.put(late).await;

    let overdue = loan::list_overdue(&ctx.deps, t0()).await.unwrap();
    assert_eq!(overdue[0].days_overdue, 3);
}

#[tokio::test]
async fn test_get_loan_uses_placeholders_when_upstreams_fail() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 1);
    let overdue = past_loan(member_id, book_id, 17, 3);
    ctx.loans.put(overdue.clone()).await;

    let details = loan::get_loan(&ctx.deps, overdue.loan_id, t0()).await.unwrap();
    assert_eq!(details.member.name, "Alice");
    assert_eq!(details.book.title, "Dune");
    assert_eq!(details.loan.status, LoanStatus::Overdue);

    ctx.members.set_down(true);
    ctx.books.set_reads_down(true);
    let details = loan::get_loan(&ctx.deps, overdue.loan_id, t0()).await.unwrap();
    assert_eq!(details.member.name, "Unknown");
    assert_eq!(details.member.email, "Unknown");
    assert_eq!(details.book.title, "Unknown");
    assert_eq!(details.book.id, book_id);

    let err = loan::get_loan(&ctx.deps, LoanId::new(), t0())
        .await
        .unwrap_err();
    assert!(matches!(err, LoanApplicationError::LoanNotFound));
}

#[tokio::test]
async fn test_member_loans_newest_first() {
    let ctx = TestContext::new();
    let member_id = ctx.members.add_member("Alice");
    let book_id = ctx.books.add_book("Dune", 3);

    let older = past_loan(member_id, book_id, 20, 6);
    let newer = past_loan(member_id, book_id, 5, -9);
    let someone_else = past_loan(MemberId::new(), book_id, 3, -11);
    for fixture in [&older, &newer, &someone_else] {
        ctx.loans.put(fixture.clone()).await;
    }

    let loans = loan::list_member_loans(&ctx.deps, member_id, t0()).await.unwrap();

    let ids: Vec<LoanId> = loans.iter().map(|l| l.loan.loan_id).collect();
    assert_eq!(ids, vec![newer.loan_id, older.loan_id]);
    assert_eq!(loans[1].loan.status, LoanStatus::Overdue);
    assert_eq!(loans[0].book.title, "Dune");
}
