//! End-to-end circulation flows over a real data directory

use chrono::NaiveDate;
use tempfile::TempDir;

use librarius::clock::Clock;
use librarius::config::CirculationConfig;
use librarius::error::AppError;
use librarius::models::{CopyStatus, RegisterMember};
use librarius::repository::{seed, Catalog};
use librarius::services::LibraryService;

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn boot(dir: &TempDir, today: &str) -> LibraryService {
    let catalog = Catalog::open(dir.path()).unwrap();
    let (service, _) =
        LibraryService::boot(catalog, Clock::new(d(today)), &CirculationConfig::default())
            .unwrap();
    service
}

fn register(service: &mut LibraryService, student_id: &str, name: &str, phone: &str) {
    service
        .register_member(RegisterMember {
            student_id: student_id.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            password: "pass1234".to_string(),
        })
        .unwrap();
}

#[test]
fn registration_survives_reopen_and_rejects_duplicates() {
    let dir = TempDir::new().unwrap();
    {
        let mut service = boot(&dir, "2025-03-01");
        register(&mut service, "20230001", "홍길동", "010-1111-2222");
    }

    let mut service = boot(&dir, "2025-03-02");
    assert!(service.catalog().member("20230001").is_some());

    let err = service
        .register_member(RegisterMember {
            student_id: "20230001".to_string(),
            name: "홍길동".to_string(),
            phone: "010-9999-8888".to_string(),
            password: "pass1234".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[test]
fn merged_copies_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let mut service = boot(&dir, "2025-03-01");
        service.add_work("Clean Code", "Robert Martin", 2).unwrap();
        service
            .add_work("Clean Code", "robert   martin", 1)
            .unwrap();
    }

    let service = boot(&dir, "2025-03-02");
    let works = service.list_works();
    assert_eq!(works.len(), 1);
    assert_eq!(works[0].nb_copies, 3);
}

#[test]
fn overdue_return_across_sessions() {
    let dir = TempDir::new().unwrap();
    let loan_id = {
        let mut service = boot(&dir, "2025-03-01");
        register(&mut service, "20230001", "홍길동", "010-1111-2222");
        let work = service.add_work("Clean Code", "Robert Martin", 1).unwrap();
        service.loan("20230001", work.work_id).unwrap().loan_id
    };

    // Fifteen days later, in a fresh session.
    let mut service = boot(&dir, "2025-03-16");
    let outcome = service.return_copy(loan_id).unwrap();
    assert!(outcome.is_overdue);

    let copy_id = service.catalog().loan(loan_id).unwrap().copy_id;
    assert_eq!(
        service.catalog().copy(copy_id).unwrap().status,
        CopyStatus::Available
    );
}

#[test]
fn reconcile_heals_doctored_state_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("works.json"),
        r#"[
            {"work_id": 1, "title": "Clean Code", "author_key": "robert martin",
             "author_display": "Robert Martin", "registered_date": "2025-01-01"},
            {"work_id": 2, "title": "Old Book", "author_key": "gone author",
             "author_display": "Gone Author", "registered_date": "2025-01-01",
             "deleted_date": "2025-02-01"}
        ]"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("copies.json"),
        r#"[
            {"copy_id": 1, "work_id": 1, "status": "loaned", "registered_date": "2025-01-01"},
            {"copy_id": 2, "work_id": 2, "status": "available", "registered_date": "2025-01-01"},
            {"copy_id": 3, "work_id": 99, "status": "available", "registered_date": "2025-01-01"}
        ]"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("members.json"),
        r#"[
            {"student_id": "20230001", "name": "홍길동", "phone": "010-1111-2222",
             "password": "pass1234", "registered_date": "2025-01-01"}
        ]"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("loans.json"),
        r#"[
            {"loan_id": 1, "copy_id": 1, "work_id": 1, "student_id": "20230001",
             "loan_date": "2025-02-01", "due_date": "2025-02-10"},
            {"loan_id": 2, "copy_id": 1, "work_id": 1, "student_id": "20230001",
             "loan_date": "2025-02-03", "due_date": "2025-02-17"},
            {"loan_id": 3, "copy_id": 42, "work_id": 1, "student_id": "20230001",
             "loan_date": "2025-02-05", "due_date": "2025-02-19"}
        ]"#,
    )
    .unwrap();

    let catalog = Catalog::open(dir.path()).unwrap();
    let (service, report) = LibraryService::boot(
        catalog,
        Clock::new(d("2025-03-01")),
        &CirculationConfig::default(),
    )
    .unwrap();

    // Copy under the deleted work picked up the deletion marker.
    let orphan = service.catalog().copy(2).unwrap();
    assert_eq!(orphan.status, CopyStatus::Deleted);
    assert_eq!(orphan.deleted_date, Some(d("2025-03-01")));

    // Dangling references are gone.
    assert!(service.catalog().copy(3).is_none());
    assert!(service.catalog().loan(3).is_none());

    // Of the two open loans on copy 1, the later one stays open.
    assert!(!service.catalog().loan(1).unwrap().is_open());
    assert_eq!(
        service.catalog().loan(1).unwrap().return_date,
        Some(d("2025-02-01"))
    );
    assert!(service.catalog().loan(2).unwrap().is_open());

    // Due dates follow the loan-date law again.
    assert_eq!(service.catalog().loan(1).unwrap().due_date, d("2025-02-15"));
    assert_eq!(service.catalog().loan(2).unwrap().due_date, d("2025-02-17"));

    assert!(!report.is_clean());
    drop(service);

    // Repairs were persisted, so a second boot finds nothing to do.
    let catalog = Catalog::open(dir.path()).unwrap();
    let (_, report) = LibraryService::boot(
        catalog,
        Clock::new(d("2025-03-02")),
        &CirculationConfig::default(),
    )
    .unwrap();
    assert!(report.is_clean(), "second boot must repair nothing: {report:?}");
}

#[test]
fn corrupt_collection_files_do_not_prevent_boot() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("works.json"), "]][[").unwrap();
    std::fs::write(dir.path().join("loans.json"), "not json either").unwrap();

    let mut service = boot(&dir, "2025-03-01");
    assert!(service.list_works().is_empty());
    assert!(service.list_loans(false).is_empty());

    // The store still accepts new state afterwards.
    register(&mut service, "20230001", "홍길동", "010-1111-2222");
    service.add_work("Clean Code", "Robert Martin", 1).unwrap();
    assert_eq!(service.list_works().len(), 1);
}

#[test]
fn seed_applies_once_and_feeds_circulation() {
    let dir = TempDir::new().unwrap();
    let seed_path = dir.path().join("seed.csv");
    std::fs::write(
        &seed_path,
        "title,author,registered_date,copies\n\
         Clean Code,Robert Martin,2025-01-02,2\n\
         The Pragmatic Programmer,Andrew Hunt,2025-01-03,1\n",
    )
    .unwrap();

    let data_dir = dir.path().join("data");
    {
        let catalog = Catalog::open_with_seed(&data_dir, &seed_path).unwrap();
        assert_eq!(catalog.work(1).unwrap().title, "Clean Code");
        assert_eq!(catalog.copy_counts(1), (2, 2));
        assert_eq!(catalog.copy_counts(2), (1, 1));
    }

    // Second open must not re-apply the seed.
    let catalog = Catalog::open_with_seed(&data_dir, &seed_path).unwrap();
    assert_eq!(catalog.copy_counts(1), (2, 2));

    let (mut service, _) = LibraryService::boot(
        catalog,
        Clock::new(d("2025-03-01")),
        &CirculationConfig::default(),
    )
    .unwrap();
    register(&mut service, "20230001", "홍길동", "010-1111-2222");
    let details = service.loan("20230001", 1).unwrap();
    assert_eq!(details.title, "Clean Code");
}

#[test]
fn engine_invariants_hold_across_an_operation_sequence() {
    let dir = TempDir::new().unwrap();
    let mut service = boot(&dir, "2025-03-01");
    register(&mut service, "20230001", "홍길동", "010-1111-2222");
    register(&mut service, "20230002", "김철수", "010-3333-4444");

    let clean = service.add_work("Clean Code", "Robert Martin", 2).unwrap();
    let pragmatic = service
        .add_work("The Pragmatic Programmer", "Andrew Hunt", 1)
        .unwrap();

    let first = service.loan("20230001", clean.work_id).unwrap();
    service.loan("20230002", clean.work_id).unwrap();
    service.loan("20230001", pragmatic.work_id).unwrap();
    service.advance_today(d("2025-03-20")).unwrap();
    service.return_copy(first.loan_id).unwrap();
    service.loan("20230002", clean.work_id).unwrap();

    let catalog = service.catalog();
    for loan in service.list_loans(false) {
        // Due-date law.
        assert_eq!(loan.due_date, loan.loan_date + chrono::Duration::days(14));
    }
    // At most one open loan per copy.
    let open = service.list_loans(true);
    let mut seen = std::collections::HashSet::new();
    for loan in &open {
        assert!(seen.insert(loan.copy_id), "copy {} loaned twice", loan.copy_id);
        assert_eq!(
            catalog.copy(loan.copy_id).unwrap().status,
            CopyStatus::Loaned
        );
    }
}

#[test]
fn seed_module_is_reusable_outside_open() {
    let dir = TempDir::new().unwrap();
    let seed_path = dir.path().join("seed.csv");
    std::fs::write(
        &seed_path,
        "title,author,registered_date,copies\nRefactoring,Martin Fowler,2025-01-05,1\n",
    )
    .unwrap();

    let rows = seed::read_seed(&seed_path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].copies, 1);
}
