//! Scripted self-test flow
//!
//! Exercises the register/catalogue/loan/return cycle end to end against a
//! throwaway data directory, printing each step. Steps that can legitimately
//! fail on a re-run (re-registering the same members) print and continue.

use chrono::Duration;

use crate::error::AppResult;
use crate::models::RegisterMember;
use crate::services::LibraryService;

pub fn run_selftest(service: &mut LibraryService) -> AppResult<()> {
    println!("[selftest] basic flow");

    for (student_id, name, phone) in [
        ("20230001", "홍길동", "010-1111-2222"),
        ("20230002", "김철수", "010-3333-4444"),
    ] {
        match service.register_member(RegisterMember {
            student_id: student_id.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            password: "password123".to_string(),
        }) {
            Ok(member) => println!("registered {}", member.student_id),
            Err(e) => println!("{e}"),
        }
    }

    let first = service.add_work("Clean Code", "Robert C. Martin", 2)?;
    service.add_work("The Pragmatic Programmer", "Andrew Hunt", 1)?;
    println!("{} work(s) in catalog", service.list_works().len());

    let details = service.loan("20230001", first.work_id)?;
    println!("loan {} due {}", details.loan_id, details.due_date);

    let outcome = service.return_copy(details.loan_id)?;
    println!("returned '{}' on {}", outcome.title, outcome.return_date);

    println!("search 'Code': {} hit(s)", service.search_works("Code").len());
    println!("{} member(s)", service.list_members().len());

    println!("[selftest] overdue flow");
    let later = service.today() + Duration::days(15);
    service.advance_today(later)?;
    let second = service.loan("20230002", first.work_id)?;
    let open = service.list_loans(true);
    println!(
        "{} open loan(s); loan {} due {}",
        open.len(),
        second.loan_id,
        second.due_date
    );

    println!("[selftest] done");
    Ok(())
}
