//! Interactive text shell
//!
//! Thin presentation layer over the circulation engine: menus, input
//! collection and listing output. No business rules live here; engine
//! errors are printed and the loop continues. Closing the input stream
//! ends the program cleanly.

mod selftest;

pub use selftest::run_selftest;

use std::io::{self, Write};

use chrono::NaiveDate;

use crate::config::AdminConfig;
use crate::error::AppResult;
use crate::models::{LoanDetails, RegisterMember, WorkSummary};
use crate::services::LibraryService;

enum Session {
    Admin,
    Member(String),
}

pub struct Shell {
    service: LibraryService,
    admin: AdminConfig,
    /// Real calendar date at process start; admin login refuses to set a
    /// virtual today before this.
    calendar_today: NaiveDate,
    session: Option<Session>,
}

impl Shell {
    pub fn new(service: LibraryService, admin: AdminConfig, calendar_today: NaiveDate) -> Self {
        Self {
            service,
            admin,
            calendar_today,
            session: None,
        }
    }

    /// Run the menu loop until quit or end of input.
    pub fn run(&mut self) -> AppResult<()> {
        println!("==== Librarius :: library circulation ====");
        loop {
            let keep_going = match &self.session {
                None => self.welcome_menu(),
                Some(Session::Admin) => self.admin_menu(),
                Some(Session::Member(student_id)) => {
                    let student_id = student_id.clone();
                    self.member_menu(&student_id)
                }
            };
            if !keep_going {
                return Ok(());
            }
        }
    }

    fn welcome_menu(&mut self) -> bool {
        println!();
        println!("[Welcome]");
        println!(" 1) Member login");
        println!(" 2) Admin login");
        println!(" 3) Register member");
        println!(" 0) Quit");
        let Some(choice) = read_line("> ") else {
            return false;
        };
        match choice.as_str() {
            "1" => self.member_login(),
            "2" => self.admin_login(),
            "3" => self.register_member_prompt(),
            "0" => {
                println!("Bye.");
                return false;
            }
            _ => println!("Unknown choice."),
        }
        true
    }

    fn member_login(&mut self) {
        let Some(student_id) = read_line("Student id: ") else {
            return;
        };
        let Some(password) = read_line("Password: ") else {
            return;
        };
        let name = match self.service.authenticate_member(&student_id, &password) {
            Some(member) => member.name.clone(),
            None => {
                println!("Unknown student id or wrong password.");
                return;
            }
        };
        println!("Welcome, {name} ({student_id}).");
        self.session = Some(Session::Member(student_id));
    }

    fn admin_login(&mut self) {
        let Some(login) = read_line("Admin id: ") else {
            return;
        };
        let Some(password) = read_line("Password: ") else {
            return;
        };
        if login != self.admin.login || password != self.admin.password {
            println!("Authentication failed.");
            return;
        }
        // Optional virtual-today override; empty input keeps the current one.
        loop {
            let prompt = format!(
                "Today ({}; YYYY-MM-DD or empty to keep): ",
                self.service.today()
            );
            let Some(input) = read_line(&prompt) else {
                break;
            };
            if input.is_empty() {
                break;
            }
            match input.parse::<NaiveDate>() {
                Ok(date) if date < self.calendar_today => {
                    println!("A date before {} is not allowed.", self.calendar_today);
                }
                Ok(date) => {
                    match self.service.advance_today(date) {
                        Ok(()) => println!("Virtual today is now {}.", self.service.today()),
                        Err(e) => println!("{e}"),
                    }
                    break;
                }
                Err(_) => println!("Expected format YYYY-MM-DD."),
            }
        }
        self.session = Some(Session::Admin);
        println!("Admin login complete.");
    }

    fn register_member_prompt(&mut self) {
        let Some(student_id) = read_line("Student id: ") else {
            return;
        };
        let Some(name) = read_line("Name: ") else {
            return;
        };
        let Some(phone) = read_line("Phone: ") else {
            return;
        };
        let Some(password) = read_line("Password: ") else {
            return;
        };
        match self.service.register_member(RegisterMember {
            student_id,
            name,
            phone,
            password,
        }) {
            Ok(member) => println!("Registered {} ({}).", member.name, member.student_id),
            Err(e) => println!("{e}"),
        }
    }

    fn admin_menu(&mut self) -> bool {
        println!();
        println!("[Admin @ {}]", self.service.today());
        println!(" 1) Add work (+copies)");
        println!(" 2) Delete work");
        println!(" 3) List works");
        println!(" 4) Search works");
        println!(" 5) List members");
        println!(" 6) Remove member");
        println!(" 7) Loans (all)");
        println!(" 8) Loans (open)");
        println!(" 9) Change today");
        println!("10) Logout");
        println!(" 0) Quit");
        let Some(choice) = read_line("> ") else {
            return false;
        };
        match choice.as_str() {
            "1" => self.add_work_prompt(),
            "2" => {
                if let Some(work_id) = read_u32("Work id to delete: ") {
                    match self.service.delete_work(work_id) {
                        Ok(cascaded) => {
                            println!("Deleted work {work_id} and {cascaded} copy(ies).")
                        }
                        Err(e) => println!("{e}"),
                    }
                }
            }
            "3" => print_works(&self.service.list_works()),
            "4" => {
                if let Some(keyword) = read_line("Keyword (title/author): ") {
                    print_works(&self.service.search_works(&keyword));
                }
            }
            "5" => self.print_members(),
            "6" => {
                if let Some(student_id) = read_line("Student id to remove: ") {
                    match self.service.remove_member(&student_id) {
                        Ok(member) => println!("Removed {} ({}).", member.name, member.student_id),
                        Err(e) => println!("{e}"),
                    }
                }
            }
            "7" => print_loans(&self.service.list_loans(false)),
            "8" => print_loans(&self.service.list_loans(true)),
            "9" => self.change_today_prompt(),
            "10" => {
                self.session = None;
                println!("Logged out.");
            }
            "0" => {
                println!("Bye.");
                return false;
            }
            _ => println!("Unknown choice."),
        }
        true
    }

    fn member_menu(&mut self, student_id: &str) -> bool {
        println!();
        println!("[Member {} @ {}]", student_id, self.service.today());
        println!(" 1) List works");
        println!(" 2) Search works");
        println!(" 3) Loan");
        println!(" 4) Return");
        println!(" 5) My loans");
        println!(" 6) Logout");
        println!(" 0) Quit");
        let Some(choice) = read_line("> ") else {
            return false;
        };
        match choice.as_str() {
            "1" => print_works(&self.service.list_works()),
            "2" => {
                if let Some(keyword) = read_line("Keyword (title/author): ") {
                    print_works(&self.service.search_works(&keyword));
                }
            }
            "3" => {
                if let Some(work_id) = read_u32("Work id to loan: ") {
                    match self.service.loan(student_id, work_id) {
                        Ok(details) => println!(
                            "Loan {}: '{}' due {}.",
                            details.loan_id, details.title, details.due_date
                        ),
                        Err(e) => println!("{e}"),
                    }
                }
            }
            "4" => {
                if let Some(loan_id) = read_u32("Loan id to return: ") {
                    match self.service.return_copy(loan_id) {
                        Ok(outcome) if outcome.is_overdue => println!(
                            "Returned '{}' on {} (overdue).",
                            outcome.title, outcome.return_date
                        ),
                        Ok(outcome) => {
                            println!("Returned '{}' on {}.", outcome.title, outcome.return_date)
                        }
                        Err(e) => println!("{e}"),
                    }
                }
            }
            "5" => print_loans(&self.service.member_loans(student_id)),
            "6" => {
                self.session = None;
                println!("Logged out.");
            }
            "0" => {
                println!("Bye.");
                return false;
            }
            _ => println!("Unknown choice."),
        }
        true
    }

    fn add_work_prompt(&mut self) {
        let Some(title) = read_line("Title: ") else {
            return;
        };
        let Some(author) = read_line("Author: ") else {
            return;
        };
        let copies = read_line("Copies (default 1): ")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        match self.service.add_work(&title, &author, copies) {
            Ok(outcome) if outcome.created => println!(
                "Catalogued work {} with {} copy(ies).",
                outcome.work_id, outcome.copies_added
            ),
            Ok(outcome) => println!(
                "Added {} copy(ies) to work {}.",
                outcome.copies_added, outcome.work_id
            ),
            Err(e) => println!("{e}"),
        }
    }

    fn change_today_prompt(&mut self) {
        let prompt = format!(
            "New today ({}; YYYY-MM-DD or empty to keep): ",
            self.service.today()
        );
        let Some(input) = read_line(&prompt) else {
            return;
        };
        if input.is_empty() {
            return;
        }
        match input.parse::<NaiveDate>() {
            Ok(date) => match self.service.advance_today(date) {
                Ok(()) => println!("Virtual today is now {}.", self.service.today()),
                Err(e) => println!("{e}"),
            },
            Err(_) => println!("Expected format YYYY-MM-DD."),
        }
    }

    fn print_members(&self) {
        let members = self.service.list_members();
        if members.is_empty() {
            println!("No members registered.");
            return;
        }
        println!("student id | name | phone | registered");
        for member in members {
            println!(
                "  {} | {} | {} | {}",
                member.student_id, member.name, member.phone, member.registered_date
            );
        }
    }
}

/// Prompt and read one trimmed line; `None` on closed input.
fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    io::stdout().flush().ok();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn read_u32(prompt: &str) -> Option<u32> {
    let input = read_line(prompt)?;
    match input.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            println!("Expected a number.");
            None
        }
    }
}

fn print_works(works: &[WorkSummary]) {
    if works.is_empty() {
        println!("No works found.");
        return;
    }
    println!("work id | title | author | available/total");
    for work in works {
        println!(
            "  {:>3} | {} | {} | {}/{}",
            work.work_id, work.title, work.author, work.nb_available, work.nb_copies
        );
    }
}

fn print_loans(loans: &[LoanDetails]) {
    if loans.is_empty() {
        println!("No loans found.");
        return;
    }
    println!("loan id | student id | title | copy | loaned | due | returned | overdue");
    for loan in loans {
        let returned = loan
            .return_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>3} | {} | {} | {} | {} | {} | {} | {}",
            loan.loan_id,
            loan.student_id,
            loan.title,
            loan.copy_id,
            loan.loan_date,
            loan.due_date,
            returned,
            if loan.is_overdue { "Y" } else { "N" }
        );
    }
}
