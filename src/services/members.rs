//! Member registration, withdrawal and lookup

use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{Member, RegisterMember};

use super::LibraryService;

impl LibraryService {
    /// Register a new member. Input is trimmed, validated, and checked for
    /// duplicate student id and phone before anything is stored.
    pub fn register_member(&mut self, request: RegisterMember) -> AppResult<Member> {
        let request = RegisterMember {
            student_id: request.student_id.trim().to_string(),
            name: request.name.trim().to_string(),
            phone: request.phone.trim().to_string(),
            password: request.password.trim().to_string(),
        };
        request.validate()?;

        if self.catalog.member(&request.student_id).is_some() {
            return Err(AppError::Conflict(format!(
                "student id {} is already registered",
                request.student_id
            )));
        }
        if self
            .catalog
            .members
            .values()
            .any(|m| m.phone == request.phone)
        {
            return Err(AppError::Conflict(format!(
                "phone {} is already registered",
                request.phone
            )));
        }

        let member = Member {
            student_id: request.student_id,
            name: request.name,
            phone: request.phone,
            password: request.password,
            registered_date: self.clock.today(),
        };
        self.catalog
            .members
            .insert(member.student_id.clone(), member.clone());
        self.catalog.persist()?;
        tracing::info!("registered member {}", member.student_id);
        Ok(member)
    }

    /// Withdraw a member (hard delete). Refused while the member holds
    /// open loans.
    pub fn remove_member(&mut self, student_id: &str) -> AppResult<Member> {
        if self.catalog.member(student_id).is_none() {
            return Err(AppError::NotFound(format!(
                "no member with student id {student_id}"
            )));
        }
        let open = self.catalog.open_loans_for_member(student_id);
        if open > 0 {
            return Err(AppError::BusinessRule(format!(
                "member {student_id} still has {open} open loan(s)"
            )));
        }
        let member = self
            .catalog
            .members
            .shift_remove(student_id)
            .ok_or_else(|| AppError::NotFound(format!("no member with student id {student_id}")))?;
        self.catalog.persist()?;
        tracing::info!("removed member {}", member.student_id);
        Ok(member)
    }

    pub fn list_members(&self) -> Vec<&Member> {
        self.catalog.members.values().collect()
    }

    /// Credential match for the shell's member login; `None` when either
    /// the id or the password does not match.
    pub fn authenticate_member(&self, student_id: &str, password: &str) -> Option<&Member> {
        self.catalog
            .member(student_id)
            .filter(|m| m.verify_password(password))
    }
}
