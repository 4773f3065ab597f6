//! Member model and registration validation

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Fallback for member records persisted before passwords existed.
fn default_password() -> String {
    "password123".to_string()
}

/// A registered member. Removal is a hard delete, so there is no
/// deletion marker here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub student_id: String,
    pub name: String,
    pub phone: String,
    #[serde(default = "default_password")]
    pub password: String,
    pub registered_date: NaiveDate,
}

impl Member {
    /// Plain credential match; stored passwords are not hashed.
    pub fn verify_password(&self, password: &str) -> bool {
        self.password == password
    }
}

/// Student id: a year between 1931 and 2025 followed by a 4 or 5 digit
/// serial.
static STUDENT_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(193[1-9]|19[4-9][0-9]|20[01][0-9]|202[0-5])[0-9]{4,5}$").unwrap()
});

/// Name: 2 to 4 Hangul syllables.
static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[가-힣]{2,4}$").unwrap());

/// Phone: 010-XXXX-XXXX or 01X-XXX(X)-XXXX.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^01(0-[0-9]{4}|[1-9]-[0-9]{3,4})-[0-9]{4}$").unwrap());

/// Member registration request
#[derive(Debug, Clone, Validate)]
pub struct RegisterMember {
    #[validate(regex(
        path = *STUDENT_ID_RE,
        message = "Student id must be a 1931-2025 year followed by a 4 or 5 digit serial"
    ))]
    pub student_id: String,
    #[validate(regex(path = *NAME_RE, message = "Name must be 2 to 4 Hangul characters"))]
    pub name: String,
    #[validate(regex(
        path = *PHONE_RE,
        message = "Phone must match 010-XXXX-XXXX or 01X-XXX-XXXX"
    ))]
    pub phone: String,
    #[validate(custom(function = validate_password))]
    pub password: String,
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if !(4..=20).contains(&len) {
        let mut err = ValidationError::new("password_length");
        err.message = Some("Password must be 4 to 20 characters".into());
        return Err(err);
    }
    if password.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("password_whitespace");
        err.message = Some("Password must not contain whitespace".into());
        return Err(err);
    }
    Ok(())
}
