//! Concrete editor forms and the field rules they share.
//!
//! Length, range and email rules are declared on the payload types with
//! `validator` attributes; [`check_payload`] runs them and folds the result
//! into the field-keyed [`ValidationErrors`]. The functions here cover what
//! `validator` has no attribute for.

use chrono::NaiveTime;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::editor::ValidationErrors;

pub mod branch;
pub mod inventory;
pub mod manager;
pub mod menu_item;
pub mod restaurant;

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Run the payload's declared rules.
pub(crate) fn check_payload<T: Validate>(payload: &T) -> ValidationErrors {
    match payload.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => ValidationErrors::from(errors),
    }
}

/// `#RRGGBB`.
pub(crate) fn hex_colour(value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(rule("colour", "Colour must be a hex value like #AA8800"))
    }
}

/// Blank is allowed; anything else must be an address.
pub(crate) fn optional_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || validator::validate_email(value) {
        Ok(())
    } else {
        Err(rule("email", "Enter a valid email address"))
    }
}

/// `range(min = 0.0)` lets NaN through, and unparseable input arrives as NaN.
pub(crate) fn check_finite(errors: &mut ValidationErrors, field: &'static str, value: f64) {
    if !value.is_finite() {
        errors.add(field, "Enter a valid number");
    }
}

pub(crate) fn parse_time(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    if trimmed.len() != 5 {
        return None;
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M").ok()
}

/// Both ends `HH:MM`, end strictly after start.
pub(crate) fn check_shift(errors: &mut ValidationErrors, field: &'static str, start: &str, end: &str) {
    match (parse_time(start), parse_time(end)) {
        (Some(s), Some(e)) if e > s => {}
        (Some(_), Some(_)) => errors.add(field, "Shift must end after it starts"),
        _ => errors.add(field, "Shift times must be HH:MM"),
    }
}

/// `None` for a blank optional id.
pub(crate) fn optional_id(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
