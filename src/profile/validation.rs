//! Inline field validation.
//!
//! Every rule maps a raw input value to an error message, with the empty
//! string meaning "valid". Rules never fail an operation; they only decide
//! whether the save action of a form is enabled.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::FormKind;

pub const EMPTY_FIELD: &str = "cannot be empty";
pub const NAME_TOO_SHORT: &str = "must have at least 3 characters";
pub const INVALID_EMAIL: &str = "must be a valid email";
pub const INVALID_CARD_NUMBER: &str = "must have 16 digits";
pub const INVALID_EXPIRATION: &str = "must be MM/YY format";
pub const INVALID_CVC: &str = "must have 3 or 4 digits";

const NAME_MIN_CHARS: usize = 3;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static CARD_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{16}$").expect("card pattern compiles"));

// No check against the current date: an expired card still validates.
static EXPIRATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0[1-9]|1[0-2])/?([0-9]{2})$").expect("expiration pattern compiles")
});

static CVC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{3,4}$").expect("cvc pattern compiles"));

/// Built-in rules, one per validated field.
#[derive(Debug, Clone, Copy)]
enum Rule {
    MinChars(usize, &'static str),
    Pattern(&'static Lazy<Regex>, &'static str),
    /// Pattern applied after removing every whitespace character.
    CompactPattern(&'static Lazy<Regex>, &'static str),
    None,
}

impl Rule {
    fn for_field(form: FormKind, field: &str) -> Self {
        match (form, field) {
            (FormKind::Personal, "name") => Rule::MinChars(NAME_MIN_CHARS, NAME_TOO_SHORT),
            (FormKind::Personal, "email") => Rule::Pattern(&EMAIL_PATTERN, INVALID_EMAIL),
            (FormKind::Payment, "cardNumber") => {
                Rule::CompactPattern(&CARD_NUMBER_PATTERN, INVALID_CARD_NUMBER)
            }
            (FormKind::Payment, "expirationDate") => {
                Rule::Pattern(&EXPIRATION_PATTERN, INVALID_EXPIRATION)
            }
            (FormKind::Payment, "cvc") => Rule::Pattern(&CVC_PATTERN, INVALID_CVC),
            _ => Rule::None,
        }
    }

    fn check(self, value: &str) -> Option<&'static str> {
        let passes = match self {
            Rule::MinChars(min, _) => value.trim().chars().count() >= min,
            Rule::Pattern(pattern, _) => pattern.is_match(value.trim()),
            Rule::CompactPattern(pattern, _) => {
                let compact: String = value.chars().filter(|ch| !ch.is_whitespace()).collect();
                pattern.is_match(&compact)
            }
            Rule::None => true,
        };
        match self {
            _ if passes => None,
            Rule::MinChars(_, message)
            | Rule::Pattern(_, message)
            | Rule::CompactPattern(_, message) => Some(message),
            Rule::None => None,
        }
    }

    fn requires_value(form: FormKind, field: &str) -> bool {
        matches!((form, field), (FormKind::Personal, "name" | "email"))
    }
}

/// Field validator with the optional "required field" rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldValidator {
    require_non_empty: bool,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the empty-value check on `name` and `email`.
    ///
    /// Disabled by default so the observed page behavior is preserved.
    pub fn with_required_fields(mut self, enabled: bool) -> Self {
        self.require_non_empty = enabled;
        self
    }

    /// Returns the error message for `value`, or an empty string when valid.
    pub fn validate(&self, form: FormKind, field: &str, value: &str) -> String {
        if self.require_non_empty && Rule::requires_value(form, field) && value.trim().is_empty()
        {
            return EMPTY_FIELD.to_string();
        }
        Rule::for_field(form, field)
            .check(value)
            .map(str::to_string)
            .unwrap_or_default()
    }
}

/// Validates with the default rule set.
pub fn validate(form: FormKind, field: &str, value: &str) -> String {
    FieldValidator::default().validate(form, field, value)
}
