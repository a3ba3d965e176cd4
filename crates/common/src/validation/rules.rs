//! Built-in field and record rules

use super::{FieldRule, FieldValue, RecordRule, Violation, ViolationKind};
use chrono::NaiveDate;
use regex_lite::Regex;
use rust_decimal::Decimal;

type Outcome = std::result::Result<(), ViolationKind>;

/// Value must be present and non-zero.
pub struct Required;

impl FieldRule for Required {
    fn check(&self, value: &FieldValue<'_>) -> Outcome {
        let blank_text = matches!(value.as_text(), Some(s) if s.trim().is_empty());
        if value.is_absent() || blank_text {
            Err(ViolationKind::Required)
        } else {
            Ok(())
        }
    }
}

/// Text, when present, must contain a non-whitespace character.
pub struct NotBlank;

impl FieldRule for NotBlank {
    fn check(&self, value: &FieldValue<'_>) -> Outcome {
        match value.as_text() {
            Some(s) if s.trim().is_empty() => Err(ViolationKind::Blank),
            _ => Ok(()),
        }
    }
}

/// Character-count bounds on present text.
pub struct Length {
    min: Option<usize>,
    max: Option<usize>,
}

impl Length {
    pub fn max(max: usize) -> Self {
        Self { min: None, max: Some(max) }
    }

    pub fn min(min: usize) -> Self {
        Self { min: Some(min), max: None }
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

impl FieldRule for Length {
    fn check(&self, value: &FieldValue<'_>) -> Outcome {
        let Some(s) = value.as_text() else {
            return Ok(());
        };
        let len = s.chars().count();
        if let Some(min) = self.min {
            if len < min {
                return Err(ViolationKind::TooShort { min });
            }
        }
        if let Some(max) = self.max {
            if len > max {
                return Err(ViolationKind::TooLong { max });
            }
        }
        Ok(())
    }
}

/// Present text must be one of a fixed set.
pub struct OneOf {
    allowed: &'static [&'static str],
}

impl OneOf {
    pub fn new(allowed: &'static [&'static str]) -> Self {
        Self { allowed }
    }
}

impl FieldRule for OneOf {
    fn check(&self, value: &FieldValue<'_>) -> Outcome {
        match value.as_text() {
            Some(s) if !self.allowed.contains(&s) => Err(ViolationKind::NotOneOf {
                allowed: self.allowed,
            }),
            _ => Ok(()),
        }
    }
}

/// Present integer must be a usable row identifier (strictly positive).
pub struct Identifier;

impl FieldRule for Identifier {
    fn check(&self, value: &FieldValue<'_>) -> Outcome {
        let id = match value {
            FieldValue::Int(v) => Some(*v),
            FieldValue::OptInt(v) => *v,
            _ => None,
        };
        match id {
            Some(v) if v < 0 => Err(ViolationKind::InvalidIdentifier),
            _ => Ok(()),
        }
    }
}

/// Lower bound on integers and decimals.
pub struct AtLeast(pub Decimal);

impl AtLeast {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }
}

impl FieldRule for AtLeast {
    fn check(&self, value: &FieldValue<'_>) -> Outcome {
        let n = match value {
            FieldValue::Int(v) => Decimal::from(*v),
            FieldValue::OptInt(Some(v)) => Decimal::from(*v),
            FieldValue::Decimal(d) => *d,
            _ => return Ok(()),
        };
        if n < self.0 {
            Err(ViolationKind::BelowMinimum { min: self.0.to_string() })
        } else {
            Ok(())
        }
    }
}

/// Present text must fully match a regular expression.
pub struct Pattern {
    regex: Regex,
    description: &'static str,
}

impl Pattern {
    pub fn new(pattern: &str, description: &'static str) -> Result<Self, regex_lite::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self { regex, description })
    }
}

impl FieldRule for Pattern {
    fn check(&self, value: &FieldValue<'_>) -> Outcome {
        match value.as_text() {
            Some(s) if !self.regex.is_match(s) => Err(ViolationKind::Format {
                expected: self.description,
            }),
            _ => Ok(()),
        }
    }
}

/// Catalog code alphabet: upper-case letters, digits, `_` and `-`.
pub struct Code;

impl Code {
    const ALPHABET: &'static str = "[A-Z0-9_-]+";
}

impl FieldRule for Code {
    fn check(&self, value: &FieldValue<'_>) -> Outcome {
        let valid = |c: char| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-';
        match value.as_text() {
            Some(s) if !s.chars().all(valid) => Err(ViolationKind::Format {
                expected: Self::ALPHABET,
            }),
            _ => Ok(()),
        }
    }
}

/// Present JSON must be an object.
pub struct Document;

impl FieldRule for Document {
    fn check(&self, value: &FieldValue<'_>) -> Outcome {
        match value {
            FieldValue::Json(Some(v)) if !v.is_null() && !v.is_object() => {
                Err(ViolationKind::MalformedDocument)
            }
            _ => Ok(()),
        }
    }
}

/// `later` must be strictly after `earlier` when both are present.
pub struct After<T> {
    later_name: &'static str,
    later: fn(&T) -> Option<NaiveDate>,
    earlier_name: &'static str,
    earlier: fn(&T) -> Option<NaiveDate>,
}

impl<T> After<T> {
    pub fn new(
        later_name: &'static str,
        later: fn(&T) -> Option<NaiveDate>,
        earlier_name: &'static str,
        earlier: fn(&T) -> Option<NaiveDate>,
    ) -> Self {
        Self {
            later_name,
            later,
            earlier_name,
            earlier,
        }
    }
}

impl<T> RecordRule<T> for After<T> {
    fn check(&self, record: &T) -> std::result::Result<(), Violation> {
        match ((self.earlier)(record), (self.later)(record)) {
            (Some(a), Some(b)) if b <= a => Err(Violation {
                field: self.later_name,
                kind: ViolationKind::NotAfter {
                    other: self.earlier_name,
                },
            }),
            _ => Ok(()),
        }
    }
}
