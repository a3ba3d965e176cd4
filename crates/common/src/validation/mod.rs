//! Declarative validation engine
//!
//! Every entity kind declares a [`Schema`] once: an ordered list of field
//! checks (each a field accessor plus its rules) and record checks spanning
//! several fields. Evaluation walks the schema in declaration order and stops
//! at the first violation, so the surfaced message is deterministic.
//!
//! Rules are plugins behind [`FieldRule`] / [`RecordRule`]; the engine only
//! knows those two interfaces. Schemas live in a [`ValidationEngine`]
//! registry keyed by the validated type, constructed once per process and
//! handed to repositories explicitly.

mod rules;

pub use rules::{After, AtLeast, Code, Document, Identifier, Length, NotBlank, OneOf, Pattern, Required};

use crate::errors::{AppError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Borrowed view of a single field handed to field rules.
///
/// The zero value of each variant (empty text, `0`, `None`) is what the
/// engine treats as "absent".
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Text(&'a str),
    OptText(Option<&'a str>),
    Int(i64),
    OptInt(Option<i64>),
    Decimal(Decimal),
    Date(Option<NaiveDate>),
    Json(Option<&'a serde_json::Value>),
}

impl FieldValue<'_> {
    pub fn is_absent(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::OptText(s) => s.map_or(true, str::is_empty),
            FieldValue::Int(v) => *v == 0,
            FieldValue::OptInt(v) => v.map_or(true, |v| v == 0),
            FieldValue::Decimal(_) => false,
            FieldValue::Date(d) => d.is_none(),
            FieldValue::Json(v) => v.map_or(true, serde_json::Value::is_null),
        }
    }

    /// Text content, if this is a present text field.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) if !s.is_empty() => Some(s),
            FieldValue::OptText(Some(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

/// The nature of a rule failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    Required,
    Blank,
    TooShort { min: usize },
    TooLong { max: usize },
    NotOneOf { allowed: &'static [&'static str] },
    InvalidIdentifier,
    BelowMinimum { min: String },
    Format { expected: &'static str },
    NotAfter { other: &'static str },
    MalformedDocument,
}

/// First failing rule of a schema: which field and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field;
        match &self.kind {
            ViolationKind::Required => write!(f, "{field} is required"),
            ViolationKind::Blank => write!(f, "{field} must not be blank"),
            ViolationKind::TooShort { min } => write!(f, "{field} must be at least {min} characters"),
            ViolationKind::TooLong { max } => write!(f, "{field} must be at most {max} characters"),
            ViolationKind::NotOneOf { allowed } => {
                write!(f, "{field} must be one of: {}", allowed.join(", "))
            }
            ViolationKind::InvalidIdentifier => write!(f, "{field} must be a valid identifier"),
            ViolationKind::BelowMinimum { min } => {
                write!(f, "{field} must be greater than or equal to {min}")
            }
            ViolationKind::Format { expected } => write!(f, "{field} must match {expected}"),
            ViolationKind::NotAfter { other } => write!(f, "{field} must be after {other}"),
            ViolationKind::MalformedDocument => {
                write!(f, "{field} must be a well-formed JSON object")
            }
        }
    }
}

impl From<Violation> for AppError {
    fn from(v: Violation) -> Self {
        AppError::Validation {
            message: v.to_string(),
            field: Some(v.field.to_string()),
        }
    }
}

/// A rule applied to one field in isolation.
pub trait FieldRule: Send + Sync {
    fn check(&self, value: &FieldValue<'_>) -> std::result::Result<(), ViolationKind>;
}

/// A rule spanning several fields of the same record.
pub trait RecordRule<T>: Send + Sync {
    fn check(&self, record: &T) -> std::result::Result<(), Violation>;
}

/// Field accessor used by a schema.
pub type Accessor<T> = for<'a> fn(&'a T) -> FieldValue<'a>;

enum Check<T> {
    Field {
        name: &'static str,
        get: Accessor<T>,
        rules: Vec<Box<dyn FieldRule>>,
    },
    Record(Box<dyn RecordRule<T>>),
}

/// Ordered rule declarations for one entity kind.
pub struct Schema<T> {
    entity: &'static str,
    checks: Vec<Check<T>>,
}

impl<T> Schema<T> {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            checks: Vec::new(),
        }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Declare a field and the rules it must satisfy, in order.
    pub fn field(mut self, name: &'static str, get: Accessor<T>, rules: Vec<Box<dyn FieldRule>>) -> Self {
        self.checks.push(Check::Field { name, get, rules });
        self
    }

    /// Declare a cross-field rule at this point of the evaluation order.
    pub fn record(mut self, rule: impl RecordRule<T> + 'static) -> Self {
        self.checks.push(Check::Record(Box::new(rule)));
        self
    }

    /// Evaluate every declared check, returning the first violation.
    pub fn evaluate(&self, value: &T) -> Option<Violation> {
        for check in &self.checks {
            match check {
                Check::Field { name, get, rules } => {
                    let field = get(value);
                    for rule in rules {
                        if let Err(kind) = rule.check(&field) {
                            return Some(Violation { field: name, kind });
                        }
                    }
                }
                Check::Record(rule) => {
                    if let Err(violation) = rule.check(value) {
                        return Some(violation);
                    }
                }
            }
        }
        None
    }
}

/// Types that declare their own validation schema.
pub trait Validated: Sized + 'static {
    fn schema() -> Schema<Self>;
}

/// Registry of schemas keyed by the validated type.
#[derive(Default)]
pub struct ValidationEngine {
    schemas: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with every input and patch schema of the domain registered.
    pub fn standard() -> Self {
        let mut engine = Self::new();
        crate::db::models::register_schemas(&mut engine);
        engine
    }

    /// Register (or replace) the schema for `T`.
    pub fn register<T: 'static>(&mut self, schema: Schema<T>) -> &mut Self {
        self.schemas.insert(TypeId::of::<T>(), Box::new(schema));
        self
    }

    pub fn register_validated<T: Validated>(&mut self) -> &mut Self {
        self.register(T::schema())
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.schemas.contains_key(&TypeId::of::<T>())
    }

    /// First violation for `value`, or `None` when it passes.
    ///
    /// Returns `None` for unregistered types; use [`ValidationEngine::validate`]
    /// to treat a missing schema as an error.
    pub fn check<T: 'static>(&self, value: &T) -> Option<Violation> {
        self.schema::<T>().and_then(|schema| schema.evaluate(value))
    }

    /// Validate `value`, surfacing the first violation as [`AppError::Validation`].
    pub fn validate<T: 'static>(&self, value: &T) -> Result<()> {
        let schema = self.schema::<T>().ok_or_else(|| AppError::Internal {
            message: format!("no validation schema registered for {}", std::any::type_name::<T>()),
        })?;

        match schema.evaluate(value) {
            None => Ok(()),
            Some(violation) => {
                tracing::debug!(
                    entity = schema.entity(),
                    field = violation.field,
                    "Validation failed"
                );
                Err(violation.into())
            }
        }
    }

    fn schema<T: 'static>(&self) -> Option<&Schema<T>> {
        self.schemas
            .get(&TypeId::of::<T>())
            .and_then(|s| s.downcast_ref::<Schema<T>>())
    }
}

/// Boxes a list of rules for [`Schema::field`].
#[macro_export]
macro_rules! rules {
    ($($rule:expr),* $(,)?) => {
        vec![$(Box::new($rule) as Box<dyn $crate::validation::FieldRule>),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules;

    struct Sample {
        code: String,
        name: String,
        status: String,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    }

    fn sample() -> Sample {
        Sample {
            code: "TAB".into(),
            name: "Tablet".into(),
            status: "active".into(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            end: NaiveDate::from_ymd_opt(2024, 6, 1),
        }
    }

    fn sample_schema() -> Schema<Sample> {
        Schema::<Sample>::new("sample")
            .field("code", |s: &Sample| FieldValue::Text(&s.code), rules![Required, Length::max(5)])
            .field("name", |s: &Sample| FieldValue::Text(&s.name), rules![Required, Length::between(2, 10)])
            .field("status", |s: &Sample| FieldValue::Text(&s.status), rules![OneOf::new(&["active", "inactive"])])
            .record(After::new("end", |s: &Sample| s.end, "start", |s: &Sample| s.start))
    }

    #[test]
    fn test_valid_record_passes() {
        assert_eq!(sample_schema().evaluate(&sample()), None);
    }

    #[test]
    fn test_first_violation_in_declaration_order() {
        let mut s = sample();
        s.code = String::new();
        s.name = "x".into();
        s.status = "bogus".into();

        let v = sample_schema().evaluate(&s).unwrap();
        assert_eq!(v.field, "code");
        assert_eq!(v.to_string(), "code is required");

        s.code = "TABLETS".into();
        let v = sample_schema().evaluate(&s).unwrap();
        assert_eq!(v.to_string(), "code must be at most 5 characters");

        s.code = "TAB".into();
        let v = sample_schema().evaluate(&s).unwrap();
        assert_eq!(v.to_string(), "name must be at least 2 characters");

        s.name = "Tablet".into();
        let v = sample_schema().evaluate(&s).unwrap();
        assert_eq!(v.to_string(), "status must be one of: active, inactive");
    }

    #[test]
    fn test_record_rule_runs_in_order() {
        let mut s = sample();
        s.end = NaiveDate::from_ymd_opt(2023, 12, 31);
        let v = sample_schema().evaluate(&s).unwrap();
        assert_eq!(v.field, "end");
        assert_eq!(v.to_string(), "end must be after start");
    }

    #[test]
    fn test_engine_registry_and_error() {
        let mut engine = ValidationEngine::new();
        engine.register(sample_schema());
        assert!(engine.is_registered::<Sample>());

        let mut s = sample();
        assert!(engine.validate(&s).is_ok());

        s.name = String::new();
        let err = engine.validate(&s).unwrap_err();
        match err {
            AppError::Validation { message, field } => {
                assert_eq!(message, "name is required");
                assert_eq!(field.as_deref(), Some("name"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unregistered_type_is_internal_error() {
        let engine = ValidationEngine::new();
        assert!(engine.check(&sample()).is_none());
        assert!(matches!(engine.validate(&sample()), Err(AppError::Internal { .. })));
    }

    /// A rule defined outside the engine plugs in through the same trait.
    struct NoDigits;

    impl FieldRule for NoDigits {
        fn check(&self, value: &FieldValue<'_>) -> std::result::Result<(), ViolationKind> {
            match value.as_text() {
                Some(s) if s.chars().any(|c| c.is_ascii_digit()) => Err(ViolationKind::Format {
                    expected: "letters only",
                }),
                _ => Ok(()),
            }
        }
    }

    #[test]
    fn test_custom_rule_plugs_in() {
        let schema = Schema::<Sample>::new("sample")
            .field("name", |s: &Sample| FieldValue::Text(&s.name), rules![Required, NoDigits]);

        let mut s = sample();
        assert!(schema.evaluate(&s).is_none());

        s.name = "Tab1et".into();
        assert_eq!(schema.evaluate(&s).unwrap().to_string(), "name must match letters only");
    }

    #[test]
    fn test_standard_engine_is_populated() {
        use crate::db::models::{BatchInput, DrugInput, DrugPatch, IngredientInput};

        let engine = ValidationEngine::standard();
        assert!(engine.is_registered::<IngredientInput>());
        assert!(engine.is_registered::<DrugInput>());
        assert!(engine.is_registered::<DrugPatch>());
        assert!(engine.is_registered::<BatchInput>());
    }
}
