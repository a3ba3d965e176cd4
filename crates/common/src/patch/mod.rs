//! Collapse-patch helpers
//!
//! A patch field holding its zero value (empty or blank text, `0`, an absent
//! or empty date) means "keep the stored value". [`collapse`] turns such a
//! field into `None`, which is bound into `SET col = COALESCE($n, col)` so the
//! column keeps its current value inside the same UPDATE.
//!
//! The consequence is that a patch can never set a field to its zero value
//! (quantity 0, price 0, clearing an optional reference). Booleans are
//! exempt: they travel as `Option<bool>` because `false` is meaningful.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Values with a distinguished "unset" state.
pub trait ZeroValue {
    fn is_zero(&self) -> bool;
}

impl ZeroValue for String {
    fn is_zero(&self) -> bool {
        self.trim().is_empty()
    }
}

impl ZeroValue for str {
    fn is_zero(&self) -> bool {
        self.trim().is_empty()
    }
}

impl ZeroValue for i64 {
    fn is_zero(&self) -> bool {
        *self == 0
    }
}

impl ZeroValue for i32 {
    fn is_zero(&self) -> bool {
        *self == 0
    }
}

impl ZeroValue for Decimal {
    fn is_zero(&self) -> bool {
        Decimal::is_zero(self)
    }
}

impl ZeroValue for NaiveDate {
    fn is_zero(&self) -> bool {
        false
    }
}

impl<T: ZeroValue> ZeroValue for Option<T> {
    fn is_zero(&self) -> bool {
        self.as_ref().map_or(true, ZeroValue::is_zero)
    }
}

/// `None` for a zero value, the value otherwise.
pub fn collapse<T: ZeroValue + Clone>(value: &T) -> Option<T> {
    if value.is_zero() {
        None
    } else {
        Some(value.clone())
    }
}

/// Trimmed text, or `None` when blank.
pub fn collapse_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Trims a field in place.
pub fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Trims and upper-cases a catalog code in place.
pub fn normalize_code(value: &mut String) {
    *value = value.trim().to_uppercase();
}

/// Trims and lower-cases a status, substituting `default` when blank.
pub fn normalize_status(value: &mut String, default: &str) {
    let lowered = value.trim().to_lowercase();
    *value = if lowered.is_empty() {
        default.to_string()
    } else {
        lowered
    };
}

/// Trims and lower-cases a status without a default, leaving blank as blank.
pub fn normalize_status_patch(value: &mut String) {
    *value = value.trim().to_lowercase();
}

/// Trims optional text, mapping blank to `None`.
pub fn normalize_optional(value: &mut Option<String>) {
    *value = value.as_deref().and_then(collapse_text);
}

/// Serde adapter for dates that may arrive as `null`, `""` or `"YYYY-MM-DD"`.
///
/// Use with `#[serde(default, with = "crate::patch::blank_date")]`.
pub mod blank_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, FORMAT)
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid date `{s}`, expected YYYY-MM-DD"))),
        }
    }

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }
}
