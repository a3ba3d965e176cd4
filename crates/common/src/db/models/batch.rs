//! Production batch payloads and projection

use super::{BatchStatus, Normalize};
use crate::patch;
use crate::rules;
use crate::validation::{
    After, AtLeast, Document, FieldValue, Identifier, Length, NotBlank, OneOf, Required, Schema, Validated,
};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::{Date, DateTimeWithTimeZone};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchInput {
    pub drug_id: i64,
    pub batch_number: String,
    #[serde(with = "patch::blank_date")]
    pub mfg_date: Option<Date>,
    #[serde(with = "patch::blank_date")]
    pub exp_date: Option<Date>,
    pub quantity: i64,
    pub price: Decimal,
    pub status: String,
    /// Free-form recall record; must be a JSON object when present
    pub recall_reason: Option<serde_json::Value>,
}

/// Collapse-patch payload.
///
/// `quantity` and `price` of `0` keep the stored value, so neither can be
/// patched down to zero.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchPatch {
    pub drug_id: i64,
    pub batch_number: String,
    #[serde(with = "patch::blank_date")]
    pub mfg_date: Option<Date>,
    #[serde(with = "patch::blank_date")]
    pub exp_date: Option<Date>,
    pub quantity: i64,
    pub price: Decimal,
    pub status: String,
    pub recall_reason: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct BatchOut {
    pub id: i64,
    pub drug_id: i64,
    pub drug_brand_name: String,
    pub api_name: String,
    pub batch_number: String,
    pub mfg_date: Date,
    pub exp_date: Date,
    pub quantity: i64,
    pub price: Decimal,
    pub status: String,
    pub recall_reason: Option<serde_json::Value>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Normalize for BatchInput {
    fn normalize(&mut self) {
        patch::trim(&mut self.batch_number);
        patch::normalize_status_patch(&mut self.status);
        if matches!(self.recall_reason, Some(serde_json::Value::Null)) {
            self.recall_reason = None;
        }
    }
}

impl Normalize for BatchPatch {
    fn normalize(&mut self) {
        patch::trim(&mut self.batch_number);
        patch::normalize_status_patch(&mut self.status);
        if matches!(self.recall_reason, Some(serde_json::Value::Null)) {
            self.recall_reason = None;
        }
    }
}

impl Validated for BatchInput {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("batch")
            .field("drug_id", |b: &Self| FieldValue::Int(b.drug_id), rules![Required, Identifier])
            .field("batch_number", |b: &Self| FieldValue::Text(&b.batch_number), rules![Required, NotBlank, Length::max(120)])
            .field("mfg_date", |b: &Self| FieldValue::Date(b.mfg_date), rules![Required])
            .field("exp_date", |b: &Self| FieldValue::Date(b.exp_date), rules![Required])
            .record(After::new("exp_date", |b: &Self| b.exp_date, "mfg_date", |b: &Self| b.mfg_date))
            .field("quantity", |b: &Self| FieldValue::Int(b.quantity), rules![AtLeast::zero()])
            .field("price", |b: &Self| FieldValue::Decimal(b.price), rules![AtLeast::zero()])
            .field("status", |b: &Self| FieldValue::Text(&b.status), rules![Required, OneOf::new(BatchStatus::VALUES)])
            .field("recall_reason", |b: &Self| FieldValue::Json(b.recall_reason.as_ref()), rules![Document])
    }
}

impl Validated for BatchPatch {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("batch")
            .field("drug_id", |b: &Self| FieldValue::Int(b.drug_id), rules![Identifier])
            .field("batch_number", |b: &Self| FieldValue::Text(&b.batch_number), rules![Length::max(120)])
            .record(After::new("exp_date", |b: &Self| b.exp_date, "mfg_date", |b: &Self| b.mfg_date))
            .field("quantity", |b: &Self| FieldValue::Int(b.quantity), rules![AtLeast::zero()])
            .field("price", |b: &Self| FieldValue::Decimal(b.price), rules![AtLeast::zero()])
            .field("status", |b: &Self| FieldValue::Text(&b.status), rules![OneOf::new(BatchStatus::VALUES)])
            .field("recall_reason", |b: &Self| FieldValue::Json(b.recall_reason.as_ref()), rules![Document])
    }
}
