//! Drug payloads and the joined drug projection

use super::{BatchOut, Normalize};
use crate::patch;
use crate::rules;
use crate::validation::{FieldValue, Identifier, Length, NotBlank, Required, Schema, Validated};
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrugInput {
    pub brand_name: String,
    /// Free-text dose, e.g. "500mg"
    pub dose: String,
    pub api_id: i64,
    pub dosage_id: i64,
    pub route_id: i64,
    pub strength_id: i64,
    pub authority_holder_id: Option<i64>,
    pub manufacturing_site_id: Option<i64>,
    pub marketing_id: Option<i64>,
}

/// Collapse-patch payload; `0` ids and empty text keep the stored value.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrugPatch {
    pub brand_name: String,
    pub dose: String,
    pub api_id: i64,
    pub dosage_id: i64,
    pub route_id: i64,
    pub strength_id: i64,
    pub authority_holder_id: i64,
    pub manufacturing_site_id: i64,
    pub marketing_id: i64,
}

/// Drug row with every reference resolved to its display name.
///
/// Optional references that are unset yield `None` for id, name and country.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct DrugOut {
    pub id: i64,
    pub brand_name: String,
    pub dose: String,

    pub api_id: i64,
    pub api_name: String,

    pub dosage_id: i64,
    pub dosage_name: String,

    pub route_id: i64,
    pub route_name: String,

    pub strength_id: i64,
    pub strength_name: String,

    pub authority_holder_id: Option<i64>,
    pub authority_holder_name: Option<String>,
    pub authority_holder_country: Option<String>,

    pub manufacturing_site_id: Option<i64>,
    pub manufacturing_site_name: Option<String>,
    pub manufacturing_site_country: Option<String>,

    pub marketing_id: Option<i64>,
    pub marketing_name: Option<String>,
    pub marketing_country: Option<String>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugWithBatches {
    #[serde(flatten)]
    pub drug: DrugOut,
    pub batches: Vec<BatchOut>,
}

impl Normalize for DrugInput {
    fn normalize(&mut self) {
        patch::trim(&mut self.brand_name);
        patch::trim(&mut self.dose);
        for id in [
            &mut self.authority_holder_id,
            &mut self.manufacturing_site_id,
            &mut self.marketing_id,
        ] {
            *id = id.filter(|v| *v != 0);
        }
    }
}

impl Normalize for DrugPatch {
    fn normalize(&mut self) {
        patch::trim(&mut self.brand_name);
        patch::trim(&mut self.dose);
    }
}

impl Validated for DrugInput {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("drug")
            .field("brand_name", |d: &Self| FieldValue::Text(&d.brand_name), rules![Required, NotBlank, Length::max(200)])
            .field("dose", |d: &Self| FieldValue::Text(&d.dose), rules![Required, Length::max(50)])
            .field("api_id", |d: &Self| FieldValue::Int(d.api_id), rules![Required, Identifier])
            .field("dosage_id", |d: &Self| FieldValue::Int(d.dosage_id), rules![Required, Identifier])
            .field("route_id", |d: &Self| FieldValue::Int(d.route_id), rules![Required, Identifier])
            .field("strength_id", |d: &Self| FieldValue::Int(d.strength_id), rules![Required, Identifier])
            .field("authority_holder_id", |d: &Self| FieldValue::OptInt(d.authority_holder_id), rules![Identifier])
            .field("manufacturing_site_id", |d: &Self| FieldValue::OptInt(d.manufacturing_site_id), rules![Identifier])
            .field("marketing_id", |d: &Self| FieldValue::OptInt(d.marketing_id), rules![Identifier])
    }
}

impl Validated for DrugPatch {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("drug")
            .field("brand_name", |d: &Self| FieldValue::Text(&d.brand_name), rules![Length::max(200)])
            .field("dose", |d: &Self| FieldValue::Text(&d.dose), rules![Length::max(50)])
            .field("api_id", |d: &Self| FieldValue::Int(d.api_id), rules![Identifier])
            .field("dosage_id", |d: &Self| FieldValue::Int(d.dosage_id), rules![Identifier])
            .field("route_id", |d: &Self| FieldValue::Int(d.route_id), rules![Identifier])
            .field("strength_id", |d: &Self| FieldValue::Int(d.strength_id), rules![Identifier])
            .field("authority_holder_id", |d: &Self| FieldValue::Int(d.authority_holder_id), rules![Identifier])
            .field("manufacturing_site_id", |d: &Self| FieldValue::Int(d.manufacturing_site_id), rules![Identifier])
            .field("marketing_id", |d: &Self| FieldValue::Int(d.marketing_id), rules![Identifier])
    }
}
