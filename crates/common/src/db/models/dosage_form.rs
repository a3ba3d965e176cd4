//! Dosage form catalog entity (tablet, capsule, solution, ...)

use super::Normalize;
use crate::patch;
use crate::rules;
use crate::validation::{Code, FieldValue, Length, Required, Schema, Validated};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dosage_form")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text", unique)]
    pub code: String,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DosageFormInput {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DosageFormPatch {
    pub code: String,
    pub name: String,
}

impl Normalize for DosageFormInput {
    fn normalize(&mut self) {
        patch::normalize_code(&mut self.code);
        patch::trim(&mut self.name);
    }
}

impl Normalize for DosageFormPatch {
    fn normalize(&mut self) {
        patch::normalize_code(&mut self.code);
        patch::trim(&mut self.name);
    }
}

impl Validated for DosageFormInput {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("dosage form")
            .field("code", |v: &Self| FieldValue::Text(&v.code), rules![Required, Length::max(50), Code])
            .field("name", |v: &Self| FieldValue::Text(&v.name), rules![Required, Length::max(100)])
    }
}

impl Validated for DosageFormPatch {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("dosage form")
            .field("code", |v: &Self| FieldValue::Text(&v.code), rules![Length::max(50), Code])
            .field("name", |v: &Self| FieldValue::Text(&v.name), rules![Length::max(100)])
    }
}
