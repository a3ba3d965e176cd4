//! Active pharmaceutical ingredient catalog entity

use super::{IngredientStatus, Normalize};
use crate::patch;
use crate::rules;
use crate::validation::{FieldValue, Length, NotBlank, OneOf, Required, Schema, Validated};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredient")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text", unique)]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub is_psychotropic: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Create payload
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngredientInput {
    pub name: String,
    pub status: String,
    pub is_psychotropic: bool,
}

/// Collapse-patch payload
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngredientPatch {
    pub name: String,
    pub status: String,
    pub is_psychotropic: Option<bool>,
}

impl Normalize for IngredientInput {
    fn normalize(&mut self) {
        patch::trim(&mut self.name);
        patch::normalize_status(&mut self.status, IngredientStatus::Active.as_str());
    }
}

impl Normalize for IngredientPatch {
    fn normalize(&mut self) {
        patch::trim(&mut self.name);
        patch::normalize_status_patch(&mut self.status);
    }
}

impl Validated for IngredientInput {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("ingredient")
            .field("name", |i: &Self| FieldValue::Text(&i.name), rules![Required, NotBlank, Length::max(200)])
            .field("status", |i: &Self| FieldValue::Text(&i.status), rules![Required, OneOf::new(IngredientStatus::VALUES)])
    }
}

impl Validated for IngredientPatch {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("ingredient")
            .field("name", |i: &Self| FieldValue::Text(&i.name), rules![Length::max(200)])
            .field("status", |i: &Self| FieldValue::Text(&i.status), rules![OneOf::new(IngredientStatus::VALUES)])
    }
}
