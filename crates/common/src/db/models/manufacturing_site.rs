//! Manufacturing site catalog entity

use super::Normalize;
use crate::patch;
use crate::rules;
use crate::validation::{FieldValue, Length, Required, Schema, Validated};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "manufacturing_site")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text", unique)]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub country: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManufacturingSiteInput {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManufacturingSitePatch {
    pub name: String,
    pub country: String,
}

impl Normalize for ManufacturingSiteInput {
    fn normalize(&mut self) {
        patch::trim(&mut self.name);
        patch::trim(&mut self.country);
    }
}

impl Normalize for ManufacturingSitePatch {
    fn normalize(&mut self) {
        patch::trim(&mut self.name);
        patch::trim(&mut self.country);
    }
}

impl Validated for ManufacturingSiteInput {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("manufacturing site")
            .field("name", |s: &Self| FieldValue::Text(&s.name), rules![Required, Length::max(150)])
            .field("country", |s: &Self| FieldValue::Text(&s.country), rules![Required, Length::max(100)])
    }
}

impl Validated for ManufacturingSitePatch {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("manufacturing site")
            .field("name", |s: &Self| FieldValue::Text(&s.name), rules![Length::max(150)])
            .field("country", |s: &Self| FieldValue::Text(&s.country), rules![Length::max(100)])
    }
}
