//! Route of administration catalog entity

use super::Normalize;
use crate::patch;
use crate::rules;
use crate::validation::{Code, FieldValue, Length, Required, Schema, Validated};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "route_of_admin")]
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
pub struct RouteOfAdminInput {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouteOfAdminPatch {
    pub code: String,
    pub name: String,
}

impl Normalize for RouteOfAdminInput {
    fn normalize(&mut self) {
        patch::normalize_code(&mut self.code);
        patch::trim(&mut self.name);
    }
}

impl Normalize for RouteOfAdminPatch {
    fn normalize(&mut self) {
        patch::normalize_code(&mut self.code);
        patch::trim(&mut self.name);
    }
}

impl Validated for RouteOfAdminInput {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("route of administration")
            .field("code", |v: &Self| FieldValue::Text(&v.code), rules![Required, Length::max(16), Code])
            .field("name", |v: &Self| FieldValue::Text(&v.name), rules![Required, Length::between(2, 80)])
    }
}

impl Validated for RouteOfAdminPatch {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("route of administration")
            .field("code", |v: &Self| FieldValue::Text(&v.code), rules![Length::max(16), Code])
            .field("name", |v: &Self| FieldValue::Text(&v.name), rules![Length::between(2, 80)])
    }
}
