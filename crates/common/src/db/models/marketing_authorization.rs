//! Marketing authorization catalog entity
//!
//! An authorization is granted per country and may carry a validity window.
//! When both ends of the window are known, `valid_to` must fall strictly
//! after `valid_from`.

use super::{AuthorizationStatus, Normalize};
use crate::patch;
use crate::rules;
use crate::validation::{After, FieldValue, Length, OneOf, Required, Schema, Validated};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "marketing_authorization")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text", unique)]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub country: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub valid_from: Option<Date>,

    pub valid_to: Option<Date>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketingAuthorizationInput {
    pub name: String,
    pub country: String,
    pub status: String,
    #[serde(with = "patch::blank_date")]
    pub valid_from: Option<Date>,
    #[serde(with = "patch::blank_date")]
    pub valid_to: Option<Date>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketingAuthorizationPatch {
    pub name: String,
    pub country: String,
    pub status: String,
    #[serde(with = "patch::blank_date")]
    pub valid_from: Option<Date>,
    #[serde(with = "patch::blank_date")]
    pub valid_to: Option<Date>,
}

impl Normalize for MarketingAuthorizationInput {
    fn normalize(&mut self) {
        patch::trim(&mut self.name);
        patch::trim(&mut self.country);
        patch::normalize_status(&mut self.status, AuthorizationStatus::Active.as_str());
    }
}

impl Normalize for MarketingAuthorizationPatch {
    fn normalize(&mut self) {
        patch::trim(&mut self.name);
        patch::trim(&mut self.country);
        patch::normalize_status_patch(&mut self.status);
    }
}

impl Validated for MarketingAuthorizationInput {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("marketing authorization")
            .field("name", |m: &Self| FieldValue::Text(&m.name), rules![Required, Length::max(150)])
            .field("country", |m: &Self| FieldValue::Text(&m.country), rules![Required, Length::max(100)])
            .field("status", |m: &Self| FieldValue::Text(&m.status), rules![Required, OneOf::new(AuthorizationStatus::VALUES)])
            .record(After::new("valid_to", |m: &Self| m.valid_to, "valid_from", |m: &Self| m.valid_from))
    }
}

impl Validated for MarketingAuthorizationPatch {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("marketing authorization")
            .field("name", |m: &Self| FieldValue::Text(&m.name), rules![Length::max(150)])
            .field("country", |m: &Self| FieldValue::Text(&m.country), rules![Length::max(100)])
            .field("status", |m: &Self| FieldValue::Text(&m.status), rules![OneOf::new(AuthorizationStatus::VALUES)])
            .record(After::new("valid_to", |m: &Self| m.valid_to, "valid_from", |m: &Self| m.valid_from))
    }
}
