//! Marketing authorization holder catalog entity

use super::Normalize;
use crate::patch;
use crate::rules;
use crate::validation::{FieldValue, Length, Required, Schema, Validated};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "authority_holder")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text", unique)]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub country: String,

    /// Holder's own registration number with the authority, if known
    #[sea_orm(column_type = "Text", nullable)]
    pub registration_number: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorityHolderInput {
    pub name: String,
    pub country: String,
    pub registration_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorityHolderPatch {
    pub name: String,
    pub country: String,
    pub registration_number: String,
}

impl Normalize for AuthorityHolderInput {
    fn normalize(&mut self) {
        patch::trim(&mut self.name);
        patch::trim(&mut self.country);
        patch::normalize_optional(&mut self.registration_number);
    }
}

impl Normalize for AuthorityHolderPatch {
    fn normalize(&mut self) {
        patch::trim(&mut self.name);
        patch::trim(&mut self.country);
        patch::trim(&mut self.registration_number);
    }
}

impl Validated for AuthorityHolderInput {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("authority holder")
            .field("name", |h: &Self| FieldValue::Text(&h.name), rules![Required, Length::max(150)])
            .field("country", |h: &Self| FieldValue::Text(&h.country), rules![Required, Length::max(100)])
            .field(
                "registration_number",
                |h: &Self| FieldValue::OptText(h.registration_number.as_deref()),
                rules![Length::max(100)],
            )
    }
}

impl Validated for AuthorityHolderPatch {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("authority holder")
            .field("name", |h: &Self| FieldValue::Text(&h.name), rules![Length::max(150)])
            .field("country", |h: &Self| FieldValue::Text(&h.country), rules![Length::max(100)])
            .field(
                "registration_number",
                |h: &Self| FieldValue::Text(&h.registration_number),
                rules![Length::max(100)],
            )
    }
}
