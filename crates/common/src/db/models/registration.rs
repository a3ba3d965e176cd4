//! Drug registrations and their site / holder link rows

use super::{Normalize, RegistrationStatus};
use crate::patch;
use crate::rules;
use crate::validation::{After, FieldValue, Identifier, Length, OneOf, Required, Schema, Validated};
use sea_orm::entity::prelude::{Date, DateTimeWithTimeZone};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

// ============================================================================
// Registration
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrationInput {
    pub drug_id: i64,
    pub ma_id: i64,
    pub registration_number: Option<String>,
    pub status: String,
    #[serde(with = "patch::blank_date")]
    pub valid_from: Option<Date>,
    #[serde(with = "patch::blank_date")]
    pub valid_to: Option<Date>,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrationPatch {
    pub drug_id: i64,
    pub ma_id: i64,
    pub registration_number: String,
    pub status: String,
    #[serde(with = "patch::blank_date")]
    pub valid_from: Option<Date>,
    #[serde(with = "patch::blank_date")]
    pub valid_to: Option<Date>,
    /// `null` or absent keeps the stored flag
    pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct RegistrationOut {
    pub id: i64,
    pub drug_id: i64,
    pub drug_brand_name: String,
    pub ma_id: i64,
    pub ma_name: String,
    pub ma_country: String,
    pub registration_number: Option<String>,
    pub status: String,
    pub valid_from: Option<Date>,
    pub valid_to: Option<Date>,
    pub is_primary: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Normalize for RegistrationInput {
    fn normalize(&mut self) {
        patch::normalize_optional(&mut self.registration_number);
        patch::normalize_status(&mut self.status, RegistrationStatus::Active.as_str());
    }
}

impl Normalize for RegistrationPatch {
    fn normalize(&mut self) {
        patch::trim(&mut self.registration_number);
        patch::normalize_status_patch(&mut self.status);
    }
}

impl Validated for RegistrationInput {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("drug registration")
            .field("drug_id", |r: &Self| FieldValue::Int(r.drug_id), rules![Required, Identifier])
            .field("ma_id", |r: &Self| FieldValue::Int(r.ma_id), rules![Required, Identifier])
            .field(
                "registration_number",
                |r: &Self| FieldValue::OptText(r.registration_number.as_deref()),
                rules![Length::max(100)],
            )
            .field("status", |r: &Self| FieldValue::Text(&r.status), rules![Required, OneOf::new(RegistrationStatus::VALUES)])
            .record(After::new("valid_to", |r: &Self| r.valid_to, "valid_from", |r: &Self| r.valid_from))
    }
}

impl Validated for RegistrationPatch {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("drug registration")
            .field("drug_id", |r: &Self| FieldValue::Int(r.drug_id), rules![Identifier])
            .field("ma_id", |r: &Self| FieldValue::Int(r.ma_id), rules![Identifier])
            .field("registration_number", |r: &Self| FieldValue::Text(&r.registration_number), rules![Length::max(100)])
            .field("status", |r: &Self| FieldValue::Text(&r.status), rules![OneOf::new(RegistrationStatus::VALUES)])
            .record(After::new("valid_to", |r: &Self| r.valid_to, "valid_from", |r: &Self| r.valid_from))
    }
}

// ============================================================================
// Site links
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrationSiteInput {
    pub drug_registration_id: i64,
    pub site_id: i64,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrationSitePatch {
    pub drug_registration_id: i64,
    pub site_id: i64,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct RegistrationSiteOut {
    pub id: i64,
    pub drug_registration_id: i64,
    pub site_id: i64,
    pub site_name: String,
    pub site_country: String,
    pub role: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Normalize for RegistrationSiteInput {
    fn normalize(&mut self) {
        patch::normalize_optional(&mut self.role);
    }
}

impl Normalize for RegistrationSitePatch {
    fn normalize(&mut self) {
        patch::trim(&mut self.role);
    }
}

impl Validated for RegistrationSiteInput {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("registration site")
            .field("drug_registration_id", |l: &Self| FieldValue::Int(l.drug_registration_id), rules![Required, Identifier])
            .field("site_id", |l: &Self| FieldValue::Int(l.site_id), rules![Required, Identifier])
            .field("role", |l: &Self| FieldValue::OptText(l.role.as_deref()), rules![Length::max(80)])
    }
}

impl Validated for RegistrationSitePatch {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("registration site")
            .field("drug_registration_id", |l: &Self| FieldValue::Int(l.drug_registration_id), rules![Identifier])
            .field("site_id", |l: &Self| FieldValue::Int(l.site_id), rules![Identifier])
            .field("role", |l: &Self| FieldValue::Text(&l.role), rules![Length::max(80)])
    }
}

// ============================================================================
// Holder links
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrationHolderInput {
    pub drug_registration_id: i64,
    pub auth_holder_id: i64,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrationHolderPatch {
    pub drug_registration_id: i64,
    pub auth_holder_id: i64,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct RegistrationHolderOut {
    pub id: i64,
    pub drug_registration_id: i64,
    pub auth_holder_id: i64,
    pub holder_name: String,
    pub holder_country: String,
    pub role: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Normalize for RegistrationHolderInput {
    fn normalize(&mut self) {
        patch::normalize_optional(&mut self.role);
    }
}

impl Normalize for RegistrationHolderPatch {
    fn normalize(&mut self) {
        patch::trim(&mut self.role);
    }
}

impl Validated for RegistrationHolderInput {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("registration holder")
            .field("drug_registration_id", |l: &Self| FieldValue::Int(l.drug_registration_id), rules![Required, Identifier])
            .field("auth_holder_id", |l: &Self| FieldValue::Int(l.auth_holder_id), rules![Required, Identifier])
            .field("role", |l: &Self| FieldValue::OptText(l.role.as_deref()), rules![Length::max(80)])
    }
}

impl Validated for RegistrationHolderPatch {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new("registration holder")
            .field("drug_registration_id", |l: &Self| FieldValue::Int(l.drug_registration_id), rules![Identifier])
            .field("auth_holder_id", |l: &Self| FieldValue::Int(l.auth_holder_id), rules![Identifier])
            .field("role", |l: &Self| FieldValue::Text(&l.role), rules![Length::max(80)])
    }
}
