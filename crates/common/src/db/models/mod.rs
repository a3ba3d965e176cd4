//! Entity models, payloads and projections
//!
//! Catalog tables are SeaORM entities. Domain rows (drugs, batches,
//! registrations) are only ever read through joined projections, so they
//! are plain `FromQueryResult` structs.

mod authority_holder;
mod batch;
mod dosage_form;
mod drug;
mod ingredient;
mod manufacturing_site;
mod marketing_authorization;
mod registration;
mod route_of_admin;
mod status;
mod strength_unit;

use crate::validation::ValidationEngine;

pub use status::{AuthorizationStatus, BatchStatus, IngredientStatus, RegistrationStatus};

pub use ingredient::{
    Entity as IngredientEntity,
    Model as Ingredient,
    Column as IngredientColumn,
    IngredientInput,
    IngredientPatch,
};

pub use dosage_form::{
    Entity as DosageFormEntity,
    Model as DosageForm,
    Column as DosageFormColumn,
    DosageFormInput,
    DosageFormPatch,
};

pub use route_of_admin::{
    Entity as RouteOfAdminEntity,
    Model as RouteOfAdmin,
    Column as RouteOfAdminColumn,
    RouteOfAdminInput,
    RouteOfAdminPatch,
};

pub use strength_unit::{
    Entity as StrengthUnitEntity,
    Model as StrengthUnit,
    Column as StrengthUnitColumn,
    StrengthUnitInput,
    StrengthUnitPatch,
};

pub use authority_holder::{
    Entity as AuthorityHolderEntity,
    Model as AuthorityHolder,
    Column as AuthorityHolderColumn,
    AuthorityHolderInput,
    AuthorityHolderPatch,
};

pub use manufacturing_site::{
    Entity as ManufacturingSiteEntity,
    Model as ManufacturingSite,
    Column as ManufacturingSiteColumn,
    ManufacturingSiteInput,
    ManufacturingSitePatch,
};

pub use marketing_authorization::{
    Entity as MarketingAuthorizationEntity,
    Model as MarketingAuthorization,
    Column as MarketingAuthorizationColumn,
    MarketingAuthorizationInput,
    MarketingAuthorizationPatch,
};

pub use drug::{DrugInput, DrugOut, DrugPatch, DrugWithBatches};
pub use batch::{BatchInput, BatchOut, BatchPatch};
pub use registration::{
    RegistrationHolderInput, RegistrationHolderOut, RegistrationHolderPatch,
    RegistrationInput, RegistrationOut, RegistrationPatch,
    RegistrationSiteInput, RegistrationSiteOut, RegistrationSitePatch,
};

/// Canonicalization applied to a payload before validation.
pub trait Normalize {
    fn normalize(&mut self);
}

/// Register every input and patch schema with `engine`.
pub(crate) fn register_schemas(engine: &mut ValidationEngine) {
    engine
        .register_validated::<IngredientInput>()
        .register_validated::<IngredientPatch>()
        .register_validated::<DosageFormInput>()
        .register_validated::<DosageFormPatch>()
        .register_validated::<RouteOfAdminInput>()
        .register_validated::<RouteOfAdminPatch>()
        .register_validated::<StrengthUnitInput>()
        .register_validated::<StrengthUnitPatch>()
        .register_validated::<AuthorityHolderInput>()
        .register_validated::<AuthorityHolderPatch>()
        .register_validated::<ManufacturingSiteInput>()
        .register_validated::<ManufacturingSitePatch>()
        .register_validated::<MarketingAuthorizationInput>()
        .register_validated::<MarketingAuthorizationPatch>()
        .register_validated::<DrugInput>()
        .register_validated::<DrugPatch>()
        .register_validated::<BatchInput>()
        .register_validated::<BatchPatch>()
        .register_validated::<RegistrationInput>()
        .register_validated::<RegistrationPatch>()
        .register_validated::<RegistrationSiteInput>()
        .register_validated::<RegistrationSitePatch>()
        .register_validated::<RegistrationHolderInput>()
        .register_validated::<RegistrationHolderPatch>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_strict;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn first_message<T: 'static>(value: &T) -> Option<String> {
        ValidationEngine::standard().check(value).map(|v| v.to_string())
    }

    fn batch() -> BatchInput {
        BatchInput {
            drug_id: 1,
            batch_number: "B-001".into(),
            mfg_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            exp_date: NaiveDate::from_ymd_opt(2027, 1, 1),
            quantity: 100,
            price: Decimal::new(1250, 2),
            status: "released".into(),
            recall_reason: None,
        }
    }

    #[test]
    fn test_ingredient_defaults_and_lowercases_status() {
        let mut input = IngredientInput {
            name: "  Paracetamol ".into(),
            ..Default::default()
        };
        input.normalize();
        assert_eq!(input.name, "Paracetamol");
        assert_eq!(input.status, "active");
        assert_eq!(first_message(&input), None);

        input.status = "Banned".into();
        input.normalize();
        assert_eq!(input.status, "banned");
    }

    #[test]
    fn test_catalog_code_is_uppercased_then_checked() {
        let mut input = DosageFormInput {
            code: " tab ".into(),
            name: "Tablet".into(),
        };
        input.normalize();
        assert_eq!(input.code, "TAB");
        assert_eq!(first_message(&input), None);

        input.code = "TAB LET".into();
        assert_eq!(first_message(&input).unwrap(), "code must match [A-Z0-9_-]+");
    }

    #[test]
    fn test_route_name_bounds() {
        let input = RouteOfAdminInput {
            code: "PO".into(),
            name: "O".into(),
        };
        assert_eq!(first_message(&input).unwrap(), "name must be at least 2 characters");
    }

    #[test]
    fn test_drug_missing_reference_is_required() {
        let input = DrugInput {
            brand_name: "Panadol".into(),
            dose: "500mg".into(),
            api_id: 1,
            dosage_id: 1,
            route_id: 0,
            strength_id: 1,
            ..Default::default()
        };
        assert_eq!(first_message(&input).unwrap(), "route_id is required");
    }

    #[test]
    fn test_drug_optional_zero_reference_becomes_null() {
        let mut input: DrugInput = decode_strict(
            br#"{"brand_name":"Panadol","dose":"500mg","api_id":1,"dosage_id":2,"route_id":3,"strength_id":4,"marketing_id":0}"#,
        )
        .unwrap();
        input.normalize();
        assert_eq!(input.marketing_id, None);
        assert_eq!(first_message(&input), None);
    }

    #[test]
    fn test_batch_dates_must_be_ordered() {
        let mut input = batch();
        assert_eq!(first_message(&input), None);

        input.exp_date = input.mfg_date;
        assert_eq!(first_message(&input).unwrap(), "exp_date must be after mfg_date");

        input.exp_date = None;
        assert_eq!(first_message(&input).unwrap(), "exp_date is required");
    }

    #[test]
    fn test_batch_rejects_negative_amounts_and_bad_status() {
        let mut input = batch();
        input.price = Decimal::new(-1, 0);
        assert_eq!(first_message(&input).unwrap(), "price must be greater than or equal to 0");

        let mut input = batch();
        input.status = "shipped".into();
        assert!(first_message(&input).unwrap().starts_with("status must be one of: planned, released"));
    }

    #[test]
    fn test_batch_recall_reason_must_be_object() {
        let mut input = batch();
        input.recall_reason = Some(serde_json::json!("contaminated"));
        assert_eq!(first_message(&input).unwrap(), "recall_reason must be a well-formed JSON object");

        input.recall_reason = Some(serde_json::json!({"code": "C1", "note": "contaminated"}));
        assert_eq!(first_message(&input), None);
    }

    #[test]
    fn test_patch_with_only_zero_values_is_valid() {
        assert_eq!(first_message(&DrugPatch::default()), None);
        assert_eq!(first_message(&BatchPatch::default()), None);
        assert_eq!(first_message(&RegistrationPatch::default()), None);
    }

    #[test]
    fn test_patch_checks_supplied_fields() {
        let patch = BatchPatch {
            status: "lost".into(),
            ..Default::default()
        };
        assert!(first_message(&patch).unwrap().starts_with("status must be one of"));

        let patch = DrugPatch {
            api_id: -4,
            ..Default::default()
        };
        assert_eq!(first_message(&patch).unwrap(), "api_id must be a valid identifier");
    }

    #[test]
    fn test_registration_window() {
        let input = RegistrationInput {
            drug_id: 1,
            ma_id: 2,
            valid_from: NaiveDate::from_ymd_opt(2025, 6, 1),
            valid_to: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Default::default()
        };
        let mut input = input;
        input.normalize();
        assert_eq!(input.status, "active");
        assert_eq!(first_message(&input).unwrap(), "valid_to must be after valid_from");
    }

    #[test]
    fn test_unknown_field_rejected_by_payload_types() {
        assert!(decode_strict::<BatchPatch>(br#"{"qty": 5}"#).is_err());
        assert!(decode_strict::<IngredientInput>(br#"{"name":"x","is_controlled":true}"#).is_err());
    }

    #[test]
    fn test_blank_dates_accepted_in_patches() {
        let patch: BatchPatch = decode_strict(br#"{"mfg_date": "", "exp_date": "2026-01-01"}"#).unwrap();
        assert_eq!(patch.mfg_date, None);
        assert_eq!(patch.exp_date, NaiveDate::from_ymd_opt(2026, 1, 1));
    }
}
