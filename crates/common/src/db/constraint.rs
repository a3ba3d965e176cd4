//! Translation of storage constraint violations into domain errors
//!
//! Postgres reports the SQLSTATE and the violated constraint name; both are
//! looked up in the tables below, which mirror the names declared in the
//! migrations. Anything unrecognized stays an [`AppError::Database`].

use crate::db::models::{
    AuthorizationStatus, BatchStatus, IngredientStatus, RegistrationStatus,
};
use crate::errors::AppError;
use crate::validation::{Violation, ViolationKind};
use sea_orm::{DbErr, RuntimeErr};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

/// Unique constraint → (entity, natural key).
const UNIQUE_KEYS: &[(&str, &str, &str)] = &[
    ("ingredient_name_key", "ingredient", "name"),
    ("dosage_form_code_key", "dosage form", "code"),
    ("route_of_admin_code_key", "route of administration", "code"),
    ("strength_unit_code_key", "strength unit", "code"),
    ("authority_holder_name_key", "authority holder", "name"),
    ("manufacturing_site_name_key", "manufacturing site", "name"),
    ("marketing_authorization_name_key", "marketing authorization", "name"),
    ("batch_drug_id_batch_number_key", "batch", "batch_number"),
    ("drug_registration_registration_number_key", "drug registration", "registration_number"),
    ("drug_registration_site_pair_key", "registration site", "site_id"),
    ("drug_registration_auth_holder_pair_key", "registration holder", "auth_holder_id"),
];

/// Foreign key constraint → relationship description.
const FOREIGN_KEYS: &[(&str, &str)] = &[
    ("drug_api_id_fkey", "drug.api_id -> ingredient"),
    ("drug_dosage_id_fkey", "drug.dosage_id -> dosage_form"),
    ("drug_route_id_fkey", "drug.route_id -> route_of_admin"),
    ("drug_strength_id_fkey", "drug.strength_id -> strength_unit"),
    ("drug_authority_holder_id_fkey", "drug.authority_holder_id -> authority_holder"),
    ("drug_manufacturing_site_id_fkey", "drug.manufacturing_site_id -> manufacturing_site"),
    ("drug_marketing_id_fkey", "drug.marketing_id -> marketing_authorization"),
    ("batch_drug_id_fkey", "batch.drug_id -> drug"),
    ("drug_registration_drug_id_fkey", "drug_registration.drug_id -> drug"),
    ("drug_registration_ma_id_fkey", "drug_registration.ma_id -> marketing_authorization"),
    (
        "drug_registration_site_drug_registration_id_fkey",
        "drug_registration_site.drug_registration_id -> drug_registration",
    ),
    ("drug_registration_site_site_id_fkey", "drug_registration_site.site_id -> manufacturing_site"),
    (
        "drug_registration_auth_holder_drug_registration_id_fkey",
        "drug_registration_auth_holder.drug_registration_id -> drug_registration",
    ),
    (
        "drug_registration_auth_holder_auth_holder_id_fkey",
        "drug_registration_auth_holder.auth_holder_id -> authority_holder",
    ),
];

fn check_violation(constraint: &str) -> Option<Violation> {
    let (field, kind) = match constraint {
        "batch_exp_after_mfg" => ("exp_date", ViolationKind::NotAfter { other: "mfg_date" }),
        "marketing_authorization_valid_window" | "drug_registration_valid_window" => {
            ("valid_to", ViolationKind::NotAfter { other: "valid_from" })
        }
        "batch_quantity_check" => ("quantity", ViolationKind::BelowMinimum { min: "0".into() }),
        "batch_price_check" => ("price", ViolationKind::BelowMinimum { min: "0".into() }),
        "ingredient_status_check" => ("status", one_of(IngredientStatus::VALUES)),
        "marketing_authorization_status_check" => ("status", one_of(AuthorizationStatus::VALUES)),
        "batch_status_check" => ("status", one_of(BatchStatus::VALUES)),
        "drug_registration_status_check" => ("status", one_of(RegistrationStatus::VALUES)),
        _ => return None,
    };
    Some(Violation { field, kind })
}

fn one_of(allowed: &'static [&'static str]) -> ViolationKind {
    ViolationKind::NotOneOf { allowed }
}

/// Map a SQLSTATE and constraint name to a domain error, if recognized.
pub fn classify(code: &str, constraint: Option<&str>) -> Option<AppError> {
    match code {
        UNIQUE_VIOLATION => {
            let name = constraint.unwrap_or_default();
            let (entity, key) = UNIQUE_KEYS
                .iter()
                .find(|(c, _, _)| *c == name)
                .map(|(_, entity, key)| (*entity, *key))
                .unwrap_or(("record", "key"));
            Some(AppError::AlreadyExists {
                entity: entity.to_string(),
                key: key.to_string(),
            })
        }
        FOREIGN_KEY_VIOLATION => {
            let name = constraint.unwrap_or_default();
            let relation = FOREIGN_KEYS
                .iter()
                .find(|(c, _)| *c == name)
                .map(|(_, relation)| relation.to_string())
                .unwrap_or_else(|| name.trim_end_matches("_fkey").to_string());
            Some(AppError::InvalidReference { relation })
        }
        CHECK_VIOLATION => constraint.and_then(check_violation).map(AppError::from),
        _ => None,
    }
}

/// Translate a storage error, keeping unrecognized failures as database errors.
pub fn translate(err: DbErr) -> AppError {
    let classified = match &err {
        DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db))) => db
            .code()
            .and_then(|code| classify(&code, db.constraint())),
        _ => None,
    };

    match classified {
        Some(app_err) => {
            tracing::debug!(error = %err, translated = %app_err, "Constraint violation");
            app_err
        }
        None => AppError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_names_entity_and_key() {
        let err = classify("23505", Some("dosage_form_code_key")).unwrap();
        assert_eq!(err.to_string(), "dosage form with this code already exists");

        let err = classify("23505", Some("batch_drug_id_batch_number_key")).unwrap();
        assert!(matches!(err, AppError::AlreadyExists { ref key, .. } if key == "batch_number"));
    }

    #[test]
    fn test_foreign_key_violation_names_relationship() {
        let err = classify("23503", Some("drug_api_id_fkey")).unwrap();
        match err {
            AppError::InvalidReference { relation } => {
                assert_eq!(relation, "drug.api_id -> ingredient")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_constraints_still_classified_by_code() {
        let err = classify("23503", Some("something_else_fkey")).unwrap();
        assert!(matches!(err, AppError::InvalidReference { ref relation } if relation == "something_else"));

        let err = classify("23505", None).unwrap();
        assert!(matches!(err, AppError::AlreadyExists { .. }));
    }

    #[test]
    fn test_check_violation_becomes_validation_message() {
        let err = classify("23514", Some("batch_exp_after_mfg")).unwrap();
        match err {
            AppError::Validation { message, field } => {
                assert_eq!(message, "exp_date must be after mfg_date");
                assert_eq!(field.as_deref(), Some("exp_date"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = classify("23514", Some("batch_status_check")).unwrap();
        assert!(err.to_string().starts_with("status must be one of: planned"));
    }

    #[test]
    fn test_other_codes_are_not_classified() {
        assert!(classify("40001", None).is_none());
        assert!(classify("23514", Some("unknown_check")).is_none());
    }

    #[test]
    fn test_non_sqlx_errors_stay_database_errors() {
        let err = translate(DbErr::RecordNotFound("drug".into()));
        assert!(matches!(err, AppError::Database(_)));
    }
}
