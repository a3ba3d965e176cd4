//! Joined read projections
//!
//! Every read shape is a SELECT over a row source (the base table, or an
//! `ins` / `upd` CTE wrapping an `INSERT ... RETURNING` / `UPDATE ...
//! RETURNING`) joined to the tables its references point at. Required
//! references use inner joins; optional ones use left joins so an unset
//! reference yields null names instead of dropping the row.

use crate::db::models::{BatchOut, DrugOut, DrugWithBatches};
use std::collections::HashMap;

const DRUG_SELECT: &str = "\
SELECT d.id, d.brand_name, d.dose,
       d.api_id, a.name AS api_name,
       d.dosage_id, df.name AS dosage_name,
       d.route_id, r.name AS route_name,
       d.strength_id, su.name AS strength_name,
       d.authority_holder_id, ah.name AS authority_holder_name, ah.country AS authority_holder_country,
       d.manufacturing_site_id, ms.name AS manufacturing_site_name, ms.country AS manufacturing_site_country,
       d.marketing_id, ma.name AS marketing_name, ma.country AS marketing_country,
       d.created_at, d.updated_at";

const DRUG_JOINS: &str = "\
JOIN ingredient a ON a.id = d.api_id
JOIN dosage_form df ON df.id = d.dosage_id
JOIN route_of_admin r ON r.id = d.route_id
JOIN strength_unit su ON su.id = d.strength_id
LEFT JOIN authority_holder ah ON ah.id = d.authority_holder_id
LEFT JOIN manufacturing_site ms ON ms.id = d.manufacturing_site_id
LEFT JOIN marketing_authorization ma ON ma.id = d.marketing_id";

/// Columns every write CTE over `drug` must return.
pub const DRUG_RETURNING: &str = "\
RETURNING id, brand_name, dose, api_id, dosage_id, route_id, strength_id,
          authority_holder_id, manufacturing_site_id, marketing_id, created_at, updated_at";

const BATCH_SELECT: &str = "\
SELECT b.id, b.drug_id, d.brand_name AS drug_brand_name, a.name AS api_name,
       b.batch_number, b.mfg_date, b.exp_date, b.quantity, b.price, b.status, b.recall_reason,
       b.created_at, b.updated_at";

const BATCH_JOINS: &str = "\
JOIN drug d ON d.id = b.drug_id
JOIN ingredient a ON a.id = d.api_id";

pub const BATCH_RETURNING: &str = "\
RETURNING id, drug_id, batch_number, mfg_date, exp_date, quantity, price, status, recall_reason,
          created_at, updated_at";

const REGISTRATION_SELECT: &str = "\
SELECT dr.id, dr.drug_id, d.brand_name AS drug_brand_name,
       dr.ma_id, ma.name AS ma_name, ma.country AS ma_country,
       dr.registration_number, dr.status, dr.valid_from, dr.valid_to, dr.is_primary,
       dr.created_at, dr.updated_at";

const REGISTRATION_JOINS: &str = "\
JOIN drug d ON d.id = dr.drug_id
JOIN marketing_authorization ma ON ma.id = dr.ma_id";

pub const REGISTRATION_RETURNING: &str = "\
RETURNING id, drug_id, ma_id, registration_number, status, valid_from, valid_to, is_primary,
          created_at, updated_at";

const SITE_SELECT: &str = "\
SELECT l.id, l.drug_registration_id, l.site_id, s.name AS site_name, s.country AS site_country,
       l.role, l.created_at, l.updated_at";

const SITE_JOINS: &str = "JOIN manufacturing_site s ON s.id = l.site_id";

const HOLDER_SELECT: &str = "\
SELECT l.id, l.drug_registration_id, l.auth_holder_id, h.name AS holder_name, h.country AS holder_country,
       l.role, l.created_at, l.updated_at";

const HOLDER_JOINS: &str = "JOIN authority_holder h ON h.id = l.auth_holder_id";

pub const LINK_RETURNING: &str = "RETURNING *";

fn compose(select: &str, source: &str, alias: &str, joins: &str, tail: &str) -> String {
    let mut sql = format!("{select}\nFROM {source} {alias}\n{joins}");
    if !tail.is_empty() {
        sql.push('\n');
        sql.push_str(tail);
    }
    sql
}

/// Wraps a data-modifying statement in a CTE and projects its rows.
pub fn with_cte(name: &str, statement: &str, projection: String) -> String {
    format!("WITH {name} AS (\n{statement}\n)\n{projection}")
}

/// Drug projection over `source` (`drug` or a CTE name), with an optional tail.
pub fn drugs(source: &str, tail: &str) -> String {
    compose(DRUG_SELECT, source, "d", DRUG_JOINS, tail)
}

pub fn batches(source: &str, tail: &str) -> String {
    compose(BATCH_SELECT, source, "b", BATCH_JOINS, tail)
}

pub fn registrations(source: &str, tail: &str) -> String {
    compose(REGISTRATION_SELECT, source, "dr", REGISTRATION_JOINS, tail)
}

pub fn registration_sites(source: &str, tail: &str) -> String {
    compose(SITE_SELECT, source, "l", SITE_JOINS, tail)
}

pub fn registration_holders(source: &str, tail: &str) -> String {
    compose(HOLDER_SELECT, source, "l", HOLDER_JOINS, tail)
}

/// Attach batches to their drugs.
///
/// Drug order is preserved, as is batch order within each drug. Drugs with
/// no batches get an empty list; batches whose drug is absent are dropped.
pub fn group_batches(drugs: Vec<DrugOut>, batches: Vec<BatchOut>) -> Vec<DrugWithBatches> {
    let mut by_drug: HashMap<i64, Vec<BatchOut>> = HashMap::with_capacity(drugs.len());
    for batch in batches {
        by_drug.entry(batch.drug_id).or_default().push(batch);
    }

    drugs
        .into_iter()
        .map(|drug| {
            let batches = by_drug.remove(&drug.id).unwrap_or_default();
            DrugWithBatches { drug, batches }
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::fixtures::{batch, drug};
    use super::*;

    #[test]
    fn test_required_references_inner_join_optional_left_join() {
        let sql = drugs("drug", "ORDER BY lower(d.brand_name), d.id");
        assert!(sql.contains("\nJOIN ingredient a ON a.id = d.api_id"));
        assert!(sql.contains("LEFT JOIN marketing_authorization ma ON ma.id = d.marketing_id"));
        assert!(sql.contains("FROM drug d"));
        assert!(sql.ends_with("ORDER BY lower(d.brand_name), d.id"));
    }

    #[test]
    fn test_cte_projection() {
        let sql = with_cte("ins", "INSERT INTO batch (drug_id) VALUES ($1) RETURNING *", batches("ins", ""));
        assert!(sql.starts_with("WITH ins AS (\nINSERT INTO batch"));
        assert!(sql.contains("FROM ins b\nJOIN drug d ON d.id = b.drug_id"));
    }

    #[test]
    fn test_group_batches_preserves_order_and_fills_empty() {
        let drugs = vec![drug(1, "Amoxil"), drug(2, "Brufen"), drug(3, "Zyrtec")];
        let batches = vec![batch(12, 3), batch(11, 1), batch(10, 3), batch(9, 99)];

        let grouped = group_batches(drugs, batches);
        let ids: Vec<i64> = grouped.iter().map(|g| g.drug.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert_eq!(grouped[0].batches.len(), 1);
        assert!(grouped[1].batches.is_empty());
        let third: Vec<i64> = grouped[2].batches.iter().map(|b| b.id).collect();
        assert_eq!(third, vec![12, 10]);
    }

    #[test]
    fn test_drug_with_batches_serializes_flat() {
        let grouped = group_batches(vec![drug(7, "Panadol")], vec![]);
        let json = serde_json::to_value(&grouped[0]).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["brand_name"], "Panadol");
        assert_eq!(json["batches"], serde_json::json!([]));
        assert!(json["marketing_name"].is_null());
    }
}
