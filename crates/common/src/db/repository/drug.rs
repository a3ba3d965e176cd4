//! Drug repository
//!
//! Drugs are always returned as the joined projection, so every write is an
//! `INSERT`/`UPDATE ... RETURNING` inside a CTE that the projection selects
//! from.

use super::{fetch_all, fetch_one, insert_sql, opt_id, opt_text, patch_sql, prepare, statement};
use crate::db::models::{BatchOut, DrugInput, DrugOut, DrugPatch, DrugWithBatches};
use crate::db::projection::{self, DRUG_RETURNING};
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::metrics::WriteTimer;
use crate::validation::ValidationEngine;
use std::sync::Arc;
use tracing::{debug, info};

const ENTITY: &str = "drug";

const COLUMNS: &[&str] = &[
    "brand_name",
    "dose",
    "api_id",
    "dosage_id",
    "route_id",
    "strength_id",
    "authority_holder_id",
    "manufacturing_site_id",
    "marketing_id",
];

const LIST_ORDER: &str = "ORDER BY lower(d.brand_name), d.id";

const BATCHES_FOR_DRUGS: &str = "WHERE b.drug_id = ANY($1)\nORDER BY b.mfg_date DESC, b.id DESC";

#[derive(Clone)]
pub struct DrugRepository {
    pool: DbPool,
    validator: Arc<ValidationEngine>,
}

impl DrugRepository {
    pub fn new(pool: DbPool, validator: Arc<ValidationEngine>) -> Self {
        Self { pool, validator }
    }

    /// Validate and insert a drug, returning it with resolved reference names
    pub async fn create(&self, input: DrugInput) -> Result<DrugOut> {
        let timer = WriteTimer::start(ENTITY, "create");
        timer.finish(self.insert(input).await)
    }

    async fn insert(&self, input: DrugInput) -> Result<DrugOut> {
        let input = prepare(&self.validator, input)?;

        let sql = projection::with_cte(
            "ins",
            &insert_sql("drug", COLUMNS, DRUG_RETURNING),
            projection::drugs("ins", ""),
        );
        let stmt = statement(
            sql,
            [
                input.brand_name.into(),
                input.dose.into(),
                input.api_id.into(),
                input.dosage_id.into(),
                input.route_id.into(),
                input.strength_id.into(),
                input.authority_holder_id.into(),
                input.manufacturing_site_id.into(),
                input.marketing_id.into(),
            ],
        );

        let drug: DrugOut = fetch_one(self.pool.conn(), stmt)
            .await?
            .ok_or_else(|| AppError::Internal {
                message: "drug insert returned no row".to_string(),
            })?;

        info!(drug_id = drug.id, brand_name = %drug.brand_name, "Drug created");
        Ok(drug)
    }

    /// All drugs, case-insensitively by brand name then id
    pub async fn list(&self) -> Result<Vec<DrugOut>> {
        let stmt = statement(projection::drugs("drug", LIST_ORDER), []);
        fetch_all(self.pool.conn(), stmt).await
    }

    /// All drugs with their batches nested, in two queries
    pub async fn list_with_batches(&self) -> Result<Vec<DrugWithBatches>> {
        let drugs = self.list().await?;
        if drugs.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = drugs.iter().map(|d| d.id).collect();
        let stmt = statement(projection::batches("batch", BATCHES_FOR_DRUGS), [ids.into()]);
        let batches: Vec<BatchOut> = fetch_all(self.pool.conn(), stmt).await?;

        debug!(drugs = drugs.len(), batches = batches.len(), "Grouping batches");
        Ok(projection::group_batches(drugs, batches))
    }

    /// Collapse-patch a drug; `0` ids and blank text keep the stored value
    pub async fn update(&self, id: i64, patch: DrugPatch) -> Result<DrugOut> {
        let timer = WriteTimer::start(ENTITY, "update");
        timer.finish(self.patch(id, patch).await)
    }

    async fn patch(&self, id: i64, patch: DrugPatch) -> Result<DrugOut> {
        let patch = prepare(&self.validator, patch)?;

        let sql = projection::with_cte(
            "upd",
            &patch_sql("drug", COLUMNS, DRUG_RETURNING),
            projection::drugs("upd", ""),
        );
        let stmt = statement(
            sql,
            [
                id.into(),
                opt_text(&patch.brand_name),
                opt_text(&patch.dose),
                opt_id(patch.api_id),
                opt_id(patch.dosage_id),
                opt_id(patch.route_id),
                opt_id(patch.strength_id),
                opt_id(patch.authority_holder_id),
                opt_id(patch.manufacturing_site_id),
                opt_id(patch.marketing_id),
            ],
        );

        let drug: DrugOut = fetch_one(self.pool.conn(), stmt)
            .await?
            .ok_or_else(|| AppError::not_found(ENTITY, id))?;

        info!(drug_id = drug.id, "Drug updated");
        Ok(drug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::projection::fixtures::{batch, drug};
    use crate::db::repository::test_support::{batch_row, drug_row, mock_pool, transaction_log, violation, Row};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn repo(db: DbPool) -> DrugRepository {
        DrugRepository::new(db, Arc::new(ValidationEngine::standard()))
    }

    fn input() -> DrugInput {
        DrugInput {
            brand_name: " Panadol ".into(),
            dose: "500mg".into(),
            api_id: 1,
            dosage_id: 2,
            route_id: 3,
            strength_id: 4,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_returns_resolved_names() {
        let mut out = drug(10, "Panadol");
        out.marketing_id = Some(5);
        out.marketing_name = Some("EMA-2025-001".into());
        out.marketing_country = Some("NL".into());

        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![drug_row(&out)]])
            .into_connection());

        let created = repo(db.clone()).create(input()).await.unwrap();
        assert_eq!(created.api_name, "Paracetamol");
        assert_eq!(created.marketing_country.as_deref(), Some("NL"));
        assert_eq!(created.authority_holder_name, None);

        let log = format!("{:?}", transaction_log(&db));
        assert!(log.contains("WITH ins AS"), "{log}");
        assert!(log.contains("Panadol"));
    }

    #[tokio::test]
    async fn test_missing_reference_is_invalid_reference() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([violation("23503", "drug_api_id_fkey")])
            .into_connection());

        let err = repo(db).create(input()).await.unwrap_err();
        match err {
            AppError::InvalidReference { relation } => {
                assert_eq!(relation, "drug.api_id -> ingredient")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_orders_by_brand_name() {
        let rows: Vec<Row> = [drug(2, "amoxil"), drug(1, "Brufen")].iter().map(drug_row).collect();
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .into_connection());

        let drugs = repo(db.clone()).list().await.unwrap();
        assert_eq!(drugs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![2, 1]);

        let log = format!("{:?}", transaction_log(&db));
        assert!(log.contains("ORDER BY lower(d.brand_name), d.id"), "{log}");
    }

    #[tokio::test]
    async fn test_list_with_batches_groups_by_drug() {
        let drugs: Vec<Row> = [drug(1, "Amoxil"), drug(2, "Brufen")].iter().map(drug_row).collect();
        let batches: Vec<Row> = [batch(21, 2), batch(20, 2)].iter().map(batch_row).collect();
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([drugs])
            .append_query_results([batches])
            .into_connection());

        let grouped = repo(db.clone()).list_with_batches().await.unwrap();
        assert_eq!(grouped.len(), 2);
        assert!(grouped[0].batches.is_empty());
        assert_eq!(grouped[1].batches.iter().map(|b| b.id).collect::<Vec<_>>(), vec![21, 20]);

        let log = transaction_log(&db);
        assert_eq!(log.len(), 2);
        assert!(format!("{:?}", log[1]).contains("ANY($1)"));
    }

    #[tokio::test]
    async fn test_list_with_batches_skips_second_query_when_empty() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Row>::new()])
            .into_connection());

        let grouped = repo(db.clone()).list_with_batches().await.unwrap();
        assert!(grouped.is_empty());
        assert_eq!(transaction_log(&db).len(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_drug_is_not_found() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Row>::new()])
            .into_connection());

        let patch = DrugPatch {
            dose: "250mg".into(),
            ..Default::default()
        };
        let err = repo(db).update(99, patch).await.unwrap_err();
        assert_eq!(err.to_string(), "Resource not found: drug with id 99");
    }

    #[tokio::test]
    async fn test_repeated_patch_sends_identical_statement() {
        let mut patched = drug(1, "Panadol");
        patched.dose = "250mg".into();
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![drug_row(&patched)]])
            .append_query_results([vec![drug_row(&patched)]])
            .into_connection());
        let repo = repo(db.clone());

        let patch = DrugPatch {
            dose: "250mg".into(),
            ..Default::default()
        };
        repo.update(1, patch.clone()).await.unwrap();
        repo.update(1, patch).await.unwrap();

        let log = transaction_log(&db);
        assert_eq!(log[0], log[1]);
        assert!(format!("{:?}", log[0]).contains("brand_name = COALESCE($2, brand_name)"));
    }
}
