//! Batch repository

use super::{fetch_all, fetch_one, insert_sql, opt_id, opt_text, patch_sql, prepare, statement};
use crate::db::models::{BatchInput, BatchOut, BatchPatch};
use crate::db::projection::{self, BATCH_RETURNING};
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::metrics::WriteTimer;
use crate::patch::collapse;
use crate::validation::ValidationEngine;
use std::sync::Arc;
use tracing::info;

const ENTITY: &str = "batch";

const COLUMNS: &[&str] = &[
    "drug_id",
    "batch_number",
    "mfg_date",
    "exp_date",
    "quantity",
    "price",
    "status",
    "recall_reason",
];

const LIST_ORDER: &str = "ORDER BY b.mfg_date DESC, b.id DESC";

#[derive(Clone)]
pub struct BatchRepository {
    pool: DbPool,
    validator: Arc<ValidationEngine>,
}

impl BatchRepository {
    pub fn new(pool: DbPool, validator: Arc<ValidationEngine>) -> Self {
        Self { pool, validator }
    }

    pub async fn create(&self, input: BatchInput) -> Result<BatchOut> {
        let timer = WriteTimer::start(ENTITY, "create");
        timer.finish(self.insert(input).await)
    }

    async fn insert(&self, input: BatchInput) -> Result<BatchOut> {
        let input = prepare(&self.validator, input)?;

        let sql = projection::with_cte(
            "ins",
            &insert_sql("batch", COLUMNS, BATCH_RETURNING),
            projection::batches("ins", ""),
        );
        let stmt = statement(
            sql,
            [
                input.drug_id.into(),
                input.batch_number.into(),
                input.mfg_date.into(),
                input.exp_date.into(),
                input.quantity.into(),
                input.price.into(),
                input.status.into(),
                input.recall_reason.into(),
            ],
        );

        let batch: BatchOut = fetch_one(self.pool.conn(), stmt)
            .await?
            .ok_or_else(|| AppError::Internal {
                message: "batch insert returned no row".to_string(),
            })?;

        info!(
            batch_id = batch.id,
            drug_id = batch.drug_id,
            batch_number = %batch.batch_number,
            "Batch created"
        );
        Ok(batch)
    }

    /// All batches, newest manufacturing date first
    pub async fn list(&self) -> Result<Vec<BatchOut>> {
        let stmt = statement(projection::batches("batch", LIST_ORDER), []);
        fetch_all(self.pool.conn(), stmt).await
    }

    /// Batches of one drug, newest manufacturing date first
    pub async fn list_for_drug(&self, drug_id: i64) -> Result<Vec<BatchOut>> {
        let tail = format!("WHERE b.drug_id = $1\n{LIST_ORDER}");
        let stmt = statement(projection::batches("batch", &tail), [drug_id.into()]);
        fetch_all(self.pool.conn(), stmt).await
    }

    /// Collapse-patch a batch.
    ///
    /// Only dates supplied together are ordered here; a single new date is
    /// checked against the stored one by the `batch_exp_after_mfg` CHECK.
    pub async fn update(&self, id: i64, patch: BatchPatch) -> Result<BatchOut> {
        let timer = WriteTimer::start(ENTITY, "update");
        timer.finish(self.patch(id, patch).await)
    }

    async fn patch(&self, id: i64, patch: BatchPatch) -> Result<BatchOut> {
        let patch = prepare(&self.validator, patch)?;

        let sql = projection::with_cte(
            "upd",
            &patch_sql("batch", COLUMNS, BATCH_RETURNING),
            projection::batches("upd", ""),
        );
        let stmt = statement(
            sql,
            [
                id.into(),
                opt_id(patch.drug_id),
                opt_text(&patch.batch_number),
                patch.mfg_date.into(),
                patch.exp_date.into(),
                collapse(&patch.quantity).into(),
                collapse(&patch.price).into(),
                opt_text(&patch.status),
                patch.recall_reason.into(),
            ],
        );

        let batch: BatchOut = fetch_one(self.pool.conn(), stmt)
            .await?
            .ok_or_else(|| AppError::not_found(ENTITY, id))?;

        info!(batch_id = batch.id, status = %batch.status, "Batch updated");
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::projection::fixtures::batch;
    use crate::db::repository::test_support::{batch_row, mock_pool, transaction_log, violation};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    fn repo(db: DbPool) -> BatchRepository {
        BatchRepository::new(db, Arc::new(ValidationEngine::standard()))
    }

    fn input() -> BatchInput {
        BatchInput {
            drug_id: 1,
            batch_number: "B-001".into(),
            mfg_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            exp_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            quantity: 500,
            price: Decimal::new(1999, 2),
            status: "Released".into(),
            recall_reason: None,
        }
    }

    #[tokio::test]
    async fn test_expiry_before_manufacture_rejected_before_storage() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let mut bad = input();
        bad.exp_date = NaiveDate::from_ymd_opt(2023, 12, 31);

        let err = repo(db.clone()).create(bad).await.unwrap_err();
        assert_eq!(err.to_string(), "exp_date must be after mfg_date");
        assert!(transaction_log(&db).is_empty());
    }

    #[tokio::test]
    async fn test_create_lowercases_status() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![batch_row(&batch(1, 1))]])
            .into_connection());

        let created = repo(db.clone()).create(input()).await.unwrap();
        assert_eq!(created.api_name, "Paracetamol");

        let log = format!("{:?}", transaction_log(&db));
        assert!(log.contains("\"released\""), "{log}");
    }

    #[tokio::test]
    async fn test_duplicate_batch_number_per_drug() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([violation("23505", "batch_drug_id_batch_number_key")])
            .into_connection());

        let err = repo(db).create(input()).await.unwrap_err();
        assert_eq!(err.to_string(), "batch with this batch_number already exists");
    }

    #[tokio::test]
    async fn test_date_check_violation_reads_as_validation() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([violation("23514", "batch_exp_after_mfg")])
            .into_connection());

        let patch = BatchPatch {
            exp_date: NaiveDate::from_ymd_opt(2020, 1, 1),
            ..Default::default()
        };
        let err = repo(db).update(1, patch).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(err.to_string(), "exp_date must be after mfg_date");
    }

    #[tokio::test]
    async fn test_update_zero_quantity_and_price_keep_stored() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![batch_row(&batch(4, 1))]])
            .into_connection());

        let patch = BatchPatch {
            status: "on_hold".into(),
            ..Default::default()
        };
        repo(db.clone()).update(4, patch).await.unwrap();

        let log = transaction_log(&db);
        let rendered = format!("{:?}", log[0]);
        assert!(rendered.contains(&format!("{:?}", Value::BigInt(None))));
        assert!(rendered.contains("quantity = COALESCE($6, quantity)"));
        assert!(rendered.contains("\"on_hold\""));
    }

    #[tokio::test]
    async fn test_list_for_drug_filters_by_id() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![batch_row(&batch(2, 7)), batch_row(&batch(1, 7))]])
            .into_connection());

        let batches = repo(db.clone()).list_for_drug(7).await.unwrap();
        assert_eq!(batches.len(), 2);

        let log = format!("{:?}", transaction_log(&db));
        assert!(log.contains("WHERE b.drug_id = $1"), "{log}");
        assert!(log.contains("ORDER BY b.mfg_date DESC, b.id DESC"));
    }
}
