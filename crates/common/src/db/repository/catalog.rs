//! Catalog repository, generic over the seven catalog kinds
//!
//! A [`CatalogKind`] names the entity, its payload types and the two write
//! statements; listing, error translation, logging and metrics are shared.

use super::{insert_sql, opt_text, patch_sql, prepare, statement};
use crate::db::constraint;
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::metrics::WriteTimer;
use crate::validation::ValidationEngine;
use sea_orm::sea_query::Expr;
use sea_orm::{EntityTrait, FromQueryResult, Order, QueryOrder, Select, Statement};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::info;

/// A catalog entity family
pub trait CatalogKind: Send + Sync + 'static {
    type Entity: EntityTrait<Model = Self::Row>;
    type Row: FromQueryResult + Serialize + Send + Sync;
    type Input: Normalize + DeserializeOwned + Send + 'static;
    type Patch: Normalize + DeserializeOwned + Send + 'static;

    /// Human-readable entity name used in logs, metrics and errors
    const ENTITY: &'static str;

    fn row_id(row: &Self::Row) -> i64;

    /// `INSERT ... RETURNING *` for a validated input
    fn insert(input: &Self::Input) -> Statement;

    /// Collapse-patch `UPDATE ... RETURNING *` for a validated patch
    fn update(id: i64, patch: &Self::Patch) -> Statement;

    /// All rows ordered case-insensitively by name, ties broken by id
    fn list() -> Select<Self::Entity> {
        Self::Entity::find()
            .order_by(Expr::cust("lower(name)"), Order::Asc)
            .order_by(Expr::cust("id"), Order::Asc)
    }
}

// ============================================================================
// Kinds
// ============================================================================

pub struct Ingredients;

impl CatalogKind for Ingredients {
    type Entity = IngredientEntity;
    type Row = Ingredient;
    type Input = IngredientInput;
    type Patch = IngredientPatch;

    const ENTITY: &'static str = "ingredient";

    fn row_id(row: &Ingredient) -> i64 {
        row.id
    }

    fn insert(i: &IngredientInput) -> Statement {
        statement(
            insert_sql("ingredient", &["name", "status", "is_psychotropic"], "RETURNING *"),
            [i.name.clone().into(), i.status.clone().into(), i.is_psychotropic.into()],
        )
    }

    fn update(id: i64, p: &IngredientPatch) -> Statement {
        statement(
            patch_sql("ingredient", &["name", "status", "is_psychotropic"], "RETURNING *"),
            [id.into(), opt_text(&p.name), opt_text(&p.status), p.is_psychotropic.into()],
        )
    }
}

pub struct DosageForms;

impl CatalogKind for DosageForms {
    type Entity = DosageFormEntity;
    type Row = DosageForm;
    type Input = DosageFormInput;
    type Patch = DosageFormPatch;

    const ENTITY: &'static str = "dosage form";

    fn row_id(row: &DosageForm) -> i64 {
        row.id
    }

    fn insert(i: &DosageFormInput) -> Statement {
        statement(
            insert_sql("dosage_form", &["code", "name"], "RETURNING *"),
            [i.code.clone().into(), i.name.clone().into()],
        )
    }

    fn update(id: i64, p: &DosageFormPatch) -> Statement {
        statement(
            patch_sql("dosage_form", &["code", "name"], "RETURNING *"),
            [id.into(), opt_text(&p.code), opt_text(&p.name)],
        )
    }
}

pub struct RoutesOfAdmin;

impl CatalogKind for RoutesOfAdmin {
    type Entity = RouteOfAdminEntity;
    type Row = RouteOfAdmin;
    type Input = RouteOfAdminInput;
    type Patch = RouteOfAdminPatch;

    const ENTITY: &'static str = "route of administration";

    fn row_id(row: &RouteOfAdmin) -> i64 {
        row.id
    }

    fn insert(i: &RouteOfAdminInput) -> Statement {
        statement(
            insert_sql("route_of_admin", &["code", "name"], "RETURNING *"),
            [i.code.clone().into(), i.name.clone().into()],
        )
    }

    fn update(id: i64, p: &RouteOfAdminPatch) -> Statement {
        statement(
            patch_sql("route_of_admin", &["code", "name"], "RETURNING *"),
            [id.into(), opt_text(&p.code), opt_text(&p.name)],
        )
    }
}

pub struct StrengthUnits;

impl CatalogKind for StrengthUnits {
    type Entity = StrengthUnitEntity;
    type Row = StrengthUnit;
    type Input = StrengthUnitInput;
    type Patch = StrengthUnitPatch;

    const ENTITY: &'static str = "strength unit";

    fn row_id(row: &StrengthUnit) -> i64 {
        row.id
    }

    fn insert(i: &StrengthUnitInput) -> Statement {
        statement(
            insert_sql("strength_unit", &["code", "name"], "RETURNING *"),
            [i.code.clone().into(), i.name.clone().into()],
        )
    }

    fn update(id: i64, p: &StrengthUnitPatch) -> Statement {
        statement(
            patch_sql("strength_unit", &["code", "name"], "RETURNING *"),
            [id.into(), opt_text(&p.code), opt_text(&p.name)],
        )
    }
}

pub struct AuthorityHolders;

impl CatalogKind for AuthorityHolders {
    type Entity = AuthorityHolderEntity;
    type Row = AuthorityHolder;
    type Input = AuthorityHolderInput;
    type Patch = AuthorityHolderPatch;

    const ENTITY: &'static str = "authority holder";

    fn row_id(row: &AuthorityHolder) -> i64 {
        row.id
    }

    fn insert(i: &AuthorityHolderInput) -> Statement {
        statement(
            insert_sql("authority_holder", &["name", "country", "registration_number"], "RETURNING *"),
            [i.name.clone().into(), i.country.clone().into(), i.registration_number.clone().into()],
        )
    }

    fn update(id: i64, p: &AuthorityHolderPatch) -> Statement {
        statement(
            patch_sql("authority_holder", &["name", "country", "registration_number"], "RETURNING *"),
            [id.into(), opt_text(&p.name), opt_text(&p.country), opt_text(&p.registration_number)],
        )
    }
}

pub struct ManufacturingSites;

impl CatalogKind for ManufacturingSites {
    type Entity = ManufacturingSiteEntity;
    type Row = ManufacturingSite;
    type Input = ManufacturingSiteInput;
    type Patch = ManufacturingSitePatch;

    const ENTITY: &'static str = "manufacturing site";

    fn row_id(row: &ManufacturingSite) -> i64 {
        row.id
    }

    fn insert(i: &ManufacturingSiteInput) -> Statement {
        statement(
            insert_sql("manufacturing_site", &["name", "country"], "RETURNING *"),
            [i.name.clone().into(), i.country.clone().into()],
        )
    }

    fn update(id: i64, p: &ManufacturingSitePatch) -> Statement {
        statement(
            patch_sql("manufacturing_site", &["name", "country"], "RETURNING *"),
            [id.into(), opt_text(&p.name), opt_text(&p.country)],
        )
    }
}

pub struct MarketingAuthorizations;

impl CatalogKind for MarketingAuthorizations {
    type Entity = MarketingAuthorizationEntity;
    type Row = MarketingAuthorization;
    type Input = MarketingAuthorizationInput;
    type Patch = MarketingAuthorizationPatch;

    const ENTITY: &'static str = "marketing authorization";

    fn row_id(row: &MarketingAuthorization) -> i64 {
        row.id
    }

    fn insert(i: &MarketingAuthorizationInput) -> Statement {
        statement(
            insert_sql(
                "marketing_authorization",
                &["name", "country", "status", "valid_from", "valid_to"],
                "RETURNING *",
            ),
            [
                i.name.clone().into(),
                i.country.clone().into(),
                i.status.clone().into(),
                i.valid_from.into(),
                i.valid_to.into(),
            ],
        )
    }

    fn update(id: i64, p: &MarketingAuthorizationPatch) -> Statement {
        statement(
            patch_sql(
                "marketing_authorization",
                &["name", "country", "status", "valid_from", "valid_to"],
                "RETURNING *",
            ),
            [
                id.into(),
                opt_text(&p.name),
                opt_text(&p.country),
                opt_text(&p.status),
                p.valid_from.into(),
                p.valid_to.into(),
            ],
        )
    }
}

// ============================================================================
// Repository
// ============================================================================

/// Create / list / patch for one catalog kind
pub struct CatalogRepository<K: CatalogKind> {
    pool: DbPool,
    validator: Arc<ValidationEngine>,
    _kind: PhantomData<K>,
}

impl<K: CatalogKind> Clone for CatalogRepository<K> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            validator: self.validator.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: CatalogKind> CatalogRepository<K> {
    pub fn new(pool: DbPool, validator: Arc<ValidationEngine>) -> Self {
        Self {
            pool,
            validator,
            _kind: PhantomData,
        }
    }

    /// Validate and insert a new catalog row
    pub async fn create(&self, input: K::Input) -> Result<K::Row> {
        let timer = WriteTimer::start(K::ENTITY, "create");
        timer.finish(self.insert(input).await)
    }

    async fn insert(&self, input: K::Input) -> Result<K::Row> {
        let input = prepare(&self.validator, input)?;

        let row = K::Entity::find()
            .from_raw_sql(K::insert(&input))
            .one(self.pool.conn())
            .await
            .map_err(constraint::translate)?
            .ok_or_else(|| AppError::Internal {
                message: format!("insert into {} returned no row", K::ENTITY),
            })?;

        info!(entity = K::ENTITY, id = K::row_id(&row), "Catalog entry created");
        Ok(row)
    }

    pub async fn list(&self) -> Result<Vec<K::Row>> {
        K::list()
            .all(self.pool.conn())
            .await
            .map_err(constraint::translate)
    }

    /// Apply a collapse-patch; zero-valued fields keep their stored value
    pub async fn update(&self, id: i64, patch: K::Patch) -> Result<K::Row> {
        let timer = WriteTimer::start(K::ENTITY, "update");
        timer.finish(self.patch(id, patch).await)
    }

    async fn patch(&self, id: i64, patch: K::Patch) -> Result<K::Row> {
        let patch = prepare(&self.validator, patch)?;

        let row = K::Entity::find()
            .from_raw_sql(K::update(id, &patch))
            .one(self.pool.conn())
            .await
            .map_err(constraint::translate)?
            .ok_or_else(|| AppError::not_found(K::ENTITY, id))?;

        info!(entity = K::ENTITY, id, "Catalog entry updated");
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::projection::fixtures::timestamp;
    use crate::db::repository::test_support::{mock_pool, transaction_log, violation};
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};

    fn repo<K: CatalogKind>(db: DbPool) -> CatalogRepository<K> {
        CatalogRepository::new(db, Arc::new(ValidationEngine::standard()))
    }

    fn dosage_form(id: i64, code: &str, name: &str) -> DosageForm {
        DosageForm {
            id,
            code: code.into(),
            name: name.into(),
            created_at: timestamp(),
            updated_at: timestamp(),
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_then_inserts() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![dosage_form(1, "TAB", "Tablet")]])
            .into_connection());
        let repo = repo::<DosageForms>(db.clone());

        let row = repo
            .create(DosageFormInput {
                code: " tab".into(),
                name: "Tablet ".into(),
            })
            .await
            .unwrap();
        assert_eq!(row.id, 1);

        let expected = DosageForms::insert(&DosageFormInput {
            code: "TAB".into(),
            name: "Tablet".into(),
        });
        assert_eq!(transaction_log(&db), vec![Transaction::one(expected)]);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_storage() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = repo::<Ingredients>(db.clone());

        let err = repo
            .create(IngredientInput {
                name: "   ".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "name is required");
        assert!(transaction_log(&db).is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_natural_key_is_already_exists() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([violation("23505", "dosage_form_code_key")])
            .into_connection());
        let repo = repo::<DosageForms>(db);

        let err = repo
            .create(DosageFormInput {
                code: "TAB".into(),
                name: "Tablet".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists { .. }));
        assert_eq!(err.to_string(), "dosage form with this code already exists");
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<DosageForm>::new()])
            .into_connection());
        let repo = repo::<DosageForms>(db);

        let err = repo
            .update(
                404,
                DosageFormPatch {
                    name: "Capsule".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_binds_zero_values_as_null() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![dosage_form(3, "CAP", "Capsule")]])
            .into_connection());
        let repo = repo::<DosageForms>(db.clone());

        repo.update(
            3,
            DosageFormPatch {
                code: String::new(),
                name: " Capsule ".into(),
            },
        )
        .await
        .unwrap();

        let expected = statement(
            patch_sql("dosage_form", &["code", "name"], "RETURNING *"),
            [3_i64.into(), Option::<String>::None.into(), "Capsule".to_string().into()],
        );
        assert_eq!(transaction_log(&db), vec![Transaction::one(expected)]);
    }

    #[tokio::test]
    async fn test_patch_is_validated_when_supplied() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = repo::<MarketingAuthorizations>(db.clone());

        let err = repo
            .update(
                1,
                MarketingAuthorizationPatch {
                    status: "pending".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "status must be one of: active, suspended, revoked, expired"
        );
        assert!(transaction_log(&db).is_empty());
    }

    #[tokio::test]
    async fn test_list_orders_by_lower_name() {
        let db = mock_pool(MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![dosage_form(2, "CAP", "capsule"), dosage_form(1, "TAB", "Tablet")]])
            .into_connection());
        let repo = repo::<DosageForms>(db.clone());

        let rows = repo.list().await.unwrap();
        assert_eq!(rows.len(), 2);

        let log = transaction_log(&db);
        let sql = format!("{:?}", log[0]);
        assert!(sql.contains("ORDER BY lower(name) ASC, id ASC"), "{sql}");
    }
}
