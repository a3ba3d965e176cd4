//! Drug registration repository
//!
//! A registration ties a drug to a marketing authorization. Site and holder
//! link rows hang off a registration and are managed through the same
//! repository, since neither exists without one.

use super::{fetch_all, fetch_one, insert_sql, opt_id, opt_text, patch_sql, prepare, statement};
use crate::db::models::{
    RegistrationHolderInput, RegistrationHolderOut, RegistrationHolderPatch, RegistrationInput,
    RegistrationOut, RegistrationPatch, RegistrationSiteInput, RegistrationSiteOut,
    RegistrationSitePatch,
};
use crate::db::projection::{self, LINK_RETURNING, REGISTRATION_RETURNING};
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::metrics::WriteTimer;
use crate::validation::ValidationEngine;
use std::sync::Arc;
use tracing::info;

const REGISTRATION: &str = "drug registration";
const SITE: &str = "registration site";
const HOLDER: &str = "registration holder";

const REGISTRATION_COLUMNS: &[&str] = &[
    "drug_id",
    "ma_id",
    "registration_number",
    "status",
    "valid_from",
    "valid_to",
    "is_primary",
];
const SITE_COLUMNS: &[&str] = &["drug_registration_id", "site_id", "role"];
const HOLDER_COLUMNS: &[&str] = &["drug_registration_id", "auth_holder_id", "role"];

const REGISTRATION_ORDER: &str = "ORDER BY dr.valid_from DESC NULLS LAST, dr.id DESC";
const LINK_ORDER: &str = "ORDER BY l.id";

fn no_row(entity: &str) -> AppError {
    AppError::Internal {
        message: format!("{entity} insert returned no row"),
    }
}

#[derive(Clone)]
pub struct RegistrationRepository {
    pool: DbPool,
    validator: Arc<ValidationEngine>,
}

impl RegistrationRepository {
    pub fn new(pool: DbPool, validator: Arc<ValidationEngine>) -> Self {
        Self { pool, validator }
    }

    // ------------------------------------------------------------------
    // Registrations
    // ------------------------------------------------------------------

    pub async fn create(&self, input: RegistrationInput) -> Result<RegistrationOut> {
        let timer = WriteTimer::start(REGISTRATION, "create");
        timer.finish(self.insert(input).await)
    }

    async fn insert(&self, input: RegistrationInput) -> Result<RegistrationOut> {
        let input = prepare(&self.validator, input)?;

        let sql = projection::with_cte(
            "ins",
            &insert_sql("drug_registration", REGISTRATION_COLUMNS, REGISTRATION_RETURNING),
            projection::registrations("ins", ""),
        );
        let stmt = statement(
            sql,
            [
                input.drug_id.into(),
                input.ma_id.into(),
                input.registration_number.into(),
                input.status.into(),
                input.valid_from.into(),
                input.valid_to.into(),
                input.is_primary.into(),
            ],
        );

        let registration: RegistrationOut = fetch_one(self.pool.conn(), stmt)
            .await?
            .ok_or_else(|| no_row(REGISTRATION))?;

        info!(
            registration_id = registration.id,
            drug_id = registration.drug_id,
            ma_id = registration.ma_id,
            "Drug registration created"
        );
        Ok(registration)
    }

    /// Latest validity first; open-ended starts last
    pub async fn list(&self) -> Result<Vec<RegistrationOut>> {
        let stmt = statement(projection::registrations("drug_registration", REGISTRATION_ORDER), []);
        fetch_all(self.pool.conn(), stmt).await
    }

    pub async fn update(&self, id: i64, patch: RegistrationPatch) -> Result<RegistrationOut> {
        let timer = WriteTimer::start(REGISTRATION, "update");
        timer.finish(self.patch(id, patch).await)
    }

    async fn patch(&self, id: i64, patch: RegistrationPatch) -> Result<RegistrationOut> {
        let patch = prepare(&self.validator, patch)?;

        let sql = projection::with_cte(
            "upd",
            &patch_sql("drug_registration", REGISTRATION_COLUMNS, REGISTRATION_RETURNING),
            projection::registrations("upd", ""),
        );
        let stmt = statement(
            sql,
            [
                id.into(),
                opt_id(patch.drug_id),
                opt_id(patch.ma_id),
                opt_text(&patch.registration_number),
                opt_text(&patch.status),
                patch.valid_from.into(),
                patch.valid_to.into(),
                patch.is_primary.into(),
            ],
        );

        let registration: RegistrationOut = fetch_one(self.pool.conn(), stmt)
            .await?
            .ok_or_else(|| AppError::not_found(REGISTRATION, id))?;

        info!(registration_id = registration.id, status = %registration.status, "Drug registration updated");
        Ok(registration)
    }

    // ------------------------------------------------------------------
    // Site links
    // ------------------------------------------------------------------

    pub async fn create_site(&self, input: RegistrationSiteInput) -> Result<RegistrationSiteOut> {
        let timer = WriteTimer::start(SITE, "create");
        timer.finish(self.insert_site(input).await)
    }

    async fn insert_site(&self, input: RegistrationSiteInput) -> Result<RegistrationSiteOut> {
        let input = prepare(&self.validator, input)?;

        let sql = projection::with_cte(
            "ins",
            &insert_sql("drug_registration_site", SITE_COLUMNS, LINK_RETURNING),
            projection::registration_sites("ins", ""),
        );
        let stmt = statement(
            sql,
            [
                input.drug_registration_id.into(),
                input.site_id.into(),
                input.role.into(),
            ],
        );

        let link: RegistrationSiteOut = fetch_one(self.pool.conn(), stmt)
            .await?
            .ok_or_else(|| no_row(SITE))?;

        info!(
            link_id = link.id,
            registration_id = link.drug_registration_id,
            site_id = link.site_id,
            "Registration site linked"
        );
        Ok(link)
    }

    pub async fn list_sites(&self) -> Result<Vec<RegistrationSiteOut>> {
        let stmt = statement(projection::registration_sites("drug_registration_site", LINK_ORDER), []);
        fetch_all(self.pool.conn(), stmt).await
    }

    pub async fn update_site(&self, id: i64, patch: RegistrationSitePatch) -> Result<RegistrationSiteOut> {
        let timer = WriteTimer::start(SITE, "update");
        timer.finish(self.patch_site(id, patch).await)
    }

    async fn patch_site(&self, id: i64, patch: RegistrationSitePatch) -> Result<RegistrationSiteOut> {
        let patch = prepare(&self.validator, patch)?;

        let sql = projection::with_cte(
            "upd",
            &patch_sql("drug_registration_site", SITE_COLUMNS, LINK_RETURNING),
            projection::registration_sites("upd", ""),
        );
        let stmt = statement(
            sql,
            [
                id.into(),
                opt_id(patch.drug_registration_id),
                opt_id(patch.site_id),
                opt_text(&patch.role),
            ],
        );

        fetch_one(self.pool.conn(), stmt)
            .await?
            .ok_or_else(|| AppError::not_found(SITE, id))
    }

    // ------------------------------------------------------------------
    // Holder links
    // ------------------------------------------------------------------

    pub async fn create_holder(&self, input: RegistrationHolderInput) -> Result<RegistrationHolderOut> {
        let timer = WriteTimer::start(HOLDER, "create");
        timer.finish(self.insert_holder(input).await)
    }

    async fn insert_holder(&self, input: RegistrationHolderInput) -> Result<RegistrationHolderOut> {
        let input = prepare(&self.validator, input)?;

        let sql = projection::with_cte(
            "ins",
            &insert_sql("drug_registration_auth_holder", HOLDER_COLUMNS, LINK_RETURNING),
            projection::registration_holders("ins", ""),
        );
        let stmt = statement(
            sql,
            [
                input.drug_registration_id.into(),
                input.auth_holder_id.into(),
                input.role.into(),
            ],
        );

        let link: RegistrationHolderOut = fetch_one(self.pool.conn(), stmt)
            .await?
            .ok_or_else(|| no_row(HOLDER))?;

        info!(
            link_id = link.id,
            registration_id = link.drug_registration_id,
            auth_holder_id = link.auth_holder_id,
            "Registration holder linked"
        );
        Ok(link)
    }

    pub async fn list_holders(&self) -> Result<Vec<RegistrationHolderOut>> {
        let stmt = statement(
            projection::registration_holders("drug_registration_auth_holder", LINK_ORDER),
            [],
        );
        fetch_all(self.pool.conn(), stmt).await
    }

    pub async fn update_holder(
        &self,
        id: i64,
        patch: RegistrationHolderPatch,
    ) -> Result<RegistrationHolderOut> {
        let timer = WriteTimer::start(HOLDER, "update");
        timer.finish(self.patch_holder(id, patch).await)
    }

    async fn patch_holder(&self, id: i64, patch: RegistrationHolderPatch) -> Result<RegistrationHolderOut> {
        let patch = prepare(&self.validator, patch)?;

        let sql = projection::with_cte(
            "upd",
            &patch_sql("drug_registration_auth_holder", HOLDER_COLUMNS, LINK_RETURNING),
            projection::registration_holders("upd", ""),
        );
        let stmt = statement(
            sql,
            [
                id.into(),
                opt_id(patch.drug_registration_id),
                opt_id(patch.auth_holder_id),
                opt_text(&patch.role),
            ],
        );

        fetch_one(self.pool.conn(), stmt)
            .await?
            .ok_or_else(|| AppError::not_found(HOLDER, id))
    }
}
