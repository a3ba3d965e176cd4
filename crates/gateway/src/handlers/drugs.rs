//! Drug handlers

use crate::extract::{EntityId, StrictJson};
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use drugreg_common::{
    db::models::{DrugInput, DrugOut, DrugPatch, DrugWithBatches},
    errors::Result,
    notifier::{notify_created, Confirmation},
};
use serde::Serialize;

/// Created drug plus the execution service's answer
#[derive(Serialize)]
pub struct DrugCreated {
    pub data: DrugOut,
    pub execs: Confirmation,
}

/// Create a drug, then notify the execution service.
///
/// The drug is stored regardless of the notification outcome, which is
/// reported in `execs`.
pub async fn create(
    State(state): State<AppState>,
    StrictJson(input): StrictJson<DrugInput>,
) -> Result<(StatusCode, Json<DrugCreated>)> {
    let drug = state.drugs().create(input).await?;
    let execs = notify_created(state.notifier.as_ref(), &drug, state.config.notifier_timeout()).await;

    Ok((StatusCode::CREATED, Json(DrugCreated { data: drug, execs })))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<DrugOut>>> {
    Ok(Json(state.drugs().list().await?))
}

pub async fn list_with_batches(State(state): State<AppState>) -> Result<Json<Vec<DrugWithBatches>>> {
    Ok(Json(state.drugs().list_with_batches().await?))
}

pub async fn update(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    StrictJson(patch): StrictJson<DrugPatch>,
) -> Result<Json<DrugOut>> {
    Ok(Json(state.drugs().update(id, patch).await?))
}
