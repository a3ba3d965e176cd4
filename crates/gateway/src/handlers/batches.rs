//! Batch handlers

use crate::extract::{EntityId, StrictJson};
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use drugreg_common::{
    db::models::{BatchInput, BatchOut, BatchPatch},
    errors::Result,
};

pub async fn create(
    State(state): State<AppState>,
    StrictJson(input): StrictJson<BatchInput>,
) -> Result<(StatusCode, Json<BatchOut>)> {
    let batch = state.batches().create(input).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<BatchOut>>> {
    Ok(Json(state.batches().list().await?))
}

/// `GET /drugs/{id}/batches`
pub async fn list_for_drug(
    State(state): State<AppState>,
    EntityId(drug_id): EntityId,
) -> Result<Json<Vec<BatchOut>>> {
    Ok(Json(state.batches().list_for_drug(drug_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    StrictJson(patch): StrictJson<BatchPatch>,
) -> Result<Json<BatchOut>> {
    Ok(Json(state.batches().update(id, patch).await?))
}
