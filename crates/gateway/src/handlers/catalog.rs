//! Catalog handlers, generic over the catalog kind

use crate::extract::{EntityId, StrictJson};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{patch, post},
    Json, Router,
};
use drugreg_common::{db::CatalogKind, errors::Result};

/// `POST`/`GET {path}` and `PATCH {path}/{id}` for one catalog kind
pub fn routes<K: CatalogKind>(path: &str) -> Router<AppState> {
    Router::new()
        .route(path, post(create::<K>).get(list::<K>))
        .route(&format!("{path}/{{id}}"), patch(update::<K>))
}

async fn create<K: CatalogKind>(
    State(state): State<AppState>,
    StrictJson(input): StrictJson<K::Input>,
) -> Result<(StatusCode, Json<K::Row>)> {
    let row = state.catalog::<K>().create(input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn list<K: CatalogKind>(State(state): State<AppState>) -> Result<Json<Vec<K::Row>>> {
    Ok(Json(state.catalog::<K>().list().await?))
}

async fn update<K: CatalogKind>(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    StrictJson(patch): StrictJson<K::Patch>,
) -> Result<Json<K::Row>> {
    Ok(Json(state.catalog::<K>().update(id, patch).await?))
}
