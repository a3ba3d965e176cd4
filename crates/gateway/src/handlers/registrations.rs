//! Drug registration and link handlers

use crate::extract::{EntityId, StrictJson};
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use drugreg_common::{
    db::models::{
        RegistrationHolderInput, RegistrationHolderOut, RegistrationHolderPatch, RegistrationInput,
        RegistrationOut, RegistrationPatch, RegistrationSiteInput, RegistrationSiteOut,
        RegistrationSitePatch,
    },
    errors::Result,
};

pub async fn create(
    State(state): State<AppState>,
    StrictJson(input): StrictJson<RegistrationInput>,
) -> Result<(StatusCode, Json<RegistrationOut>)> {
    let registration = state.registrations().create(input).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<RegistrationOut>>> {
    Ok(Json(state.registrations().list().await?))
}

pub async fn update(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    StrictJson(patch): StrictJson<RegistrationPatch>,
) -> Result<Json<RegistrationOut>> {
    Ok(Json(state.registrations().update(id, patch).await?))
}

// Site links

pub async fn create_site(
    State(state): State<AppState>,
    StrictJson(input): StrictJson<RegistrationSiteInput>,
) -> Result<(StatusCode, Json<RegistrationSiteOut>)> {
    let link = state.registrations().create_site(input).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn list_sites(State(state): State<AppState>) -> Result<Json<Vec<RegistrationSiteOut>>> {
    Ok(Json(state.registrations().list_sites().await?))
}

pub async fn update_site(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    StrictJson(patch): StrictJson<RegistrationSitePatch>,
) -> Result<Json<RegistrationSiteOut>> {
    Ok(Json(state.registrations().update_site(id, patch).await?))
}

// Holder links

pub async fn create_holder(
    State(state): State<AppState>,
    StrictJson(input): StrictJson<RegistrationHolderInput>,
) -> Result<(StatusCode, Json<RegistrationHolderOut>)> {
    let link = state.registrations().create_holder(input).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn list_holders(State(state): State<AppState>) -> Result<Json<Vec<RegistrationHolderOut>>> {
    Ok(Json(state.registrations().list_holders().await?))
}

pub async fn update_holder(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    StrictJson(patch): StrictJson<RegistrationHolderPatch>,
) -> Result<Json<RegistrationHolderOut>> {
    Ok(Json(state.registrations().update_holder(id, patch).await?))
}
