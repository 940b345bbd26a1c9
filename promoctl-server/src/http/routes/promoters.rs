//! Promoter endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Router};

use crate::db::repos::{Promoter, PromoterRepo, PromoterView};
use crate::http::error::ApiError;
use crate::http::extractors::{Bound, ValidJson};
use crate::http::response::Envelope;
use crate::http::server::AppState;
use crate::models::{AttachSkillInput, PromoterInput, ValidationError};

/// GET /promoters - all promoters with groups and skills
async fn list_promoters(
    State(state): State<Arc<AppState>>,
) -> Result<Envelope<Vec<PromoterView>>, ApiError> {
    let promoters = PromoterRepo::new(&state.pool).list().await?;
    Ok(Envelope::data("promoters", promoters))
}

/// POST /promoters - register a promoter
async fn create_promoter(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<PromoterInput>,
) -> Result<(StatusCode, Envelope<PromoterView>), ApiError> {
    let input = input.validate(super::today())?;
    let promoter = PromoterRepo::new(&state.pool).create(input).await?;

    Ok((
        StatusCode::CREATED,
        Envelope::data("promoter", promoter).with_message("Promoter registered successfully"),
    ))
}

/// GET /promoters/{id}
async fn get_promoter(
    State(state): State<Arc<AppState>>,
    Bound(promoter): Bound<Promoter>,
) -> Result<Envelope<PromoterView>, ApiError> {
    let promoter = PromoterRepo::new(&state.pool).get(promoter.id).await?;
    Ok(Envelope::data("promoter", promoter))
}

/// PUT /promoters/{id} - replace every field
async fn update_promoter(
    State(state): State<Arc<AppState>>,
    Bound(promoter): Bound<Promoter>,
    ValidJson(input): ValidJson<PromoterInput>,
) -> Result<Envelope<PromoterView>, ApiError> {
    let input = input.validate(super::today())?;
    let promoter = PromoterRepo::new(&state.pool)
        .update(promoter.id, input)
        .await?;

    Ok(Envelope::data("promoter", promoter).with_message("Promoter updated successfully"))
}

/// DELETE /promoters/{id}
async fn delete_promoter(
    State(state): State<Arc<AppState>>,
    Bound(promoter): Bound<Promoter>,
) -> Result<Envelope<()>, ApiError> {
    PromoterRepo::new(&state.pool).delete(promoter.id).await?;
    Ok(Envelope::message("Promoter deleted successfully"))
}

/// POST /promoters/{id}/skills - add one skill, keep the rest
async fn attach_skill(
    State(state): State<Arc<AppState>>,
    Bound(promoter): Bound<Promoter>,
    ValidJson(input): ValidJson<AttachSkillInput>,
) -> Result<Envelope<PromoterView>, ApiError> {
    let skill_id = input
        .skill_id
        .ok_or(ValidationError::Required { field: "skill_id" })?;

    let promoter = PromoterRepo::new(&state.pool)
        .attach_skill(promoter.id, skill_id)
        .await?;

    Ok(Envelope::data("promoter", promoter).with_message("Skill successfully added to promoter"))
}

/// Promoter routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/promoters", get(list_promoters).post(create_promoter))
        .route(
            "/promoters/{id}",
            get(get_promoter).put(update_promoter).delete(delete_promoter),
        )
        .route("/promoters/{id}/skills", post(attach_skill))
}
