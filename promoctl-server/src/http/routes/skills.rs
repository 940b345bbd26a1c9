//! Skill endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Router};

use crate::db::repos::{Skill, SkillRepo, SkillView};
use crate::http::error::ApiError;
use crate::http::extractors::{Bound, ValidJson};
use crate::http::response::Envelope;
use crate::http::server::AppState;
use crate::models::SkillInput;

/// GET /skills
async fn list_skills(
    State(state): State<Arc<AppState>>,
) -> Result<Envelope<Vec<SkillView>>, ApiError> {
    let skills = SkillRepo::new(&state.pool).list().await?;
    Ok(Envelope::data("skills", skills))
}

/// POST /skills - create, optionally linking `promoter_group_ids`
async fn create_skill(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<SkillInput>,
) -> Result<(StatusCode, Envelope<SkillView>), ApiError> {
    let draft = input.validate();
    let skill = SkillRepo::new(&state.pool).create(draft).await?;

    Ok((
        StatusCode::CREATED,
        Envelope::data("skill", skill).with_message("Skill created successfully"),
    ))
}

/// GET /skills/{id}
async fn get_skill(
    State(state): State<Arc<AppState>>,
    Bound(skill): Bound<Skill>,
) -> Result<Envelope<SkillView>, ApiError> {
    let skill = SkillRepo::new(&state.pool).get(skill.id).await?;
    Ok(Envelope::data("skill", skill))
}

/// PUT /skills/{id}
async fn update_skill(
    State(state): State<Arc<AppState>>,
    Bound(skill): Bound<Skill>,
    ValidJson(input): ValidJson<SkillInput>,
) -> Result<Envelope<SkillView>, ApiError> {
    let draft = input.validate();
    let skill = SkillRepo::new(&state.pool).update(skill.id, draft).await?;

    Ok(Envelope::data("skill", skill).with_message("Skill updated successfully"))
}

/// DELETE /skills/{id}
async fn delete_skill(
    State(state): State<Arc<AppState>>,
    Bound(skill): Bound<Skill>,
) -> Result<Envelope<()>, ApiError> {
    SkillRepo::new(&state.pool).delete(skill.id).await?;
    Ok(Envelope::message("Skill deleted successfully"))
}

/// Skill routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/skills", get(list_skills).post(create_skill))
        .route(
            "/skills/{id}",
            get(get_skill).put(update_skill).delete(delete_skill),
        )
}
