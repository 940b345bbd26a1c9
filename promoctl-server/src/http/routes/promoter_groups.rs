//! Promoter group endpoints
//!
//! `skill_ids` and `promoter_ids` are synced only when present in the body.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Router};

use crate::db::repos::{PromoterGroup, PromoterGroupRepo, PromoterGroupView};
use crate::http::error::ApiError;
use crate::http::extractors::{Bound, ValidJson};
use crate::http::response::Envelope;
use crate::http::server::AppState;
use crate::models::PromoterGroupInput;

/// GET /promoter-groups - all groups with promoters and skills
async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Envelope<Vec<PromoterGroupView>>, ApiError> {
    let groups = PromoterGroupRepo::new(&state.pool).list().await?;
    Ok(Envelope::data("promoter_groups", groups))
}

/// POST /promoter-groups
async fn create_group(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<PromoterGroupInput>,
) -> Result<(StatusCode, Envelope<PromoterGroupView>), ApiError> {
    let draft = input.validate();
    let group = PromoterGroupRepo::new(&state.pool).create(draft).await?;

    Ok((
        StatusCode::CREATED,
        Envelope::data("promoter_group", group).with_message("Promoter group created successfully"),
    ))
}

/// GET /promoter-groups/{id}
async fn get_group(
    State(state): State<Arc<AppState>>,
    Bound(group): Bound<PromoterGroup>,
) -> Result<Envelope<PromoterGroupView>, ApiError> {
    let group = PromoterGroupRepo::new(&state.pool).get(group.id).await?;
    Ok(Envelope::data("promoter_group", group))
}

/// PUT /promoter-groups/{id}
async fn update_group(
    State(state): State<Arc<AppState>>,
    Bound(group): Bound<PromoterGroup>,
    ValidJson(input): ValidJson<PromoterGroupInput>,
) -> Result<Envelope<PromoterGroupView>, ApiError> {
    let draft = input.validate();
    let group = PromoterGroupRepo::new(&state.pool)
        .update(group.id, draft)
        .await?;

    Ok(Envelope::data("promoter_group", group).with_message("Promoter group updated successfully"))
}

/// DELETE /promoter-groups/{id}
async fn delete_group(
    State(state): State<Arc<AppState>>,
    Bound(group): Bound<PromoterGroup>,
) -> Result<Envelope<()>, ApiError> {
    PromoterGroupRepo::new(&state.pool).delete(group.id).await?;
    Ok(Envelope::message("Promoter group deleted successfully"))
}

/// Promoter group routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/promoter-groups", get(list_groups).post(create_group))
        .route(
            "/promoter-groups/{id}",
            get(get_group).put(update_group).delete(delete_group),
        )
}
