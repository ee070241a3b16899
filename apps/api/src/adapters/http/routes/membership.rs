use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use gymflow_types::Role;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, auth::current_user},
    app_error::AppResult,
    application::use_cases::membership::{CreateMembershipInput, UpdateMembershipInput},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_memberships).post(create_membership))
        .route(
            "/{membership_id}",
            get(get_membership)
                .patch(update_membership)
                .delete(archive_membership),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMembershipsQuery {
    #[serde(default)]
    include_archived: bool,
}

/// GET /memberships
///
/// Archived plans are only listed for admins who ask for them.
async fn list_memberships(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListMembershipsQuery>,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &app_state)?;
    if query.include_archived {
        user.require(Role::can_administer)?;
    }

    let plans = app_state
        .membership_use_cases
        .list(query.include_archived)
        .await?;

    Ok(Json(plans))
}

/// GET /memberships/{membership_id}
async fn get_membership(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(membership_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    current_user(&headers, &app_state)?;

    let plan = app_state.membership_use_cases.get(membership_id).await?;
    Ok(Json(plan))
}

/// POST /memberships
async fn create_membership(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateMembershipInput>,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &app_state)?;
    user.require(Role::can_administer)?;

    let plan = app_state.membership_use_cases.create(payload).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// PATCH /memberships/{membership_id}
async fn update_membership(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(membership_id): Path<Uuid>,
    Json(payload): Json<UpdateMembershipInput>,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &app_state)?;
    user.require(Role::can_administer)?;

    let plan = app_state
        .membership_use_cases
        .update(membership_id, payload)
        .await?;
    Ok(Json(plan))
}

/// DELETE /memberships/{membership_id}
///
/// Archives; items already sold keep their snapshot.
async fn archive_membership(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(membership_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &app_state)?;
    user.require(Role::can_administer)?;

    app_state.membership_use_cases.archive(membership_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
