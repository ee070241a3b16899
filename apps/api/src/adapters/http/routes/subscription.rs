use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::Utc;
use gymflow_types::Role;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, auth::current_user},
    app_error::{AppError, AppResult},
    domain::entities::subscription_item::SubscriptionItem,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscriptions/me", get(get_my_subscription))
        .route("/subscriptions/{subscription_id}", patch(update_subscription))
        .route("/subscriptions/{subscription_id}/items", post(add_items))
        .route(
            "/subscriptions/{subscription_id}/items/{item_id}/cancel",
            post(cancel_item),
        )
        .route("/users/{user_id}/subscription", get(get_user_subscription))
        .route("/users/{user_id}/subscription", post(create_subscription))
}

/// GET /subscriptions/me
///
/// `null` when the caller has never had a subscription.
async fn get_my_subscription(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &app_state)?;

    let overview = app_state
        .subscription_use_cases
        .overview(user.id, Utc::now())
        .await?;

    Ok(Json(overview))
}

/// GET /users/{user_id}/subscription
async fn get_user_subscription(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &app_state)?;
    user.require(Role::is_staff)?;

    let overview = app_state
        .subscription_use_cases
        .overview(user_id, Utc::now())
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(overview))
}

/// POST /users/{user_id}/subscription
async fn create_subscription(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &app_state)?;
    user.require(Role::can_manage_subscriptions)?;

    let subscription = app_state
        .subscription_use_cases
        .create_subscription(user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSubscriptionPayload {
    is_active: bool,
}

/// PATCH /subscriptions/{subscription_id}
async fn update_subscription(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(subscription_id): Path<Uuid>,
    Json(payload): Json<UpdateSubscriptionPayload>,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &app_state)?;
    user.require(Role::can_administer)?;

    let subscription = app_state
        .subscription_use_cases
        .set_active(subscription_id, payload.is_active)
        .await?;

    Ok(Json(subscription))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemsPayload {
    membership_ids: Vec<Uuid>,
}

#[derive(Serialize)]
struct AddItemsResponse {
    items: Vec<SubscriptionItem>,
}

/// POST /subscriptions/{subscription_id}/items
///
/// The batch runs on its own task. If the client goes away the drop guard
/// cancels the token, so the in-flight item finishes and no more are added.
async fn add_items(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(subscription_id): Path<Uuid>,
    Json(payload): Json<AddItemsPayload>,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &app_state)?;
    user.require(Role::can_manage_subscriptions)?;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let use_cases = app_state.subscription_use_cases.clone();
    let now = Utc::now();

    let items = tokio::spawn(async move {
        use_cases
            .add_memberships(subscription_id, &payload.membership_ids, now, &cancel)
            .await
    })
    .await
    .map_err(|e| AppError::Internal(format!("Membership batch task failed: {e}")))??;

    Ok((StatusCode::CREATED, Json(AddItemsResponse { items })))
}

/// POST /subscriptions/{subscription_id}/items/{item_id}/cancel
async fn cancel_item(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path((subscription_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&headers, &app_state)?;
    user.require(Role::can_manage_subscriptions)?;

    let item = app_state
        .subscription_use_cases
        .cancel_item(subscription_id, item_id)
        .await?;

    Ok(Json(item))
}
