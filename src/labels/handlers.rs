use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateLabelRequest, LabelResponse, ListLabelsQuery},
    repo, LabelKind,
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiJson, ApiQuery},
    state::AppState,
};

const MAX_NAME_LEN: usize = 255;

pub fn tag_routes() -> Router<AppState> {
    Router::new().route("/tags", get(list_tags).post(create_tag))
}

pub fn ingredient_routes() -> Router<AppState> {
    Router::new().route("/ingredients", get(list_ingredients).post(create_ingredient))
}

#[instrument(skip(state))]
pub async fn list_tags(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(q): ApiQuery<ListLabelsQuery>,
) -> Result<Json<Vec<LabelResponse>>, ApiError> {
    list_labels(&state, LabelKind::Tag, user_id, q).await
}

#[instrument(skip(state, payload))]
pub async fn create_tag(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CreateLabelRequest>,
) -> Result<(StatusCode, Json<LabelResponse>), ApiError> {
    create_label(&state, LabelKind::Tag, user_id, payload).await
}

#[instrument(skip(state))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(q): ApiQuery<ListLabelsQuery>,
) -> Result<Json<Vec<LabelResponse>>, ApiError> {
    list_labels(&state, LabelKind::Ingredient, user_id, q).await
}

#[instrument(skip(state, payload))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CreateLabelRequest>,
) -> Result<(StatusCode, Json<LabelResponse>), ApiError> {
    create_label(&state, LabelKind::Ingredient, user_id, payload).await
}

async fn list_labels(
    state: &AppState,
    kind: LabelKind,
    user_id: uuid::Uuid,
    q: ListLabelsQuery,
) -> Result<Json<Vec<LabelResponse>>, ApiError> {
    let rows = repo::list_for_user(&state.db, kind, user_id, q.assigned_only != 0).await?;
    Ok(Json(rows.into_iter().map(LabelResponse::from).collect()))
}

async fn create_label(
    state: &AppState,
    kind: LabelKind,
    user_id: uuid::Uuid,
    payload: CreateLabelRequest,
) -> Result<(StatusCode, Json<LabelResponse>), ApiError> {
    let name = validate_label_name(&payload.name)?;
    let label = repo::create(&state.db, kind, user_id, &name).await?;
    info!(%user_id, id = %label.id, kind = ?kind, "label created");
    Ok((StatusCode::CREATED, Json(label.into())))
}

pub(crate) fn validate_label_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name may not be blank".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(
            "name must have no more than 255 characters".into(),
        ));
    }
    Ok(name.to_string())
}
