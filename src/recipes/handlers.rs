use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        ListRecipesQuery, PatchRecipeRequest, RecipeDetail, RecipeImageResponse, RecipeRequest,
        RecipeResponse,
    },
    repo,
    repo_types::RecipeFilter,
    services::{self, parse_id_list, validate_fields},
};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiJson, ApiMultipart, ApiPath, ApiQuery},
    images::services::{discard_image, presign_image, store_recipe_image, UploadItem},
    labels::{self, LabelKind, LabelResponse},
    state::AppState,
};

const MAX_PAGE: i64 = 100;
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id",
            get(get_recipe)
                .patch(patch_recipe)
                .put(put_recipe)
                .delete(delete_recipe),
        )
        .route(
            "/recipes/:id/upload-image",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
}

fn not_found() -> ApiError {
    ApiError::NotFound("Recipe not found".into())
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(q): ApiQuery<ListRecipesQuery>,
) -> Result<Json<Vec<RecipeResponse>>, ApiError> {
    let filter = RecipeFilter {
        tags: parse_id_list("tags", q.tags.as_deref())?,
        ingredients: parse_id_list("ingredients", q.ingredients.as_deref())?,
    };
    let limit = q.limit.clamp(1, MAX_PAGE);
    let offset = q.offset.max(0);

    let rows = repo::list_for_user(&state.db, user_id, &filter, limit, offset).await?;
    Ok(Json(rows.into_iter().map(RecipeResponse::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<RecipeRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<RecipeResponse>), ApiError> {
    let fields = validate_fields(
        &payload.title,
        payload.time_minutes,
        payload.price,
        &payload.link,
    )?;
    let row = services::create_recipe(
        &state,
        user_id,
        fields,
        payload.tags,
        payload.ingredients,
    )
    .await?;

    info!(%user_id, recipe_id = %row.id, "recipe created");
    let location = format!("/recipes/{}", row.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(row.into()),
    ))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<RecipeDetail>, ApiError> {
    let row = repo::get_for_user(&state.db, user_id, id)
        .await?
        .ok_or_else(not_found)?;

    let tags = labels::repo::list_for_recipe(&state.db, LabelKind::Tag, id).await?;
    let ingredients = labels::repo::list_for_recipe(&state.db, LabelKind::Ingredient, id).await?;
    let image = match row.image.as_deref() {
        Some(key) => Some(presign_image(&state, key).await?),
        None => None,
    };

    Ok(Json(RecipeDetail {
        id: row.id,
        title: row.title,
        time_minutes: row.time_minutes,
        price: row.price,
        link: row.link,
        tags: tags.into_iter().map(LabelResponse::from).collect(),
        ingredients: ingredients.into_iter().map(LabelResponse::from).collect(),
        image,
    }))
}

#[instrument(skip(state, payload))]
pub async fn patch_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<PatchRecipeRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let current = repo::get_for_user(&state.db, user_id, id)
        .await?
        .ok_or_else(not_found)?;

    let fields = validate_fields(
        payload.title.as_deref().unwrap_or(&current.title),
        payload.time_minutes.unwrap_or(current.time_minutes),
        payload.price.unwrap_or(current.price),
        payload.link.as_deref().unwrap_or(&current.link),
    )?;

    let row = services::update_recipe(
        &state,
        user_id,
        id,
        fields,
        payload.tags,
        payload.ingredients,
    )
    .await?
    .ok_or_else(not_found)?;
    info!(%user_id, recipe_id = %id, "recipe patched");
    Ok(Json(row.into()))
}

#[instrument(skip(state, payload))]
pub async fn put_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<RecipeRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let fields = validate_fields(
        &payload.title,
        payload.time_minutes,
        payload.price,
        &payload.link,
    )?;

    let row = services::update_recipe(
        &state,
        user_id,
        id,
        fields,
        Some(payload.tags),
        Some(payload.ingredients),
    )
    .await?
    .ok_or_else(not_found)?;
    info!(%user_id, recipe_id = %id, "recipe replaced");
    Ok(Json(row.into()))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let image = repo::delete(&state.db, user_id, id)
        .await?
        .ok_or_else(not_found)?;
    if let Some(key) = image {
        discard_image(&state, &key).await;
    }
    info!(%user_id, recipe_id = %id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/:id/upload-image (multipart, file field `image`)
#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    mp: ApiMultipart,
) -> Result<Json<RecipeImageResponse>, ApiError> {
    let ApiMultipart(mut mp) = mp;
    let mut upload = None;
    while let Some(field) = mp.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = field.file_name().map(str::to_string);
        let body = field.bytes().await?;
        upload = Some(UploadItem {
            body,
            content_type,
            file_name,
        });
    }

    let item = upload.ok_or_else(|| ApiError::BadRequest("image file is required".into()))?;
    if item.body.is_empty() {
        return Err(ApiError::BadRequest("The submitted file is empty".into()));
    }
    let ext = item.extension().ok_or_else(|| {
        ApiError::BadRequest("Upload a valid image (jpeg, png, webp, heic or gif)".into())
    })?;

    let current = repo::get_for_user(&state.db, user_id, id)
        .await?
        .ok_or_else(not_found)?;

    let key = store_recipe_image(&state, item, ext).await?;
    if !repo::set_image(&state.db, user_id, id, &key).await? {
        warn!(%user_id, recipe_id = %id, "recipe deleted during image upload");
        discard_image(&state, &key).await;
        return Err(not_found());
    }
    if let Some(old) = current.image.as_deref() {
        discard_image(&state, old).await;
    }

    let image = presign_image(&state, &key).await?;
    info!(%user_id, recipe_id = %id, %key, "recipe image uploaded");
    Ok(Json(RecipeImageResponse { id, image }))
}
