use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            CreateUserRequest, PublicUser, ReplaceMeRequest, TokenRequest, TokenResponse,
            UpdateMeRequest,
        },
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo_types::User,
        services::{self, validate_email, validate_name, validate_password, UserError},
    },
    error::{ApiError, ApiJson},
    state::AppState,
};

const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/create", post(create_user))
        .route("/user/token", post(create_token))
        .route("/user/me", get(get_me).patch(update_me).put(replace_me))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let email = validate_email(&payload.email)?;
    validate_password(&payload.password)?;
    let name = validate_name(&payload.name)?;

    let user = services::create_user(&state.db, &email, &payload.password, &name).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn create_token(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = services::normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Must include \"email\" and \"password\"".into(),
        ));
    }

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!("token requested for unknown email");
        return Err(ApiError::BadRequest(BAD_CREDENTIALS.into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "token requested with wrong password");
        return Err(ApiError::BadRequest(BAD_CREDENTIALS.into()));
    }
    if !user.is_active {
        warn!(user_id = %user.id, "token requested for inactive user");
        return Err(ApiError::BadRequest(BAD_CREDENTIALS.into()));
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, "token issued");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<UpdateMeRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    apply_profile_update(&state, user_id, payload).await.map(Json)
}

#[instrument(skip(state, payload))]
pub async fn replace_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<ReplaceMeRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    apply_profile_update(&state, user_id, payload.into()).await.map(Json)
}

async fn apply_profile_update(
    state: &AppState,
    user_id: uuid::Uuid,
    payload: UpdateMeRequest,
) -> Result<PublicUser, ApiError> {
    let email = payload.email.as_deref().map(validate_email).transpose()?;
    let name = payload.name.as_deref().map(validate_name).transpose()?;
    if let Some(password) = payload.password.as_deref() {
        validate_password(password)?;
    }

    if let Some(email) = email.as_deref() {
        if let Some(other) = User::find_by_email(&state.db, email).await? {
            if other.id != user_id {
                return Err(UserError::EmailTaken.into());
            }
        }
    }
    let hash = payload.password.as_deref().map(hash_password).transpose()?;

    let user = User::update_profile(
        &state.db,
        user_id,
        email.as_deref(),
        name.as_deref(),
        hash.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    info!(user_id = %user.id, "profile updated");
    Ok(user.into())
}
