use rust_decimal::Decimal;
use sqlx::PgConnection;
use thiserror::Error;
use uuid::Uuid;

use super::{
    repo,
    repo_types::{RecipeFields, RecipeRow},
};
use crate::{
    error::ApiError,
    labels::{self, LabelKind},
    state::AppState,
};

const MAX_TEXT_LEN: usize = 255;

#[derive(Debug, Error, PartialEq)]
pub enum RecipeError {
    #[error("title may not be blank")]
    BlankTitle,
    #[error("{0} must have no more than 255 characters")]
    TooLong(&'static str),
    #[error("time_minutes must be zero or positive")]
    NegativeTime,
    #[error("price must be between 0 and 999.99 with at most 2 decimal places")]
    InvalidPrice,
    #[error("invalid id in {0} filter: {1}")]
    InvalidFilterId(&'static str, String),
    #[error("unknown {0} id(s) for this user")]
    ForeignLabel(&'static str),
}

impl From<RecipeError> for ApiError {
    fn from(e: RecipeError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

pub fn validate_fields(
    title: &str,
    time_minutes: i32,
    price: Decimal,
    link: &str,
) -> Result<RecipeFields, RecipeError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(RecipeError::BlankTitle);
    }
    if title.chars().count() > MAX_TEXT_LEN {
        return Err(RecipeError::TooLong("title"));
    }
    if time_minutes < 0 {
        return Err(RecipeError::NegativeTime);
    }
    let link = link.trim();
    if link.chars().count() > MAX_TEXT_LEN {
        return Err(RecipeError::TooLong("link"));
    }
    Ok(RecipeFields {
        title: title.to_string(),
        time_minutes,
        price: validate_price(price)?,
        link: link.to_string(),
    })
}

/// Prices fit NUMERIC(5,2); the result always carries two decimal places.
pub fn validate_price(price: Decimal) -> Result<Decimal, RecipeError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(RecipeError::InvalidPrice);
    }
    if price.normalize().scale() > 2 || price >= Decimal::from(1000) {
        return Err(RecipeError::InvalidPrice);
    }
    let mut price = price;
    price.rescale(2);
    Ok(price)
}

/// Parses a comma separated id list from a query string. Blank input means
/// no filter.
pub fn parse_id_list(
    relation: &'static str,
    raw: Option<&str>,
) -> Result<Option<Vec<Uuid>>, RecipeError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s).map_err(|_| RecipeError::InvalidFilterId(relation, s.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(if ids.is_empty() { None } else { Some(ids) })
}

pub fn dedup_ids(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Rejects label ids that do not exist or belong to someone else.
async fn ensure_owned(
    conn: &mut PgConnection,
    kind: LabelKind,
    user_id: Uuid,
    ids: &[Uuid],
) -> Result<(), ApiError> {
    if ids.is_empty() {
        return Ok(());
    }
    let owned = labels::repo::count_owned(&mut *conn, kind, user_id, ids).await?;
    if owned != ids.len() as i64 {
        return Err(RecipeError::ForeignLabel(kind.table()).into());
    }
    Ok(())
}

async fn write_links(
    conn: &mut PgConnection,
    kind: LabelKind,
    user_id: Uuid,
    recipe_id: Uuid,
    ids: Vec<Uuid>,
) -> Result<(), ApiError> {
    let ids = dedup_ids(ids);
    ensure_owned(conn, kind, user_id, &ids).await?;
    repo::replace_links(conn, kind, recipe_id, &ids).await?;
    Ok(())
}

pub async fn create_recipe(
    state: &AppState,
    user_id: Uuid,
    fields: RecipeFields,
    tags: Vec<Uuid>,
    ingredients: Vec<Uuid>,
) -> Result<RecipeRow, ApiError> {
    let recipe_id = Uuid::new_v4();
    let mut tx = state.db.begin().await?;

    repo::insert(&mut tx, recipe_id, user_id, &fields).await?;
    write_links(&mut tx, LabelKind::Tag, user_id, recipe_id, tags).await?;
    write_links(&mut tx, LabelKind::Ingredient, user_id, recipe_id, ingredients).await?;

    let row = repo::get_for_user(&mut *tx, user_id, recipe_id)
        .await?
        .ok_or_else(|| {
            anyhow::anyhow!("recipe {} vanished inside its own transaction", recipe_id)
        })?;
    tx.commit().await?;
    Ok(row)
}

/// Writes new scalar fields and, when given, replaces relation sets.
/// `Ok(None)` when the recipe is not the caller's.
pub async fn update_recipe(
    state: &AppState,
    user_id: Uuid,
    recipe_id: Uuid,
    fields: RecipeFields,
    tags: Option<Vec<Uuid>>,
    ingredients: Option<Vec<Uuid>>,
) -> Result<Option<RecipeRow>, ApiError> {
    let mut tx = state.db.begin().await?;

    if !repo::update(&mut tx, user_id, recipe_id, &fields).await? {
        return Ok(None);
    }
    if let Some(tags) = tags {
        write_links(&mut tx, LabelKind::Tag, user_id, recipe_id, tags).await?;
    }
    if let Some(ingredients) = ingredients {
        write_links(&mut tx, LabelKind::Ingredient, user_id, recipe_id, ingredients).await?;
    }

    let row = repo::get_for_user(&mut *tx, user_id, recipe_id).await?;
    tx.commit().await?;
    Ok(row)
}
