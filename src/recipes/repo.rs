use anyhow::Context;
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{RecipeFields, RecipeFilter, RecipeRow};
use crate::labels::LabelKind;

const SELECT_RECIPE: &str = r#"
    SELECT r.id, r.user_id, r.title, r.time_minutes, r.price, r.link, r.image, r.created_at,
           COALESCE((SELECT array_agg(rt.tag_id ORDER BY rt.tag_id)
                       FROM recipe_tags rt WHERE rt.recipe_id = r.id), '{}'::uuid[]) AS tag_ids,
           COALESCE((SELECT array_agg(ri.ingredient_id ORDER BY ri.ingredient_id)
                       FROM recipe_ingredients ri WHERE ri.recipe_id = r.id), '{}'::uuid[]) AS ingredient_ids
      FROM recipes r
"#;

/// Owner-scoped listing. Each relation filter matches recipes linked to at
/// least one of the given ids; EXISTS keeps every recipe to a single row.
pub fn list_query(
    user_id: Uuid,
    filter: &RecipeFilter,
    limit: i64,
    offset: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SELECT_RECIPE);
    qb.push(" WHERE r.user_id = ").push_bind(user_id);

    if let Some(tags) = &filter.tags {
        qb.push(
            " AND EXISTS (SELECT 1 FROM recipe_tags ft WHERE ft.recipe_id = r.id AND ft.tag_id = ANY(",
        )
        .push_bind(tags.clone())
        .push("))");
    }
    if let Some(ingredients) = &filter.ingredients {
        qb.push(
            " AND EXISTS (SELECT 1 FROM recipe_ingredients fi WHERE fi.recipe_id = r.id AND fi.ingredient_id = ANY(",
        )
        .push_bind(ingredients.clone())
        .push("))");
    }

    qb.push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    qb
}

pub async fn list_for_user(
    db: &PgPool,
    user_id: Uuid,
    filter: &RecipeFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<RecipeRow>> {
    let mut qb = list_query(user_id, filter, limit, offset);
    let rows = qb
        .build_query_as::<RecipeRow>()
        .fetch_all(db)
        .await
        .context("list recipes")?;
    Ok(rows)
}

pub async fn get_for_user<'e, E>(
    executor: E,
    user_id: Uuid,
    recipe_id: Uuid,
) -> anyhow::Result<Option<RecipeRow>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, RecipeRow>(&format!(
        "{SELECT_RECIPE} WHERE r.id = $1 AND r.user_id = $2"
    ))
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .context("get recipe")?;
    Ok(row)
}

pub async fn insert(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    user_id: Uuid,
    fields: &RecipeFields,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO recipes (id, user_id, title, time_minutes, price, link)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(recipe_id)
    .bind(user_id)
    .bind(&fields.title)
    .bind(fields.time_minutes)
    .bind(fields.price)
    .bind(&fields.link)
    .execute(conn)
    .await
    .context("insert recipe")?;
    Ok(())
}

/// Returns false when no recipe with that id belongs to the user.
pub async fn update(
    conn: &mut PgConnection,
    user_id: Uuid,
    recipe_id: Uuid,
    fields: &RecipeFields,
) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        UPDATE recipes
           SET title = $3, time_minutes = $4, price = $5, link = $6
         WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(recipe_id)
    .bind(user_id)
    .bind(&fields.title)
    .bind(fields.time_minutes)
    .bind(fields.price)
    .bind(&fields.link)
    .execute(conn)
    .await
    .context("update recipe")?;
    Ok(res.rows_affected() == 1)
}

/// Replaces the full set of `kind` links of a recipe.
pub async fn replace_links(
    conn: &mut PgConnection,
    kind: LabelKind,
    recipe_id: Uuid,
    ids: &[Uuid],
) -> anyhow::Result<()> {
    sqlx::query(&format!(
        "DELETE FROM {} WHERE recipe_id = $1",
        kind.link_table()
    ))
    .bind(recipe_id)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("clear {}", kind.link_table()))?;

    if ids.is_empty() {
        return Ok(());
    }

    sqlx::query(&format!(
        "INSERT INTO {} (recipe_id, {}) SELECT $1, UNNEST($2::uuid[])",
        kind.link_table(),
        kind.link_column()
    ))
    .bind(recipe_id)
    .bind(ids)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("fill {}", kind.link_table()))?;
    Ok(())
}

pub async fn set_image(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
    key: &str,
) -> anyhow::Result<bool> {
    let res = sqlx::query("UPDATE recipes SET image = $3 WHERE id = $1 AND user_id = $2")
        .bind(recipe_id)
        .bind(user_id)
        .bind(key)
        .execute(db)
        .await
        .context("set recipe image")?;
    Ok(res.rows_affected() == 1)
}

/// Deletes the recipe; on success yields the image key it referenced, if any.
pub async fn delete(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
) -> anyhow::Result<Option<Option<String>>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("DELETE FROM recipes WHERE id = $1 AND user_id = $2 RETURNING image")
            .bind(recipe_id)
            .bind(user_id)
            .fetch_optional(db)
            .await
            .context("delete recipe")?;
    Ok(row.map(|(image,)| image))
}
