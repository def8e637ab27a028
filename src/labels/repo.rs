use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::LabelKind;

/// A tag or ingredient row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Label {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: OffsetDateTime,
}

fn list_sql(kind: LabelKind, assigned_only: bool) -> String {
    let mut sql = format!(
        "SELECT t.id, t.user_id, t.name, t.created_at FROM {} t WHERE t.user_id = $1",
        kind.table()
    );
    if assigned_only {
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM {link} l JOIN recipes r ON r.id = l.recipe_id \
             WHERE l.{col} = t.id AND r.user_id = $1)",
            link = kind.link_table(),
            col = kind.link_column(),
        ));
    }
    sql.push_str(" ORDER BY t.name DESC, t.id");
    sql
}

pub async fn list_for_user(
    db: &PgPool,
    kind: LabelKind,
    user_id: Uuid,
    assigned_only: bool,
) -> anyhow::Result<Vec<Label>> {
    let rows = sqlx::query_as::<_, Label>(&list_sql(kind, assigned_only))
        .bind(user_id)
        .fetch_all(db)
        .await
        .with_context(|| format!("list {}", kind.table()))?;
    Ok(rows)
}

pub async fn create(
    db: &PgPool,
    kind: LabelKind,
    user_id: Uuid,
    name: &str,
) -> anyhow::Result<Label> {
    let row = sqlx::query_as::<_, Label>(&format!(
        r#"
        INSERT INTO {} (id, user_id, name)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, name, created_at
        "#,
        kind.table()
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(name)
    .fetch_one(db)
    .await
    .with_context(|| format!("insert into {}", kind.table()))?;
    Ok(row)
}

/// Labels of `kind` attached to a recipe, ordered by name.
pub async fn list_for_recipe<'e, E>(
    executor: E,
    kind: LabelKind,
    recipe_id: Uuid,
) -> anyhow::Result<Vec<Label>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, Label>(&format!(
        r#"
        SELECT t.id, t.user_id, t.name, t.created_at
          FROM {table} t
          JOIN {link} l ON l.{col} = t.id
         WHERE l.recipe_id = $1
         ORDER BY t.name, t.id
        "#,
        table = kind.table(),
        link = kind.link_table(),
        col = kind.link_column(),
    ))
    .bind(recipe_id)
    .fetch_all(executor)
    .await
    .with_context(|| format!("list {} for recipe", kind.table()))?;
    Ok(rows)
}

/// How many of `ids` (expected distinct) belong to `user_id`.
pub async fn count_owned<'e, E>(
    executor: E,
    kind: LabelKind,
    user_id: Uuid,
    ids: &[Uuid],
) -> anyhow::Result<i64>
where
    E: PgExecutor<'e>,
{
    let (count,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM {} WHERE user_id = $1 AND id = ANY($2)",
        kind.table()
    ))
    .bind(user_id)
    .bind(ids)
    .fetch_one(executor)
    .await
    .with_context(|| format!("count owned {}", kind.table()))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_owner_scoped_and_ordered_by_name_desc() {
        let sql = list_sql(LabelKind::Tag, false);
        assert!(sql.contains("FROM tags t WHERE t.user_id = $1"));
        assert!(sql.ends_with("ORDER BY t.name DESC, t.id"));
        assert!(!sql.contains("EXISTS"));
    }

    #[test]
    fn assigned_only_requires_a_recipe_link() {
        let sql = list_sql(LabelKind::Ingredient, true);
        assert!(sql.contains("FROM ingredients t"));
        assert!(sql.contains("EXISTS (SELECT 1 FROM recipe_ingredients l"));
        assert!(sql.contains("l.ingredient_id = t.id"));
        assert!(sql.contains("r.user_id = $1"));
    }
}
