use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::RecipeRow;
use crate::labels::LabelResponse;

/// Body of `POST /recipes` and `PUT /recipes/:id`.
#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub tags: Vec<Uuid>,
    #[serde(default)]
    pub ingredients: Vec<Uuid>,
}

/// Body of `PATCH /recipes/:id`; absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
pub struct PatchRecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<Uuid>>,
    pub ingredients: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct ListRecipesQuery {
    /// Comma separated tag ids.
    pub tags: Option<String>,
    /// Comma separated ingredient ids.
    pub ingredients: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
}

impl From<RecipeRow> for RecipeResponse {
    fn from(r: RecipeRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            time_minutes: r.time_minutes,
            price: r.price,
            link: r.link,
            tags: r.tag_ids,
            ingredients: r.ingredient_ids,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<LabelResponse>,
    pub ingredients: Vec<LabelResponse>,
    pub image: Option<String>, // presigned URL
}

#[derive(Debug, Serialize)]
pub struct RecipeImageResponse {
    pub id: Uuid,
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_accepts_string_or_number() {
        let a: RecipeRequest =
            serde_json::from_str(r#"{"title":"t","time_minutes":10,"price":"5.00"}"#).unwrap();
        let b: RecipeRequest =
            serde_json::from_str(r#"{"title":"t","time_minutes":10,"price":5}"#).unwrap();
        assert_eq!(a.price, Decimal::new(500, 2));
        assert_eq!(b.price, Decimal::from(5));
        assert!(a.tags.is_empty() && a.ingredients.is_empty() && a.link.is_empty());
    }

    #[test]
    fn response_serializes_price_as_string() {
        let res = RecipeResponse {
            id: Uuid::nil(),
            title: "Sample recipe".into(),
            time_minutes: 10,
            price: Decimal::new(500, 2),
            link: String::new(),
            tags: vec![],
            ingredients: vec![],
        };
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["price"], "5.00");
        assert_eq!(json["time_minutes"], 10);
    }
}
