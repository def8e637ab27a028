use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::Label;

#[derive(Debug, Deserialize)]
pub struct CreateLabelRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListLabelsQuery {
    /// Non-zero keeps only labels attached to at least one recipe.
    #[serde(default)]
    pub assigned_only: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<Label> for LabelResponse {
    fn from(l: Label) -> Self {
        Self {
            id: l.id,
            name: l.name,
        }
    }
}
