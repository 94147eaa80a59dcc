use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::entities;

/// An entity together with both of its multi-valued attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub updated: DateTime<Utc>,
    pub alt_labels: Vec<String>,
    pub exact_matches: Vec<String>,
}

impl EntityRecord {
    pub fn from_parts(
        model: entities::Model,
        alt_labels: Vec<String>,
        exact_matches: Vec<String>,
    ) -> Self {
        Self {
            id: model.id,
            entity_type: model.entity_type,
            updated: model.updated,
            alt_labels,
            exact_matches,
        }
    }
}

/// Full desired state of an entity. On update the id comes from the path and
/// any id in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityInput {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub alt_labels: Vec<String>,
    #[serde(default)]
    pub exact_matches: Vec<String>,
}

/// Drop repeated values, keeping the first occurrence of each.
pub fn dedup_preserving_order(values: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}
