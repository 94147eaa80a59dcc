use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{json_data, typed_json_data};

/// Keyed JSON document without a type discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct JsonDocument {
    pub key: String,
    #[schema(value_type = Object)]
    pub data: Value,
    pub updated: DateTime<Utc>,
}

impl From<json_data::Model> for JsonDocument {
    fn from(model: json_data::Model) -> Self {
        Self {
            key: model.key,
            data: model.data,
            updated: model.updated,
        }
    }
}

/// Keyed JSON document carrying a type discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct TypedJsonDocument {
    pub key: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[schema(value_type = Object)]
    pub data: Value,
    pub updated: DateTime<Utc>,
}

impl From<typed_json_data::Model> for TypedJsonDocument {
    fn from(model: typed_json_data::Model) -> Self {
        Self {
            key: model.key,
            doc_type: model.doc_type,
            data: model.data,
            updated: model.updated,
        }
    }
}

/// Listing row for typed documents; the payload is left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct TypedDocumentSummary {
    pub key: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub updated: DateTime<Utc>,
}

/// Request body carrying only a payload.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct DocumentPayload {
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewTypedDocument {
    pub key: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TypedDocumentQuery {
    /// Only list documents of this type.
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
}
