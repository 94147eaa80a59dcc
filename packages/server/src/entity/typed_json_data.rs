use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Keyed JSON document carrying a type tag.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "typed_json_data")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,

    #[sea_orm(column_name = "type", indexed)]
    pub doc_type: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub data: Json,

    #[sea_orm(indexed)]
    pub updated: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
