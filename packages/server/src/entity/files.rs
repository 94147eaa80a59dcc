use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display name.
    #[sea_orm(indexed)]
    pub name: String,

    /// Origin: the uploaded filename or the source URL.
    #[sea_orm(column_type = "Text")]
    pub path: String,

    pub size: i64,

    /// Lowercase hex SHA-256 of the content. At most one row per blob.
    #[sea_orm(unique)]
    pub sha256: String,

    #[sea_orm(indexed)]
    pub updated: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
