use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per exact-match reference of an entity.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entities_exact_matches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub entity_id: String,
    #[sea_orm(belongs_to, from = "entity_id", to = "id")]
    pub entity: HasOne<super::entities::Entity>,

    #[sea_orm(column_type = "Text")]
    pub exact_match: String,
}

impl ActiveModelBehavior for ActiveModel {}
