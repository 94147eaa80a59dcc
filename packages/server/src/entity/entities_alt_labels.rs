use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per alternative label of an entity.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entities_alt_labels")]
pub struct Model {
    /// Insertion order of the values.
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub entity_id: String,
    #[sea_orm(belongs_to, from = "entity_id", to = "id")]
    pub entity: HasOne<super::entities::Entity>,

    #[sea_orm(column_type = "Text")]
    pub alt_label: String,
}

impl ActiveModelBehavior for ActiveModel {}
