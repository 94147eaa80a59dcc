use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entities")]
pub struct Model {
    /// Caller-supplied identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(column_name = "type")]
    pub entity_type: String,

    #[sea_orm(indexed)]
    pub updated: DateTimeUtc,

    #[sea_orm(has_many)]
    pub alt_labels: HasMany<super::entities_alt_labels::Entity>,

    #[sea_orm(has_many)]
    pub exact_matches: HasMany<super::entities_exact_matches::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
