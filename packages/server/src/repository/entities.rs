use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use super::{MetadataRepository, expect_single_row, require_non_empty};
use crate::entity::{entities, entities_alt_labels, entities_exact_matches};
use crate::error::{RepoError, Result};
use crate::models::entity::{EntityInput, EntityRecord, dedup_preserving_order};

impl MetadataRepository {
    /// Insert an entity and both of its value sets in one transaction.
    pub async fn create_entity(&self, input: EntityInput) -> Result<EntityRecord> {
        require_non_empty(&input.id, "id")?;
        require_non_empty(&input.entity_type, "type")?;

        let alt_labels = dedup_preserving_order(&input.alt_labels);
        let exact_matches = dedup_preserving_order(&input.exact_matches);
        let now = Utc::now();

        let txn = self.db.begin().await?;

        if entities::Entity::find_by_id(input.id.clone())
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(RepoError::Conflict(format!("entity {} already exists", input.id)));
        }

        let id = input.id.clone();
        let model = entities::ActiveModel {
            id: Set(input.id),
            entity_type: Set(input.entity_type),
            updated: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| RepoError::from_insert(e, || format!("entity {id} already exists")))?;

        insert_children(&txn, &model.id, &alt_labels, &exact_matches).await?;
        txn.commit().await?;

        Ok(EntityRecord::from_parts(model, alt_labels, exact_matches))
    }

    /// Replace the type and both value sets of an existing entity.
    ///
    /// Child rows are deleted and reinserted, never merged. Nothing is
    /// written unless the entity exists.
    pub async fn update_entity(&self, id: &str, input: EntityInput) -> Result<EntityRecord> {
        require_non_empty(&input.entity_type, "type")?;

        let alt_labels = dedup_preserving_order(&input.alt_labels);
        let exact_matches = dedup_preserving_order(&input.exact_matches);
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let result = entities::Entity::update_many()
            .col_expr(entities::Column::EntityType, Expr::value(input.entity_type))
            .col_expr(entities::Column::Updated, Expr::value(now))
            .filter(entities::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        expect_single_row(result.rows_affected, || format!("entity {id}"))?;

        delete_children(&txn, id).await?;
        insert_children(&txn, id, &alt_labels, &exact_matches).await?;

        let model = entities::Entity::find_by_id(id.to_string())
            .one(&txn)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("entity {id}")))?;
        txn.commit().await?;

        Ok(EntityRecord::from_parts(model, alt_labels, exact_matches))
    }

    /// Remove an entity and all of its child rows. Returns the removed state.
    pub async fn delete_entity(&self, id: &str) -> Result<EntityRecord> {
        let txn = self.db.begin().await?;

        let Some(model) = entities::Entity::find_by_id(id.to_string()).one(&txn).await? else {
            return Err(RepoError::NotFound(format!("entity {id}")));
        };
        let (alt_labels, exact_matches) = load_children(&txn, id).await?;

        delete_children(&txn, id).await?;
        let result = entities::Entity::delete_by_id(id.to_string())
            .exec(&txn)
            .await?;
        // Dropping the transaction without commit rolls back the child deletes.
        expect_single_row(result.rows_affected, || format!("entity {id}"))?;

        txn.commit().await?;
        Ok(EntityRecord::from_parts(model, alt_labels, exact_matches))
    }

    pub async fn get_entity(&self, id: &str) -> Result<EntityRecord> {
        let model = entities::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("entity {id}")))?;
        let (alt_labels, exact_matches) = load_children(&self.db, id).await?;
        Ok(EntityRecord::from_parts(model, alt_labels, exact_matches))
    }

    /// All entities, least recently updated first, with their value sets.
    pub async fn list_entities(&self) -> Result<Vec<EntityRecord>> {
        let models = entities::Entity::find()
            .order_by_asc(entities::Column::Updated)
            .order_by_asc(entities::Column::Id)
            .all(&self.db)
            .await?;
        if models.is_empty() {
            return Ok(Vec::new());
        }

        // Read whole tables; no bind parameter per entity.
        let alt_rows: Vec<(String, String)> = entities_alt_labels::Entity::find()
            .select_only()
            .column(entities_alt_labels::Column::EntityId)
            .column(entities_alt_labels::Column::AltLabel)
            .order_by_asc(entities_alt_labels::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await?;

        let exact_rows: Vec<(String, String)> = entities_exact_matches::Entity::find()
            .select_only()
            .column(entities_exact_matches::Column::EntityId)
            .column(entities_exact_matches::Column::ExactMatch)
            .order_by_asc(entities_exact_matches::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut alt_by_entity = group_by_entity(alt_rows);
        let mut exact_by_entity = group_by_entity(exact_rows);

        Ok(models
            .into_iter()
            .map(|model| {
                let alt = alt_by_entity.remove(&model.id).unwrap_or_default();
                let exact = exact_by_entity.remove(&model.id).unwrap_or_default();
                EntityRecord::from_parts(model, alt, exact)
            })
            .collect())
    }
}

fn group_by_entity(rows: Vec<(String, String)>) -> HashMap<String, Vec<String>> {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for (entity_id, value) in rows {
        grouped.entry(entity_id).or_default().push(value);
    }
    grouped
}

/// Both value sets of one entity, in insertion order.
async fn load_children<C: ConnectionTrait>(
    conn: &C,
    entity_id: &str,
) -> Result<(Vec<String>, Vec<String>)> {
    let alt_labels: Vec<String> = entities_alt_labels::Entity::find()
        .select_only()
        .column(entities_alt_labels::Column::AltLabel)
        .filter(entities_alt_labels::Column::EntityId.eq(entity_id))
        .order_by_asc(entities_alt_labels::Column::Id)
        .into_tuple()
        .all(conn)
        .await?;

    let exact_matches: Vec<String> = entities_exact_matches::Entity::find()
        .select_only()
        .column(entities_exact_matches::Column::ExactMatch)
        .filter(entities_exact_matches::Column::EntityId.eq(entity_id))
        .order_by_asc(entities_exact_matches::Column::Id)
        .into_tuple()
        .all(conn)
        .await?;

    Ok((alt_labels, exact_matches))
}

async fn delete_children<C: ConnectionTrait>(conn: &C, entity_id: &str) -> Result<()> {
    entities_alt_labels::Entity::delete_many()
        .filter(entities_alt_labels::Column::EntityId.eq(entity_id))
        .exec(conn)
        .await?;
    entities_exact_matches::Entity::delete_many()
        .filter(entities_exact_matches::Column::EntityId.eq(entity_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn insert_children<C: ConnectionTrait>(
    conn: &C,
    entity_id: &str,
    alt_labels: &[String],
    exact_matches: &[String],
) -> Result<()> {
    for label in alt_labels {
        entities_alt_labels::Entity::insert(entities_alt_labels::ActiveModel {
            entity_id: Set(entity_id.to_string()),
            alt_label: Set(label.clone()),
            ..Default::default()
        })
        .exec(conn)
        .await?;
    }
    for exact in exact_matches {
        entities_exact_matches::Entity::insert(entities_exact_matches::ActiveModel {
            entity_id: Set(entity_id.to_string()),
            exact_match: Set(exact.clone()),
            ..Default::default()
        })
        .exec(conn)
        .await?;
    }
    Ok(())
}
