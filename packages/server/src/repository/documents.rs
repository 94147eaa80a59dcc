use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde_json::Value;

use super::{MetadataRepository, expect_single_row, require_non_empty};
use crate::entity::{json_data, typed_json_data};
use crate::error::{RepoError, Result};
use crate::models::document::{
    JsonDocument, NewTypedDocument, TypedDocumentSummary, TypedJsonDocument,
};

impl MetadataRepository {
    pub async fn create_document(&self, key: &str, data: Value) -> Result<JsonDocument> {
        require_non_empty(key, "key")?;

        if json_data::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await?
            .is_some()
        {
            return Err(RepoError::Conflict(format!("document {key} already exists")));
        }

        let model = json_data::ActiveModel {
            key: Set(key.to_string()),
            data: Set(data),
            updated: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| RepoError::from_insert(e, || format!("document {key} already exists")))?;

        Ok(model.into())
    }

    pub async fn get_document(&self, key: &str) -> Result<JsonDocument> {
        json_data::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await?
            .map(JsonDocument::from)
            .ok_or_else(|| RepoError::NotFound(format!("document {key}")))
    }

    /// Replace the payload stored under `key`.
    pub async fn update_document(&self, key: &str, data: Value) -> Result<JsonDocument> {
        let result = json_data::Entity::update_many()
            .col_expr(json_data::Column::Data, Expr::value(data))
            .col_expr(json_data::Column::Updated, Expr::value(Utc::now()))
            .filter(json_data::Column::Key.eq(key))
            .exec(&self.db)
            .await?;
        expect_single_row(result.rows_affected, || format!("document {key}"))?;

        self.get_document(key).await
    }

    pub async fn delete_document(&self, key: &str) -> Result<JsonDocument> {
        let document = self.get_document(key).await?;
        let result = json_data::Entity::delete_by_id(key.to_string())
            .exec(&self.db)
            .await?;
        expect_single_row(result.rows_affected, || format!("document {key}"))?;
        Ok(document)
    }

    pub async fn create_typed_document(&self, new: NewTypedDocument) -> Result<TypedJsonDocument> {
        require_non_empty(&new.key, "key")?;
        require_non_empty(&new.doc_type, "type")?;

        if typed_json_data::Entity::find_by_id(new.key.clone())
            .one(&self.db)
            .await?
            .is_some()
        {
            return Err(RepoError::Conflict(format!(
                "typed document {} already exists",
                new.key
            )));
        }

        let key = new.key.clone();
        let model = typed_json_data::ActiveModel {
            key: Set(new.key),
            doc_type: Set(new.doc_type),
            data: Set(new.data),
            updated: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| RepoError::from_insert(e, || format!("typed document {key} already exists")))?;

        Ok(model.into())
    }

    pub async fn get_typed_document(&self, key: &str) -> Result<TypedJsonDocument> {
        typed_json_data::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await?
            .map(TypedJsonDocument::from)
            .ok_or_else(|| RepoError::NotFound(format!("typed document {key}")))
    }

    /// Replace the payload stored under `key`; the type is kept.
    pub async fn update_typed_document(&self, key: &str, data: Value) -> Result<TypedJsonDocument> {
        let result = typed_json_data::Entity::update_many()
            .col_expr(typed_json_data::Column::Data, Expr::value(data))
            .col_expr(typed_json_data::Column::Updated, Expr::value(Utc::now()))
            .filter(typed_json_data::Column::Key.eq(key))
            .exec(&self.db)
            .await?;
        expect_single_row(result.rows_affected, || format!("typed document {key}"))?;

        self.get_typed_document(key).await
    }

    pub async fn delete_typed_document(&self, key: &str) -> Result<TypedJsonDocument> {
        let document = self.get_typed_document(key).await?;
        let result = typed_json_data::Entity::delete_by_id(key.to_string())
            .exec(&self.db)
            .await?;
        expect_single_row(result.rows_affected, || format!("typed document {key}"))?;
        Ok(document)
    }

    /// Key, type and timestamp of every typed document, optionally limited to
    /// one type, least recently updated first.
    pub async fn list_typed_documents(
        &self,
        type_filter: Option<&str>,
    ) -> Result<Vec<TypedDocumentSummary>> {
        let mut query = typed_json_data::Entity::find()
            .select_only()
            .column(typed_json_data::Column::Key)
            .column(typed_json_data::Column::DocType)
            .column(typed_json_data::Column::Updated);
        if let Some(doc_type) = type_filter {
            query = query.filter(typed_json_data::Column::DocType.eq(doc_type));
        }

        let rows: Vec<(String, String, DateTime<Utc>)> = query
            .order_by_asc(typed_json_data::Column::Updated)
            .order_by_asc(typed_json_data::Column::Key)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(key, doc_type, updated)| TypedDocumentSummary {
                key,
                doc_type,
                updated,
            })
            .collect())
    }
}
