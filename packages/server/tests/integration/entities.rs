use docstore::entity::{entities_alt_labels, entities_exact_matches};
use docstore::error::ErrorKind;
use docstore::models::entity::EntityInput;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};

use crate::common::TestContext;

fn input(id: &str, entity_type: &str, alt: &[&str], exact: &[&str]) -> EntityInput {
    EntityInput {
        id: id.to_string(),
        entity_type: entity_type.to_string(),
        alt_labels: alt.iter().map(|s| s.to_string()).collect(),
        exact_matches: exact.iter().map(|s| s.to_string()).collect(),
    }
}

async fn child_row_counts(ctx: &TestContext) -> (u64, u64) {
    let alt = entities_alt_labels::Entity::find()
        .count(&ctx.db)
        .await
        .unwrap();
    let exact = entities_exact_matches::Entity::find()
        .count(&ctx.db)
        .await
        .unwrap();
    (alt, exact)
}

/// Make any insert of `value` into the exact-match table abort.
async fn reject_exact_match(ctx: &TestContext, value: &str) {
    ctx.db
        .execute_unprepared(&format!(
            "CREATE TRIGGER reject_exact_match BEFORE INSERT ON entities_exact_matches \
             WHEN NEW.exact_match = '{value}' \
             BEGIN SELECT RAISE(ABORT, 'exact match rejected'); END"
        ))
        .await
        .unwrap();
}

mod create_entity {
    use super::*;

    #[tokio::test]
    async fn stores_parent_and_both_value_sets() {
        let ctx = TestContext::new().await;

        let created = ctx
            .service
            .create_entity(input(
                "tokyo",
                "place",
                &["Edo", "東京"],
                &["wikidata:Q1490"],
            ))
            .await
            .unwrap();

        assert_eq!(created.id, "tokyo");
        assert_eq!(created.entity_type, "place");
        assert_eq!(created.alt_labels, vec!["Edo", "東京"]);
        assert_eq!(created.exact_matches, vec!["wikidata:Q1490"]);

        let fetched = ctx.service.get_entity("tokyo").await.unwrap();
        assert_eq!(fetched.alt_labels, created.alt_labels);
        assert_eq!(fetched.exact_matches, created.exact_matches);
    }

    #[tokio::test]
    async fn empty_attributes_read_back_as_empty_lists() {
        let ctx = TestContext::new().await;
        ctx.service
            .create_entity(input("bare", "thing", &[], &[]))
            .await
            .unwrap();

        let fetched = ctx.service.get_entity("bare").await.unwrap();
        assert!(fetched.alt_labels.is_empty());
        assert!(fetched.exact_matches.is_empty());
    }

    #[tokio::test]
    async fn repeated_values_are_collapsed_in_first_seen_order() {
        let ctx = TestContext::new().await;
        let created = ctx
            .service
            .create_entity(input("dup", "thing", &["b", "a", "b"], &["x", "x"]))
            .await
            .unwrap();

        assert_eq!(created.alt_labels, vec!["b", "a"]);
        assert_eq!(created.exact_matches, vec!["x"]);
        assert_eq!(child_row_counts(&ctx).await, (2, 1));
    }

    #[tokio::test]
    async fn duplicate_id_conflicts_without_touching_existing_rows() {
        let ctx = TestContext::new().await;
        ctx.service
            .create_entity(input("e1", "person", &["a"], &["m"]))
            .await
            .unwrap();

        let err = ctx
            .service
            .create_entity(input("e1", "place", &["b", "c"], &[]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let fetched = ctx.service.get_entity("e1").await.unwrap();
        assert_eq!(fetched.entity_type, "person");
        assert_eq!(fetched.alt_labels, vec!["a"]);
        assert_eq!(child_row_counts(&ctx).await, (1, 1));
    }

    #[tokio::test]
    async fn failure_after_parent_insert_leaves_no_rows() {
        let ctx = TestContext::new().await;
        reject_exact_match(&ctx, "broken").await;

        let err = ctx
            .service
            .create_entity(input("e1", "person", &["a", "b"], &["ok", "broken"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transaction);

        assert_eq!(
            ctx.service.get_entity("e1").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(child_row_counts(&ctx).await, (0, 0));
    }

    #[tokio::test]
    async fn missing_id_or_type_is_rejected() {
        let ctx = TestContext::new().await;

        let err = ctx
            .service
            .create_entity(input("", "person", &[], &[]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = ctx
            .service
            .create_entity(input("e1", " ", &[], &[]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(ctx.service.list_entities().await.unwrap().is_empty());
    }
}

mod update_entity {
    use super::*;

    #[tokio::test]
    async fn value_sets_are_replaced_not_merged() {
        let ctx = TestContext::new().await;
        ctx.service
            .create_entity(input("e1", "person", &["a", "b"], &["m1", "m2"]))
            .await
            .unwrap();

        let updated = ctx
            .service
            .update_entity("e1", input("", "person", &["c"], &[]))
            .await
            .unwrap();
        assert_eq!(updated.alt_labels, vec!["c"]);
        assert!(updated.exact_matches.is_empty());

        let fetched = ctx.service.get_entity("e1").await.unwrap();
        assert_eq!(fetched.alt_labels, vec!["c"]);
        assert!(fetched.exact_matches.is_empty());
        assert_eq!(child_row_counts(&ctx).await, (1, 0));
    }

    #[tokio::test]
    async fn changes_type_and_timestamp() {
        let ctx = TestContext::new().await;
        let created = ctx
            .service
            .create_entity(input("e1", "person", &[], &[]))
            .await
            .unwrap();

        let updated = ctx
            .service
            .update_entity("e1", input("ignored", "organization", &[], &[]))
            .await
            .unwrap();

        assert_eq!(updated.id, "e1");
        assert_eq!(updated.entity_type, "organization");
        assert!(updated.updated >= created.updated);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found_and_writes_nothing() {
        let ctx = TestContext::new().await;

        let err = ctx
            .service
            .update_entity("ghost", input("", "person", &["a"], &["b"]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(child_row_counts(&ctx).await, (0, 0));
    }

    #[tokio::test]
    async fn failure_midway_restores_prior_state() {
        let ctx = TestContext::new().await;
        ctx.service
            .create_entity(input("e1", "person", &["a", "b"], &["x"]))
            .await
            .unwrap();
        reject_exact_match(&ctx, "broken").await;

        let err = ctx
            .service
            .update_entity("e1", input("", "place", &["c"], &["broken"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transaction);

        let kept = ctx.service.get_entity("e1").await.unwrap();
        assert_eq!(kept.entity_type, "person");
        assert_eq!(kept.alt_labels, vec!["a", "b"]);
        assert_eq!(kept.exact_matches, vec!["x"]);
        assert_eq!(child_row_counts(&ctx).await, (2, 1));
    }

    #[tokio::test]
    async fn other_entities_keep_their_values() {
        let ctx = TestContext::new().await;
        ctx.service
            .create_entity(input("e1", "person", &["a"], &[]))
            .await
            .unwrap();
        ctx.service
            .create_entity(input("e2", "person", &["z"], &["y"]))
            .await
            .unwrap();

        ctx.service
            .update_entity("e1", input("", "person", &[], &[]))
            .await
            .unwrap();

        let other = ctx.service.get_entity("e2").await.unwrap();
        assert_eq!(other.alt_labels, vec!["z"]);
        assert_eq!(other.exact_matches, vec!["y"]);
    }
}

mod delete_entity {
    use super::*;

    #[tokio::test]
    async fn removes_parent_and_children() {
        let ctx = TestContext::new().await;
        ctx.service
            .create_entity(input("e1", "person", &["a", "b"], &["c"]))
            .await
            .unwrap();

        let deleted = ctx.service.delete_entity("e1").await.unwrap();
        assert_eq!(deleted.alt_labels, vec!["a", "b"]);

        assert_eq!(
            ctx.service.get_entity("e1").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(child_row_counts(&ctx).await, (0, 0));
    }

    #[tokio::test]
    async fn missing_id_is_not_found_with_no_mutation() {
        let ctx = TestContext::new().await;
        ctx.service
            .create_entity(input("kept", "person", &["a"], &["b"]))
            .await
            .unwrap();

        let err = ctx.service.delete_entity("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(ctx.service.list_entities().await.unwrap().len(), 1);
        assert_eq!(child_row_counts(&ctx).await, (1, 1));
    }
}

mod list_entities {
    use super::*;

    #[tokio::test]
    async fn least_recently_updated_first_with_values() {
        let ctx = TestContext::new().await;
        ctx.service
            .create_entity(input("first", "t", &["f1"], &[]))
            .await
            .unwrap();
        ctx.service
            .create_entity(input("second", "t", &[], &["s1", "s2"]))
            .await
            .unwrap();
        ctx.service
            .create_entity(input("third", "t", &[], &[]))
            .await
            .unwrap();

        ctx.service
            .update_entity("first", input("", "t", &["f2"], &[]))
            .await
            .unwrap();

        let listed = ctx.service.list_entities().await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["second", "third", "first"]);

        assert_eq!(listed[0].exact_matches, vec!["s1", "s2"]);
        assert!(listed[1].alt_labels.is_empty());
        assert_eq!(listed[2].alt_labels, vec!["f2"]);
    }

    #[tokio::test]
    async fn lists_more_entities_than_bind_parameters() {
        let ctx = TestContext::new().await;
        ctx.db
            .execute_unprepared(
                "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 40000) \
                 INSERT INTO entities (id, type, updated) \
                 SELECT printf('bulk-%05d', n), 'bulk', '2024-01-01T00:00:00+00:00' FROM seq",
            )
            .await
            .unwrap();
        ctx.service
            .create_entity(input("latest", "t", &["l"], &["m"]))
            .await
            .unwrap();

        let listed = ctx.service.list_entities().await.unwrap();
        assert_eq!(listed.len(), 40_001);
        assert_eq!(listed[0].id, "bulk-00001");
        assert!(listed[0].alt_labels.is_empty());

        let last = listed.last().unwrap();
        assert_eq!(last.id, "latest");
        assert_eq!(last.alt_labels, vec!["l"]);
        assert_eq!(last.exact_matches, vec!["m"]);
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let ctx = TestContext::new().await;
        assert!(ctx.service.list_entities().await.unwrap().is_empty());
    }
}
