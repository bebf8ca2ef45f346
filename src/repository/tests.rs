//! Repository Integration Tests
//!
//! Tests for TagRepository with in-memory SQLite database.

#[cfg(test)]
mod tests {
    use crate::domain::{DomainError, Locale, NewTag, Tag, TagInput, Translations};
    use crate::repository::{
        init_db, Repository, SearchableRepository, TagLookupOperations, TagQuery, TagRepository,
        TagSortableOperations,
    };
    use std::path::Path;

    async fn setup_test_db() -> TagRepository {
        // Use in-memory database for tests
        let db_state = init_db(Path::new(":memory:")).await.expect("Failed to init test DB");
        TagRepository::new(db_state.connection(), Locale::default())
    }

    fn names(tags: &[Tag]) -> Vec<&str> {
        tags.iter().map(|t| t.name_in("en").unwrap_or_default()).collect()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = setup_test_db().await;

        let created = repo.create(&Tag::new(1, "Urgent", None, "en")).await.expect("Failed to create");
        assert!(created.id > 0);
        assert_eq!(created.order_column, 1);

        let found = repo.find_by_id(created.id).await.expect("Find failed").unwrap();
        assert_eq!(found, created);
        assert_eq!(found.slug_in("en"), Some("urgent"));
    }

    #[tokio::test]
    async fn test_create_requires_a_name() {
        let repo = setup_test_db().await;
        let tag = Tag::from_attributes(NewTag::new(1, Translations::new()), "en");

        let err = repo.create(&tag).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_find_or_create_from_string_is_idempotent() {
        let repo = setup_test_db().await;

        let first = repo.find_or_create_from_string(1, "red", Some("color"), None).await.unwrap();
        assert_eq!(first.job_id(), 1);
        assert_eq!(first.tag_type.as_deref(), Some("color"));
        assert_eq!(first.name(), &Translations::single("en", "red"));

        let second = repo.find_or_create_from_string(1, "red", Some("color"), None).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_from_string_scopes() {
        let repo = setup_test_db().await;
        repo.find_or_create_from_string(1, "Dark Red", Some("color"), None).await.unwrap();

        // Matches by slug as well as by name
        let by_slug = repo.find_from_string(1, "dark-red", Some("color"), None).await.unwrap();
        assert!(by_slug.is_some());

        // Untyped lookup only sees untyped tags
        assert!(repo.find_from_string(1, "Dark Red", None, None).await.unwrap().is_none());
        // Other jobs and locales miss
        assert!(repo.find_from_string(2, "Dark Red", Some("color"), None).await.unwrap().is_none());
        assert!(repo.find_from_string(1, "Dark Red", Some("color"), Some("nl")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_untyped_and_typed_are_distinct() {
        let repo = setup_test_db().await;
        let untyped = repo.find_or_create_from_string(1, "red", None, None).await.unwrap();
        let typed = repo.find_or_create_from_string(1, "red", Some("color"), None).await.unwrap();
        assert_ne!(untyped.id, typed.id);
        assert_eq!(untyped.tag_type, None);
    }

    #[tokio::test]
    async fn test_find_from_string_of_any_type() {
        let repo = setup_test_db().await;
        repo.find_or_create_from_string(1, "red", Some("color"), None).await.unwrap();
        repo.find_or_create_from_string(1, "red", Some("mood"), None).await.unwrap();
        repo.find_or_create_from_string(2, "red", Some("color"), None).await.unwrap();

        let found = repo.find_from_string_of_any_type(1, "red", None).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|t| t.job_id() == 1));
    }

    #[tokio::test]
    async fn test_find_or_create_keeps_input_order() {
        let repo = setup_test_db().await;
        let a = repo.find_or_create_one(1, "a", None).await.unwrap();

        let tags = repo
            .find_or_create(1, vec!["a".into(), "b".into()], None)
            .await
            .unwrap();
        assert_eq!(names(&tags), vec!["a", "b"]);
        assert_eq!(tags[0].id, a.id);
        assert!(tags[1].id > a.id);
    }

    #[tokio::test]
    async fn test_find_or_create_passes_existing_through() {
        let repo = setup_test_db().await;
        let existing = repo.find_or_create_one(1, "kept", Some("keyword")).await.unwrap();

        let tags = repo
            .find_or_create(1, vec![TagInput::Existing(existing.clone()), "new".into()], None)
            .await
            .unwrap();
        assert_eq!(tags[0], existing);
        assert_eq!(tags[1].tag_type, None);
    }

    #[tokio::test]
    async fn test_scalar_find_or_create_returns_one_tag() {
        let repo = setup_test_db().await;
        let tag = repo.find_or_create_one(5, "solo", Some("keyword")).await.unwrap();
        assert_eq!(tag.name_in("en"), Some("solo"));
        assert_eq!(tag.job_id(), 5);
    }

    #[tokio::test]
    async fn test_locale_defaults_and_overrides() {
        let mut repo = setup_test_db().await;
        repo.set_locale(Locale::new("nl").unwrap());

        let tag = repo.find_or_create_from_string(1, "rood", None, None).await.unwrap();
        assert_eq!(tag.name_in("nl"), Some("rood"));
        assert_eq!(tag.name_in("en"), None);

        let en = repo.find_or_create_from_string(1, "red", None, Some("en")).await.unwrap();
        assert_eq!(en.name_in("en"), Some("red"));

        assert!(repo.find_or_create_from_string(1, "x", None, Some("bad locale")).await.is_err());
    }

    #[tokio::test]
    async fn test_update_translation_keeps_other_locales() {
        let repo = setup_test_db().await;
        let mut tag = repo.find_or_create_one(1, "red", None).await.unwrap();

        tag.set_name("nl", "rood");
        let updated = repo.update(&tag).await.unwrap();
        assert_eq!(updated.name_in("en"), Some("red"));
        assert_eq!(updated.name_in("nl"), Some("rood"));
        assert_eq!(updated.slug_in("nl"), Some("rood"));

        let found = repo.find_from_string(1, "rood", None, Some("nl")).await.unwrap();
        assert_eq!(found.map(|t| t.id), Some(tag.id));
    }

    #[tokio::test]
    async fn test_update_missing_tag() {
        let repo = setup_test_db().await;
        let mut tag = Tag::new(1, "ghost", None, "en");
        tag.id = 99;
        assert!(matches!(repo.update(&tag).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_slug_collision_gets_suffix() {
        let repo = setup_test_db().await;
        let first = repo.create(&Tag::new(1, "Red!", None, "en")).await.unwrap();
        let second = repo.create(&Tag::new(1, "red", None, "en")).await.unwrap();
        let other_job = repo.create(&Tag::new(2, "red", None, "en")).await.unwrap();

        assert_eq!(first.slug_in("en"), Some("red"));
        assert_eq!(second.slug_in("en"), Some("red-1"));
        assert_eq!(other_job.slug_in("en"), Some("red"));
    }

    #[tokio::test]
    async fn test_with_type_scope() {
        let repo = setup_test_db().await;
        let blue = repo.create(&Tag::new(1, "blue", Some("color"), "en")).await.unwrap();
        repo.create(&Tag::new(1, "happy", Some("mood"), "en")).await.unwrap();
        let red = repo.create(&Tag::new(1, "red", Some("color"), "en")).await.unwrap();
        repo.move_to_start(red.id).await.unwrap();

        let colors = repo.get(&TagQuery::new().with_type(Some("color"))).await.unwrap();
        assert_eq!(names(&colors), vec!["red", "blue"]);
        assert!(colors.iter().all(|t| t.id == red.id || t.id == blue.id));

        let all = repo.get(&TagQuery::new().with_type(None)).await.unwrap();
        let unfiltered = repo.get(&TagQuery::new()).await.unwrap();
        assert_eq!(all, unfiltered);
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_with_job_and_get_with_type() {
        let repo = setup_test_db().await;
        repo.create(&Tag::new(1, "a", Some("k"), "en")).await.unwrap();
        repo.create(&Tag::new(2, "b", Some("k"), "en")).await.unwrap();
        repo.create(&Tag::new(1, "c", None, "en")).await.unwrap();

        let job_one = repo.get(&TagQuery::new().with_job(1)).await.unwrap();
        assert_eq!(names(&job_one), vec!["a", "c"]);

        let typed = repo.get_with_type(1, "k").await.unwrap();
        assert_eq!(names(&typed), vec!["a"]);
    }

    #[tokio::test]
    async fn test_containing_scope() {
        let repo = setup_test_db().await;
        repo.create(&Tag::new(1, "the FOO bar", None, "en")).await.unwrap();
        repo.create(&Tag::new(1, "food", None, "en")).await.unwrap();

        let foo = repo.get(&TagQuery::new().containing("Foo", "en")).await.unwrap();
        assert_eq!(foo.len(), 2);

        let foods = repo.get(&TagQuery::new().containing("foods", "en")).await.unwrap();
        assert!(foods.is_empty());

        let wrong_locale = repo.get(&TagQuery::new().containing("foo", "nl")).await.unwrap();
        assert!(wrong_locale.is_empty());

        let searched = repo.search("BAR").await.unwrap();
        assert_eq!(names(&searched), vec!["the FOO bar"]);
    }

    #[tokio::test]
    async fn test_containing_is_literal() {
        let repo = setup_test_db().await;
        repo.create(&Tag::new(1, "100% Wool", None, "en")).await.unwrap();
        repo.create(&Tag::new(1, "cotton", None, "en")).await.unwrap();

        let found = repo.get(&TagQuery::new().containing("%", "en")).await.unwrap();
        assert_eq!(names(&found), vec!["100% Wool"]);
    }

    #[tokio::test]
    async fn test_get_types() {
        let repo = setup_test_db().await;
        repo.create(&Tag::new(1, "a", Some("color"), "en")).await.unwrap();
        repo.create(&Tag::new(2, "b", Some("color"), "en")).await.unwrap();
        repo.create(&Tag::new(2, "c", Some("mood"), "en")).await.unwrap();
        repo.create(&Tag::new(3, "d", None, "en")).await.unwrap();

        let mut types = repo.get_types().await.unwrap();
        types.sort();
        assert_eq!(
            types,
            vec![None, Some("color".to_string()), Some("mood".to_string())]
        );
    }

    #[tokio::test]
    async fn test_sortable_operations() {
        let repo = setup_test_db().await;
        let a = repo.create(&Tag::new(1, "a", None, "en")).await.unwrap();
        let b = repo.create(&Tag::new(1, "b", None, "en")).await.unwrap();
        let c = repo.create(&Tag::new(1, "c", None, "en")).await.unwrap();
        assert_eq!(repo.highest_order_number().await.unwrap(), 3);
        assert_eq!(repo.lowest_order_number().await.unwrap(), 1);

        repo.move_order_down(a.id).await.unwrap();
        assert_eq!(names(&repo.list().await.unwrap()), vec!["b", "a", "c"]);

        repo.move_order_up(c.id).await.unwrap();
        assert_eq!(names(&repo.list().await.unwrap()), vec!["b", "c", "a"]);

        // Edges are no-ops
        repo.move_order_up(b.id).await.unwrap();
        repo.move_order_down(a.id).await.unwrap();
        assert_eq!(names(&repo.list().await.unwrap()), vec!["b", "c", "a"]);

        repo.move_to_end(b.id).await.unwrap();
        assert_eq!(names(&repo.list().await.unwrap()), vec!["c", "a", "b"]);

        repo.swap_order(c.id, b.id).await.unwrap();
        assert_eq!(names(&repo.list().await.unwrap()), vec!["b", "a", "c"]);

        repo.move_tag(c.id, 2).await.unwrap();
        assert_eq!(names(&repo.list().await.unwrap()), vec!["b", "c", "a"]);

        repo.set_new_order(&[a.id, b.id, c.id], 1).await.unwrap();
        let ordered = repo.list().await.unwrap();
        assert_eq!(names(&ordered), vec!["a", "b", "c"]);
        assert_eq!(
            ordered.iter().map(|t| t.order_column).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_delete_renumbers() {
        let repo = setup_test_db().await;
        let a = repo.create(&Tag::new(1, "a", None, "en")).await.unwrap();
        repo.create(&Tag::new(1, "b", None, "en")).await.unwrap();
        repo.create(&Tag::new(1, "c", None, "en")).await.unwrap();

        repo.delete(a.id).await.expect("Delete failed");
        assert!(repo.find_by_id(a.id).await.unwrap().is_none());

        let rest = repo.list().await.unwrap();
        assert_eq!(
            rest.iter().map(|t| t.order_column).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(matches!(repo.delete(a.id).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_new_order_unknown_tag_changes_nothing() {
        let repo = setup_test_db().await;
        let a = repo.create(&Tag::new(1, "a", None, "en")).await.unwrap();
        let b = repo.create(&Tag::new(1, "b", None, "en")).await.unwrap();

        let result = repo.set_new_order(&[b.id, 9999, a.id], 1).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));

        // No partial renumbering
        assert_eq!(names(&repo.list().await.unwrap()), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_set_new_order_out_of_range() {
        let repo = setup_test_db().await;
        let a = repo.create(&Tag::new(1, "a", None, "en")).await.unwrap();
        let b = repo.create(&Tag::new(1, "b", None, "en")).await.unwrap();

        let result = repo.set_new_order(&[a.id, b.id], i32::MAX).await;
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
        assert_eq!(repo.find_by_id(a.id).await.unwrap().unwrap().order_column, 1);

        // The last slot itself is usable, but nothing can be appended after it
        repo.set_new_order(&[b.id], i32::MAX).await.unwrap();
        let err = repo.create(&Tag::new(1, "c", None, "en")).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_reorder_unknown_tag() {
        let repo = setup_test_db().await;
        assert!(matches!(repo.move_to_start(42).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_uninitialized_repository() {
        let repo = TagRepository::new(crate::repository::DbState::new().connection(), Locale::default());
        let err = repo.list().await.unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
    }

    #[tokio::test]
    async fn test_open_from_config() {
        let repo = crate::open(&crate::TagConfig::in_memory()).await.unwrap();
        assert_eq!(repo.locale().as_str(), "en");
        assert!(repo.list().await.unwrap().is_empty());
    }
}
