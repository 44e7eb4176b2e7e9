use crate::commands::{next_id, CmdMessage, CmdResult};
use crate::error::{RobopediaError, Result};
use crate::record::Record;
use crate::slug::slugify;
use crate::store::cache::EntityStore;
use crate::store::StorageBackend;

pub fn run<T: Record, B: StorageBackend>(
    store: &mut EntityStore<T>,
    backend: &B,
    draft: T::Draft,
) -> Result<CmdResult<T>> {
    T::validate_draft(&draft)?;

    let key = match T::draft_key(&draft) {
        Some(key) => key,
        None if T::DERIVED_KEY => slugify(T::draft_title(&draft).unwrap_or_default()),
        None => String::new(),
    };
    if key.is_empty() {
        return Err(RobopediaError::Validation(format!(
            "Could not derive a slug for this {}",
            T::NOUN
        )));
    }
    if store.key_taken(backend, &key, None) {
        return Err(duplicate_key::<T>(key));
    }

    let id = match T::draft_id(&draft) {
        Some(id) if store.contains_id(backend, id) => {
            return Err(RobopediaError::Validation(format!(
                "A {} with id '{}' already exists",
                T::NOUN,
                id
            )));
        }
        Some(id) => id.to_string(),
        None => next_id(store, backend),
    };

    let record = T::from_draft(id, key, draft);
    store.insert(backend, record.clone());
    let persisted = store.flush(backend);

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Created {}: {}",
        T::NOUN,
        record.title()
    )));
    result.set_persisted(persisted, backend.name());
    Ok(result.with_affected(vec![record]))
}

/// Rejection for a key that is already in use.
pub(crate) fn duplicate_key<T: Record>(key: String) -> RobopediaError {
    if T::DERIVED_KEY {
        RobopediaError::DuplicateSlug {
            kind: T::NOUN,
            slug: key,
        }
    } else {
        RobopediaError::Validation(format!("A {} with key '{}' already exists", T::NOUN, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::get;
    use crate::model::{NewsArticle, NewsDraft, Robot, RobotDraft, User};
    use crate::store::cache::Origin;
    use crate::store::mem_backend::MemBackend;
    use crate::store::Collection;
    use crate::test_utils::{robot, user_draft};

    fn store() -> EntityStore<Robot> {
        EntityStore::new(vec![robot("robot-001", "Atlas"), robot("robot-002", "Sophia")])
    }

    #[test]
    fn creates_with_generated_id_and_slug() {
        let backend = MemBackend::new();
        let mut store = store();
        let result = run(&mut store, &backend, RobotDraft::named("Test Bot")).unwrap();

        let created = &result.affected[0];
        assert!(created.id.starts_with("robot-"));
        assert_eq!(created.slug, "test-bot");
        assert!(result.persisted);
        assert_eq!(
            get::by_key(&mut store, &backend, "test-bot").map(|r| r.id),
            Some(created.id.clone())
        );
        assert_eq!(store.origin(&backend, &created.id), Some(Origin::Custom));
    }

    #[test]
    fn explicit_slug_wins_over_title() {
        let backend = MemBackend::new();
        let mut store = store();
        let draft = RobotDraft {
            slug: Some("My Custom Slug".into()),
            ..RobotDraft::named("Test Bot")
        };
        let result = run(&mut store, &backend, draft).unwrap();
        assert_eq!(result.affected[0].slug, "My Custom Slug");
    }

    #[test]
    fn only_custom_records_are_saved() {
        let backend = MemBackend::new();
        let mut store = store();
        run(&mut store, &backend, RobotDraft::named("Test Bot")).unwrap();

        let saved = backend.stored(Collection::Robots);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0]["slug"], "test-bot");
    }

    #[test]
    fn duplicate_slug_is_rejected_without_mutation() {
        let backend = MemBackend::new();
        let mut store = store();
        let err = run(&mut store, &backend, RobotDraft::named("atlas!")).unwrap_err();

        assert!(matches!(err, RobopediaError::DuplicateSlug { ref slug, .. } if slug == "atlas"));
        assert_eq!(get::all(&mut store, &backend).len(), 2);
        assert!(backend.save_calls().is_empty());
    }

    #[test]
    fn missing_name_is_rejected() {
        let backend = MemBackend::new();
        let mut store = store();
        let err = run(&mut store, &backend, RobotDraft::default()).unwrap_err();
        assert!(matches!(err, RobopediaError::Validation(_)));

        let err = run(&mut store, &backend, RobotDraft::named("!!!")).unwrap_err();
        assert!(matches!(err, RobopediaError::Validation(_)));
    }

    #[test]
    fn explicit_id_must_be_unused() {
        let backend = MemBackend::new();
        let mut store = store();
        let draft = RobotDraft {
            id: Some("robot-001".into()),
            ..RobotDraft::named("Another")
        };
        assert!(run(&mut store, &backend, draft).is_err());
    }

    #[test]
    fn failed_save_keeps_record_and_reports_it() {
        let backend = MemBackend::new();
        backend.set_simulate_write_error(true);
        let mut store = store();

        let result = run(&mut store, &backend, RobotDraft::named("Test Bot")).unwrap();
        assert!(!result.persisted);
        assert!(result
            .messages
            .iter()
            .any(|m| m.level == crate::commands::MessageLevel::Warning));
        assert!(get::by_key(&mut store, &backend, "test-bot").is_some());
    }

    #[test]
    fn creates_news_with_published_default() {
        let backend = MemBackend::new();
        let mut store = EntityStore::<NewsArticle>::new(Vec::new());
        let result = run(&mut store, &backend, NewsDraft::titled("Hello World")).unwrap();
        let article = &result.affected[0];
        assert!(article.id.starts_with("news-"));
        assert_eq!(article.slug, "hello-world");
        assert!(article.is_published());
    }

    #[test]
    fn users_are_unique_by_email() {
        let backend = MemBackend::new();
        let mut store = EntityStore::<User>::new(Vec::new());
        run(&mut store, &backend, user_draft("ada@example.com")).unwrap();

        let err = run(&mut store, &backend, user_draft("ADA@example.com")).unwrap_err();
        assert!(matches!(err, RobopediaError::Validation(_)));

        let saved = backend.stored(Collection::Users);
        assert_eq!(saved.len(), 1);
        assert_ne!(saved[0]["password"], "secret");
    }
}
