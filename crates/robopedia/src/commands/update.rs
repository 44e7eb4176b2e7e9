use crate::commands::create::duplicate_key;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::record::Record;
use crate::slug::slugify;
use crate::store::cache::EntityStore;
use crate::store::StorageBackend;

/// Applies `patch` to the record with `id`. `Ok(None)` when there is no such record.
///
/// The id never changes. An explicit key in the patch is used as given; otherwise a
/// derived key is recomputed only when the title changed. A resulting key that
/// belongs to another record is rejected.
pub fn run<T: Record, B: StorageBackend>(
    store: &mut EntityStore<T>,
    backend: &B,
    id: &str,
    patch: T::Patch,
) -> Result<Option<CmdResult<T>>> {
    let Some(existing) = store.get(backend, id) else {
        return Ok(None);
    };

    let explicit_key = T::patch_key(&patch).is_some();
    let mut updated = existing.clone();
    updated.apply_patch(patch);

    if !explicit_key && T::DERIVED_KEY && updated.title() != existing.title() {
        let slug = slugify(updated.title());
        if !slug.is_empty() {
            updated.set_key(slug);
        }
    }

    if updated.key() != existing.key() && store.key_taken(backend, updated.key(), Some(id)) {
        return Err(duplicate_key::<T>(updated.key().to_string()));
    }

    store.replace(backend, updated.clone());
    let persisted = store.flush(backend);

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Updated {}: {}",
        T::NOUN,
        updated.title()
    )));
    result.set_persisted(persisted, backend.name());
    Ok(Some(result.with_affected(vec![updated])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{create, get};
    use crate::error::RobopediaError;
    use crate::model::{Robot, RobotDraft, RobotPatch};
    use crate::store::cache::Origin;
    use crate::store::mem_backend::MemBackend;
    use crate::store::Collection;
    use crate::test_utils::robot;

    fn store() -> EntityStore<Robot> {
        EntityStore::new(vec![robot("robot-001", "Atlas"), robot("robot-002", "Sophia")])
    }

    fn rename(name: &str) -> RobotPatch {
        RobotPatch {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn title_change_recomputes_slug_and_keeps_id() {
        let backend = MemBackend::new();
        let mut store = store();
        let result = run(&mut store, &backend, "robot-001", rename("Atlas Next"))
            .unwrap()
            .unwrap();

        let updated = &result.affected[0];
        assert_eq!(updated.id, "robot-001");
        assert_eq!(updated.slug, "atlas-next");
        assert!(get::by_key(&mut store, &backend, "atlas").is_none());
    }

    #[test]
    fn explicit_slug_is_kept_verbatim() {
        let backend = MemBackend::new();
        let mut store = store();
        let patch = RobotPatch {
            slug: Some("Atlas_V2 Classic".into()),
            ..rename("Atlas Next")
        };
        let result = run(&mut store, &backend, "robot-001", patch).unwrap().unwrap();
        assert_eq!(result.affected[0].slug, "Atlas_V2 Classic");
        assert!(get::by_key(&mut store, &backend, "Atlas_V2 Classic").is_some());
    }

    #[test]
    fn unchanged_title_keeps_slug() {
        let backend = MemBackend::new();
        let mut store = store();
        let patch = RobotPatch {
            description: Some("New text".into()),
            ..Default::default()
        };
        let result = run(&mut store, &backend, "robot-002", patch).unwrap().unwrap();
        assert_eq!(result.affected[0].slug, "sophia");
    }

    #[test]
    fn updating_a_default_makes_it_custom() {
        let backend = MemBackend::new();
        let mut store = store();
        run(&mut store, &backend, "robot-002", rename("Sophia 2")).unwrap();

        assert_eq!(store.origin(&backend, "robot-002"), Some(Origin::Custom));
        let saved = backend.stored(Collection::Robots);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0]["id"], "robot-002");
        assert_eq!(get::all(&mut store, &backend).len(), 2);
    }

    #[test]
    fn missing_record_is_none() {
        let backend = MemBackend::new();
        let mut store = store();
        assert!(run(&mut store, &backend, "robot-404", rename("X")).unwrap().is_none());
        assert!(backend.save_calls().is_empty());
    }

    #[test]
    fn colliding_slug_is_rejected() {
        let backend = MemBackend::new();
        let mut store = store();
        let err = run(&mut store, &backend, "robot-001", rename("Sophia")).unwrap_err();
        assert!(matches!(err, RobopediaError::DuplicateSlug { .. }));
        assert_eq!(get::by_id(&mut store, &backend, "robot-001").unwrap().name, "Atlas");
    }

    #[test]
    fn specification_keys_are_lowercased_on_update() {
        let backend = MemBackend::new();
        let mut store = store();
        let created = create::run(&mut store, &backend, RobotDraft::named("Specs"))
            .unwrap()
            .affected
            .remove(0);

        let mut specs = std::collections::BTreeMap::new();
        specs.insert("Top Speed".to_string(), "5 km/h".to_string());
        let patch = RobotPatch {
            specifications: Some(specs),
            ..Default::default()
        };
        let result = run(&mut store, &backend, &created.id, patch).unwrap().unwrap();
        assert!(result.affected[0].specifications.contains_key("top speed"));
    }
}
