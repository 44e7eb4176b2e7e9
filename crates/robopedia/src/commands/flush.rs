use crate::commands::{CmdMessage, CmdResult, Stores};
use crate::record::Record;
use crate::store::cache::EntityStore;
use crate::store::{Collection, StorageBackend};
use tracing::warn;

/// Saves the custom records of every warm cache, then pushes whatever the backend
/// still holds as pending from earlier runs. Cold caches are skipped: they hold
/// nothing the backend does not already have.
///
/// `affected` lists the collections that could not be saved.
pub fn run<B: StorageBackend>(stores: &Stores, backend: &B) -> CmdResult<Collection> {
    let mut result = CmdResult::default();
    check(&stores.robots, backend, &mut result);
    check(&stores.news, backend, &mut result);
    check(&stores.users, backend, &mut result);

    match backend.sync_pending() {
        Ok(outcomes) => {
            for (collection, outcome) in outcomes {
                match outcome {
                    Ok(()) => result.add_message(CmdMessage::info(format!(
                        "Pushed pending {} to {}",
                        collection,
                        backend.name()
                    ))),
                    Err(e) => {
                        warn!("Pending {} not pushed: {}", collection, e);
                        if !result.affected.contains(&collection) {
                            result.affected.push(collection);
                            result.add_message(CmdMessage::error(format!(
                                "Could not save {}",
                                collection
                            )));
                        }
                    }
                }
            }
        }
        Err(e) => {
            warn!("Cannot list pending changes: {}", e);
            result.add_message(CmdMessage::error(format!(
                "Cannot read pending changes: {}",
                e
            )));
            result.set_persisted(false, backend.name());
            return result;
        }
    }

    if result.affected.is_empty() {
        result.add_message(CmdMessage::success(format!("All changes saved to {}", backend.name())));
    } else {
        result.set_persisted(false, backend.name());
    }
    result
}

fn check<T: Record, B: StorageBackend>(
    store: &EntityStore<T>,
    backend: &B,
    result: &mut CmdResult<Collection>,
) {
    if !store.flush(backend) {
        result.affected.push(T::COLLECTION);
        result.add_message(CmdMessage::error(format!("Could not save {}", T::COLLECTION)));
    }
}
