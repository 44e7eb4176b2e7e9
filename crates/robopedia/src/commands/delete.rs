use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::record::Record;
use crate::store::cache::EntityStore;
use crate::store::StorageBackend;
use tracing::warn;

/// Removes the record with `id`. `Ok(None)` when there is no such record.
///
/// When the backend tracks assets, the record's images are deleted first. Asset
/// failures only produce warnings; the collection is saved either way.
///
/// Deleting a bundled record hides it for the lifetime of the cache only: the
/// bundled dataset is not part of what gets persisted, so it is visible again after
/// the next load.
pub fn run<T: Record, B: StorageBackend>(
    store: &mut EntityStore<T>,
    backend: &B,
    id: &str,
) -> Result<Option<CmdResult<T>>> {
    let Some(removed) = store.remove(backend, id) else {
        return Ok(None);
    };

    let mut result = CmdResult::default();

    if backend.tracks_assets() {
        for asset in removed.assets() {
            if let Err(e) = backend.delete_asset(asset) {
                warn!("Could not delete asset {} of {}: {}", asset, removed.id(), e);
                result.add_message(CmdMessage::warning(format!(
                    "Could not delete asset {}",
                    asset
                )));
            }
        }
    }

    let persisted = store.flush(backend);
    result.add_message(CmdMessage::success(format!(
        "Deleted {}: {}",
        T::NOUN,
        removed.title()
    )));
    result.set_persisted(persisted, backend.name());
    Ok(Some(result.with_affected(vec![removed])))
}
