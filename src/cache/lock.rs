//! Snapshot slots survive a panicking writer: the poisoned guard is taken
//! over and the event is logged against the collection.

use std::sync::{LockResult, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn read_slot<'a, T>(
    slot: &'a RwLock<T>,
    collection: &'static str,
) -> RwLockReadGuard<'a, T> {
    recover(slot.read(), collection, "read")
}

pub(crate) fn write_slot<'a, T>(
    slot: &'a RwLock<T>,
    collection: &'static str,
) -> RwLockWriteGuard<'a, T> {
    recover(slot.write(), collection, "write")
}

fn recover<G>(result: LockResult<G>, collection: &'static str, access: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            target = "timberline::cache",
            collection,
            access,
            "snapshot slot poisoned; continuing with the last written snapshot"
        );
        poisoned.into_inner()
    })
}
