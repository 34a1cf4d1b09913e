//! `CollectionStore` adapters selected by `storage.backend`.

mod file;
mod memory;
mod remote;

pub use file::FileCollectionStore;
pub use memory::MemoryCollectionStore;
pub use remote::{RemoteCollectionStore, RemoteStoreConfig};
