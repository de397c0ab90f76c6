mod in_memory_store;
mod local_store;
mod store_factory;

pub use in_memory_store::InMemoryFileStore;
pub use local_store::LocalFileStore;
pub use store_factory::FileStoreFactory;
