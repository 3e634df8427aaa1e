pub mod sqlite_cache;

pub use sqlite_cache::SqliteCacheStore;
