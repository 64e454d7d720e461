//! Infrastructure layer of chatcfg: storage adapters, the versioned DTOs and
//! their migration chain, and the live [`ConfigStore`].

pub mod config_store;
pub mod dto;
pub mod migration;
pub mod paths;
pub mod storage;

pub use config_store::{ConfigStore, CorruptStatePolicy, StoreOptions};
pub use paths::{CONFIG_DIR_ENV, ChatcfgPaths, PathError};
pub use storage::{FileKeyValueStore, MemoryKeyValueStore, StorageError, StorageFormat};
