//! Domain layer of chatcfg: the chat client's settings schema, the model
//! catalog, value validation and the ports the store depends on.

pub mod catalog;
pub mod envelope;
pub mod error;
pub mod observer;
pub mod repository;
pub mod schema;
pub mod validator;

pub use catalog::{ModelCatalog, ModelEntry};
pub use envelope::PersistedEnvelope;
pub use error::{ConfigError, DataFormat, Result};
pub use observer::{ChangeCallback, ConfigObservers, SubscriptionId};
pub use repository::KeyValueStore;
pub use schema::{
    CONFIG_STORE_KEY, CURRENT_SCHEMA_VERSION, ChatConfig, FIRST_SCHEMA_VERSION, ModelConfig,
    SubmitKey, Theme,
};
pub use validator::ModelConfigValidator;
