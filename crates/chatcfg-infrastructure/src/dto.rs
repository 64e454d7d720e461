//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs represent the versioned schema of the stored configuration.
//! They are private to the infrastructure layer and handle the evolution of
//! the storage format over time; the rest of the workspace only sees
//! [`chatcfg_core::schema::ChatConfig`].
//!
//! ## Schema Versioning
//!
//! The envelope on disk carries an integer schema version. Each integer maps
//! to a MAJOR version of the DTO chain (`2` is `"2.0.0"`), see
//! [`chat_config::version_key`].
//!
//! ### ChatConfig Version History
//! - **1.0.0**: Initial schema, model parameters only
//! - **2.0.0**: Added conversation memory settings to `modelConfig`

pub mod chat_config;

pub use chat_config::{
    CHAT_CONFIG_ENTITY, ChatConfigDTO, ChatConfigV1_0, ChatConfigV2_0, ModelConfigV1_0,
    ModelConfigV2_0, create_chat_config_migrator, version_key,
};
