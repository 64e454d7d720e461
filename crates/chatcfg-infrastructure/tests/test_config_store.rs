use chatcfg_core::schema::{CONFIG_STORE_KEY, CURRENT_SCHEMA_VERSION, ChatConfig, SubmitKey, Theme};
use chatcfg_core::{ConfigError, KeyValueStore, PersistedEnvelope};
use chatcfg_infrastructure::{
    ConfigStore, CorruptStatePolicy, FileKeyValueStore, StorageFormat, StoreOptions,
};
use serde_json::json;
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn file_store(temp_dir: &TempDir) -> Arc<FileKeyValueStore> {
    Arc::new(FileKeyValueStore::new(temp_dir.path().to_path_buf()))
}

fn read_envelope(temp_dir: &TempDir) -> PersistedEnvelope {
    let content = fs::read_to_string(temp_dir.path().join("app-config.json"))
        .expect("config file should exist");
    PersistedEnvelope::from_json(serde_json::from_str(&content).unwrap()).unwrap()
}

#[test]
fn test_first_run_writes_defaults() {
    let temp_dir = TempDir::new().unwrap();

    let store = ConfigStore::init(file_store(&temp_dir), StoreOptions::default()).unwrap();

    assert_eq!(store.get(), ChatConfig::default());
    let envelope = read_envelope(&temp_dir);
    assert_eq!(envelope.version, CURRENT_SCHEMA_VERSION);
    assert_eq!(
        envelope.state,
        serde_json::to_value(ChatConfig::default()).unwrap()
    );
}

#[test]
fn test_v1_file_is_migrated_and_rewritten() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("app-config.json"),
        r#"{
            "version": 1,
            "state": {
                "submitKey": "Ctrl + Enter",
                "avatar": "1f600",
                "fontSize": 16,
                "theme": "light",
                "tightBorder": true,
                "sendPreviewBubble": true,
                "sidebarWidth": 280,
                "disablePromptHint": true,
                "dontShowMaskSplashScreen": true,
                "modelConfig": {
                    "model": "gpt-3.5-turbo",
                    "temperature": 0.7,
                    "max_tokens": 1500,
                    "presence_penalty": 0.5,
                    "sendMemory": false,
                    "historyMessageCount": 32,
                    "compressMessageLengthThreshold": 4000
                }
            }
        }"#,
    )
    .unwrap();

    let store = ConfigStore::init(file_store(&temp_dir), StoreOptions::default()).unwrap();
    let config = store.get();

    // User preferences survive
    assert_eq!(config.submit_key, SubmitKey::CtrlEnter);
    assert_eq!(config.font_size, 16);
    assert_eq!(config.theme, Theme::Light);
    assert_eq!(config.model_config.model, "gpt-3.5-turbo");
    assert_eq!(config.model_config.temperature, 0.7);
    assert_eq!(config.model_config.max_tokens, 1500);

    // v2 resets these
    assert!(config.model_config.send_memory);
    assert_eq!(config.model_config.history_message_count, 4);
    assert_eq!(config.model_config.compress_message_length_threshold, 1000);
    assert!(!config.dont_show_mask_splash_screen);

    let envelope = read_envelope(&temp_dir);
    assert_eq!(envelope.version, CURRENT_SCHEMA_VERSION);
    assert_eq!(envelope.state, serde_json::to_value(&config).unwrap());
}

#[test]
fn test_versionless_file_is_treated_as_v1() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("app-config.json"),
        r#"{
            "state": {
                "theme": "auto",
                "modelConfig": {
                    "model": "gpt-4o-mini",
                    "temperature": 0.5,
                    "max_tokens": 2000,
                    "presence_penalty": 0,
                    "sendMemory": false
                }
            }
        }"#,
    )
    .unwrap();

    let store = ConfigStore::init(file_store(&temp_dir), StoreOptions::default()).unwrap();

    assert_eq!(store.get().theme, Theme::Auto);
    assert!(store.model_config().send_memory);
    assert_eq!(read_envelope(&temp_dir).version, CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_updates_persist_across_restarts() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = ConfigStore::init(file_store(&temp_dir), StoreOptions::default()).unwrap();
        store.update(|config| {
            config.theme = Theme::Light;
            config.model_config.model = "gpt-4-turbo".to_string();
            config.model_config.temperature = 0.9;
        });
    }

    let store = ConfigStore::init(file_store(&temp_dir), StoreOptions::default()).unwrap();
    let config = store.get();
    assert_eq!(config.theme, Theme::Light);
    assert_eq!(config.model_config.model, "gpt-4-turbo");
    assert_eq!(config.model_config.temperature, 0.9);
}

#[test]
fn test_toml_backend_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let storage = || {
        Arc::new(
            FileKeyValueStore::new(temp_dir.path().to_path_buf()).with_format(StorageFormat::Toml),
        )
    };

    {
        let store = ConfigStore::init(storage(), StoreOptions::default()).unwrap();
        store.update(|config| config.sidebar_width = 360);
    }

    assert!(temp_dir.path().join("app-config.toml").exists());
    let store = ConfigStore::init(storage(), StoreOptions::default()).unwrap();
    assert_eq!(store.get().sidebar_width, 360);
}

#[test]
fn test_reset_overwrites_file_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let store = ConfigStore::init(file_store(&temp_dir), StoreOptions::default()).unwrap();
    store.update(|config| config.font_size = 22);

    store.reset();

    assert_eq!(store.get(), ChatConfig::default());
    assert_eq!(
        read_envelope(&temp_dir).state,
        serde_json::to_value(ChatConfig::default()).unwrap()
    );
}

#[test]
fn test_observer_sees_committed_state() {
    let temp_dir = TempDir::new().unwrap();
    let store =
        Arc::new(ConfigStore::init(file_store(&temp_dir), StoreOptions::default()).unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let reader = Arc::clone(&store);
    let log = Arc::clone(&seen);
    store.subscribe(Arc::new(move || {
        log.lock().unwrap().push(reader.get().theme);
    }));

    store.update(|config| config.theme = Theme::Light);
    store.update(|config| config.theme = Theme::Auto);

    assert_eq!(*seen.lock().unwrap(), vec![Theme::Light, Theme::Auto]);
}

#[test]
fn test_corrupt_file_fails_by_default() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("app-config.json"), "{ truncated").unwrap();

    let err = ConfigStore::init(file_store(&temp_dir), StoreOptions::default()).unwrap_err();

    assert!(err.is_serialization());
    // The file is left alone for inspection
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("app-config.json")).unwrap(),
        "{ truncated"
    );
}

#[test]
fn test_corrupt_file_can_be_reset() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("app-config.json"), "{ truncated").unwrap();

    let options = StoreOptions::default().with_on_corrupt(CorruptStatePolicy::ResetToDefault);
    let store = ConfigStore::init(file_store(&temp_dir), options).unwrap();

    assert_eq!(store.get(), ChatConfig::default());
    assert!(read_envelope(&temp_dir).is_current());
}

#[test]
fn test_float_max_tokens_from_other_clients_loads() {
    let temp_dir = TempDir::new().unwrap();
    let mut state = serde_json::to_value(ChatConfig::default()).unwrap();
    state["modelConfig"]["max_tokens"] = json!(2000.0);
    fs::write(
        temp_dir.path().join("app-config.json"),
        json!({ "version": CURRENT_SCHEMA_VERSION, "state": state }).to_string(),
    )
    .unwrap();

    let store = ConfigStore::init(file_store(&temp_dir), StoreOptions::default()).unwrap();
    assert_eq!(store.model_config().max_tokens, 2000);

    store.update(|config| config.model_config.max_tokens = 1024);
    assert_eq!(read_envelope(&temp_dir).state["modelConfig"]["max_tokens"], json!(1024));
}

#[test]
fn test_newer_schema_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let storage = file_store(&temp_dir);
    storage
        .save(CONFIG_STORE_KEY, &json!({ "version": 7, "state": {} }))
        .unwrap();

    let err = ConfigStore::init(storage, StoreOptions::default()).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::UnsupportedVersion {
            found: 7,
            latest: CURRENT_SCHEMA_VERSION
        }
    ));
}

#[test]
fn test_write_failure_keeps_memory_authoritative() {
    let temp_dir = TempDir::new().unwrap();
    // A regular file where the store directory should be
    let blocked = temp_dir.path().join("blocked");
    fs::write(&blocked, "").unwrap();
    let storage = Arc::new(FileKeyValueStore::new(blocked));

    let store = ConfigStore::init(storage, StoreOptions::default()).unwrap();
    store.update(|config| config.avatar = "1f680".to_string());

    assert_eq!(store.get().avatar, "1f680");
    assert!(store.persist().is_err());
}
