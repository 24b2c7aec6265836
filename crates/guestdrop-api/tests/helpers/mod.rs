//! Test helpers: build AppState and router for integration tests.
//!
//! Every app gets its own temporary root holding the object store, the event
//! registry and the staging directory.

pub mod storage;
pub mod workflows;

use axum_test::TestServer;
use guestdrop_api::setup::routes;
use guestdrop_api::state::AppState;
use guestdrop_core::config::UploadServiceConfig;
use guestdrop_core::Config;
use guestdrop_db::EventRepository;
use guestdrop_storage::{create_storage, Storage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_ADMIN_PASSWORD: &str = "test-admin-secret";
pub const TEST_BASE_URL: &str = "http://localhost:3000";

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _root: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn staging_dir(&self) -> &PathBuf {
        self.state.config.staging_dir()
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.state.storage
    }

    /// Number of entries left in the staging directory.
    pub fn staged_file_count(&self) -> usize {
        std::fs::read_dir(self.staging_dir())
            .expect("Failed to read staging directory")
            .count()
    }
}

fn test_config(root: &Path, overrides: &[(&str, String)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("ADMIN_PASSWORD".to_string(), TEST_ADMIN_PASSWORD.to_string()),
        ("STORAGE_BACKEND".to_string(), "local".to_string()),
        (
            "LOCAL_STORAGE_PATH".to_string(),
            root.join("objects").to_string_lossy().to_string(),
        ),
        ("LOCAL_STORAGE_BASE_URL".to_string(), TEST_BASE_URL.to_string()),
        (
            "LOCAL_STORAGE_SIGNING_KEY".to_string(),
            "integration-test-signing-key".to_string(),
        ),
        (
            "EVENTS_FILE".to_string(),
            root.join("events.json").to_string_lossy().to_string(),
        ),
        (
            "UPLOAD_STAGING_DIR".to_string(),
            root.join("staging").to_string_lossy().to_string(),
        ),
        ("PUBLIC_BASE_URL".to_string(), TEST_BASE_URL.to_string()),
        ("MAX_UPLOAD_SIZE_MB".to_string(), "1".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.clone());
    }

    let inner = UploadServiceConfig::from_lookup(|key| vars.get(key).cloned())
        .expect("Failed to build test config");
    Config(Box::new(inner))
}

async fn build_app(root: TempDir, config: Config, storage: Option<Arc<dyn Storage>>) -> TestApp {
    std::fs::create_dir_all(config.staging_dir()).expect("Failed to create staging directory");

    let storage = match storage {
        Some(storage) => storage,
        None => create_storage(&config)
            .await
            .expect("Failed to create local storage"),
    };
    let events = EventRepository::new(config.events_file().clone());
    let state = Arc::new(AppState::new(config.clone(), storage, events));

    let app = routes::setup_routes(&config, state.clone()).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        _root: root,
    }
}

/// Setup test app with local storage and an empty registry.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_env(&[]).await
}

/// Setup test app with extra configuration variables.
pub async fn setup_test_app_with_env(overrides: &[(&str, String)]) -> TestApp {
    let root = tempfile::tempdir().expect("Failed to create temp directory");
    let config = test_config(root.path(), overrides);
    build_app(root, config, None).await
}

/// Setup test app backed by the given storage double.
pub async fn setup_test_app_with_storage(storage: Arc<dyn Storage>) -> TestApp {
    let root = tempfile::tempdir().expect("Failed to create temp directory");
    let config = test_config(root.path(), &[]);
    build_app(root, config, Some(storage)).await
}
