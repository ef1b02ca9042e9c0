use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use fintrip::config::WeatherConfig;
use fintrip::http::ApiClient;
use fintrip::navigation::RecordingNavigator;
use fintrip::session::SessionStore;
use fintrip::storage::{FileStorage, MemoryStorage};

/// Session store, its collaborators, and a client pointed at `base_url`
#[allow(dead_code)]
pub struct Harness {
    pub storage: Arc<MemoryStorage>,
    pub cookies: Arc<MemoryStorage>,
    pub navigator: Arc<RecordingNavigator>,
    pub session: Arc<SessionStore>,
    pub client: Arc<ApiClient>,
}

#[allow(dead_code)]
pub fn harness(base_url: &str, location: &str) -> Harness {
    harness_with_timeout(base_url, location, Duration::from_secs(5))
}

#[allow(dead_code)]
pub fn harness_with_timeout(base_url: &str, location: &str, timeout: Duration) -> Harness {
    let storage = Arc::new(MemoryStorage::new());
    let cookies = Arc::new(MemoryStorage::new());
    let navigator = Arc::new(RecordingNavigator::at(location));
    let session = Arc::new(SessionStore::new(
        storage.clone(),
        cookies.clone(),
        navigator.clone(),
    ));
    session.restore();

    let client = Arc::new(
        ApiClient::new(base_url, timeout, session.clone()).expect("failed to build api client"),
    );

    Harness {
        storage,
        cookies,
        navigator,
        session,
        client,
    }
}

#[allow(dead_code)]
pub fn create_temp_storage() -> (FileStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let storage = FileStorage::new_with_path(tmp.path().join("storage.json"))
        .expect("failed to create file storage with path");
    (storage, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Weather configuration pointing both provider endpoints at `base_url`
#[allow(dead_code)]
pub fn weather_config(base_url: &str) -> WeatherConfig {
    WeatherConfig {
        api_key: Some("test-key".to_string()),
        geocoding_url: base_url.to_string(),
        forecast_url: base_url.to_string(),
        units: "metric".to_string(),
    }
}
