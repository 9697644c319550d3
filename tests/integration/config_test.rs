//! Configuration Integration Tests
//!
//! Config file lifecycle through `ConfigService` and its hand-off to
//! `AppState`.

use std::time::Duration;

use abogabot::models::settings::SettingsUpdate;
use abogabot::storage::ConfigService;
use abogabot::state::AppState;
use abogabot::utils::error::AppError;
use abogabot_core::{GenerateRoute, ProxyConfig, ProxyProtocol};

#[test]
fn test_config_roundtrip_through_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let mut service = ConfigService::open(&path).unwrap();

    service
        .update_config(SettingsUpdate {
            api_base_url: Some("http://127.0.0.1:9".to_string()),
            generator_base_url: Some("http://127.0.0.1:10".to_string()),
            generation_timeout_secs: Some(45),
            generate_route: Some(GenerateRoute::Query),
            ..Default::default()
        })
        .unwrap();

    let reopened = ConfigService::open(&path).unwrap();
    let config = reopened.get_config().clone();
    assert_eq!(config.generate_route, GenerateRoute::Query);

    let client_config = config.to_client_config();
    assert_eq!(client_config.generator_base_url, "http://127.0.0.1:10");
    assert_eq!(client_config.request_timeout, Duration::from_secs(30));

    let state = AppState::from_config(config).unwrap();
    assert_eq!(
        state.generation_options().timeout,
        Some(Duration::from_secs(45))
    );
}

#[test]
fn test_proxy_password_never_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let mut service = ConfigService::open(&path).unwrap();

    service
        .update_config(SettingsUpdate {
            proxy: Some(ProxyConfig {
                protocol: ProxyProtocol::Http,
                host: "proxy.estudio.test".to_string(),
                port: 3128,
                username: Some("abogado".to_string()),
                password: Some("secreto".to_string()),
            }),
            ..Default::default()
        })
        .unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("proxy.estudio.test"));
    assert!(!raw.contains("secreto"));
}

#[test]
fn test_invalid_file_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"api_base_url":"http://ok.test","request_timeout_secs":0}"#).unwrap();

    let err = ConfigService::open(&path).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn test_malformed_file_is_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = ConfigService::open(&path).unwrap_err();
    assert!(matches!(err, AppError::Serialization(_)));
}
