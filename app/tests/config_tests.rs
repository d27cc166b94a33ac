// app/tests/config_tests.rs

use std::env;

use marketplace::config::{AppConfig, BackendKind};
use marketplace::errors::AppError;
use serial_test::serial;

const KEYS: [&str; 11] = [
  "SERVER_HOST",
  "SERVER_PORT",
  "APP_BASE_URL",
  "HOSTED_BACKEND",
  "HOSTED_URL",
  "HOSTED_ANON_KEY",
  "HOSTED_SERVICE_KEY",
  "STORAGE_BUCKET",
  "SESSION_COOKIE_PREFIX",
  "COOKIE_SECURE",
  "CURRENCY",
];

fn clear_env() {
  for key in KEYS {
    env::remove_var(key);
  }
}

#[test]
#[serial]
fn memory_backend_needs_no_credentials() {
  clear_env();
  env::set_var("HOSTED_BACKEND", "memory");
  env::set_var("SERVER_PORT", "9090");

  let config = AppConfig::from_env().expect("config");
  assert_eq!(config.backend, BackendKind::Memory);
  assert_eq!(config.app_base_url, "http://127.0.0.1:9090");
  assert_eq!(config.access_cookie_name(), "mp-access-token");
  assert_eq!(config.currency, "USD");
  assert!(!config.cookie_secure);
  clear_env();
}

#[test]
#[serial]
fn rest_backend_requires_hosted_url() {
  clear_env();
  env::set_var("HOSTED_BACKEND", "rest");
  env::set_var("HOSTED_ANON_KEY", "anon");
  env::set_var("HOSTED_SERVICE_KEY", "service");

  match AppConfig::from_env() {
    Err(AppError::Config(msg)) => assert!(msg.contains("HOSTED_URL"), "{}", msg),
    other => panic!("expected a config error, got {:?}", other.map(|c| c.backend)),
  }

  env::set_var("HOSTED_URL", "https://project.example.co/");
  let config = AppConfig::from_env().expect("config");
  assert_eq!(config.hosted_url, "https://project.example.co");
  clear_env();
}

#[test]
#[serial]
fn bad_values_are_config_errors() {
  clear_env();
  env::set_var("HOSTED_BACKEND", "sqlite");
  assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));

  env::set_var("HOSTED_BACKEND", "memory");
  env::set_var("COOKIE_SECURE", "sometimes");
  assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));
  clear_env();
}
