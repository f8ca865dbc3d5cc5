//! Unit tests for the logging subsystem.

use std::path::PathBuf;

use super::{format_service_name, service::logger_config, types::*, LoggingInitConfig, Rotation};

#[test]
fn test_format_service_name() {
    assert_eq!(format_service_name("bridge-operator", None), "bridge-operator");
    assert_eq!(
        format_service_name("bridge-operator", Some("dev")),
        "bridge-operator%dev"
    );
}

#[test]
fn test_logger_config_builder_pattern() {
    let file = FileLoggingConfig::new(PathBuf::from("/tmp/logs"), "op".to_string())
        .with_rotation(Rotation::HOURLY)
        .with_json_format(true);
    let config = LoggerConfig::new("test-service".to_string())
        .with_json_logging(true)
        .with_file_logging(file);

    assert_eq!(config.service_name, "test-service");
    assert!(config.stdout_config.json_format);
    let file = config.file_logging_config.unwrap();
    assert_eq!(file.file_name_prefix, "op");
    assert!(file.json_format);
}

#[test]
fn test_logger_config_from_init_config() {
    let dir = PathBuf::from("/var/log/covbridge");
    let init = LoggingInitConfig {
        service_base_name: "bridge-operator",
        service_label: Some("prod"),
        log_dir: Some(&dir),
        log_file_prefix: None,
        json_format: Some(true),
        default_log_prefix: "operator",
    };

    let config = logger_config(&init);
    assert_eq!(config.service_name, "bridge-operator%prod");
    assert!(config.stdout_config.json_format);
    let file = config.file_logging_config.unwrap();
    assert_eq!(file.directory, dir);
    assert_eq!(file.file_name_prefix, "operator");
}

#[test]
fn test_no_file_logging_without_dir() {
    let init = LoggingInitConfig {
        service_base_name: "bridge-operator",
        service_label: None,
        log_dir: None,
        log_file_prefix: Some("ignored"),
        json_format: None,
        default_log_prefix: "operator",
    };

    let config = logger_config(&init);
    assert!(config.file_logging_config.is_none());
    assert!(!config.stdout_config.json_format);
}
