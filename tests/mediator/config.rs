//! Configuration files driving mediator behavior.

use crate::common::*;
use rowgate::CONFIG_FILE_NAME;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn default_file_is_written_once_and_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    MediatorConfig::write_default_if_missing(&path).unwrap();
    let config = MediatorConfig::from_file(&path).unwrap();
    assert_eq!(config, MediatorConfig::default());
}

#[test]
fn prefix_from_file_names_transactions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "transaction_name_prefix = \"ingest\"\ntrace_operations = true\n").unwrap();

    let config = MediatorConfig::from_file(&path).unwrap();
    let mediator = Mediator::with_config(Arc::new(memory_adapter()), config);

    let scope = mediator.begin().unwrap();
    assert_eq!(scope.name(), Some("ingest-1"));
    scope.insert("users", user("Traced", 1), false).unwrap();
}

#[test]
fn malformed_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "rollback_on_error = maybe").unwrap();

    let err = MediatorConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
