//! Loading sandbox options from configuration files.

extern crate justbox;
extern crate tempfile;

use std::io::Write;

use justbox::runner::ds::value::JsValue;
use justbox::runner::host::HostEnvironment;
use justbox::sandbox::{Classification, Sandbox, SandboxError, SandboxOptions};

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_options_from_file() {
    let file = config_file(
        r#"{
            "multiMode": true,
            "injection": { "appName": "orders", "retries": 3 },
            "classification": { "makeThing": "preserve" }
        }"#,
    );
    let options = SandboxOptions::load(file.path()).unwrap();
    assert!(options.multi_mode);
    assert_eq!(options.injection.len(), 2);
    assert_eq!(options.classification.lookup("makeThing"), Some(Classification::Preserve));
}

#[test]
fn test_loaded_options_drive_the_sandbox() {
    let file = config_file(r#"{ "multiMode": true, "injection": { "appName": "orders" } }"#);
    let host = HostEnvironment::new();
    let mut sandbox = Sandbox::new(&host, SandboxOptions::load(file.path()).unwrap());
    assert_eq!(
        sandbox.execute("marker = appName + '!'; marker", None).unwrap(),
        JsValue::string("orders!")
    );
    assert!(!host.has("marker"));
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    match SandboxOptions::load(dir.path().join("absent.json")) {
        Err(SandboxError::Config(message)) => assert!(message.contains("absent.json")),
        other => panic!("Expected config error, got {:?}", other),
    }
}

#[test]
fn test_malformed_file_is_config_error() {
    let file = config_file("{ multiMode: yes }");
    assert!(matches!(SandboxOptions::load(file.path()), Err(SandboxError::Config(_))));
}

#[test]
fn test_unknown_classification_is_rejected() {
    let file = config_file(r#"{ "classification": { "f": "sometimes" } }"#);
    assert!(matches!(SandboxOptions::load(file.path()), Err(SandboxError::Config(_))));
}

#[test]
fn test_options_round_trip_through_json() {
    let options = SandboxOptions::from_json_str(r#"{ "multiMode": true }"#).unwrap();
    let text = serde_json::to_string(&options).unwrap();
    assert!(text.contains("\"multiMode\":true"));
    assert_eq!(SandboxOptions::from_json_str(&text).unwrap(), options);
}
