// tests/command_builder.rs

mod common;
use crate::common::builders::SettingsBuilder;
use crate::common::fake_builder;

use runasd::errors::RunAsError;

#[test]
fn defaults_apply_when_optional_keys_are_absent() {
    let (_manager, builder) = fake_builder();
    let settings = SettingsBuilder::service("myapp", "/opt/myapp/bin/myapp").build();

    let cmd = builder.build_command(&settings, "myapp").unwrap();

    assert_eq!(cmd.name(), "myapp");
    assert_eq!(cmd.executable(), "/opt/myapp/bin/myapp");
    assert_eq!(cmd.parameters(), "");
    assert!(!cmd.kill_children());
    assert!(!cmd.is_running());
}

#[test]
fn configured_values_are_used() {
    let (_manager, builder) = fake_builder();
    let settings = SettingsBuilder::service("myapp", "/opt/myapp/bin/myapp")
        .parameters("--port 8080 --name \"my app\"")
        .kill_process_tree(true)
        .build();

    let cmd = builder.build_command(&settings, "myapp").unwrap();

    assert_eq!(cmd.parameters(), "--port 8080 --name \"my app\"");
    assert!(cmd.kill_children());
}

#[test]
fn kill_process_tree_accepts_text_booleans() {
    let (_manager, builder) = fake_builder();
    let settings = SettingsBuilder::service("myapp", "/bin/true")
        .with("killProcessTree", "TRUE")
        .build();

    let cmd = builder.build_command(&settings, "myapp").unwrap();

    assert!(cmd.kill_children());
}

#[test]
fn missing_executable_is_a_config_error() {
    let (manager, builder) = fake_builder();
    let settings = SettingsBuilder::new().with("name", "myapp").build();

    let err = builder.build_command(&settings, "myapp").unwrap_err();

    assert!(matches!(err, RunAsError::ConfigError(_)), "got {err:?}");
    assert_eq!(manager.created(), 0);
}

#[test]
fn blank_executable_is_a_config_error() {
    let (_manager, builder) = fake_builder();
    let settings = SettingsBuilder::service("myapp", "   ").build();

    assert!(matches!(
        builder.build_command(&settings, "myapp"),
        Err(RunAsError::ConfigError(_))
    ));
}

#[test]
fn invalid_kill_process_tree_is_a_config_error() {
    let (_manager, builder) = fake_builder();
    let settings = SettingsBuilder::service("myapp", "/bin/true")
        .with("killProcessTree", "sometimes")
        .build();

    let err = builder.build_command(&settings, "myapp").unwrap_err();

    match err {
        RunAsError::ConfigError(msg) => assert!(msg.contains("killProcessTree"), "{msg}"),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn building_does_not_create_a_process() {
    let (manager, builder) = fake_builder();
    let settings = SettingsBuilder::service("myapp", "/bin/true").build();

    let _cmd = builder.build_command(&settings, "myapp").unwrap();

    assert_eq!(manager.created(), 0);
    assert!(manager.events().is_empty());
}
