// tests/logging_filter.rs

use runasd::cli::LogLevel;
use runasd::logging::{filter_directives, CHILD_OUTPUT_TARGET};

#[test]
fn defaults_to_info() {
    assert_eq!(filter_directives(None, None), "info");
    assert_eq!(filter_directives(None, Some("  ")), "info");
    assert_eq!(filter_directives(None, Some(",")), "info");
}

#[test]
fn cli_level_wins_over_the_environment() {
    assert_eq!(
        filter_directives(Some(LogLevel::Debug), Some("error,runasd::child=trace")),
        "debug"
    );
    assert_eq!(filter_directives(Some(LogLevel::Warn), None), "warn");
}

#[test]
fn environment_directives_are_kept_per_target() {
    let env = format!("info, {CHILD_OUTPUT_TARGET}=debug");

    let directives = filter_directives(None, Some(env.as_str()));
    assert_eq!(directives, "info,runasd::child=debug");
}

#[test]
fn warning_is_an_alias_for_warn() {
    assert_eq!(filter_directives(None, Some("WARNING")), "warn");
    assert_eq!(
        filter_directives(None, Some("debug,runasd::hooks=Warning")),
        "debug,runasd::hooks=warn"
    );
}
