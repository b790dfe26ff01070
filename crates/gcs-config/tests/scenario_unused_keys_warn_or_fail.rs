//! Unused-key guard: warn lists the strays, fail refuses them.

use gcs_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

const YAML: &str = r#"
store:
  kind: memory
digest:
  timezone: UTC
strore:
  kind: file
extras:
  - one
"#;

#[test]
fn warn_reports_sorted_unused_leaves() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/extras/0".to_string(), "/strore/kind".to_string()]
    );
    assert!(!report.is_clean());
}

#[test]
fn fail_refuses_unused_leaves() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    assert!(err.to_string().contains("CONFIG_UNUSED_KEYS"));
}

#[test]
fn fully_consumed_config_is_clean() {
    let loaded =
        load_layered_yaml_from_strings(&["store:\n  kind: file\n  path: /tmp/gcs\ndaemon:\n  addr: 0.0.0.0:8080\n"])
            .unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
}

#[test]
fn mistyped_key_inside_known_section_is_reported() {
    let loaded =
        load_layered_yaml_from_strings(&["store:\n  kindd: redis\n  path: /tmp/gcs\nnotify:\n  chunk_limt: 280\n"])
            .unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/notify/chunk_limt".to_string(), "/store/kindd".to_string()]
    );
}

#[test]
fn every_default_key_counts_as_consumed() {
    let defaults = serde_json::to_value(gcs_config::AppConfig::default()).unwrap();
    let report = report_unused_keys(&defaults, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
}
