//! Literal secrets in YAML are refused; env var names are accepted.

use gcs_config::load_layered_yaml_from_strings;

fn assert_refused(yaml: &str, leaf: &str) {
    let err = load_layered_yaml_from_strings(&[yaml]).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_SECRET_DETECTED"), "got: {msg}");
    assert!(msg.contains(leaf), "error should name the leaf; got: {msg}");
    assert!(msg.contains("REDACTED"));
}

#[test]
fn literal_session_cookie_is_refused() {
    assert_refused(
        "source:\n  session_cookie_env: \"PHPSESSID=abcdef0123456789\"\n",
        "/source/session_cookie_env",
    );
}

#[test]
fn literal_webhook_url_is_refused() {
    assert_refused(
        "notify:\n  webhook_url_env: \"https://hooks.slack.com/services/T000/B000/XXXX\"\n",
        "/notify/webhook_url_env",
    );
}

#[test]
fn redis_url_with_password_is_refused() {
    assert_refused(
        "store:\n  redis_url_env: \"redis://:hunter2secret@cache:6379\"\n",
        "/store/redis_url_env",
    );
}

#[test]
fn secret_in_overlay_layer_is_refused() {
    let base = "store:\n  kind: redis\n";
    let overlay = "notify:\n  webhook_url_env: \"https://discord.com/api/webhooks/1/abc\"\n";
    assert!(load_layered_yaml_from_strings(&[base, overlay]).is_err());
}

#[test]
fn env_var_names_are_accepted_and_kept_verbatim() {
    let loaded = load_layered_yaml_from_strings(&[
        "source:\n  session_cookie_env: GCS_SESSION_COOKIE\nstore:\n  redis_url_env: GCS_REDIS_URL\n",
    ])
    .unwrap();
    assert!(loaded.canonical_json.contains("GCS_SESSION_COOKIE"));
    assert!(loaded.canonical_json.contains("GCS_REDIS_URL"));
}
