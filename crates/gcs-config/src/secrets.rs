//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only env var NAMES (e.g. `"GCS_REDIS_URL"`).
//! - Callers invoke [`resolve_secrets`] once at startup and pass the result
//!   into constructors; nothing else reads these env vars.
//! - `Debug` redacts every value. Errors name the env var, never the value.
//!
//! # Enforcement
//! | Secret          | Required when            |
//! |-----------------|--------------------------|
//! | session cookie  | never (anonymous access) |
//! | redis URL       | `store.kind: redis`      |
//! | webhook URL     | `notify.sink: post`      |

use anyhow::{bail, Result};

use crate::app::{AppConfig, SinkKind, StoreKind};

pub const DEFAULT_REDIS_URL_ENV: &str = "GCS_REDIS_URL";
pub const DEFAULT_WEBHOOK_URL_ENV: &str = "GCS_WEBHOOK_URL";

#[derive(Clone, Default)]
pub struct ResolvedSecrets {
    pub session_cookie: Option<String>,
    pub redis_url: Option<String>,
    pub webhook_url: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "<REDACTED>"),
            )
            .field("redis_url", &self.redis_url.as_ref().map(|_| "<REDACTED>"))
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Unset and blank are both "absent".
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn require(var_name: &str, what: &str, when: &str) -> Result<String> {
    match resolve_env(var_name) {
        Some(v) => Ok(v),
        None => bail!("SECRETS_MISSING {when}: required env var '{var_name}' ({what}) is not set or empty"),
    }
}

pub fn resolve_secrets(cfg: &AppConfig) -> Result<ResolvedSecrets> {
    let session_cookie = cfg
        .source
        .session_cookie_env
        .as_deref()
        .and_then(resolve_env);

    let redis_var = cfg
        .store
        .redis_url_env
        .as_deref()
        .unwrap_or(DEFAULT_REDIS_URL_ENV);
    let redis_url = match cfg.store.kind {
        StoreKind::Redis => Some(require(redis_var, "redis url", "store.kind=redis")?),
        _ => resolve_env(redis_var),
    };

    let webhook_var = cfg
        .notify
        .webhook_url_env
        .as_deref()
        .unwrap_or(DEFAULT_WEBHOOK_URL_ENV);
    let webhook_url = match cfg.notify.sink {
        SinkKind::Post => Some(require(webhook_var, "webhook url", "notify.sink=post")?),
        SinkKind::Log => resolve_env(webhook_var),
    };

    Ok(ResolvedSecrets {
        session_cookie,
        redis_url,
        webhook_url,
    })
}
