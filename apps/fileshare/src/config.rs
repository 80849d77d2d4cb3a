use std::{collections::HashMap, fs};

use anyhow::{bail, Context};
use client_core::{StatusPolicy, DEFAULT_FILES_PAGE_SIZE, DEFAULT_SCROLL_EPSILON};
use tracing::warn;
use url::Url;

pub const CONFIG_FILE: &str = "fileshare.toml";

const KEYS: [&str; 5] = [
    "server_url",
    "files_page_size",
    "status_policy",
    "scroll_epsilon",
    "request_timeout_secs",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_url: String,
    pub files_page_size: u32,
    pub status_policy: StatusPolicy,
    pub scroll_epsilon: f64,
    /// Unset means requests wait as long as the connection stays open.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3000".into(),
            files_page_size: DEFAULT_FILES_PAGE_SIZE,
            status_policy: StatusPolicy::Strict,
            scroll_epsilon: DEFAULT_SCROLL_EPSILON,
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Sets one key from its textual form. Unparsable values leave the
    /// current setting in place.
    fn apply(&mut self, key: &str, value: &str) {
        let value = value.trim();
        let applied = match key {
            "server_url" => {
                self.server_url = value.to_string();
                true
            }
            "files_page_size" => match value.parse::<u32>() {
                Ok(size) if size > 0 => {
                    self.files_page_size = size;
                    true
                }
                _ => false,
            },
            "status_policy" => value
                .parse::<StatusPolicy>()
                .map(|policy| self.status_policy = policy)
                .is_ok(),
            "scroll_epsilon" => match value.parse::<f64>() {
                Ok(epsilon) if epsilon.is_finite() && epsilon >= 0.0 => {
                    self.scroll_epsilon = epsilon;
                    true
                }
                _ => false,
            },
            "request_timeout_secs" => match value.parse::<u64>() {
                Ok(0) => {
                    self.request_timeout_secs = None;
                    true
                }
                Ok(secs) => {
                    self.request_timeout_secs = Some(secs);
                    true
                }
                Err(_) => false,
            },
            _ => {
                warn!(key, "ignoring unknown setting");
                return;
            }
        };
        if !applied {
            warn!(key, value, "ignoring invalid setting value");
        }
    }
}

pub fn load_settings() -> Settings {
    let raw = fs::read_to_string(CONFIG_FILE).ok();
    load_settings_from(raw.as_deref(), |name| std::env::var(name).ok())
}

/// Defaults, then the config file, then the environment.
pub fn load_settings_from(
    raw_file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = raw_file {
        match toml::from_str::<HashMap<String, toml::Value>>(raw) {
            Ok(file_cfg) => {
                for key in KEYS {
                    match file_cfg.get(key) {
                        Some(toml::Value::String(v)) => settings.apply(key, v),
                        Some(v) => settings.apply(key, &v.to_string()),
                        None => {}
                    }
                }
            }
            Err(err) => warn!(error = %err, file = CONFIG_FILE, "ignoring unreadable config file"),
        }
    }

    if let Some(v) = env("FILESHARE_SERVER_URL") {
        settings.apply("server_url", &v);
    }
    for key in KEYS {
        if let Some(v) = env(&format!("APP__{}", key.to_ascii_uppercase())) {
            settings.apply(key, &v);
        }
    }

    settings
}

/// Checks the backend address and strips any trailing slash.
pub fn validate_server_url(raw: &str) -> anyhow::Result<String> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid server url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("server url '{raw}' must use http or https");
    }
    if url.host_str().is_none() {
        bail!("server url '{raw}' has no host");
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}
