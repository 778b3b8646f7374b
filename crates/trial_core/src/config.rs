use std::{collections::HashMap, fs, path::Path, time::Duration};

use serde::Deserialize;

pub const SETTINGS_FILE: &str = "operator.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceSettings {
    pub device_url: String,
    pub request_timeout_ms: u64,
    pub tick_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            device_url: "http://127.0.0.1:8090".into(),
            request_timeout_ms: 10_000,
            tick_ms: 10,
        }
    }
}

impl DeviceSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

/// Defaults, then `operator.toml` in the working directory, then the
/// environment.
pub fn load_settings() -> DeviceSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> DeviceSettings {
    let mut settings = DeviceSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, env);

    settings
}

fn apply_file(settings: &mut DeviceSettings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        tracing::warn!("ignoring unparseable settings file");
        return;
    };

    if let Some(v) = file_cfg.get("device_url").and_then(toml::Value::as_str) {
        settings.device_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("request_timeout_ms").and_then(as_u64) {
        settings.request_timeout_ms = v;
    }
    if let Some(v) = file_cfg.get("tick_ms").and_then(as_u64) {
        settings.tick_ms = v;
    }
}

fn apply_env(settings: &mut DeviceSettings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("DEVICE_URL") {
        settings.device_url = v;
    }
    if let Some(v) = env("APP__DEVICE_URL") {
        settings.device_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_ms = parsed;
        }
    }

    if let Some(v) = env("APP__TICK_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.tick_ms = parsed;
        }
    }
}

fn as_u64(value: &toml::Value) -> Option<u64> {
    value.as_integer().and_then(|v| u64::try_from(v).ok())
}
