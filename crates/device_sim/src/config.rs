use std::{collections::HashMap, fs, path::Path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub max_samples_per_window: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8090".into(),
            max_samples_per_window: 4096,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new("device.toml"), |key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
                settings.bind_addr = v.to_string();
            }
            if let Some(v) = file_cfg
                .get("max_samples_per_window")
                .and_then(toml::Value::as_integer)
                .and_then(|v| usize::try_from(v).ok())
            {
                settings.max_samples_per_window = v;
            }
        }
    }

    if let Some(v) = env("DEVICE_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = env("APP__MAX_SAMPLES_PER_WINDOW") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_samples_per_window = parsed;
        }
    }

    settings
}
