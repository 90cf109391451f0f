use std::{collections::HashMap, fs, path::Path};

use shared::protocol::{DEFAULT_LISTS_SENSOR, DEFAULT_SERVICE_DOMAIN};
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "cozi.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub token: Option<String>,
    pub sensor_entity: String,
    pub service_domain: String,
    /// Card title; the selected list's title is used when unset.
    pub name: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8123".into(),
            token: None,
            sensor_entity: DEFAULT_LISTS_SENSOR.into(),
            service_domain: DEFAULT_SERVICE_DOMAIN.into(),
            name: None,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(DEFAULT_CONFIG_FILE))
}

/// Defaults, then the flat string table in `path` if present, then environment.
pub fn load_settings_from(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => apply_file_table(&mut settings, &file_cfg),
            Err(err) => warn!(path = %path.display(), "ignoring malformed config file: {err}"),
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file_table(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("base_url") {
        settings.base_url = v.clone();
    }
    if let Some(v) = file_cfg.get("token") {
        settings.token = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("sensor_entity") {
        settings.sensor_entity = v.clone();
    }
    if let Some(v) = file_cfg.get("service_domain") {
        settings.service_domain = v.clone();
    }
    if let Some(v) = file_cfg.get("name") {
        settings.name = Some(v.clone()).filter(|name| !name.is_empty());
    }
}

pub(crate) fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("HASS_URL") {
        settings.base_url = v;
    }
    if let Some(v) = lookup("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = lookup("HASS_TOKEN") {
        settings.token = Some(v);
    }
    if let Some(v) = lookup("APP__TOKEN") {
        settings.token = Some(v);
    }

    if let Some(v) = lookup("APP__SENSOR_ENTITY") {
        settings.sensor_entity = v;
    }
    if let Some(v) = lookup("APP__SERVICE_DOMAIN") {
        settings.service_domain = v;
    }
    if let Some(v) = lookup("APP__NAME") {
        settings.name = Some(v).filter(|name| !name.is_empty());
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
