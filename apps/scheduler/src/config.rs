use std::{collections::HashMap, fs};

use client_core::store::DEFAULT_API_URL;

const SETTINGS_FILE: &str = "scheduler.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
        }
    }
}

/// Defaults, then `scheduler.toml`, then environment, then the `--api-url` flag.
pub fn load_settings(api_url_flag: Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    if let Some(api_url) = api_url_flag {
        settings.api_url = api_url;
    }

    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        tracing::warn!(file = SETTINGS_FILE, "ignoring unparsable settings file");
        return;
    };
    if let Some(v) = file_cfg.get("api_url") {
        settings.api_url = v.clone();
    }
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    for key in ["SCHEDULER_API_URL", "APP__API_URL"] {
        if let Some(v) = lookup(key).filter(|v| !v.trim().is_empty()) {
            settings.api_url = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local_service() {
        assert_eq!(Settings::default().api_url, "http://localhost:5000/api/v1");
    }

    #[test]
    fn file_then_env_override_defaults() {
        let mut settings = Settings::default();
        apply_file_overrides(&mut settings, "api_url = \"http://file.example/api\"\n");
        assert_eq!(settings.api_url, "http://file.example/api");

        apply_env_overrides(&mut settings, |key| {
            (key == "APP__API_URL").then(|| "http://env.example/api".to_string())
        });
        assert_eq!(settings.api_url, "http://env.example/api");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |_| Some("  ".to_string()));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn flag_wins_over_everything() {
        let settings = load_settings(Some("http://flag.example/api".to_string()));
        assert_eq!(settings.api_url, "http://flag.example/api");
    }
}
