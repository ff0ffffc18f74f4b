use std::{fs, io::ErrorKind, path::Path};

use anyhow::Context;
use client_core::config::ClientSettings;

pub fn load_settings(path: &Path) -> anyhow::Result<ClientSettings> {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<ClientSettings>(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound => ClientSettings::default(),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.validate()?;
    Ok(settings)
}

fn apply_env_overrides(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__RECIPIENT_EMAIL") {
        settings.recipient_email = v;
    }
    if let Some(v) = lookup("APP__CAPTION_INTERVAL_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.timing.caption_interval_ms = parsed;
        }
    }
}
