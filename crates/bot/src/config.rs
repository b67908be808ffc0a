use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::UserId;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub bot_bind: String,
    pub database_url: String,
    pub platform_api_url: String,
    pub platform_token: Option<String>,
    /// Inactivity window of interactive panels; 0 keeps panels open until shutdown.
    pub panel_timeout_seconds: u64,
    /// Members allowed to remove any review by its id.
    pub admin_ids: Vec<i64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_bind: "127.0.0.1:8480".into(),
            database_url: "sqlite://./data/reviews.db".into(),
            platform_api_url: "http://127.0.0.1:8443/api".into(),
            platform_token: None,
            panel_timeout_seconds: 300,
            admin_ids: Vec::new(),
        }
    }
}

impl Settings {
    pub fn panel_timeout(&self) -> Option<Duration> {
        (self.panel_timeout_seconds > 0).then(|| Duration::from_secs(self.panel_timeout_seconds))
    }

    pub fn admins(&self) -> Vec<UserId> {
        self.admin_ids.iter().copied().map(UserId).collect()
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("bot.toml") {
        apply_file_settings(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("BOT_BIND") {
        settings.bot_bind = v;
    }
    if let Ok(v) = std::env::var("APP__BIND_ADDR") {
        settings.bot_bind = v;
    }

    if let Ok(v) = std::env::var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Ok(v) = std::env::var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Ok(v) = std::env::var("PLATFORM_API_URL") {
        settings.platform_api_url = v;
    }
    if let Ok(v) = std::env::var("PLATFORM_TOKEN") {
        settings.platform_token = Some(v);
    }

    if let Ok(v) = std::env::var("APP__PANEL_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.panel_timeout_seconds = parsed;
        }
    }

    if let Ok(v) = std::env::var("APP__ADMIN_IDS") {
        settings.admin_ids = parse_admin_ids(&v);
    }

    settings
}

/// Comma separated member ids; entries that are not numbers are skipped.
fn parse_admin_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|id| id.trim().parse().ok())
        .collect()
}

fn apply_file_settings(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        return;
    };
    let text = |key: &str| file_cfg.get(key).and_then(|v| v.as_str()).map(str::to_string);

    if let Some(v) = text("bind_addr") {
        settings.bot_bind = v;
    }
    if let Some(v) = text("database_url") {
        settings.database_url = v;
    }
    if let Some(v) = text("platform_api_url") {
        settings.platform_api_url = v;
    }
    if let Some(v) = text("platform_token") {
        settings.platform_token = Some(v);
    }
    if let Some(v) = file_cfg
        .get("panel_timeout_seconds")
        .and_then(|v| v.as_integer())
    {
        settings.panel_timeout_seconds = u64::try_from(v).unwrap_or_default();
    }
    if let Some(ids) = file_cfg.get("admin_ids").and_then(|v| v.as_array()) {
        settings.admin_ids = ids.iter().filter_map(toml::Value::as_integer).collect();
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
