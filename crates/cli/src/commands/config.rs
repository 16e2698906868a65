use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use quartermaster_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

/// Print the effective configuration with per-field source attribution
/// (env > file > default) and secrets redacted.
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |field: &str, env_key: &str| {
        field_source(field, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "discord.bot_token",
        &redact_token(config.discord.bot_token.expose_secret()),
        source("discord.bot_token", "QM_DISCORD_BOT_TOKEN"),
    ));
    lines.push(render_line(
        "discord.command_prefix",
        &config.discord.command_prefix,
        source("discord.command_prefix", "QM_COMMAND_PREFIX"),
    ));

    for (field, env_key, value) in [
        ("channels.update", "QM_CHANNEL_UPDATE", &config.channels.update),
        ("channels.welcome", "QM_CHANNEL_WELCOME", &config.channels.welcome),
        ("channels.logs", "QM_CHANNEL_LOGS", &config.channels.logs),
        ("channels.role_picker", "QM_CHANNEL_ROLE_PICKER", &config.channels.role_picker),
    ] {
        lines.push(render_line(
            field,
            value.as_deref().unwrap_or("<unset>"),
            source(field, env_key),
        ));
    }

    lines.push(render_line(
        "permissions.manage",
        &config.permissions.manage.join(","),
        source("permissions.manage", "QM_PERMISSIONS_MANAGE"),
    ));
    lines.push(render_line(
        "permissions.channel_close",
        &config.permissions.channel_close.join(","),
        source("permissions.channel_close", "QM_PERMISSIONS_CHANNEL_CLOSE"),
    ));

    lines.push(render_line(
        "storage.data_dir",
        &config.storage.data_dir.display().to_string(),
        source("storage.data_dir", "QM_STORAGE_DATA_DIR"),
    ));
    lines.push(render_line(
        "storage.changelog_path",
        &config.storage.changelog_path.display().to_string(),
        source("storage.changelog_path", "QM_STORAGE_CHANGELOG_PATH"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "QM_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_lowercase(),
        source("logging.format", "QM_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn render_line(field: &str, value: &str, source: String) -> String {
    format!("  {field} = {value}  [{source}]")
}

fn redact_token(token: &str) -> String {
    if token.is_empty() {
        "<unset>".to_string()
    } else {
        format!("<redacted:{} chars>", token.len())
    }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("quartermaster.toml"), PathBuf::from("config/quartermaster.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &str,
    env_key: &str,
    file_doc: Option<&Value>,
    file_path: Option<&Path>,
) -> String {
    if env::var(env_key).map(|value| !value.trim().is_empty()).unwrap_or(false) {
        return format!("env:{env_key}");
    }

    if let (Some(doc), Some(path)) = (file_doc, file_path) {
        let mut cursor = Some(doc);
        for segment in field.split('.') {
            cursor = cursor.and_then(|value| value.get(segment));
        }
        if cursor.is_some() {
            return format!("file:{}", path.display());
        }
    }

    "default".to_string()
}
