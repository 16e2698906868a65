use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub discord: DiscordConfig,
    pub channels: ChannelsConfig,
    pub permissions: PermissionsConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DiscordConfig {
    pub bot_token: SecretString,
    pub command_prefix: String,
}

/// Well-known channel ids. Every one is optional; a feature that needs an
/// unset channel is skipped at runtime rather than failing bootstrap.
#[derive(Clone, Debug)]
pub struct ChannelsConfig {
    pub update: Option<String>,
    pub welcome: Option<String>,
    pub logs: Option<String>,
    pub role_picker: Option<String>,
}

/// Role names checked at the interaction boundary before privileged
/// operations reach the core services.
#[derive(Clone, Debug)]
pub struct PermissionsConfig {
    pub manage: Vec<String>,
    pub channel_close: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub changelog_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bot_token: Option<String>,
    pub command_prefix: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            discord: DiscordConfig {
                bot_token: String::new().into(),
                command_prefix: "!".to_string(),
            },
            channels: ChannelsConfig { update: None, welcome: None, logs: None, role_picker: None },
            permissions: PermissionsConfig {
                manage: vec!["Treasurer".to_string()],
                channel_close: vec![
                    "Administrator".to_string(),
                    "Moderator".to_string(),
                    "Recruiter".to_string(),
                ],
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("data"),
                changelog_path: PathBuf::from("changelog.json"),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("quartermaster.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(discord) = patch.discord {
            if let Some(bot_token_value) = discord.bot_token {
                self.discord.bot_token = secret_value(bot_token_value);
            }
            if let Some(command_prefix) = discord.command_prefix {
                self.discord.command_prefix = command_prefix;
            }
        }

        if let Some(channels) = patch.channels {
            if let Some(update) = channels.update {
                self.channels.update = Some(update);
            }
            if let Some(welcome) = channels.welcome {
                self.channels.welcome = Some(welcome);
            }
            if let Some(logs) = channels.logs {
                self.channels.logs = Some(logs);
            }
            if let Some(role_picker) = channels.role_picker {
                self.channels.role_picker = Some(role_picker);
            }
        }

        if let Some(permissions) = patch.permissions {
            if let Some(manage) = permissions.manage {
                self.permissions.manage = manage;
            }
            if let Some(channel_close) = permissions.channel_close {
                self.permissions.channel_close = channel_close;
            }
        }

        if let Some(storage) = patch.storage {
            if let Some(data_dir) = storage.data_dir {
                self.storage.data_dir = data_dir;
            }
            if let Some(changelog_path) = storage.changelog_path {
                self.storage.changelog_path = changelog_path;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("QM_DISCORD_BOT_TOKEN") {
            self.discord.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("QM_COMMAND_PREFIX") {
            self.discord.command_prefix = value;
        }

        if let Some(value) = read_env("QM_CHANNEL_UPDATE") {
            self.channels.update = Some(value);
        }
        if let Some(value) = read_env("QM_CHANNEL_WELCOME") {
            self.channels.welcome = Some(value);
        }
        if let Some(value) = read_env("QM_CHANNEL_LOGS") {
            self.channels.logs = Some(value);
        }
        if let Some(value) = read_env("QM_CHANNEL_ROLE_PICKER") {
            self.channels.role_picker = Some(value);
        }

        if let Some(value) = read_env("QM_PERMISSIONS_MANAGE") {
            self.permissions.manage = parse_role_list(&value);
        }
        if let Some(value) = read_env("QM_PERMISSIONS_CHANNEL_CLOSE") {
            self.permissions.channel_close = parse_role_list(&value);
        }

        if let Some(value) = read_env("QM_STORAGE_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("QM_STORAGE_CHANGELOG_PATH") {
            self.storage.changelog_path = PathBuf::from(value);
        }

        let log_level = read_env("QM_LOGGING_LEVEL").or_else(|| read_env("QM_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("QM_LOGGING_FORMAT").or_else(|| read_env("QM_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bot_token) = overrides.bot_token {
            self.discord.bot_token = secret_value(bot_token);
        }
        if let Some(command_prefix) = overrides.command_prefix {
            self.discord.command_prefix = command_prefix;
        }
        if let Some(data_dir) = overrides.data_dir {
            self.storage.data_dir = data_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_discord(&self.discord)?;
        validate_channels(&self.channels)?;
        validate_permissions(&self.permissions)?;
        validate_storage(&self.storage)?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    /// Case-insensitive check against the privileged-management role set.
    pub fn is_manager(&self, member_roles: &[String]) -> bool {
        roles_intersect(&self.permissions.manage, member_roles)
    }

    pub fn may_close_channels(&self, member_roles: &[String]) -> bool {
        roles_intersect(&self.permissions.channel_close, member_roles)
    }
}

fn roles_intersect(required: &[String], held: &[String]) -> bool {
    held.iter().any(|role| required.iter().any(|needed| needed.eq_ignore_ascii_case(role)))
}

fn parse_role_list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|role| !role.is_empty()).map(str::to_owned).collect()
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("quartermaster.toml"), PathBuf::from("config/quartermaster.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_discord(discord: &DiscordConfig) -> Result<(), ConfigError> {
    if discord.bot_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "discord.bot_token is required. Create one under your application's Bot settings"
                .to_string(),
        ));
    }

    let prefix = discord.command_prefix.trim();
    if prefix.is_empty() || prefix.len() > 3 || prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(
            "discord.command_prefix must be 1-3 non-whitespace characters".to_string(),
        ));
    }

    Ok(())
}

fn validate_channels(channels: &ChannelsConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("channels.update", &channels.update),
        ("channels.welcome", &channels.welcome),
        ("channels.logs", &channels.logs),
        ("channels.role_picker", &channels.role_picker),
    ] {
        if let Some(id) = value {
            if id.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{name} is set but empty; remove the key or provide a channel id"
                )));
            }
        }
    }
    Ok(())
}

fn validate_permissions(permissions: &PermissionsConfig) -> Result<(), ConfigError> {
    if permissions.manage.is_empty() {
        return Err(ConfigError::Validation(
            "permissions.manage must list at least one role".to_string(),
        ));
    }
    if permissions.channel_close.is_empty() {
        return Err(ConfigError::Validation(
            "permissions.channel_close must list at least one role".to_string(),
        ));
    }
    Ok(())
}

fn validate_storage(storage: &StorageConfig) -> Result<(), ConfigError> {
    if storage.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("storage.data_dir must not be empty".to_string()));
    }
    if storage.changelog_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "storage.changelog_path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    discord: Option<DiscordPatch>,
    channels: Option<ChannelsPatch>,
    permissions: Option<PermissionsPatch>,
    storage: Option<StoragePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscordPatch {
    bot_token: Option<String>,
    command_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelsPatch {
    update: Option<String>,
    welcome: Option<String>,
    logs: Option<String>,
    role_picker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PermissionsPatch {
    manage: Option<Vec<String>>,
    channel_close: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    data_dir: Option<PathBuf>,
    changelog_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_QM_BOT_TOKEN", "token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("quartermaster.toml");
            fs::write(
                &path,
                r#"
[discord]
bot_token = "${TEST_QM_BOT_TOKEN}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.discord.bot_token.expose_secret() == "token-from-env",
                "bot token should be loaded from environment",
            )
        })();

        clear_vars(&["TEST_QM_BOT_TOKEN"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("QM_DISCORD_BOT_TOKEN", "token-from-env");
        env::set_var("QM_CHANNEL_LOGS", "C-logs-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("quartermaster.toml");
            fs::write(
                &path,
                r#"
[discord]
bot_token = "token-from-file"

[channels]
logs = "C-logs-file"
welcome = "C-welcome-file"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.discord.bot_token.expose_secret() == "token-from-env",
                "env token should win over file",
            )?;
            ensure(
                config.channels.logs.as_deref() == Some("C-logs-env"),
                "env channel id should win over file",
            )?;
            ensure(
                config.channels.welcome.as_deref() == Some("C-welcome-file"),
                "file channel id should win over default",
            )?;
            ensure(config.logging.level == "debug", "override log level should win over file")
        })();

        clear_vars(&["QM_DISCORD_BOT_TOKEN", "QM_CHANNEL_LOGS"]);
        result
    }

    #[test]
    fn validation_requires_a_bot_token() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["QM_DISCORD_BOT_TOKEN"]);

        let error = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => return Err("expected validation failure but config load succeeded".to_string()),
            Err(error) => error,
        };
        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("discord.bot_token")
        );
        ensure(has_message, "validation failure should mention discord.bot_token")
    }

    #[test]
    fn role_list_env_override_is_comma_separated() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("QM_DISCORD_BOT_TOKEN", "token");
        env::set_var("QM_PERMISSIONS_MANAGE", "Quartermaster, Officer");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.permissions.manage == vec!["Quartermaster".to_string(), "Officer".to_string()],
                "manage roles should parse from comma-separated env value",
            )?;
            ensure(
                config.is_manager(&["officer".to_string()]),
                "role comparison should be case-insensitive",
            )?;
            ensure(
                !config.is_manager(&["Cadet".to_string()]),
                "unlisted roles should not grant management",
            )
        })();

        clear_vars(&["QM_DISCORD_BOT_TOKEN", "QM_PERMISSIONS_MANAGE"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("QM_DISCORD_BOT_TOKEN", "super-secret-token");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("super-secret-token"), "debug output should not contain token")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )
        })();

        clear_vars(&["QM_DISCORD_BOT_TOKEN"]);
        result
    }

    #[test]
    fn require_file_fails_when_config_is_absent() {
        let missing = std::path::PathBuf::from("/nonexistent/quartermaster.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing.clone()),
            require_file: true,
            ..LoadOptions::default()
        });

        assert!(matches!(result, Err(ConfigError::MissingConfigFile(path)) if path == missing));
    }
}
