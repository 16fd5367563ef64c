use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::insights::{InsightSettings, DEFAULT_SETTINGS};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub insights: InsightsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InsightsConfig {
    pub exploration_boost: f64,
    pub high_value_spend_minor: u64,
    pub diverse_interest_threshold: usize,
    pub segment_min_support: f64,
    pub max_segments: usize,
    pub report_recommendations: usize,
    pub report_min_support: f64,
    pub report_patterns: usize,
    pub report_centrality: usize,
    /// Upper bound on one engine call, snapshot read included.
    pub deadline_secs: u64,
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
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub deadline_secs: Option<u64>,
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
            database: DatabaseConfig {
                url: "sqlite://affinity.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            insights: InsightsConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            exploration_boost: DEFAULT_SETTINGS.exploration_boost,
            high_value_spend_minor: DEFAULT_SETTINGS.high_value_spend_minor,
            diverse_interest_threshold: DEFAULT_SETTINGS.diverse_interest_threshold,
            segment_min_support: DEFAULT_SETTINGS.segment_min_support,
            max_segments: DEFAULT_SETTINGS.max_segments,
            report_recommendations: DEFAULT_SETTINGS.report_recommendations,
            report_min_support: DEFAULT_SETTINGS.report_min_support,
            report_patterns: DEFAULT_SETTINGS.report_patterns,
            report_centrality: DEFAULT_SETTINGS.report_centrality,
            deadline_secs: 30,
        }
    }
}

impl InsightsConfig {
    /// Engine tunables; the deadline stays with the caller.
    pub fn settings(&self) -> InsightSettings {
        InsightSettings {
            exploration_boost: self.exploration_boost,
            high_value_spend_minor: self.high_value_spend_minor,
            diverse_interest_threshold: self.diverse_interest_threshold,
            segment_min_support: self.segment_min_support,
            max_segments: self.max_segments,
            report_recommendations: self.report_recommendations,
            report_min_support: self.report_min_support,
            report_patterns: self.report_patterns,
            report_centrality: self.report_centrality,
        }
    }
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("affinity.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(insights) = patch.insights {
            let target = &mut self.insights;
            if let Some(value) = insights.exploration_boost {
                target.exploration_boost = value;
            }
            if let Some(value) = insights.high_value_spend_minor {
                target.high_value_spend_minor = value;
            }
            if let Some(value) = insights.diverse_interest_threshold {
                target.diverse_interest_threshold = value;
            }
            if let Some(value) = insights.segment_min_support {
                target.segment_min_support = value;
            }
            if let Some(value) = insights.max_segments {
                target.max_segments = value;
            }
            if let Some(value) = insights.report_recommendations {
                target.report_recommendations = value;
            }
            if let Some(value) = insights.report_min_support {
                target.report_min_support = value;
            }
            if let Some(value) = insights.report_patterns {
                target.report_patterns = value;
            }
            if let Some(value) = insights.report_centrality {
                target.report_centrality = value;
            }
            if let Some(value) = insights.deadline_secs {
                target.deadline_secs = value;
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
        if let Some(value) = read_env("AFFINITY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("AFFINITY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("AFFINITY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("AFFINITY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("AFFINITY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("AFFINITY_INSIGHTS_EXPLORATION_BOOST") {
            self.insights.exploration_boost =
                parse_env("AFFINITY_INSIGHTS_EXPLORATION_BOOST", &value)?;
        }
        if let Some(value) = read_env("AFFINITY_INSIGHTS_HIGH_VALUE_SPEND_MINOR") {
            self.insights.high_value_spend_minor =
                parse_env("AFFINITY_INSIGHTS_HIGH_VALUE_SPEND_MINOR", &value)?;
        }
        if let Some(value) = read_env("AFFINITY_INSIGHTS_SEGMENT_MIN_SUPPORT") {
            self.insights.segment_min_support =
                parse_env("AFFINITY_INSIGHTS_SEGMENT_MIN_SUPPORT", &value)?;
        }
        if let Some(value) = read_env("AFFINITY_INSIGHTS_MAX_SEGMENTS") {
            self.insights.max_segments = parse_env("AFFINITY_INSIGHTS_MAX_SEGMENTS", &value)?;
        }
        if let Some(value) = read_env("AFFINITY_INSIGHTS_DEADLINE_SECS") {
            self.insights.deadline_secs = parse_env("AFFINITY_INSIGHTS_DEADLINE_SECS", &value)?;
        }

        let log_level =
            read_env("AFFINITY_LOGGING_LEVEL").or_else(|| read_env("AFFINITY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("AFFINITY_LOGGING_FORMAT").or_else(|| read_env("AFFINITY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(deadline_secs) = overrides.deadline_secs {
            self.insights.deadline_secs = deadline_secs;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_insights(&self.insights)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("affinity.toml"), PathBuf::from("config/affinity.toml")]
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

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_insights(insights: &InsightsConfig) -> Result<(), ConfigError> {
    if !insights.exploration_boost.is_finite() || insights.exploration_boost <= 0.0 {
        return Err(ConfigError::Validation(
            "insights.exploration_boost must be a positive finite number".to_string(),
        ));
    }

    for (key, value) in [
        ("insights.segment_min_support", insights.segment_min_support),
        ("insights.report_min_support", insights.report_min_support),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::Validation(format!("{key} must be in range 0.0..=1.0")));
        }
    }

    if insights.max_segments == 0 {
        return Err(ConfigError::Validation(
            "insights.max_segments must be greater than zero".to_string(),
        ));
    }

    if insights.deadline_secs == 0 || insights.deadline_secs > 3_600 {
        return Err(ConfigError::Validation(
            "insights.deadline_secs must be in range 1..=3600".to_string(),
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

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    insights: Option<InsightsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct InsightsPatch {
    exploration_boost: Option<f64>,
    high_value_spend_minor: Option<u64>,
    diverse_interest_threshold: Option<usize>,
    segment_min_support: Option<f64>,
    max_segments: Option<usize>,
    report_recommendations: Option<usize>,
    report_min_support: Option<f64>,
    report_patterns: Option<usize>,
    report_centrality: Option<usize>,
    deadline_secs: Option<u64>,
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

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::insights::InsightSettings;

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
    fn defaults_match_engine_settings() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.insights.settings() == InsightSettings::default(), "defaults should agree")?;
        ensure(config.insights.deadline_secs == 30, "default deadline should be 30 seconds")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_AFFINITY_DB_PATH", "/tmp/affinity-interpolated.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("affinity.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://${TEST_AFFINITY_DB_PATH}"

[insights]
exploration_boost = 2.0
max_segments = 4
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite:///tmp/affinity-interpolated.db",
                "database url should be interpolated from environment",
            )?;
            ensure(config.insights.settings().exploration_boost == 2.0, "boost from file")?;
            ensure(config.insights.settings().max_segments == 4, "segment cap from file")?;
            Ok(())
        })();

        clear_vars(&["TEST_AFFINITY_DB_PATH"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_AFFINITY_UNSET"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("affinity.toml");
        fs::write(&path, "[database]\nurl = \"${TEST_AFFINITY_UNSET}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => return Err("expected interpolation failure".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "TEST_AFFINITY_UNSET"),
            "error should name the missing variable",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("AFFINITY_LOG_LEVEL", "warn");
        env::set_var("AFFINITY_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["AFFINITY_LOG_LEVEL", "AFFINITY_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("AFFINITY_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("AFFINITY_INSIGHTS_DEADLINE_SECS", "45");
        env::set_var("AFFINITY_INSIGHTS_SEGMENT_MIN_SUPPORT", "0.2");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("affinity.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[insights]
segment_min_support = 0.1
deadline_secs = 10

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    deadline_secs: Some(5),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.insights.deadline_secs == 5, "override deadline should win")?;
            ensure(
                config.insights.segment_min_support == 0.2,
                "env segment support should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(&[
            "AFFINITY_DATABASE_URL",
            "AFFINITY_INSIGHTS_DEADLINE_SECS",
            "AFFINITY_INSIGHTS_SEGMENT_MIN_SUPPORT",
        ]);
        result
    }

    #[test]
    fn invalid_env_override_names_the_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("AFFINITY_INSIGHTS_MAX_SEGMENTS", "many");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected env override failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. }
                        if key == "AFFINITY_INSIGHTS_MAX_SEGMENTS"
                ),
                "error should name the offending variable",
            )
        })();

        clear_vars(&["AFFINITY_INSIGHTS_MAX_SEGMENTS"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("AFFINITY_INSIGHTS_SEGMENT_MIN_SUPPORT", "1.5");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("insights.segment_min_support")
            );
            ensure(has_message, "validation failure should mention insights.segment_min_support")
        })();

        clear_vars(&["AFFINITY_INSIGHTS_SEGMENT_MIN_SUPPORT"]);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("absent.toml");
        let error = match AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected missing file failure".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::MissingConfigFile(ref missing) if *missing == path),
            "missing file should be reported",
        )
    }
}
