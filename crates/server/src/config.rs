//! Service configuration.
//!
//! Values come from environment variables. `MAILROOM_CONFIG` may name a TOML
//! file whose sections map onto the same variables; the environment always
//! wins over the file.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use mailroom_directory::MatchPolicy;
use thiserror::Error;

pub const CONFIG_FILE_VAR: &str = "MAILROOM_CONFIG";

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;
const DEFAULT_VISION_URL: &str = mailroom_vision::openai::DEFAULT_BASE_URL;
const DEFAULT_VISION_MODEL: &str = mailroom_vision::openai::DEFAULT_MODEL;
const DEFAULT_VISION_TIMEOUT_SECS: u64 = 60;
const DEFAULT_DIRECTORY_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CANDIDATE_LIMIT: usize = 3;

/// `(section, key, variable)`: where each TOML key lands.
const FILE_KEYS: &[(&str, &str, &str)] = &[
    ("server", "bind", "MAILROOM_BIND"),
    ("server", "body_limit", "MAILROOM_BODY_LIMIT"),
    ("server", "log_format", "MAILROOM_LOG_FORMAT"),
    ("vision", "api_key", "OPENAI_API_KEY"),
    ("vision", "url", "MAILROOM_VISION_URL"),
    ("vision", "model", "MAILROOM_VISION_MODEL"),
    ("vision", "timeout_secs", "MAILROOM_VISION_TIMEOUT_SECS"),
    ("directory", "url", "SUPABASE_URL"),
    ("directory", "api_key", "SUPABASE_SERVICE_KEY"),
    ("directory", "file", "MAILROOM_DIRECTORY_FILE"),
    ("directory", "table", "MAILROOM_DIRECTORY_TABLE"),
    ("directory", "name_column", "MAILROOM_DIRECTORY_NAME_COLUMN"),
    ("directory", "email_column", "MAILROOM_DIRECTORY_EMAIL_COLUMN"),
    ("directory", "match", "MAILROOM_DIRECTORY_MATCH"),
    ("directory", "limit", "MAILROOM_DIRECTORY_LIMIT"),
    ("directory", "timeout_secs", "MAILROOM_DIRECTORY_TIMEOUT_SECS"),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid { var: &'static str, value: String, reason: String },
    #[error("{0}")]
    Incomplete(String),
    #[error("failed to read config file {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("config file key [{section}].{key} must be a string, number or boolean")]
    FileValue { section: String, key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" | "bunyan" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("Unknown log format: '{other}'")),
        }
    }
}

#[derive(Clone)]
pub struct VisionSettings {
    /// Missing keys are reported per request, not at startup.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for VisionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum DirectorySource {
    Disabled,
    Postgrest { url: String, api_key: String },
    File(PathBuf),
}

impl std::fmt::Debug for DirectorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectorySource::Disabled => write!(f, "Disabled"),
            DirectorySource::Postgrest { url, .. } => write!(f, "Postgrest({url})"),
            DirectorySource::File(path) => write!(f, "File({})", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectorySettings {
    pub source: DirectorySource,
    pub table: String,
    pub name_column: String,
    pub email_column: String,
    pub policy: MatchPolicy,
    pub candidate_limit: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub body_limit: usize,
    pub log_format: LogFormat,
    pub vision: VisionSettings,
    pub directory: DirectorySettings,
}

impl ServiceConfig {
    /// Build from the process environment, layered over `MAILROOM_CONFIG`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        let mut vars = match env.get(CONFIG_FILE_VAR) {
            Some(path) => Self::read_file(Path::new(path))?,
            None => HashMap::new(),
        };
        vars.extend(env);
        Self::from_vars(&vars)
    }

    fn read_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        file_vars(&content)
    }

    /// Build from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |var: &str| vars.get(var).map(|v| v.trim()).filter(|v| !v.is_empty());

        let vision = VisionSettings {
            api_key: get("OPENAI_API_KEY").map(str::to_string),
            base_url: get("MAILROOM_VISION_URL").unwrap_or(DEFAULT_VISION_URL).to_string(),
            model: get("MAILROOM_VISION_MODEL").unwrap_or(DEFAULT_VISION_MODEL).to_string(),
            timeout: Duration::from_secs(parse_or(
                vars,
                "MAILROOM_VISION_TIMEOUT_SECS",
                DEFAULT_VISION_TIMEOUT_SECS,
            )?),
        };

        let source = match (get("SUPABASE_URL"), get("SUPABASE_SERVICE_KEY")) {
            (Some(url), Some(key)) => DirectorySource::Postgrest { url: url.to_string(), api_key: key.to_string() },
            (Some(_), None) => {
                return Err(ConfigError::Incomplete("SUPABASE_URL is set but SUPABASE_SERVICE_KEY is not".into()))
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete("SUPABASE_SERVICE_KEY is set but SUPABASE_URL is not".into()))
            }
            (None, None) => match get("MAILROOM_DIRECTORY_FILE") {
                Some(path) => DirectorySource::File(PathBuf::from(path)),
                None => DirectorySource::Disabled,
            },
        };

        let directory = DirectorySettings {
            source,
            table: get("MAILROOM_DIRECTORY_TABLE").unwrap_or("people").to_string(),
            name_column: get("MAILROOM_DIRECTORY_NAME_COLUMN").unwrap_or("name").to_string(),
            email_column: get("MAILROOM_DIRECTORY_EMAIL_COLUMN").unwrap_or("email").to_string(),
            policy: parse_or(vars, "MAILROOM_DIRECTORY_MATCH", MatchPolicy::default())?,
            candidate_limit: parse_or(vars, "MAILROOM_DIRECTORY_LIMIT", DEFAULT_CANDIDATE_LIMIT)?,
            timeout: Duration::from_secs(parse_or(
                vars,
                "MAILROOM_DIRECTORY_TIMEOUT_SECS",
                DEFAULT_DIRECTORY_TIMEOUT_SECS,
            )?),
        };
        if directory.candidate_limit == 0 {
            return Err(ConfigError::Invalid {
                var: "MAILROOM_DIRECTORY_LIMIT",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(ServiceConfig {
            bind: parse_or(vars, "MAILROOM_BIND", parse_default(DEFAULT_BIND))?,
            body_limit: parse_or(vars, "MAILROOM_BODY_LIMIT", DEFAULT_BODY_LIMIT)?,
            log_format: parse_or(vars, "MAILROOM_LOG_FORMAT", LogFormat::default())?,
            vision,
            directory,
        })
    }
}

fn parse_default(value: &str) -> SocketAddr {
    value.parse().unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000)))
}

fn parse_or<T>(vars: &HashMap<String, String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match vars.get(var).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Flatten a TOML config file into the variables it stands for.
fn file_vars(content: &str) -> Result<HashMap<String, String>, ConfigError> {
    let table: toml::Table = toml::from_str(content)?;
    let mut vars = HashMap::new();
    for (section, key, var) in FILE_KEYS {
        let Some(value) = table.get(*section).and_then(|s| s.get(*key)) else {
            continue;
        };
        let text = match value {
            toml::Value::String(s) => s.clone(),
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            _ => {
                return Err(ConfigError::FileValue { section: section.to_string(), key: key.to_string() });
            }
        };
        vars.insert(var.to_string(), text);
    }
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_without_any_variables() {
        let config = ServiceConfig::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config.bind, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.vision.api_key.is_none());
        assert_eq!(config.vision.base_url, "https://api.openai.com/v1");
        assert_eq!(config.vision.timeout, Duration::from_secs(60));
        assert_eq!(config.directory.source, DirectorySource::Disabled);
        assert_eq!(config.directory.policy, MatchPolicy::Contains);
        assert_eq!(config.directory.candidate_limit, 3);
        assert_eq!(config.directory.timeout, Duration::from_secs(5));
    }

    #[test]
    fn reads_credentials_and_overrides() {
        let config = ServiceConfig::from_vars(&vars(&[
            ("OPENAI_API_KEY", "sk-live"),
            ("MAILROOM_VISION_MODEL", "gpt-4o"),
            ("SUPABASE_URL", "https://proj.supabase.co"),
            ("SUPABASE_SERVICE_KEY", "service"),
            ("MAILROOM_DIRECTORY_MATCH", "fuzzy:0.7"),
            ("MAILROOM_DIRECTORY_LIMIT", "5"),
            ("MAILROOM_BIND", "127.0.0.1:8080"),
            ("MAILROOM_LOG_FORMAT", "pretty"),
        ]))
        .unwrap();
        assert_eq!(config.vision.api_key.as_deref(), Some("sk-live"));
        assert_eq!(config.vision.model, "gpt-4o");
        assert_eq!(
            config.directory.source,
            DirectorySource::Postgrest { url: "https://proj.supabase.co".into(), api_key: "service".into() }
        );
        assert_eq!(config.directory.policy, MatchPolicy::Fuzzy { threshold: 0.7 });
        assert_eq!(config.directory.candidate_limit, 5);
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = ServiceConfig::from_vars(&vars(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(config.vision.api_key.is_none());
    }

    #[test]
    fn directory_file_used_without_postgrest() {
        let config = ServiceConfig::from_vars(&vars(&[("MAILROOM_DIRECTORY_FILE", "/etc/mailroom/people.toml")])).unwrap();
        assert_eq!(config.directory.source, DirectorySource::File("/etc/mailroom/people.toml".into()));
    }

    #[test]
    fn half_configured_directory_is_rejected() {
        let err = ServiceConfig::from_vars(&vars(&[("SUPABASE_URL", "https://proj.supabase.co")])).unwrap_err();
        assert!(matches!(err, ConfigError::Incomplete(_)));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (var, value) in [
            ("MAILROOM_DIRECTORY_MATCH", "soundex"),
            ("MAILROOM_DIRECTORY_LIMIT", "many"),
            ("MAILROOM_DIRECTORY_LIMIT", "0"),
            ("MAILROOM_VISION_TIMEOUT_SECS", "-1"),
            ("MAILROOM_BIND", "localhost"),
            ("MAILROOM_LOG_FORMAT", "xml"),
        ] {
            let err = ServiceConfig::from_vars(&vars(&[(var, value)])).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{var}={value}");
        }
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = ServiceConfig::from_vars(&vars(&[
            ("OPENAI_API_KEY", "sk-secret"),
            ("SUPABASE_URL", "https://proj.supabase.co"),
            ("SUPABASE_SERVICE_KEY", "service-secret"),
        ]))
        .unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-secret"));
        assert!(!printed.contains("service-secret"));
        assert!(printed.contains("proj.supabase.co"));
    }

    #[test]
    fn file_sections_map_to_variables() {
        let file = r#"
[server]
bind = "127.0.0.1:4000"
body_limit = 2048

[vision]
model = "gpt-4.1-mini"
timeout_secs = 30

[directory]
file = "people.toml"
match = "exact"
"#;
        let mut merged = file_vars(file).unwrap();
        merged.extend(vars(&[("MAILROOM_VISION_MODEL", "from-env")]));
        let config = ServiceConfig::from_vars(&merged).unwrap();
        assert_eq!(config.bind.port(), 4000);
        assert_eq!(config.body_limit, 2048);
        assert_eq!(config.vision.model, "from-env");
        assert_eq!(config.vision.timeout, Duration::from_secs(30));
        assert_eq!(config.directory.source, DirectorySource::File("people.toml".into()));
        assert_eq!(config.directory.policy, MatchPolicy::Exact);
    }

    #[test]
    fn file_rejects_nested_values() {
        assert!(matches!(
            file_vars("[vision]\nmodel = [\"a\"]"),
            Err(ConfigError::FileValue { .. })
        ));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            ServiceConfig::read_file(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
