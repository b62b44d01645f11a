//! Configuration system for survey-synth
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (SURVEY_SYNTH_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::survey::population::Pool;
use crate::survey::{GenerationPlan, SubmissionOptions, SurveyCatalog};

/// Default reproducibility seed
pub const DEFAULT_SEED: u64 = 42;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Generation settings
    pub generation: GenerationSettings,

    /// Record sink settings
    pub sink: SinkSettings,

    /// Submission pacing
    pub submission: SubmissionSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Seed for the shared random stream
    pub seed: u64,

    /// Replacement label pools for the standard plan
    pub pools: PoolOverrides,
}

/// Label pools that replace the standard ones. Each map gives a label and
/// the number of personas that receive it; counts must still sum to the
/// stakeholder's population size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_majors: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_institutions: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty_disciplines: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty_institution_types: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty_institutions: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practitioner_disciplines: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practitioner_roles: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practitioner_industries: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practitioner_companies: Option<BTreeMap<String, usize>>,
}

fn override_pool(pool: &mut Pool<String>, labels: &Option<BTreeMap<String, usize>>) {
    if let Some(labels) = labels {
        *pool = Pool::new(labels.iter().map(|(l, n)| (l.clone(), *n)).collect());
    }
}

impl GenerationSettings {
    /// The standard plan with any configured pools swapped in.
    pub fn plan(&self) -> GenerationPlan {
        let p = &self.pools;
        let mut plan = GenerationPlan::standard();
        override_pool(&mut plan.students.majors, &p.student_majors);
        override_pool(&mut plan.students.institutions, &p.student_institutions);
        override_pool(&mut plan.faculty.disciplines, &p.faculty_disciplines);
        override_pool(&mut plan.faculty.institution_types, &p.faculty_institution_types);
        override_pool(&mut plan.faculty.institutions, &p.faculty_institutions);
        override_pool(&mut plan.practitioners.disciplines, &p.practitioner_disciplines);
        override_pool(&mut plan.practitioners.roles, &p.practitioner_roles);
        override_pool(&mut plan.practitioners.industries, &p.practitioner_industries);
        override_pool(&mut plan.practitioners.companies, &p.practitioner_companies);
        plan
    }
}

/// Which sink the generated bundles are written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Keep everything in process memory
    #[default]
    Memory,
    /// PostgREST-style data service
    Rest,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::Memory => write!(f, "memory"),
            SinkKind::Rest => write!(f, "rest"),
        }
    }
}

impl FromStr for SinkKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(SinkKind::Memory),
            "rest" => Ok(SinkKind::Rest),
            other => Err(Error::config_field_invalid(
                "sink.kind",
                format!("Unknown sink kind '{}'. Must be one of: memory, rest", other),
            )),
        }
    }
}

/// Record sink settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkSettings {
    /// Sink implementation
    pub kind: SinkKind,

    /// Data service base URL (e.g., "https://project.example.co")
    pub base_url: String,

    /// Data service API key
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Submission pacing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionSettings {
    /// Bundles between pauses (0 = never pause)
    pub pause_every: usize,

    /// Pause length in milliseconds
    pub pause_ms: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            pools: PoolOverrides::default(),
        }
    }
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            kind: SinkKind::Memory,
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        let options = SubmissionOptions::default();
        Self {
            pause_every: options.pause_every,
            pause_ms: options.pause.as_millis() as u64,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl SubmissionSettings {
    /// Pacing for the given sink. The in-memory sink is never throttled.
    pub fn options_for(&self, kind: SinkKind) -> SubmissionOptions {
        match kind {
            SinkKind::Memory => SubmissionOptions::unpaced(),
            SinkKind::Rest => SubmissionOptions {
                pause_every: self.pause_every,
                pause: Duration::from_millis(self.pause_ms),
            },
        }
    }
}

impl SynthConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
                path: path.clone(),
                source: e,
            })?;
            config = toml::from_str(&content).map_err(|e| Error::ConfigParse {
                message: format!("{}: {}", path.display(), e.message()),
                source: Some(e),
            })?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides()?;

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // An explicit path must exist
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::config_not_found(path));
        }

        let search_paths = [
            // Current directory
            Some(PathBuf::from("survey-synth.toml")),
            // User config directory
            dirs::config_dir().map(|p| p.join("survey-synth").join("config.toml")),
            // Home directory
            dirs::home_dir().map(|p| p.join(".survey-synth").join("config.toml")),
        ];

        for path in search_paths.into_iter().flatten() {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("SURVEY_SYNTH_SEED") {
            self.generation.seed = val.parse().map_err(|_| {
                Error::config_field_invalid(
                    "generation.seed",
                    format!("SURVEY_SYNTH_SEED is not an unsigned integer: '{}'", val),
                )
            })?;
        }

        if let Ok(val) = std::env::var("SURVEY_SYNTH_SINK") {
            self.sink.kind = val.parse()?;
        }
        if let Ok(val) = std::env::var("SURVEY_SYNTH_BASE_URL") {
            self.sink.base_url = val;
        }
        if let Ok(val) = std::env::var("SURVEY_SYNTH_API_KEY") {
            self.sink.api_key = val;
        }
        if let Ok(val) = std::env::var("SURVEY_SYNTH_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.sink.timeout_secs = n;
            }
        }

        if let Ok(val) = std::env::var("SURVEY_SYNTH_PAUSE_EVERY") {
            if let Ok(n) = val.parse() {
                self.submission.pause_every = n;
            }
        }
        if let Ok(val) = std::env::var("SURVEY_SYNTH_PAUSE_MS") {
            if let Ok(n) = val.parse() {
                self.submission.pause_ms = n;
            }
        }

        if let Ok(val) = std::env::var("SURVEY_SYNTH_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("SURVEY_SYNTH_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("SURVEY_SYNTH_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }

        Ok(())
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.sink.kind == SinkKind::Rest {
            if self.sink.base_url.is_empty() {
                return Err(Error::config_field_invalid(
                    "sink.base_url",
                    "base_url is required for the rest sink",
                ));
            }
            let parsed = url::Url::parse(&self.sink.base_url).map_err(|e| {
                Error::config_field_invalid(
                    "sink.base_url",
                    format!("Invalid base_url '{}': {}", self.sink.base_url, e),
                )
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::config_field_invalid(
                    "sink.base_url",
                    "base_url must start with http:// or https://",
                ));
            }
        }

        if self.sink.timeout_secs == 0 {
            return Err(Error::config_field_invalid(
                "sink.timeout_secs",
                "timeout_secs must be greater than 0",
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        self.generation.plan().validate(&SurveyCatalog::standard())?;

        Ok(())
    }

    /// Render as TOML with the API key masked
    pub fn to_display_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if !shown.sink.api_key.is_empty() {
            shown.sink.api_key = "********".to_string();
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Default location written by `config init`
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".survey-synth")
        .join("config.toml")
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(default_config_path);

    if config_path.exists() && !force {
        return Err(Error::config_validation(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    fs::write(&config_path, generate_default_config()).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    info!(path = %config_path.display(), "Configuration file created");
    Ok(config_path)
}

/// Generate default configuration content with comments
pub fn generate_default_config() -> String {
    r#"# survey-synth configuration

[generation]
# Seed for the shared random stream; the same seed reproduces a run exactly
seed = 42

# Replace a label pool of the standard plan. Counts must sum to the
# population size (students 40, faculty 30, practitioners 30).
# Keys: student_majors, student_institutions, faculty_disciplines,
# faculty_institution_types, faculty_institutions, practitioner_disciplines,
# practitioner_roles, practitioner_industries, practitioner_companies
# [generation.pools.practitioner_industries]
# "Technology" = 12
# "Manufacturing" = 10
# "Consulting" = 8

[sink]
# Where bundles are written: "memory" or "rest"
kind = "memory"

# Data service base URL (required for the rest sink)
# base_url = "https://your-project.example.co"

# Data service API key
# api_key = ""

# Request timeout in seconds
timeout_secs = 30

[submission]
# Bundles submitted between pauses (0 = never pause; rest sink only)
pause_every = 10

# Pause length in milliseconds
pause_ms = 500

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.survey-synth/logs/survey-synth.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SynthConfig::default();
        assert_eq!(config.generation.seed, 42);
        assert_eq!(config.sink.kind, SinkKind::Memory);
        assert_eq!(config.submission.pause_every, 10);
        assert_eq!(config.submission.pause_ms, 500);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_override() {
        env::set_var("SURVEY_SYNTH_SEED", "7");
        env::set_var("SURVEY_SYNTH_PAUSE_EVERY", "3");

        let mut config = SynthConfig::default();
        config.apply_env_overrides().unwrap();

        assert_eq!(config.generation.seed, 7);
        assert_eq!(config.submission.pause_every, 3);

        env::remove_var("SURVEY_SYNTH_SEED");
        env::remove_var("SURVEY_SYNTH_PAUSE_EVERY");
    }

    #[test]
    fn test_sink_kind_parse() {
        assert_eq!("REST".parse::<SinkKind>().unwrap(), SinkKind::Rest);
        assert_eq!("memory".parse::<SinkKind>().unwrap(), SinkKind::Memory);
        assert!("sqlite".parse::<SinkKind>().is_err());
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(SynthConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rest_requires_url() {
        let mut config = SynthConfig::default();
        config.sink.kind = SinkKind::Rest;
        let err = config.validate().unwrap_err();
        assert!(err.is_fatal());

        config.sink.base_url = "ftp://db.example.org".to_string();
        assert!(config.validate().is_err());

        config.sink.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.sink.base_url = "https://db.example.org".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = SynthConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pool_override_replaces_labels() {
        let config: SynthConfig = toml::from_str(
            r#"
            [generation.pools.practitioner_industries]
            "Technology" = 12
            "Manufacturing" = 10
            "Consulting" = 8
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());

        let plan = config.generation.plan();
        let industries: Vec<_> = plan
            .practitioners
            .industries
            .entries()
            .iter()
            .map(|(label, n)| (label.as_str(), *n))
            .collect();
        assert_eq!(
            industries,
            vec![("Consulting", 8), ("Manufacturing", 10), ("Technology", 12)]
        );
        assert_eq!(plan.students.majors, GenerationPlan::standard().students.majors);
    }

    #[test]
    fn test_pool_override_must_fill_population() {
        let mut config = SynthConfig::default();
        let mut majors = BTreeMap::new();
        majors.insert("Civil Engineering".to_string(), 39);
        config.generation.pools.student_majors = Some(majors);

        let err = config.validate().unwrap_err();
        assert_eq!(err.exit_code(), 40);
        assert!(err.to_string().contains("majors"));
    }

    #[test]
    fn test_memory_sink_is_unpaced() {
        let settings = SubmissionSettings::default();
        assert_eq!(settings.options_for(SinkKind::Memory).pause_every, 0);

        let rest = settings.options_for(SinkKind::Rest);
        assert_eq!(rest.pause_every, 10);
        assert_eq!(rest.pause, Duration::from_millis(500));
    }

    #[test]
    fn test_display_masks_api_key() {
        let mut config = SynthConfig::default();
        config.sink.api_key = "secret-key".to_string();
        let shown = config.to_display_toml().unwrap();
        assert!(!shown.contains("secret-key"));
        assert!(shown.contains("********"));
    }

    #[test]
    fn test_default_config_template_parses() {
        let parsed: SynthConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(parsed.generation.seed, DEFAULT_SEED);
        assert_eq!(parsed.sink.timeout_secs, 30);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_parse_config_file() {
        let config_str = r#"
[generation]
seed = 2025

[sink]
kind = "rest"
base_url = "https://db.example.org"
api_key = "anon"

[submission]
pause_every = 0

[logging]
level = "debug"
"#;

        let config: SynthConfig = toml::from_str(config_str).unwrap();
        assert_eq!(config.generation.seed, 2025);
        assert_eq!(config.sink.kind, SinkKind::Rest);
        assert_eq!(config.sink.base_url, "https://db.example.org");
        assert_eq!(config.sink.timeout_secs, 30);
        assert_eq!(config.submission.pause_every, 0);
        assert_eq!(config.submission.pause_ms, 500);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let path_str = path.to_str().unwrap();

        let written = init_config(Some(path_str), false).unwrap();
        assert_eq!(written, path);
        assert!(init_config(Some(path_str), false).is_err());
        assert!(init_config(Some(path_str), true).is_ok());
    }

    #[test]
    fn test_explicit_missing_file() {
        let err = SynthConfig::find_config_file(Some("/nonexistent/survey-synth.toml")).unwrap_err();
        assert_eq!(err.exit_code(), 10);
    }
}
