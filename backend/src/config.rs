use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/server.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub frontend_dir: PathBuf,
    pub staging: StagingConfig,
    pub analysis: AnalysisConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub interpreter: String,
    pub script: PathBuf,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_bytes: usize,
    pub require_cluster_count: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            frontend_dir: PathBuf::from("frontend/dist"),
            staging: StagingConfig::default(),
            analysis: AnalysisConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("temp"),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            script: PathBuf::from("process_satellite.py"),
            timeout_secs: 120,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 50 * 1024 * 1024,
            require_cluster_count: false,
        }
    }
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ServerConfig {
    /// Loads the YAML file named by `SATVIEW_CONFIG` (or the default path when present),
    /// then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = env::var("SATVIEW_CONFIG").ok();
        let path = explicit
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if explicit.is_some() || Path::new(&path).exists() {
            Self::from_file(Path::new(&path))?
        } else {
            log::info!("No config file at {}, using defaults", path);
            Self::default()
        };

        config.apply_overrides(|name| env::var(name).ok())?;
        config.resolve_paths();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("BIND_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = parse_env("PORT", port)?;
        }
        if let Some(dir) = lookup("FRONTEND_DIR") {
            self.frontend_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("STAGING_DIR") {
            self.staging.dir = PathBuf::from(dir);
        }
        if let Some(interpreter) = lookup("ANALYSIS_INTERPRETER") {
            self.analysis.interpreter = interpreter;
        }
        if let Some(script) = lookup("ANALYSIS_SCRIPT") {
            self.analysis.script = PathBuf::from(script);
        }
        if let Some(secs) = lookup("ANALYSIS_TIMEOUT_SECS") {
            self.analysis.timeout_secs = parse_env("ANALYSIS_TIMEOUT_SECS", secs)?;
        }
        if let Some(bytes) = lookup("MAX_UPLOAD_BYTES") {
            self.upload.max_bytes = parse_env("MAX_UPLOAD_BYTES", bytes)?;
        }
        if let Some(flag) = lookup("REQUIRE_CLUSTER_COUNT") {
            self.upload.require_cluster_count = parse_env("REQUIRE_CLUSTER_COUNT", flag)?;
        }
        Ok(())
    }

    // Staging containment checks compare absolute paths, so anchor relative ones now.
    fn resolve_paths(&mut self) {
        if let Ok(dir) = std::path::absolute(&self.staging.dir) {
            self.staging.dir = dir;
        }
        if let Ok(script) = std::path::absolute(&self.analysis.script) {
            self.analysis.script = script;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "analysis timeout must be at least one second".into(),
            ));
        }
        if self.analysis.interpreter.trim().is_empty() {
            return Err(ConfigError::Invalid("analysis interpreter is empty".into()));
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Invalid("max upload size is zero".into()));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}
