use serde::{Deserialize, Serialize};

const MAX_BODY_LIMIT_MB: usize = 1024;

// ─── Config ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Logging
    pub logging_to_file: bool,
    pub log_dir: Option<String>,
    pub log_format: LogFormat,

    // Request body size limit (MB)
    pub body_limit_mb: usize,

    // Graceful shutdown drain (seconds)
    pub shutdown_timeout: u64,

    // Jobs
    pub import: ImportConfig,
    pub launcher: LauncherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            logging_to_file: false,
            log_dir: None,
            log_format: LogFormat::default(),
            body_limit_mb: 1,
            shutdown_timeout: 5,
            import: ImportConfig::default(),
            launcher: LauncherConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file, sanitize, and validate.
    pub fn load(path: &str) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        let mut config: Config = serde_yaml_ng::from_str(contents)?;
        config.sanitize();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        anyhow::ensure!(self.port != 0, "port must be non-zero");
        anyhow::ensure!(
            (1..=MAX_BODY_LIMIT_MB).contains(&self.body_limit_mb),
            "body-limit-mb must be between 1 and {MAX_BODY_LIMIT_MB}"
        );
        anyhow::ensure!(
            self.launcher.history_capacity > 0,
            "launcher.history-capacity must be greater than zero"
        );
        anyhow::ensure!(!self.import.input.is_empty(), "import.input must be set");
        Ok(())
    }

    fn sanitize(&mut self) {
        self.host = self.host.trim().to_string();
        self.import.input = self.import.input.trim().to_string();
        if let Some(ref mut dir) = self.log_dir {
            while dir.len() > 1 && dir.ends_with('/') {
                dir.pop();
            }
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Request body limit in bytes, saturating for values that skipped
    /// validation.
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }
}

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

// ─── Sub-configs ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ImportConfig {
    /// CSV file read by the import-product job.
    pub input: String,
    /// Malformed lines tolerated before the execution fails.
    pub skip_limit: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            input: "data/products.csv".to_string(),
            skip_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LauncherConfig {
    /// Finished executions kept for the execution explorer.
    pub history_capacity: usize,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
        }
    }
}
