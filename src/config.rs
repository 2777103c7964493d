//! Configuration management for ticketcheck using the prefer crate.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::MatchMode;
use crate::services::LookupService;
use crate::sheets::{
    CredentialError, ServiceAccount, SheetsClient, SheetsError, DEFAULT_SHEETS_ENDPOINT,
};

/// Default sheet range (whole first sheet, columns A through Z).
pub const DEFAULT_RANGE: &str = "Sheet1!A:Z";

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default upstream request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Errors turning settings into a running data source.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No spreadsheet configured (set SPREADSHEET_ID or `spreadsheet_id` in the config file)")]
    MissingSpreadsheetId,
    #[error("No service account credentials configured (set GOOGLE_SERVICE_ACCOUNT_JSON or GOOGLE_SERVICE_ACCOUNT_FILE)")]
    MissingCredentials,
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    #[error(transparent)]
    Client(#[from] SheetsError),
}

/// Where the service account key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Key JSON supplied directly (e.g. through the environment).
    Inline(String),
    /// Path to a key file.
    File(PathBuf),
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(_) => write!(f, "Inline(<redacted>)"),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

impl CredentialSource {
    /// Parse the service account key.
    pub fn load(&self) -> Result<ServiceAccount, CredentialError> {
        match self {
            Self::Inline(json) => ServiceAccount::from_json(json),
            Self::File(path) => ServiceAccount::from_file(path),
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Inline(_) => "inline JSON".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Spreadsheet to read tickets from.
    pub spreadsheet_id: Option<String>,
    /// A1 range holding the ticket table, header row included.
    pub range: String,
    /// Service account key.
    pub credentials: Option<CredentialSource>,
    /// How keywords match rows.
    pub match_mode: MatchMode,
    /// Upstream request timeout in seconds.
    pub request_timeout: u64,
    /// Sheets API base URL.
    pub sheets_endpoint: String,
    /// Host to bind the web server to.
    pub host: String,
    /// Port to bind the web server to.
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            range: DEFAULT_RANGE.to_string(),
            credentials: None,
            match_mode: MatchMode::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            sheets_endpoint: DEFAULT_SHEETS_ENDPOINT.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Build the Google Sheets client.
    ///
    /// Credentials are loaded and the key parsed here so that bad
    /// configuration fails at startup rather than on the first request.
    pub fn create_sheets_client(&self) -> Result<SheetsClient, ConfigError> {
        let spreadsheet_id = self
            .spreadsheet_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::MissingSpreadsheetId)?;
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ConfigError::MissingCredentials)?;

        tracing::debug!("Loading service account from {}", credentials.describe());
        let account = credentials.load()?;
        tracing::info!(
            "Using service account {} for spreadsheet {}",
            account.client_email(),
            spreadsheet_id
        );

        Ok(SheetsClient::with_endpoint(
            &self.sheets_endpoint,
            spreadsheet_id,
            account,
            self.request_timeout(),
        )?)
    }

    /// Build the lookup service backed by Google Sheets.
    pub fn create_lookup_service(&self) -> Result<LookupService, ConfigError> {
        let client = self.create_sheets_client()?;
        Ok(LookupService::new(
            Arc::new(client),
            &self.range,
            self.match_mode,
        ))
    }

    /// Apply environment overrides. `lookup` reads a variable by name.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());

        if let Some(id) = var("SPREADSHEET_ID") {
            self.spreadsheet_id = Some(id);
        }
        if let Some(range) = var("SHEET_RANGE") {
            self.range = range;
        }
        // Inline JSON wins over a key file
        if let Some(json) = var("GOOGLE_SERVICE_ACCOUNT_JSON") {
            tracing::debug!("Using service account JSON from environment");
            self.credentials = Some(CredentialSource::Inline(json));
        } else if let Some(path) = var("GOOGLE_SERVICE_ACCOUNT_FILE") {
            let expanded = shellexpand::tilde(&path).into_owned();
            self.credentials = Some(CredentialSource::File(PathBuf::from(expanded)));
        }
        if let Some(mode) = var("TICKETCHECK_MATCH_MODE") {
            match MatchMode::from_str(&mode) {
                Some(mode) => self.match_mode = mode,
                None => tracing::warn!("Ignoring unknown TICKETCHECK_MATCH_MODE: {}", mode),
            }
        }
        if let Some(host) = var("TICKETCHECK_HOST") {
            self.host = host;
        }
        if let Some(port) = var("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT: {}", port),
            }
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Spreadsheet ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    /// Sheet range, e.g. `Sheet1!A:Z`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// Service account key file, relative to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<String>,
    /// Keyword matching rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_mode: Option<MatchMode>,
    /// Upstream request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Sheets API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheets_endpoint: Option<String>,
    /// Bind host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Bind port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers ticketcheck config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("ticketcheck").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML, and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (typically config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref id) = self.spreadsheet_id {
            settings.spreadsheet_id = Some(id.clone());
        }
        if let Some(ref range) = self.range {
            settings.range = range.clone();
        }
        if let Some(ref file) = self.credentials_file {
            settings.credentials = Some(CredentialSource::File(self.resolve_path(file, base_dir)));
        }
        if let Some(mode) = self.match_mode {
            settings.match_mode = mode;
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ref endpoint) = self.sheets_endpoint {
            settings.sheets_endpoint = endpoint.clone();
        }
        if let Some(ref host) = self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
}

/// Load config from the explicit path or by discovery.
async fn load_file_config(options: &LoadOptions) -> Config {
    if let Some(ref config_path) = options.config_path {
        return match Config::load_from_path(config_path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}", e);
                Config::default()
            }
        };
    }

    Config::load().await
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config = load_file_config(&options).await;
    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    let mut settings = Settings::default();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd
    } else {
        config.base_dir().unwrap_or(cwd)
    };

    config.apply_to_settings(&mut settings, &base_dir);

    // Environment takes precedence over the config file
    settings.apply_env(|name| std::env::var(name).ok());

    (settings, config)
}
