//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::NonZeroU64,
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::scheduler::DEFAULT_PUBLISH_SCHEDULE;

mod cli;

pub use cli::{CliArgs, Command, PublishDueArgs, ServeArgs, ServeOverrides, StorageOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "timberline";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_STORAGE_DIR: &str = "data";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const MAX_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_SITE_NAME: &str = "Timberline";
const DEFAULT_SITE_URL: &str = "http://localhost:8080";
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_LLM_TEMPERATURE: f32 = 0.7;
const DEFAULT_LLM_MAX_TOKENS: u32 = 2000;
const DEFAULT_LLM_COST_PER_1K_TOKENS: f64 = 0.002;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub storage: StorageSettings,
    pub cache: CacheSettings,
    pub site: SiteSettings,
    pub auth: AuthSettings,
    pub llm: LlmSettings,
    pub scheduler: SchedulerSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Memory,
    File { directory: PathBuf },
    Remote(RemoteStorageSettings),
}

#[derive(Debug, Clone)]
pub struct RemoteStorageSettings {
    pub endpoint: Url,
    pub project_id: String,
    pub database_id: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl_seconds: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub name: String,
    pub base_url: Url,
}

#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    /// Accepted bearer tokens. Empty means any presented token is accepted.
    pub admin_tokens: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Generation is unavailable without a key.
    pub api_key: Option<String>,
    pub base_url: Url,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub cost_per_1k_tokens: f64,
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub cron: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("TIMBERLINE").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::PublishDue(args)) => raw.apply_storage_overrides(&args.storage),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    storage: RawStorageSettings,
    cache: RawCacheSettings,
    site: RawSiteSettings,
    auth: RawAuthSettings,
    llm: RawLlmSettings,
    scheduler: RawSchedulerSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(ttl);
        }
        if let Some(enabled) = overrides.scheduler_enabled {
            self.scheduler.enabled = Some(enabled);
        }
        if let Some(cron) = overrides.scheduler_cron.as_ref() {
            self.scheduler.cron = Some(cron.clone());
        }
        self.apply_storage_overrides(&overrides.storage);
    }

    fn apply_storage_overrides(&mut self, overrides: &StorageOverrides) {
        if let Some(backend) = overrides.storage_backend.as_ref() {
            self.storage.backend = Some(backend.clone());
        }
        if let Some(directory) = overrides.storage_directory.as_ref() {
            self.storage.directory = Some(directory.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        Ok(Self {
            server: build_server_settings(raw.server)?,
            logging: build_logging_settings(raw.logging)?,
            storage: build_storage_settings(raw.storage)?,
            cache: build_cache_settings(raw.cache)?,
            site: build_site_settings(raw.site)?,
            auth: build_auth_settings(raw.auth),
            llm: build_llm_settings(raw.llm)?,
            scheduler: build_scheduler_settings(raw.scheduler)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.host", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    Ok(LoggingSettings {
        level,
        json: logging.json.unwrap_or(false),
    })
}

fn build_storage_settings(storage: RawStorageSettings) -> Result<StorageSettings, LoadError> {
    let backend = storage
        .backend
        .as_deref()
        .map(str::trim)
        .unwrap_or("memory")
        .to_ascii_lowercase();

    let backend = match backend.as_str() {
        "memory" => StorageBackend::Memory,
        "file" => {
            let directory = storage
                .directory
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));
            if directory.as_os_str().is_empty() {
                return Err(LoadError::invalid(
                    "storage.directory",
                    "path must not be empty",
                ));
            }
            StorageBackend::File { directory }
        }
        "remote" => {
            let endpoint = required(storage.endpoint, "storage.endpoint")?;
            let endpoint = Url::parse(&endpoint)
                .map_err(|err| LoadError::invalid("storage.endpoint", err.to_string()))?;
            StorageBackend::Remote(RemoteStorageSettings {
                endpoint,
                project_id: required(storage.project_id, "storage.project_id")?,
                database_id: required(storage.database_id, "storage.database_id")?,
                api_key: required(storage.api_key, "storage.api_key")?,
            })
        }
        other => {
            return Err(LoadError::invalid(
                "storage.backend",
                format!("unknown backend `{other}` (expected memory, file or remote)"),
            ));
        }
    };

    Ok(StorageSettings { backend })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl > MAX_CACHE_TTL_SECS {
        return Err(LoadError::invalid(
            "cache.ttl_seconds",
            format!("must be at most {MAX_CACHE_TTL_SECS}"),
        ));
    }
    let ttl_seconds = NonZeroU64::new(ttl)
        .ok_or_else(|| LoadError::invalid("cache.ttl_seconds", "must be greater than zero"))?;
    Ok(CacheSettings { ttl_seconds })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let name = non_empty(site.name).unwrap_or_else(|| DEFAULT_SITE_NAME.to_string());
    let base_url = non_empty(site.base_url).unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
    let base_url =
        Url::parse(&base_url).map_err(|err| LoadError::invalid("site.base_url", err.to_string()))?;
    Ok(SiteSettings { name, base_url })
}

fn build_auth_settings(auth: RawAuthSettings) -> AuthSettings {
    let admin_tokens = match auth.admin_tokens {
        Some(RawTokenList::Joined(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect(),
        Some(RawTokenList::List(tokens)) => tokens
            .into_iter()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .collect(),
        None => Vec::new(),
    };
    AuthSettings { admin_tokens }
}

fn build_llm_settings(llm: RawLlmSettings) -> Result<LlmSettings, LoadError> {
    let base_url = non_empty(llm.base_url).unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string());
    let base_url =
        Url::parse(&base_url).map_err(|err| LoadError::invalid("llm.base_url", err.to_string()))?;

    let temperature = llm.temperature.unwrap_or(DEFAULT_LLM_TEMPERATURE);
    if !(0.0..=2.0).contains(&temperature) {
        return Err(LoadError::invalid(
            "llm.temperature",
            "must be between 0 and 2",
        ));
    }
    let max_tokens = llm.max_tokens.unwrap_or(DEFAULT_LLM_MAX_TOKENS);
    if !(1..=8000).contains(&max_tokens) {
        return Err(LoadError::invalid(
            "llm.max_tokens",
            "must be between 1 and 8000",
        ));
    }
    let cost_per_1k_tokens = llm
        .cost_per_1k_tokens
        .unwrap_or(DEFAULT_LLM_COST_PER_1K_TOKENS);
    if cost_per_1k_tokens < 0.0 {
        return Err(LoadError::invalid(
            "llm.cost_per_1k_tokens",
            "must not be negative",
        ));
    }

    Ok(LlmSettings {
        api_key: non_empty(llm.api_key),
        base_url,
        model: non_empty(llm.model).unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
        temperature,
        max_tokens,
        cost_per_1k_tokens,
    })
}

fn build_scheduler_settings(
    scheduler: RawSchedulerSettings,
) -> Result<SchedulerSettings, LoadError> {
    let cron = non_empty(scheduler.cron).unwrap_or_else(|| DEFAULT_PUBLISH_SCHEDULE.to_string());
    cron::Schedule::from_str(&cron)
        .map_err(|err| LoadError::invalid("scheduler.cron", format!("failed to parse: {err}")))?;
    Ok(SchedulerSettings {
        enabled: scheduler.enabled.unwrap_or(true),
        cron,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStorageSettings {
    backend: Option<String>,
    directory: Option<PathBuf>,
    endpoint: Option<String>,
    project_id: Option<String>,
    database_id: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    name: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuthSettings {
    admin_tokens: Option<RawTokenList>,
}

/// Tokens arrive as an array from files and as a comma-joined string from
/// the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawTokenList {
    List(Vec<String>),
    Joined(String),
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLlmSettings {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    cost_per_1k_tokens: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSchedulerSettings {
    enabled: Option<bool>,
    cron: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn required(value: Option<String>, key: &'static str) -> Result<String, LoadError> {
    non_empty(value).ok_or_else(|| LoadError::invalid(key, "is required for the remote backend"))
}
