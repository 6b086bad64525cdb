//! Layered runtime configuration: defaults, config files, environment, then CLI flags.

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroU64, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "foglio";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_ADMIN_HOST: &str = "127.0.0.1";
const DEFAULT_PUBLIC_PORT: u16 = 8000;
const DEFAULT_ADMIN_PORT: u16 = 8001;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_TTL_SECS: u64 = 20;
const DEFAULT_CACHE_MAX_PAGES: usize = 64;

/// Command-line arguments for the Foglio binary.
#[derive(Debug, Parser)]
#[command(name = "foglio", version, about = "Foglio feed server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOGLIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the Foglio HTTP services.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the public listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the administrative listener host.
    #[arg(long = "server-admin-host", value_name = "HOST")]
    pub server_admin_host: Option<String>,

    /// Override the public listener port.
    #[arg(long = "server-public-port", value_name = "PORT")]
    pub public_port: Option<u16>,

    /// Override the administrative listener port.
    #[arg(long = "server-admin-port", value_name = "PORT")]
    pub admin_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Toggle the global feed page cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the page cache TTL.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    /// Override the page cache capacity.
    #[arg(long = "cache-max-pages", value_name = "COUNT")]
    pub cache_max_pages: Option<usize>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_seconds: NonZeroU64,
    pub max_pages: NonZeroUsize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not assemble configuration: {0}")]
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

/// Resolve settings, letting later sources shadow earlier ones.
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut sources = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        sources = sources.add_source(File::from(path.as_path()).required(true));
    }

    let resolved = sources
        .add_source(Environment::with_prefix("FOGLIO").separator("__"))
        .build()?;

    let mut raw: RawSettings = resolved.try_deserialize()?;
    let overrides = match cli.command.as_ref() {
        Some(Command::Serve(args)) => args.overrides.clone(),
        None => ServeOverrides::default(),
    };
    raw.apply_serve_overrides(&overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        let server = &mut self.server;
        server.host = overrides.server_host.clone().or(server.host.take());
        server.admin_host = overrides.server_admin_host.clone().or(server.admin_host.take());
        server.public_port = overrides.public_port.or(server.public_port);
        server.admin_port = overrides.admin_port.or(server.admin_port);
        server.graceful_shutdown_seconds = overrides
            .server_graceful_shutdown_seconds
            .or(server.graceful_shutdown_seconds);

        let logging = &mut self.logging;
        logging.level = overrides.log_level.clone().or(logging.level.take());
        logging.json = overrides.log_json.or(logging.json);

        let database = &mut self.database;
        database.url = overrides.database_url.clone().or(database.url.take());
        database.max_connections = overrides
            .database_max_connections
            .or(database.max_connections);

        let cache = &mut self.cache;
        cache.enabled = overrides.cache_enabled.or(cache.enabled);
        cache.ttl_seconds = overrides.cache_ttl_seconds.or(cache.ttl_seconds);
        cache.max_pages = overrides.cache_max_pages.or(cache.max_pages);
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        Ok(Self {
            server: build_server_settings(raw.server)?,
            logging: build_logging_settings(raw.logging)?,
            database: build_database_settings(raw.database)?,
            cache: build_cache_settings(raw.cache)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let public_port = server.public_port.unwrap_or(DEFAULT_PUBLIC_PORT);
    let admin_port = server.admin_port.unwrap_or(DEFAULT_ADMIN_PORT);
    for (port, key) in [
        (public_port, "server.public_port"),
        (admin_port, "server.admin_port"),
    ] {
        if port == 0 {
            return Err(LoadError::invalid(key, "port must be greater than zero"));
        }
    }

    let public_addr = listener_addr(
        server.host.as_deref().unwrap_or(DEFAULT_HOST),
        public_port,
        "server.public_addr",
    )?;
    let admin_addr = listener_addr(
        server.admin_host.as_deref().unwrap_or(DEFAULT_ADMIN_HOST),
        admin_port,
        "server.admin_addr",
    )?;

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
        public_addr,
        admin_addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn listener_addr(host: &str, port: u16, key: &'static str) -> Result<SocketAddr, LoadError> {
    format!("{host}:{port}")
        .parse()
        .map_err(|err| LoadError::invalid(key, format!("invalid address `{host}:{port}`: {err}")))
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = logging
        .level
        .as_deref()
        .map(|value| {
            LevelFilter::from_str(value)
                .map_err(|err| LoadError::invalid("logging.level", format!("failed to parse: {err}")))
        })
        .transpose()?
        .unwrap_or(LevelFilter::INFO);

    let format = match logging.json {
        Some(true) => LogFormat::Json,
        _ => LogFormat::Compact,
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database
        .url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    let max_connections = non_zero_u32(
        u64::from(database.max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl_seconds = NonZeroU64::new(cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS))
        .ok_or_else(|| LoadError::invalid("cache.ttl_seconds", "must be greater than zero"))?;
    let max_pages = NonZeroUsize::new(cache.max_pages.unwrap_or(DEFAULT_CACHE_MAX_PAGES))
        .ok_or_else(|| LoadError::invalid("cache.max_pages", "must be greater than zero"))?;

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        ttl_seconds,
        max_pages,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    admin_host: Option<String>,
    public_port: Option<u16>,
    admin_port: Option<u16>,
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
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    ttl_seconds: Option<u64>,
    max_pages: Option<usize>,
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    let value = u32::try_from(value)
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.public_port = Some(7000);
        raw.logging.level = Some("info".to_string());
        raw.database.url = Some("postgres://from-file".to_string());

        let overrides = ServeOverrides {
            public_port: Some(7777),
            log_level: Some("debug".to_string()),
            database_url: Some("postgres://from-cli".to_string()),
            ..Default::default()
        };
        raw.apply_serve_overrides(&overrides);

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.server.public_addr.port(), 7777);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert_eq!(settings.database.url.as_deref(), Some("postgres://from-cli"));
    }

    #[test]
    fn file_values_survive_when_no_override_is_given() {
        let mut raw = RawSettings::default();
        raw.server.host = Some("0.0.0.0".to_string());

        raw.apply_serve_overrides(&ServeOverrides::default());

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.server.public_addr.ip().to_string(), "0.0.0.0");
    }

    #[test]
    fn listeners_default_to_split_ports() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert_eq!(settings.server.public_addr.port(), 8000);
        assert_eq!(settings.server.admin_addr.port(), 8001);
    }

    #[test]
    fn cache_defaults_to_twenty_second_ttl() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert!(settings.cache.enabled);
        assert_eq!(settings.cache.ttl_seconds.get(), 20);
        assert_eq!(settings.cache.max_pages.get(), 64);
    }

    #[test]
    fn zero_cache_ttl_is_rejected() {
        let mut raw = RawSettings::default();
        raw.cache.ttl_seconds = Some(0);
        let result = Settings::from_raw(raw);
        assert!(matches!(
            result,
            Err(LoadError::Invalid {
                key: "cache.ttl_seconds",
                ..
            })
        ));
    }

    #[test]
    fn json_flag_switches_the_log_format() {
        let mut raw = RawSettings::default();
        raw.apply_serve_overrides(&ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        });

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn bare_invocation_defaults_to_serve() {
        let args = CliArgs::parse_from(["foglio"]);
        let command = args
            .command
            .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
        assert!(matches!(command, Command::Serve(_)));
    }

    #[test]
    fn parse_serve_overrides() {
        let args = CliArgs::parse_from([
            "foglio",
            "serve",
            "--server-host",
            "0.0.0.0",
            "--database-url",
            "postgres://override",
            "--cache-enabled",
            "false",
        ]);

        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
                assert_eq!(
                    serve.overrides.database_url.as_deref(),
                    Some("postgres://override")
                );
                assert_eq!(serve.overrides.cache_enabled, Some(false));
            }
        }
    }
}
