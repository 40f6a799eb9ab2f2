//! Application settings
//!
//! Settings are layered: built-in defaults, then an optional `dyne.toml`
//! file, then `DYNE_*` environment variables, then the conventional `PORT`
//! variable (which platforms such as container runtimes set to pick the
//! listen port).

use serde::Deserialize;
use std::net::SocketAddr;

use crate::error::{Error, Result};
use crate::logger;

/// Top-level settings structure.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub performance: PerformanceSettings,
    pub http: HttpSettings,
    pub statics: StaticSettings,
    /// Host header patterns requests must match. Empty allows any host.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

/// Listener settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Worker threads for the runtime. Defaults to the number of CPU cores.
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Logging settings.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub access_log: bool,
    pub show_headers: bool,
    /// Access log format: `combined`, `common`, `json`, or a custom pattern.
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path. Stdout when unset.
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path. Stderr when unset.
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Connection handling settings.
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceSettings {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    #[serde(default)]
    pub max_connections: Option<u64>,
}

/// HTTP response settings.
#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    pub server_name: String,
    pub enable_cors: bool,
    pub enable_hsts: bool,
    pub max_body_size: u64,
}

/// Static file settings.
#[derive(Debug, Deserialize, Clone)]
pub struct StaticSettings {
    /// Directory to serve. Static serving is disabled when unset.
    #[serde(default)]
    pub dir: Option<String>,
    /// URL prefix the directory is mounted at.
    #[serde(default = "default_static_route")]
    pub route: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_static_route() -> String {
    "/static".to_string()
}

impl Settings {
    /// Load settings from an optional file path (without extension), the
    /// `DYNE_*` environment, and the `PORT` variable.
    ///
    /// The file defaults to `dyne.toml` in the working directory and is
    /// optional.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path.unwrap_or("dyne")).required(false))
            .add_source(config::Environment::with_prefix("DYNE"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5042)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "dyne/0.1")?
            .set_default("http.enable_cors", false)?
            .set_default("http.enable_hsts", false)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("statics.route", "/static")?
            .set_default("allowed_hosts", Vec::<String>::new())?;

        // Platform convention: a bare PORT variable picks the listen port.
        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    builder = builder.set_override("server.port", i64::from(p))?;
                }
                Err(_) => {
                    logger::log_warning(&format!("Ignoring invalid PORT value '{port}'"));
                }
            }
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Resolve the listen address from host and port.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse().map_err(|_| Error::InvalidAddress(addr))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 5042,
                workers: None,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                access_log: true,
                show_headers: false,
                access_log_format: default_access_log_format(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceSettings {
                keep_alive_timeout: 75,
                read_timeout: 30,
                write_timeout: 30,
                max_connections: None,
            },
            http: HttpSettings {
                server_name: "dyne/0.1".to_string(),
                enable_cors: false,
                enable_hsts: false,
                max_body_size: 10_485_760,
            },
            statics: StaticSettings {
                dir: None,
                route: default_static_route(),
            },
            allowed_hosts: Vec::new(),
        }
    }
}
