use crate::collectors::{CollectorOptions, DeviceFilter, MetricFilter};
use crate::error::ExporterError;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

static METRIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$").expect("valid metric prefix pattern")
});

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub smartctl: SmartctlConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where metrics go; exactly one of the two must be set
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    /// `host:port` to serve `/metrics` on
    #[serde(default)]
    pub listen: Option<String>,
    /// Text file for the node exporter textfile collector
    #[serde(default)]
    pub textfile_name: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectionConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(default)]
    pub oneshot: bool,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default = "default_metric_prefix")]
    pub metric_prefix: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmartctlConfig {
    #[serde(default = "default_smartctl_path")]
    pub path: PathBuf,
}

/// Logging settings, handed to the subscriber and the collector
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Silence errors and warnings, including per-disk failures
    #[serde(default)]
    pub quiet: bool,
}

fn default_interval() -> u64 {
    60
}

fn default_metric_prefix() -> String {
    "pysmart".to_string()
}

fn default_smartctl_path() -> PathBuf {
    PathBuf::from("smartctl")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            oneshot: false,
            include: Vec::new(),
            exclude: Vec::new(),
            metrics: Vec::new(),
            metric_prefix: default_metric_prefix(),
        }
    }
}

impl Default for SmartctlConfig {
    fn default() -> Self {
        Self {
            path: default_smartctl_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            quiet: false,
        }
    }
}

impl LoggingConfig {
    /// Directive for the tracing `EnvFilter`
    pub fn filter_directive(&self) -> &str {
        if self.quiet {
            "off"
        } else {
            &self.level
        }
    }

    /// Subscriber filter: `RUST_LOG` wins over the configured level, quiet wins over both
    pub fn env_filter(&self) -> EnvFilter {
        if self.quiet {
            return EnvFilter::new("off");
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }
}

/// Validated run mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Listen {
        addr: String,
    },
    Textfile {
        path: PathBuf,
        interval: Duration,
        oneshot: bool,
    },
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("PYSMART_EXPORTER")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("collection.include")
                    .with_list_parse_key("collection.exclude")
                    .with_list_parse_key("collection.metrics"),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Check option combinations and decide how to run
    pub fn run_mode(&self) -> std::result::Result<RunMode, ExporterError> {
        validate_metric_prefix(&self.collection.metric_prefix)?;

        match (&self.output.listen, &self.output.textfile_name) {
            (Some(_), Some(_)) => Err(ExporterError::Config(
                "listen and textfile_name are mutually exclusive".to_string(),
            )),
            (None, None) => Err(ExporterError::Config(
                "one of listen or textfile_name is required".to_string(),
            )),
            (Some(listen), None) => {
                if self.collection.oneshot {
                    return Err(ExporterError::Config(
                        "oneshot has to be used with textfile mode".to_string(),
                    ));
                }
                validate_listen(listen)?;
                Ok(RunMode::Listen {
                    addr: listen.clone(),
                })
            }
            (None, Some(path)) => {
                if self.collection.interval_seconds == 0 {
                    return Err(ExporterError::Config(
                        "interval_seconds must be greater than zero".to_string(),
                    ));
                }
                Ok(RunMode::Textfile {
                    path: path.clone(),
                    interval: Duration::from_secs(self.collection.interval_seconds),
                    oneshot: self.collection.oneshot,
                })
            }
        }
    }

    pub fn collector_options(&self) -> CollectorOptions {
        CollectorOptions {
            metric_prefix: self.collection.metric_prefix.clone(),
            metrics: MetricFilter::new(&self.collection.metrics),
            devices: DeviceFilter::new(&self.collection.include, &self.collection.exclude),
        }
    }
}

fn validate_metric_prefix(prefix: &str) -> std::result::Result<(), ExporterError> {
    if !METRIC_PREFIX.is_match(prefix) {
        return Err(ExporterError::Config(format!(
            "metric_prefix must match [a-zA-Z_:][a-zA-Z0-9_:]*, got {:?}",
            prefix
        )));
    }
    Ok(())
}

fn validate_listen(listen: &str) -> std::result::Result<(), ExporterError> {
    let invalid = || ExporterError::Config(format!("listen must be host:port, got {:?}", listen));
    let (host, port) = listen.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(invalid());
    }
    Ok(())
}
