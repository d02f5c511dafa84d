use anyhow::Result;
use clap::Parser;
use pysmart_exporter::collectors::SmartCollector;
use pysmart_exporter::config::{Config, RunMode};
use pysmart_exporter::server::{self, SharedCollector};
use pysmart_exporter::smart::{DiskSource, SmartctlSource};
use pysmart_exporter::textfile;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, disable_version_flag = true)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Full file path where to store data for node collector to pick up
    #[arg(short = 'f', long, env = "PYSMART_TEXTFILE_NAME", conflicts_with = "listen")]
    textfile_name: Option<PathBuf>,

    /// Listen host:port, i.e. 0.0.0.0:9417
    #[arg(short, long, env = "PYSMART_LISTEN")]
    listen: Option<String>,

    /// Number of seconds between updates of the textfile
    #[arg(short, long)]
    interval: Option<u64>,

    /// Run only once and exit. Useful for running in a cronjob
    #[arg(short = '1', long)]
    oneshot: bool,

    /// Silence any error messages and warnings
    #[arg(short, long)]
    quiet: bool,

    /// Comma-separated list of devices to include, e.g. nvme0,/dev/sda,/dev/sdb
    #[arg(long)]
    include: Option<String>,

    /// Comma-separated list of devices to exclude, e.g. nvme0,/dev/sdc,/dev/sdd
    #[arg(long)]
    exclude: Option<String>,

    /// Custom prefix for exported metrics
    #[arg(long)]
    metric_prefix: Option<String>,

    /// Comma-separated list of metrics to include (info is always included)
    #[arg(long)]
    metrics: Option<String>,

    /// Path to the smartctl binary
    #[arg(long, env = "PYSMART_SMARTCTL")]
    smartctl: Option<PathBuf>,

    /// Print version
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    version: Option<bool>,
}

impl Args {
    /// Override file and environment settings with the ones given on the command line
    fn apply(self, config: &mut Config) {
        if let Some(path) = self.textfile_name {
            config.output.textfile_name = Some(path);
            config.output.listen = None;
        }
        if let Some(listen) = self.listen {
            config.output.listen = Some(listen);
            config.output.textfile_name = None;
        }
        if let Some(interval) = self.interval {
            config.collection.interval_seconds = interval;
        }
        config.collection.oneshot |= self.oneshot;
        config.logging.quiet |= self.quiet;
        if let Some(include) = self.include {
            config.collection.include = vec![include];
        }
        if let Some(exclude) = self.exclude {
            config.collection.exclude = vec![exclude];
        }
        if let Some(prefix) = self.metric_prefix {
            config.collection.metric_prefix = prefix;
        }
        if let Some(metrics) = self.metrics {
            config.collection.metrics = vec![metrics];
        }
        if let Some(smartctl) = self.smartctl {
            config.smartctl.path = smartctl;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    args.apply(&mut config);

    // Initialize tracing
    tracing_subscriber::registry()
        .with(config.logging.env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting PySMART Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mode = match config.run_mode() {
        Ok(mode) => mode,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let source: Arc<dyn DiskSource> = Arc::new(SmartctlSource::new(config.smartctl.path.clone()));
    let collector: SharedCollector = Arc::new(SmartCollector::new(
        source,
        config.collector_options(),
        config.logging.clone(),
    ));

    let result = match mode {
        RunMode::Listen { addr } => server::start(collector, &addr).await,
        RunMode::Textfile {
            path,
            interval,
            oneshot,
        } => {
            info!(
                "Writing metrics to {} every {}s",
                path.display(),
                interval.as_secs()
            );
            textfile::run(collector, path, interval, oneshot).await
        }
    };

    if let Err(e) = result {
        error!("Exporter error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
