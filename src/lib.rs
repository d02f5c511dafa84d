//! PySMART Prometheus Exporter
//!
//! Republishes physical-disk health telemetry (SMART attributes, NVMe health logs,
//! temperature, self-test history) as Prometheus metrics.
//!
//! # Overview
//!
//! Every collection pass reads all disks through `smartctl --json`, maps each disk
//! onto a small set of metric families with stable names and label schemas, and
//! either serves the result over HTTP or writes it to a text file for the node
//! exporter textfile collector.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  --json   ┌──────────────────────────────┐
//! │ smartctl │ ────────► │ DiskSource                   │
//! └──────────┘           │   │ DiskRecord (per disk)    │      HTTP      ┌────────────┐
//!                        │   ▼                          │ ─────────────► │ Prometheus │
//!                        │ map_disk ─► FamilyCache      │   /metrics     └────────────┘
//!                        │                 │            │
//!                        │                 ▼            │   textfile     ┌───────────────┐
//!                        │           MetricFamily list  │ ─────────────► │ node_exporter │
//!                        └──────────────────────────────┘                └───────────────┘
//! ```
//!
//! # Modules
//!
//! - [`smart`] - Disk records, smartctl JSON types and the smartctl disk source
//! - [`collectors`] - Mapping of disk records to metrics and the collection pass
//! - [`labels`] - Label sets and normalization of absent values
//! - [`metrics`] - Metric families, the per-pass family cache and rendering
//! - [`server`] - HTTP server
//! - [`textfile`] - Textfile output loop
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use pysmart_exporter::collectors::{CollectorOptions, SmartCollector};
//! use pysmart_exporter::config::LoggingConfig;
//! use pysmart_exporter::{metrics, smart::SmartctlSource};
//!
//! fn main() -> anyhow::Result<()> {
//!     let collector = SmartCollector::new(
//!         SmartctlSource::new("smartctl"),
//!         CollectorOptions::default(),
//!         LoggingConfig::default(),
//!     );
//!     let families = collector.collect()?;
//!     print!("{}", metrics::render(&families)?);
//!     Ok(())
//! }
//! ```

pub mod collectors;
pub mod config;
pub mod error;
pub mod labels;
pub mod metrics;
pub mod server;
pub mod smart;
pub mod textfile;
