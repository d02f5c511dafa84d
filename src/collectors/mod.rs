//! Disk Metrics Collection
//!
//! This module turns disk telemetry records into metric families.
//!
//! # Architecture
//!
//! - [`map_disk`] maps one [`DiskRecord`] into an ordered list of emissions. The
//!   per-category rules live in the submodules (`identity`, `attributes`,
//!   `diagnostics`, `self_test`).
//! - [`SmartCollector`] runs one collection pass over a [`DiskSource`]: it maps
//!   every disk, fixes the label schema of every family, and fills a
//!   [`FamilyCache`].
//!
//! # Error Handling
//!
//! Disk failures are non-fatal. A disk that cannot be read or mapped is logged,
//! contributes nothing to the pass, and the remaining disks are still exported.
//! Only a failure to enumerate disks at all aborts a pass.

use crate::config::LoggingConfig;
use crate::error::Result;
use crate::metrics::{FamilyCache, MetricEmission, MetricFamily, DEFAULT_PREFIX};
use crate::smart::{DiskRecord, DiskSource};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

pub mod attributes;
pub mod diagnostics;
pub mod identity;

/// Allow-list of metric names; empty allows everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricFilter {
    names: Vec<String>,
}

impl MetricFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: split_list(names),
        }
    }

    pub fn allows(&self, name: &str) -> bool {
        self.names.is_empty() || self.names.iter().any(|n| n == name)
    }
}

/// Include/exclude lists matched against device names and device paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl DeviceFilter {
    pub fn new<I, S>(include: I, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            include: split_list(include),
            exclude: split_list(exclude),
        }
    }

    pub fn allows(&self, name: &str, reference: &str) -> bool {
        let listed = |list: &[String]| list.iter().any(|d| d == name || d == reference);
        if !self.include.is_empty() && !listed(&self.include) {
            return false;
        }
        !listed(&self.exclude)
    }
}

/// Accept both `["sda", "sdb"]` and `["sda,sdb"]`
fn split_list<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .flat_map(|item| {
            item.as_ref()
                .split(',')
                .map(|s| s.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Map one disk into its metric emissions
///
/// Emissions come out in a fixed order: info, health, attributes, diagnostics,
/// test capabilities, test history. Any fault aborts the whole disk.
pub fn map_disk(disk: &DiskRecord, filter: &MetricFilter) -> Result<Vec<MetricEmission>> {
    let common = identity::common_labels(disk);

    let mut emissions = vec![identity::info(disk, &common)];
    emissions.extend(identity::health(disk, &common, filter));
    emissions.extend(attributes::attributes(&disk.attributes, &common, filter)?);
    emissions.extend(diagnostics::diagnostics(&disk.diagnostics, &common, filter));
    emissions.extend(self_test::capabilities(disk, &common, filter));
    emissions.extend(self_test::history(disk, &common, filter));

    Ok(emissions)
}

/// Settings applied to every collection pass
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    pub metric_prefix: String,
    pub metrics: MetricFilter,
    pub devices: DeviceFilter,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            metric_prefix: DEFAULT_PREFIX.to_string(),
            metrics: MetricFilter::default(),
            devices: DeviceFilter::default(),
        }
    }
}

/// A disk skipped during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskFault {
    pub device: String,
    pub reason: String,
}

/// Result of one collection pass
#[derive(Debug, Clone)]
pub struct CollectionPass {
    pub families: Vec<MetricFamily>,
    /// Number of disks whose metrics were exported
    pub disks: usize,
    pub faults: Vec<DiskFault>,
}

pub struct SmartCollector<S> {
    source: S,
    options: CollectorOptions,
    logging: LoggingConfig,
    pass_lock: Arc<Mutex<()>>,
}

impl<S: DiskSource> SmartCollector<S> {
    pub fn new(source: S, options: CollectorOptions, logging: LoggingConfig) -> Self {
        Self {
            source,
            options,
            logging,
            pass_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Lock held by async callers for the whole of a pass, so passes never overlap
    pub fn pass_lock(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.pass_lock)
    }

    /// Run one pass and return the metric families
    pub fn collect(&self) -> Result<Vec<MetricFamily>> {
        Ok(self.collect_pass()?.families)
    }

    /// Run one pass, also reporting the disks that were skipped
    pub fn collect_pass(&self) -> Result<CollectionPass> {
        let readings = self.source.list()?;
        let mut mapped: Vec<Vec<MetricEmission>> = Vec::with_capacity(readings.len());
        let mut faults = Vec::new();

        for reading in readings {
            let disk = match reading {
                Ok(disk) => disk,
                Err(e) => {
                    let device = e.device().unwrap_or("unknown").to_string();
                    if self.options.devices.allows(&device, &device) {
                        self.record_fault(&mut faults, device, e.to_string());
                    }
                    continue;
                }
            };

            if !self.options.devices.allows(&disk.name, &disk.dev_reference) {
                debug!("Skipping filtered device {}", disk.name);
                continue;
            }

            match map_disk(&disk, &self.options.metrics) {
                Ok(emissions) => mapped.push(emissions),
                Err(e) => self.record_fault(&mut faults, disk.name.clone(), e.to_string()),
            }
        }

        let disks = mapped.len();
        let families = self.build_families(mapped);
        info!(
            "Collected {} metric families from {} disks ({} skipped)",
            families.len(),
            disks,
            faults.len()
        );

        Ok(CollectionPass {
            families,
            disks,
            faults,
        })
    }

    fn record_fault(&self, faults: &mut Vec<DiskFault>, device: String, reason: String) {
        if !self.logging.quiet {
            error!(device = %device, "Failed to update SMART metrics: {}", reason);
        }
        faults.push(DiskFault { device, reason });
    }

    /// Fix every family's label schema, then insert
    ///
    /// The schema of a family is the union of the label keys of all its emissions
    /// in this pass, in first-seen order, so optional labels present on only some
    /// disks or test entries never change the arity of a family.
    fn build_families(&self, mapped: Vec<Vec<MetricEmission>>) -> Vec<MetricFamily> {
        let mut schemas: HashMap<&str, Vec<String>> = HashMap::new();
        for emission in mapped.iter().flatten() {
            let schema = schemas.entry(emission.name.as_str()).or_default();
            for key in emission.labels.keys() {
                if !schema.iter().any(|k| k == key) {
                    schema.push(key.to_string());
                }
            }
        }

        let mut cache = FamilyCache::new(self.options.metric_prefix.clone());
        for emission in mapped.iter().flatten() {
            let schema = schemas
                .get(emission.name.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            cache
                .ensure(&emission.name, emission.kind(), None, schema)
                .insert(&emission.labels, emission.sample.clone());
        }

        cache.into_families()
    }
}
