//! Prometheus Metric Families
//!
//! This module holds the per-pass metric model and its Prometheus rendering.
//!
//! # Metric Kinds
//!
//! - **Gauge**: one numeric value per label tuple (temperature, attribute values, counters)
//! - **Info**: identity data carried entirely as labels, value is always 1
//! - **StateSet**: a set of named states per label tuple, each rendered as 1 or 0
//!
//! # Naming
//!
//! Gauge and state-set families are exposed as `<prefix>_<name>`. The info family is
//! registered under the bare prefix and rendered as `<prefix>_info`, so with the
//! default prefix the disk identity lives in `pysmart_info{...}`.
//!
//! # Lifecycle
//!
//! A [`FamilyCache`] lives for exactly one collection pass. Families are created on
//! first use, accumulate label tuples from every disk, and are rendered through a
//! fresh [`Registry`] so that disks removed between passes disappear from the output.

use crate::error::{ExporterError, Result};
use crate::labels::LabelSet;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::{BTreeMap, HashMap};

/// Default metric name prefix
pub const DEFAULT_PREFIX: &str = "pysmart";

/// Emission name reserved for the info family
pub const INFO: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Info,
    StateSet,
}

/// Value carried by one label tuple
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Gauge(f64),
    Info,
    /// State name to active flag
    StateSet(BTreeMap<String, bool>),
}

impl Sample {
    pub fn kind(&self) -> MetricKind {
        match self {
            Sample::Gauge(_) => MetricKind::Gauge,
            Sample::Info => MetricKind::Info,
            Sample::StateSet(_) => MetricKind::StateSet,
        }
    }
}

/// One observation produced by the attribute mapper
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEmission {
    /// Unprefixed metric name, e.g. `temperature` or `attribute_raw`
    pub name: String,
    pub sample: Sample,
    pub labels: LabelSet,
}

impl MetricEmission {
    pub fn gauge(name: impl Into<String>, value: f64, labels: LabelSet) -> Self {
        Self {
            name: name.into(),
            sample: Sample::Gauge(value),
            labels,
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.sample.kind()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    name: String,
    help: String,
    kind: MetricKind,
    label_keys: Vec<String>,
    samples: Vec<(Vec<String>, Sample)>,
}

impl MetricFamily {
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        kind: MetricKind,
        label_keys: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind,
            label_keys,
            samples: Vec::new(),
        }
    }

    /// Exposed family name (already prefixed)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn label_keys(&self) -> &[String] {
        &self.label_keys
    }

    pub fn samples(&self) -> &[(Vec<String>, Sample)] {
        &self.samples
    }

    /// Append one label tuple
    ///
    /// Labels are normalized against the family schema: schema keys missing from
    /// `labels` become `N/A`.
    ///
    /// # Panics
    ///
    /// Panics if `labels` carries a key outside the schema or `sample` is of a
    /// different kind than the family. Both are caller bugs: schemas are fixed
    /// before the first insertion of a pass.
    pub fn insert(&mut self, labels: &LabelSet, sample: Sample) {
        assert_eq!(
            sample.kind(),
            self.kind,
            "sample kind does not match family {}",
            self.name
        );
        if let Some(extra) = labels
            .keys()
            .find(|key| !self.label_keys.iter().any(|k| k == key))
        {
            panic!(
                "label {} is not part of the schema of family {}",
                extra, self.name
            );
        }
        self.samples.push((labels.values_for(&self.label_keys), sample));
    }

    fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        let keys: Vec<&str> = self.label_keys.iter().map(String::as_str).collect();

        match self.kind {
            MetricKind::Gauge => {
                let gauge = GaugeVec::new(Opts::new(self.name.clone(), self.help.clone()), &keys)?;
                for (values, sample) in &self.samples {
                    if let Sample::Gauge(value) = sample {
                        gauge
                            .get_metric_with_label_values(as_strs(values).as_slice())?
                            .set(*value);
                    }
                }
                registry.register(Box::new(gauge))
            }
            MetricKind::Info => {
                let info = GaugeVec::new(
                    Opts::new(format!("{}_info", self.name), self.help.clone()),
                    &keys,
                )?;
                for (values, _) in &self.samples {
                    info.get_metric_with_label_values(as_strs(values).as_slice())?
                        .set(1.0);
                }
                registry.register(Box::new(info))
            }
            MetricKind::StateSet => {
                // The active state is carried in a label named after the family itself.
                let mut state_keys = keys.clone();
                state_keys.push(&self.name);
                let states = GaugeVec::new(
                    Opts::new(self.name.clone(), self.help.clone()),
                    &state_keys,
                )?;
                for (values, sample) in &self.samples {
                    if let Sample::StateSet(set) = sample {
                        for (state, active) in set {
                            let mut tuple = as_strs(values);
                            tuple.push(state);
                            states
                                .get_metric_with_label_values(tuple.as_slice())?
                                .set(if *active { 1.0 } else { 0.0 });
                        }
                    }
                }
                registry.register(Box::new(states))
            }
        }
    }
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

/// Name-keyed registry of the families created during one pass
#[derive(Debug)]
pub struct FamilyCache {
    prefix: String,
    families: Vec<MetricFamily>,
    by_name: HashMap<String, usize>,
}

impl FamilyCache {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            families: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Return the family registered under `name`, creating it on first use
    ///
    /// `kind`, `help` and `label_keys` only matter for the first call of a pass;
    /// later calls get the existing family unchanged.
    pub fn ensure(
        &mut self,
        name: &str,
        kind: MetricKind,
        help: Option<&str>,
        label_keys: &[String],
    ) -> &mut MetricFamily {
        let index = match self.by_name.get(name) {
            Some(&index) => index,
            None => {
                let exposed = if kind == MetricKind::Info {
                    self.prefix.clone()
                } else {
                    format!("{}_{}", self.prefix, name)
                };
                let help = help
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("PySMART metric {}", name));
                self.families
                    .push(MetricFamily::new(exposed, help, kind, label_keys.to_vec()));
                self.by_name.insert(name.to_string(), self.families.len() - 1);
                self.families.len() - 1
            }
        };
        &mut self.families[index]
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Families in creation order
    pub fn into_families(self) -> Vec<MetricFamily> {
        self.families
    }
}

/// Render families in Prometheus text format
pub fn render(families: &[MetricFamily]) -> Result<String> {
    let registry = Registry::new();
    for family in families {
        family.register(&registry)?;
    }

    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| ExporterError::Prometheus(prometheus::Error::Msg(e.to_string())))
}
