//! Vendor Attribute Metrics
//!
//! ATA attribute tables and NVMe health logs share the `attribute_value` family
//! but nothing else.
//!
//! # Metrics Produced
//! - `pysmart_attribute_value` - Normalized attribute value
//!   - Labels (NVMe): name, device, interface
//!   - Labels (ATA): num, name, flags, type, updated, whenfailed, device, interface
//! - `pysmart_attribute_thresh` - Failure threshold (ATA only)
//! - `pysmart_attribute_worst` - Worst recorded value (ATA only)
//! - `pysmart_attribute_raw` - Raw counter, when the drive reports one (ATA only)

use super::MetricFilter;
use crate::error::Result;
use crate::labels::LabelSet;
use crate::metrics::MetricEmission;
use crate::smart::{Attribute, AttributePayload};
use std::collections::BTreeMap;

pub fn attributes(
    payload: &AttributePayload,
    common: &LabelSet,
    filter: &MetricFilter,
) -> Result<Vec<MetricEmission>> {
    match payload {
        AttributePayload::Nvme(log) => Ok(nvme(log, common, filter)),
        AttributePayload::Legacy(table) => legacy(table, common, filter),
    }
}

fn nvme(
    log: &BTreeMap<String, serde_json::Value>,
    common: &LabelSet,
    filter: &MetricFilter,
) -> Vec<MetricEmission> {
    log.iter()
        .filter(|(name, _)| filter.allows(name))
        .filter_map(|(name, value)| {
            // Arrays (per-sensor temperatures) and flags are not gauges
            let value = value.as_f64()?;
            let mut labels = LabelSet::new();
            labels.insert("name", name);
            labels.extend(common);
            Some(MetricEmission::gauge("attribute_value", value, labels))
        })
        .collect()
}

fn legacy(
    table: &[Attribute],
    common: &LabelSet,
    filter: &MetricFilter,
) -> Result<Vec<MetricEmission>> {
    let mut emissions = Vec::with_capacity(table.len() * 4);

    for attribute in table.iter().filter(|a| filter.allows(&a.name)) {
        let mut labels = LabelSet::new();
        labels.insert("num", attribute.num);
        labels.insert("name", &attribute.name);
        labels.insert("flags", &attribute.flags);
        labels.insert("type", &attribute.attr_type);
        labels.insert("updated", &attribute.updated);
        labels.insert("whenfailed", &attribute.when_failed);
        labels.extend(common);

        emissions.push(MetricEmission::gauge(
            "attribute_value",
            attribute.value_int()?,
            labels.clone(),
        ));
        emissions.push(MetricEmission::gauge(
            "attribute_thresh",
            attribute.thresh_int()?,
            labels.clone(),
        ));
        emissions.push(MetricEmission::gauge(
            "attribute_worst",
            attribute.worst_int()?,
            labels.clone(),
        ));
        if let Some(raw) = attribute.raw_int {
            emissions.push(MetricEmission::gauge("attribute_raw", raw as f64, labels));
        }
    }

    Ok(emissions)
}
