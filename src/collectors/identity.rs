//! Disk Identity and Health Metrics
//!
//! # Metrics Produced
//! - `pysmart_info` - Disk identity (value is always 1)
//!   - Labels: interface, model, rotation, serial, size_raw, size, ssd, firmware,
//!     smart_capable, smart_enabled, vendor, sector_size, logical_sector_size,
//!     physical_sector_size, device, raid_id (RAID only)
//! - `pysmart_assessment_passed` - Overall SMART assessment (1=PASS, 0=anything else)
//! - `pysmart_temperature` - Current temperature in Celsius
//! - `pysmart_size` - Capacity in bytes

use super::MetricFilter;
use crate::labels::{raid_id, LabelSet};
use crate::metrics::{MetricEmission, Sample, INFO};
use crate::smart::DiskRecord;

/// Labels shared by every metric of a disk
pub fn common_labels(disk: &DiskRecord) -> LabelSet {
    let mut labels = LabelSet::new();
    labels.insert("device", &disk.name);
    labels.insert("interface", &disk.interface);
    if let Some(id) = raid_id(&disk.interface) {
        labels.insert("raid_id", id);
    }
    labels
}

/// Identity labels; emitted regardless of the metric filter
pub fn info(disk: &DiskRecord, common: &LabelSet) -> MetricEmission {
    let mut labels = LabelSet::new();
    labels.insert("interface", &disk.interface);
    labels.insert("model", &disk.model);
    labels.insert("rotation", disk.rotation_rate);
    labels.insert("serial", &disk.serial);
    labels.insert("size_raw", &disk.size_raw);
    labels.insert("size", disk.size);
    labels.insert("ssd", disk.is_ssd);
    labels.insert("firmware", &disk.firmware);
    labels.insert("smart_capable", disk.smart_capable);
    labels.insert("smart_enabled", disk.smart_enabled);
    labels.insert("vendor", &disk.vendor);
    labels.insert("sector_size", disk.sector_size);
    labels.insert("logical_sector_size", disk.logical_sector_size);
    labels.insert("physical_sector_size", disk.physical_sector_size);
    labels.extend(common);

    MetricEmission {
        name: INFO.to_string(),
        sample: Sample::Info,
        labels,
    }
}

pub fn health(disk: &DiskRecord, common: &LabelSet, filter: &MetricFilter) -> Vec<MetricEmission> {
    let mut emissions = Vec::with_capacity(3);

    // No assessment means the disk never reported one, not that it failed
    if let Some(assessment) = &disk.assessment {
        if filter.allows("assessment_passed") {
            let passed = if assessment == "PASS" { 1.0 } else { 0.0 };
            emissions.push(MetricEmission::gauge(
                "assessment_passed",
                passed,
                common.clone(),
            ));
        }
    }

    if let Some(temperature) = disk.temperature {
        if filter.allows("temperature") {
            emissions.push(MetricEmission::gauge(
                "temperature",
                temperature as f64,
                common.clone(),
            ));
        }
    }

    if let Some(size) = disk.size {
        if filter.allows("size") {
            emissions.push(MetricEmission::gauge("size", size as f64, common.clone()));
        }
    }

    emissions
}
