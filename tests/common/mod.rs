//! Shared fixtures for integration tests

#![allow(dead_code)]

use pysmart_exporter::collectors::{CollectorOptions, SmartCollector};
use pysmart_exporter::config::LoggingConfig;
use pysmart_exporter::error::{ExporterError, Result};
use pysmart_exporter::metrics::{MetricFamily, Sample};
use pysmart_exporter::smart::{
    Attribute, AttributePayload, DiskReading, DiskRecord, DiskSource, TestRecord,
};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Disk source returning a fixed list of readings
pub struct StaticSource {
    readings: Mutex<Vec<Box<dyn Fn() -> DiskReading + Send>>>,
}

impl StaticSource {
    pub fn new(disks: Vec<DiskRecord>) -> Self {
        let readings = disks
            .into_iter()
            .map(|disk| Box::new(move || Ok(disk.clone())) as Box<dyn Fn() -> DiskReading + Send>)
            .collect();
        Self {
            readings: Mutex::new(readings),
        }
    }

    /// Append a disk that fails to read
    pub fn with_read_error(self, device: &str, reason: &str) -> Self {
        let device = device.to_string();
        let reason = reason.to_string();
        self.readings.lock().unwrap().push(Box::new(move || {
            Err(ExporterError::DeviceRead {
                device: device.clone(),
                reason: reason.clone(),
            })
        }));
        self
    }
}

impl DiskSource for StaticSource {
    fn list(&self) -> Result<Vec<DiskReading>> {
        Ok(self.readings.lock().unwrap().iter().map(|r| r()).collect())
    }
}

/// Disk source whose enumeration always fails
pub struct BrokenSource;

impl DiskSource for BrokenSource {
    fn list(&self) -> Result<Vec<DiskReading>> {
        Err(ExporterError::Smartctl("scan failed".to_string()))
    }
}

pub fn collector(disks: Vec<DiskRecord>) -> SmartCollector<StaticSource> {
    SmartCollector::new(
        StaticSource::new(disks),
        CollectorOptions::default(),
        LoggingConfig::default(),
    )
}

pub fn attribute(num: u16, name: &str, value: &str, raw: Option<i64>) -> Attribute {
    Attribute {
        num,
        name: name.to_string(),
        flags: "0x0033".to_string(),
        attr_type: "Pre-fail".to_string(),
        updated: "Always".to_string(),
        when_failed: "-".to_string(),
        value: value.to_string(),
        worst: "100".to_string(),
        thresh: "010".to_string(),
        raw_int: raw,
    }
}

/// SATA disk with an attribute table and one self-test entry
pub fn sata_disk(name: &str) -> DiskRecord {
    DiskRecord {
        name: name.to_string(),
        dev_reference: format!("/dev/{}", name),
        interface: "sat".to_string(),
        model: Some("WDC WD40EFRX-68N32N0".to_string()),
        serial: Some(format!("WD-{}", name.to_uppercase())),
        firmware: Some("82.00A82".to_string()),
        size_raw: Some("4.00 TB".to_string()),
        size: Some(4_000_787_030_016),
        sector_size: Some(512),
        logical_sector_size: Some(512),
        physical_sector_size: Some(4096),
        rotation_rate: Some(5400),
        smart_capable: true,
        smart_enabled: true,
        assessment: Some("PASS".to_string()),
        temperature: Some(34),
        attributes: AttributePayload::Legacy(vec![
            attribute(5, "Reallocated_Sector_Ct", "200", Some(0)),
            attribute(194, "Temperature_Celsius", "116", Some(34)),
        ]),
        test_capabilities: capabilities(&["offline", "short", "long"]),
        tests: vec![TestRecord {
            num: 1,
            hours: Some(1200),
            test_type: "Short offline".to_string(),
            status: "Completed without error".to_string(),
            lba: Some("-".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// NVMe disk with a health log
pub fn nvme_disk(name: &str) -> DiskRecord {
    let mut log = BTreeMap::new();
    log.insert("critical_warning".to_string(), serde_json::json!(0));
    log.insert("percentage_used".to_string(), serde_json::json!(3));
    log.insert("data_units_read".to_string(), serde_json::json!(1234567));
    log.insert("temperature_sensors".to_string(), serde_json::json!([36, 41]));

    DiskRecord {
        name: name.to_string(),
        dev_reference: format!("/dev/{}", name),
        interface: "nvme".to_string(),
        model: Some("Samsung SSD 980 PRO 1TB".to_string()),
        serial: Some("S5GXNF0R123456".to_string()),
        size: Some(1_000_204_886_016),
        is_ssd: true,
        smart_capable: true,
        smart_enabled: true,
        assessment: Some("PASS".to_string()),
        temperature: Some(36),
        attributes: AttributePayload::Nvme(log),
        test_capabilities: capabilities(&["short", "long"]),
        ..Default::default()
    }
}

pub fn capabilities(supported: &[&str]) -> BTreeMap<String, bool> {
    ["offline", "short", "long", "conveyance", "selective"]
        .iter()
        .map(|name| (name.to_string(), supported.contains(name)))
        .collect()
}

pub fn family<'a>(families: &'a [MetricFamily], name: &str) -> Option<&'a MetricFamily> {
    families.iter().find(|f| f.name() == name)
}

/// Label value of `key` in a sample of `family`
pub fn label<'a>(family: &MetricFamily, values: &'a [String], key: &str) -> Option<&'a str> {
    family
        .label_keys()
        .iter()
        .position(|k| k == key)
        .map(|i| values[i].as_str())
}

pub fn gauge_value(sample: &Sample) -> f64 {
    match sample {
        Sample::Gauge(v) => *v,
        other => panic!("expected gauge sample, got {:?}", other),
    }
}
