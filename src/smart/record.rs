//! Disk Telemetry Records
//!
//! Normalized, source-independent view of one disk as seen in a single
//! collection pass. Records are built fresh by a [`DiskSource`](super::DiskSource)
//! every pass and dropped once mapped.
//!
//! # Design Notes
//!
//! - **Optional Fields**: anything a controller may not report is an `Option`.
//! - **Attribute Payloads**: ATA tables and NVMe health logs have nothing in
//!   common, so [`AttributePayload`] keeps them as separate variants.
//! - **Textual Attribute Values**: legacy attribute values are kept as printed by
//!   the drive table (`"100"`, `"---"`) and parsed when mapped.

use crate::error::{ExporterError, Result};
use std::collections::BTreeMap;

/// Names of the self-test capability states reported for every disk
pub const TEST_CAPABILITIES: [&str; 5] = ["offline", "short", "long", "conveyance", "selective"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskRecord {
    /// Short device name, e.g. `sda` or `nvme0`
    pub name: String,
    /// Device path used to open the disk, e.g. `/dev/sda`
    pub dev_reference: String,
    /// smartctl device type, e.g. `sat`, `nvme`, `megaraid,3`
    pub interface: String,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub vendor: Option<String>,
    pub firmware: Option<String>,
    /// Human readable capacity, e.g. `500 GB`
    pub size_raw: Option<String>,
    /// Capacity in bytes
    pub size: Option<u64>,
    pub sector_size: Option<u32>,
    pub logical_sector_size: Option<u32>,
    pub physical_sector_size: Option<u32>,
    /// Rotation rate in RPM, 0 for solid state media
    pub rotation_rate: Option<u32>,
    pub is_ssd: bool,
    pub smart_capable: bool,
    pub smart_enabled: bool,
    /// Overall health assessment, `PASS` or `FAIL`
    pub assessment: Option<String>,
    /// Current temperature in Celsius
    pub temperature: Option<i64>,
    pub attributes: AttributePayload,
    pub diagnostics: Diagnostics,
    /// Self-test type to supported flag
    pub test_capabilities: BTreeMap<String, bool>,
    pub tests: Vec<TestRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributePayload {
    /// ATA/SATA vendor attribute table
    Legacy(Vec<Attribute>),
    /// NVMe health information log, attribute name to value
    Nvme(BTreeMap<String, serde_json::Value>),
}

impl Default for AttributePayload {
    fn default() -> Self {
        AttributePayload::Legacy(Vec::new())
    }
}

/// One row of an ATA attribute table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attribute {
    pub num: u16,
    pub name: String,
    /// Flag word as printed by smartctl, e.g. `0x002f`
    pub flags: String,
    /// `Pre-fail` or `Old_age`
    pub attr_type: String,
    /// `Always` or `Offline`
    pub updated: String,
    pub when_failed: String,
    pub value: String,
    pub worst: String,
    pub thresh: String,
    pub raw_int: Option<i64>,
}

impl Attribute {
    pub fn value_int(&self) -> Result<f64> {
        self.numeric("value", &self.value)
    }

    pub fn worst_int(&self) -> Result<f64> {
        self.numeric("worst", &self.worst)
    }

    pub fn thresh_int(&self) -> Result<f64> {
        self.numeric("thresh", &self.thresh)
    }

    fn numeric(&self, field: &'static str, raw: &str) -> Result<f64> {
        raw.trim()
            .parse::<i64>()
            .map(|v| v as f64)
            .map_err(|_| ExporterError::AttributeValue {
                attribute: self.name.clone(),
                field,
                value: raw.to_string(),
            })
    }
}

/// SCSI/SAS style diagnostic counters
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(non_snake_case)]
pub struct Diagnostics {
    pub Reallocated_Sector_Ct: Option<u64>,
    pub Start_Stop_Spec: Option<u64>,
    pub Start_Stop_Cycles: Option<u64>,
    pub Start_Stop_Pct_Left: Option<u64>,
    pub Load_Cycle_Spec: Option<u64>,
    pub Load_Cycle_Count: Option<u64>,
    pub Load_Cycle_Pct_Left: Option<u64>,
    pub Non_Medium_Errors: Option<u64>,
    pub Corrected_Reads: Option<u64>,
    pub Corrected_Writes: Option<u64>,
    pub Corrected_Verifies: Option<u64>,
    pub Uncorrected_Reads: Option<u64>,
    pub Uncorrected_Writes: Option<u64>,
    pub Uncorrected_Verifies: Option<u64>,
    pub Reads_GB: Option<f64>,
    pub Writes_GB: Option<f64>,
    pub Verifies_GB: Option<f64>,
}

impl Diagnostics {
    /// Every counter with its name, in declaration order
    pub fn fields(&self) -> Vec<(&'static str, Option<f64>)> {
        let count = |v: Option<u64>| v.map(|v| v as f64);
        vec![
            ("Reallocated_Sector_Ct", count(self.Reallocated_Sector_Ct)),
            ("Start_Stop_Spec", count(self.Start_Stop_Spec)),
            ("Start_Stop_Cycles", count(self.Start_Stop_Cycles)),
            ("Start_Stop_Pct_Left", count(self.Start_Stop_Pct_Left)),
            ("Load_Cycle_Spec", count(self.Load_Cycle_Spec)),
            ("Load_Cycle_Count", count(self.Load_Cycle_Count)),
            ("Load_Cycle_Pct_Left", count(self.Load_Cycle_Pct_Left)),
            ("Non_Medium_Errors", count(self.Non_Medium_Errors)),
            ("Corrected_Reads", count(self.Corrected_Reads)),
            ("Corrected_Writes", count(self.Corrected_Writes)),
            ("Corrected_Verifies", count(self.Corrected_Verifies)),
            ("Uncorrected_Reads", count(self.Uncorrected_Reads)),
            ("Uncorrected_Writes", count(self.Uncorrected_Writes)),
            ("Uncorrected_Verifies", count(self.Uncorrected_Verifies)),
            ("Reads_GB", self.Reads_GB),
            ("Writes_GB", self.Writes_GB),
            ("Verifies_GB", self.Verifies_GB),
        ]
    }
}

/// One entry of the self-test history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestRecord {
    /// Position in the log, 1 is the most recent
    pub num: u32,
    /// Power-on hours when the test ran
    pub hours: Option<u64>,
    pub test_type: String,
    pub status: String,
    /// First failing LBA, `-` when none
    pub lba: Option<String>,
    pub segment: Option<String>,
    /// Remaining percentage of a running test
    pub remain: Option<String>,
    pub sense: Option<String>,
    pub asc: Option<String>,
    pub ascq: Option<String>,
}
