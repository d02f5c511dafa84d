//! smartctl JSON Type Definitions
//!
//! Structs for deserializing `smartctl --json` output (smartmontools 7.x) and
//! their conversion into [`DiskRecord`]s.
//!
//! # Design Notes
//!
//! - **Optional Fields**: smartctl only prints the sections a device supports, so
//!   nearly everything is `Option<T>` or `#[serde(default)]`.
//! - **SCSI Self-Tests**: SCSI logs use numbered top-level keys
//!   (`scsi_self_test_0`, `scsi_self_test_1`, ...) and are picked out of the
//!   flattened remainder of the report.
//!
//! # Commands Covered
//!
//! - `smartctl --scan-open --json` → [`ScanReport`]
//! - `smartctl --all --json -d <type> <device>` → [`SmartctlReport`]

use super::record::{
    Attribute, AttributePayload, Diagnostics, DiskRecord, TestRecord, TEST_CAPABILITIES,
};
use crate::error::{ExporterError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Output of `smartctl --scan-open --json`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScanReport {
    #[serde(default)]
    pub devices: Vec<ScannedDevice>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScannedDevice {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub protocol: Option<String>,
}

impl ScannedDevice {
    /// Short name without the `/dev/` directory
    pub fn short_name(&self) -> String {
        self.name
            .rsplit('/')
            .next()
            .unwrap_or(&self.name)
            .to_string()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SmartctlMeta {
    /// Exit status as recorded by smartctl itself
    pub exit_status: Option<i32>,
    #[serde(default)]
    pub messages: Vec<SmartctlMessage>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmartctlMessage {
    pub string: String,
}

/// Output of `smartctl --all --json` for one device
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SmartctlReport {
    #[serde(default)]
    pub smartctl: Option<SmartctlMeta>,
    pub model_name: Option<String>,
    pub model_family: Option<String>,
    pub scsi_vendor: Option<String>,
    pub scsi_product: Option<String>,
    pub scsi_model_name: Option<String>,
    pub scsi_revision: Option<String>,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
    pub user_capacity: Option<UserCapacity>,
    pub nvme_total_capacity: Option<u64>,
    pub logical_block_size: Option<u32>,
    pub physical_block_size: Option<u32>,
    pub rotation_rate: Option<u32>,
    pub smart_support: Option<SmartSupport>,
    pub smart_status: Option<SmartStatus>,
    pub temperature: Option<Temperature>,
    pub ata_smart_attributes: Option<AtaSmartAttributes>,
    pub ata_smart_data: Option<AtaSmartData>,
    pub ata_smart_self_test_log: Option<AtaSelfTestLog>,
    pub nvme_smart_health_information_log: Option<BTreeMap<String, serde_json::Value>>,
    pub nvme_optional_admin_commands: Option<NvmeOptionalAdminCommands>,
    pub nvme_self_test_log: Option<NvmeSelfTestLog>,
    pub scsi_grown_defect_list: Option<u64>,
    pub scsi_start_stop_cycle_counter: Option<ScsiStartStopCycleCounter>,
    pub scsi_error_counter_log: Option<ScsiErrorCounterLog>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UserCapacity {
    pub bytes: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SmartSupport {
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SmartStatus {
    pub passed: Option<bool>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Temperature {
    pub current: Option<i64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AtaSmartAttributes {
    #[serde(default)]
    pub table: Vec<AtaAttribute>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AtaAttribute {
    pub id: u16,
    #[serde(default)]
    pub name: String,
    pub value: Option<i64>,
    pub worst: Option<i64>,
    pub thresh: Option<i64>,
    #[serde(default)]
    pub when_failed: String,
    #[serde(default)]
    pub flags: AtaAttributeFlags,
    pub raw: Option<AtaRawValue>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AtaAttributeFlags {
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub prefailure: bool,
    #[serde(default)]
    pub updated_online: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AtaRawValue {
    pub value: Option<i64>,
    #[serde(default)]
    pub string: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AtaSmartData {
    pub capabilities: Option<AtaCapabilities>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AtaCapabilities {
    #[serde(default)]
    pub exec_offline_immediate_supported: bool,
    #[serde(default)]
    pub self_tests_supported: bool,
    #[serde(default)]
    pub conveyance_self_test_supported: bool,
    #[serde(default)]
    pub selective_self_test_supported: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AtaSelfTestLog {
    pub standard: Option<AtaSelfTestTable>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AtaSelfTestTable {
    #[serde(default)]
    pub table: Vec<AtaSelfTestEntry>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AtaSelfTestEntry {
    #[serde(rename = "type", default)]
    pub test_type: Described,
    #[serde(default)]
    pub status: AtaSelfTestStatus,
    pub lifetime_hours: Option<u64>,
    pub lba: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AtaSelfTestStatus {
    #[serde(default)]
    pub string: String,
    pub remaining_percent: Option<u8>,
}

/// `{ "value": ..., "string": ... }` pair used throughout smartctl output
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Described {
    #[serde(default)]
    pub string: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NvmeOptionalAdminCommands {
    #[serde(default)]
    pub self_test: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NvmeSelfTestLog {
    #[serde(default)]
    pub table: Vec<NvmeSelfTestEntry>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NvmeSelfTestEntry {
    #[serde(default)]
    pub self_test_code: Described,
    #[serde(default)]
    pub self_test_result: Described,
    pub power_on_hours: Option<u64>,
    pub segment: Option<u64>,
    pub lba: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScsiStartStopCycleCounter {
    pub specified_cycle_count_over_device_lifetime: Option<u64>,
    pub accumulated_start_stop_cycles: Option<u64>,
    pub specified_load_unload_count_over_device_lifetime: Option<u64>,
    pub accumulated_load_unload_cycles: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScsiErrorCounterLog {
    pub read: Option<ScsiErrorCounter>,
    pub write: Option<ScsiErrorCounter>,
    pub verify: Option<ScsiErrorCounter>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScsiErrorCounter {
    pub total_errors_corrected: Option<u64>,
    pub total_uncorrected_errors: Option<u64>,
    /// Printed by smartctl as a decimal string, e.g. `"1234.567"`
    pub gigabytes_processed: Option<String>,
}

impl ScsiErrorCounter {
    fn gigabytes(&self) -> Option<f64> {
        self.gigabytes_processed
            .as_deref()
            .and_then(|gb| gb.trim().parse().ok())
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScsiSelfTestEntry {
    #[serde(default)]
    pub code: Described,
    #[serde(default)]
    pub result: Described,
    pub power_on_time: Option<ScsiPowerOnTime>,
    pub failed_segment: Option<ScsiValue>,
    pub lba_first_failure: Option<ScsiValue>,
    pub sense_key: Option<ScsiValue>,
    pub asc: Option<u64>,
    pub ascq: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScsiPowerOnTime {
    pub hours: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScsiValue {
    pub value: Option<u64>,
}

impl SmartctlReport {
    /// Messages smartctl attached to the report, joined for logging
    /// Exit status smartctl reported in its own output
    pub fn exit_status(&self) -> Option<i32> {
        self.smartctl.as_ref().and_then(|meta| meta.exit_status)
    }

    pub fn messages(&self) -> String {
        self.smartctl
            .as_ref()
            .map(|meta| {
                meta.messages
                    .iter()
                    .map(|m| m.string.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_default()
    }

    /// Convert the report of `device` into a disk record
    pub fn into_record(self, device: &ScannedDevice) -> Result<DiskRecord> {
        let is_nvme = device.device_type == "nvme"
            || device.protocol.as_deref() == Some("NVMe")
            || self.nvme_smart_health_information_log.is_some();

        let size = self
            .user_capacity
            .as_ref()
            .and_then(|c| c.bytes)
            .or(self.nvme_total_capacity);

        let smart_support = self.smart_support.clone().unwrap_or(SmartSupport {
            available: is_nvme,
            enabled: is_nvme,
        });

        let tests = self.test_history(&device.name)?;
        let diagnostics = self.diagnostics();
        let test_capabilities = self.test_capabilities(is_nvme);

        let attributes = match self.nvme_smart_health_information_log {
            Some(log) => AttributePayload::Nvme(log),
            None => AttributePayload::Legacy(
                self.ata_smart_attributes
                    .map(|attrs| attrs.table.into_iter().map(legacy_attribute).collect())
                    .unwrap_or_default(),
            ),
        };

        Ok(DiskRecord {
            name: device.short_name(),
            dev_reference: device.name.clone(),
            interface: device.device_type.clone(),
            model: self
                .model_name
                .or(self.scsi_model_name)
                .or(self.scsi_product),
            serial: self.serial_number,
            vendor: self.scsi_vendor.or(self.model_family),
            firmware: self.firmware_version.or(self.scsi_revision),
            size_raw: size.map(format_capacity),
            size,
            sector_size: self.logical_block_size,
            logical_sector_size: self.logical_block_size,
            physical_sector_size: self.physical_block_size,
            rotation_rate: self.rotation_rate,
            is_ssd: is_nvme || self.rotation_rate == Some(0),
            smart_capable: smart_support.available,
            smart_enabled: smart_support.enabled,
            assessment: self
                .smart_status
                .and_then(|s| s.passed)
                .map(|passed| if passed { "PASS" } else { "FAIL" }.to_string()),
            temperature: self.temperature.and_then(|t| t.current),
            attributes,
            diagnostics,
            test_capabilities,
            tests,
        })
    }

    fn diagnostics(&self) -> Diagnostics {
        let mut diag = Diagnostics {
            Reallocated_Sector_Ct: self.scsi_grown_defect_list,
            ..Default::default()
        };

        if let Some(cycles) = &self.scsi_start_stop_cycle_counter {
            diag.Start_Stop_Spec = cycles.specified_cycle_count_over_device_lifetime;
            diag.Start_Stop_Cycles = cycles.accumulated_start_stop_cycles;
            diag.Start_Stop_Pct_Left = percent_left(diag.Start_Stop_Cycles, diag.Start_Stop_Spec);
            diag.Load_Cycle_Spec = cycles.specified_load_unload_count_over_device_lifetime;
            diag.Load_Cycle_Count = cycles.accumulated_load_unload_cycles;
            diag.Load_Cycle_Pct_Left = percent_left(diag.Load_Cycle_Count, diag.Load_Cycle_Spec);
        }

        if let Some(log) = &self.scsi_error_counter_log {
            if let Some(read) = &log.read {
                diag.Corrected_Reads = read.total_errors_corrected;
                diag.Uncorrected_Reads = read.total_uncorrected_errors;
                diag.Reads_GB = read.gigabytes();
            }
            if let Some(write) = &log.write {
                diag.Corrected_Writes = write.total_errors_corrected;
                diag.Uncorrected_Writes = write.total_uncorrected_errors;
                diag.Writes_GB = write.gigabytes();
            }
            if let Some(verify) = &log.verify {
                diag.Corrected_Verifies = verify.total_errors_corrected;
                diag.Uncorrected_Verifies = verify.total_uncorrected_errors;
                diag.Verifies_GB = verify.gigabytes();
            }
        }

        diag
    }

    fn test_capabilities(&self, is_nvme: bool) -> BTreeMap<String, bool> {
        let mut caps: BTreeMap<String, bool> = TEST_CAPABILITIES
            .iter()
            .map(|name| (name.to_string(), false))
            .collect();

        if let Some(ata) = self.ata_smart_data.as_ref().and_then(|d| d.capabilities.as_ref()) {
            caps.insert("offline".into(), ata.exec_offline_immediate_supported);
            caps.insert("short".into(), ata.self_tests_supported);
            caps.insert("long".into(), ata.self_tests_supported);
            caps.insert("conveyance".into(), ata.conveyance_self_test_supported);
            caps.insert("selective".into(), ata.selective_self_test_supported);
        } else if is_nvme {
            let self_test = self
                .nvme_optional_admin_commands
                .as_ref()
                .is_some_and(|c| c.self_test);
            caps.insert("short".into(), self_test);
            caps.insert("long".into(), self_test);
        }

        caps
    }

    fn test_history(&self, device: &str) -> Result<Vec<TestRecord>> {
        let mut tests = Vec::new();

        if let Some(table) = self
            .ata_smart_self_test_log
            .as_ref()
            .and_then(|log| log.standard.as_ref())
        {
            for entry in &table.table {
                tests.push(TestRecord {
                    num: tests.len() as u32 + 1,
                    hours: entry.lifetime_hours,
                    test_type: entry.test_type.string.clone(),
                    status: entry.status.string.clone(),
                    lba: Some(entry.lba.map_or_else(|| "-".to_string(), |l| l.to_string())),
                    remain: entry.status.remaining_percent.map(|r| format!("{}%", r)),
                    ..Default::default()
                });
            }
        }

        if let Some(log) = &self.nvme_self_test_log {
            for entry in &log.table {
                tests.push(TestRecord {
                    num: tests.len() as u32 + 1,
                    hours: entry.power_on_hours,
                    test_type: entry.self_test_code.string.clone(),
                    status: entry.self_test_result.string.clone(),
                    lba: Some(entry.lba.map_or_else(|| "-".to_string(), |l| l.to_string())),
                    segment: entry.segment.map(|s| s.to_string()),
                    ..Default::default()
                });
            }
        }

        // scsi_self_test_0 .. scsi_self_test_19, most recent first
        let mut scsi: Vec<(u32, &serde_json::Value)> = self
            .extra
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix("scsi_self_test_")
                    .and_then(|n| n.parse().ok())
                    .map(|n| (n, value))
            })
            .collect();
        scsi.sort_by_key(|(n, _)| *n);

        for (_, value) in scsi {
            let entry: ScsiSelfTestEntry =
                serde_json::from_value(value.clone()).map_err(|e| ExporterError::DeviceRead {
                    device: device.to_string(),
                    reason: format!("malformed SCSI self-test entry: {}", e),
                })?;
            tests.push(TestRecord {
                num: tests.len() as u32 + 1,
                hours: entry.power_on_time.and_then(|t| t.hours),
                test_type: entry.code.string,
                status: entry.result.string,
                lba: Some(
                    entry
                        .lba_first_failure
                        .and_then(|l| l.value)
                        .map_or_else(|| "-".to_string(), |l| l.to_string()),
                ),
                segment: entry.failed_segment.and_then(|s| s.value).map(|s| s.to_string()),
                sense: entry.sense_key.and_then(|s| s.value).map(|s| s.to_string()),
                asc: entry.asc.map(|a| a.to_string()),
                ascq: entry.ascq.map(|a| a.to_string()),
                ..Default::default()
            });
        }

        Ok(tests)
    }
}

fn legacy_attribute(attr: AtaAttribute) -> Attribute {
    let printed = |v: Option<i64>| v.map_or_else(|| "---".to_string(), |v| format!("{:03}", v));
    Attribute {
        num: attr.id,
        name: attr.name,
        flags: format!("0x{:04x}", attr.flags.value),
        attr_type: if attr.flags.prefailure { "Pre-fail" } else { "Old_age" }.to_string(),
        updated: if attr.flags.updated_online { "Always" } else { "Offline" }.to_string(),
        when_failed: if attr.when_failed.is_empty() {
            "-".to_string()
        } else {
            attr.when_failed
        },
        value: printed(attr.value),
        worst: printed(attr.worst),
        thresh: printed(attr.thresh),
        raw_int: attr.raw.and_then(|r| r.value),
    }
}

fn percent_left(used: Option<u64>, spec: Option<u64>) -> Option<u64> {
    match (used, spec) {
        (Some(used), Some(spec)) if spec > 0 => {
            Some(100u64.saturating_sub(used.saturating_mul(100) / spec))
        }
        _ => None,
    }
}

/// Decimal capacity with three significant digits, the way smartctl prints it
pub fn format_capacity(bytes: u64) -> String {
    const UNITS: [&str; 7] = ["bytes", "kB", "MB", "GB", "TB", "PB", "EB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    match (unit, value) {
        (0, _) => format!("{} {}", bytes, UNITS[0]),
        (_, v) if v < 10.0 => format!("{:.2} {}", v, UNITS[unit]),
        (_, v) if v < 100.0 => format!("{:.1} {}", v, UNITS[unit]),
        (_, v) => format!("{:.0} {}", v, UNITS[unit]),
    }
}
