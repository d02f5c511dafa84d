//! smartctl Disk Source
//!
//! Enumerates disks with `smartctl --scan-open` and reads each one with
//! `smartctl --all --json`. Every device is read independently: a device that
//! cannot be opened or returns garbage becomes a per-disk fault and the rest of
//! the scan carries on.
//!
//! # Exit Status
//!
//! smartctl returns a bit mask. Bits 0 and 1 (command line error, device open
//! failure) mean no usable data was produced. The remaining bits report disk
//! conditions (failing attributes, error log entries) while the JSON report is
//! still complete, so they are not treated as errors.

use super::types::{ScanReport, ScannedDevice, SmartctlReport};
use super::{DiskReading, DiskSource};
use crate::error::{ExporterError, Result};
use std::path::PathBuf;
use std::process::{Command, Output};
use tracing::debug;

const FATAL_EXIT_BITS: i32 = 0b11;

pub struct SmartctlSource {
    binary: PathBuf,
}

impl SmartctlSource {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Devices reported by `smartctl --scan-open`
    pub fn scan(&self) -> Result<Vec<ScannedDevice>> {
        let output = self.run(&["--scan-open", "--json"])?;
        let report: ScanReport = serde_json::from_slice(&output.stdout)?;
        debug!("smartctl scan found {} devices", report.devices.len());
        Ok(report.devices)
    }

    /// Read one device
    pub fn read(&self, device: &ScannedDevice) -> DiskReading {
        let output = self
            .run(&["--all", "--json", "-d", &device.device_type, &device.name])
            .map_err(|e| ExporterError::DeviceRead {
                device: device.name.clone(),
                reason: e.to_string(),
            })?;
        parse_device_report(device, &output.stdout, output.status.code())
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new(&self.binary).args(args).output().map_err(|e| {
            ExporterError::Smartctl(format!(
                "failed to run {} {}: {}",
                self.binary.display(),
                args.join(" "),
                e
            ))
        })
    }
}

impl DiskSource for SmartctlSource {
    fn list(&self) -> Result<Vec<DiskReading>> {
        Ok(self
            .scan()?
            .iter()
            .map(|device| self.read(device))
            .collect())
    }
}

/// Turn the raw output of `smartctl --all --json` into a record
///
/// `exit_code` is the process exit code; `None` means smartctl was killed by a signal,
/// in which case the `exit_status` smartctl wrote into the report is used instead.
pub fn parse_device_report(
    device: &ScannedDevice,
    stdout: &[u8],
    exit_code: Option<i32>,
) -> DiskReading {
    let read_error = |reason: String| ExporterError::DeviceRead {
        device: device.name.clone(),
        reason,
    };

    let report: SmartctlReport = serde_json::from_slice(stdout)
        .map_err(|e| read_error(format!("unparseable smartctl output: {}", e)))?;

    // A signal leaves no process exit code; trust the status smartctl recorded, if any
    let code = exit_code
        .or_else(|| report.exit_status())
        .ok_or_else(|| read_error("smartctl terminated by signal".into()))?;
    if code & FATAL_EXIT_BITS != 0 {
        let messages = report.messages();
        return Err(read_error(format!(
            "smartctl exited with status {}{}",
            code,
            if messages.is_empty() {
                String::new()
            } else {
                format!(": {}", messages)
            }
        )));
    }

    report.into_record(device)
}
