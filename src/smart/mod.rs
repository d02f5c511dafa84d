pub mod record;
pub mod smartctl;
pub mod types;

pub use record::{AttributePayload, Attribute, Diagnostics, DiskRecord, TestRecord};
pub use smartctl::SmartctlSource;

use crate::error::{ExporterError, Result};

/// Per-disk outcome of reading telemetry: a read fault only affects its own disk
pub type DiskReading = std::result::Result<DiskRecord, ExporterError>;

/// Producer of disk telemetry records
///
/// `list` is called once per collection pass and returns a fresh snapshot.
/// An `Err` means the disks could not be enumerated at all.
pub trait DiskSource: Send + Sync {
    fn list(&self) -> Result<Vec<DiskReading>>;
}

impl<S: DiskSource + ?Sized> DiskSource for std::sync::Arc<S> {
    fn list(&self) -> Result<Vec<DiskReading>> {
        (**self).list()
    }
}
