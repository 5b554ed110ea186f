//! Block device reference handed in by the monitoring daemon.

use std::path::PathBuf;

use serde::Serialize;

use crate::ibpi::IbpiPattern;

/// The daemon's view of one drive. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockDevice {
    /// Storage controller path in sysfs, e.g.
    /// `/sys/devices/pci0000:00/0000:00:08.1/ata5/host4/target4:0:0/4:0:0:0`.
    pub cntrl_path: PathBuf,
    /// The block device's own sysfs path.
    pub sysfs_path: PathBuf,
    /// Pattern applied by the previous successful write.
    pub ibpi_prev: IbpiPattern,
}

impl BlockDevice {
    pub fn new(cntrl_path: PathBuf, sysfs_path: PathBuf) -> Self {
        BlockDevice {
            cntrl_path,
            sysfs_path,
            ibpi_prev: IbpiPattern::Unknown,
        }
    }

    pub fn with_previous(mut self, pattern: IbpiPattern) -> Self {
        self.ibpi_prev = pattern;
        self
    }
}
