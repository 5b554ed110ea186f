//! Drive location: map a controller path to a physical bay.
//!
//! NVMe drives are matched to a PCI hotplug slot, whose number (after a
//! platform correction) is the bay. SATA drives carry their port in the
//! `ataNN` component of the controller path.

use std::path::Path;

use serde::Serialize;

use crate::error::{LedError, Result};
use crate::path::find_path;
use crate::platform::AmdPlatform;
use crate::sysfs::SysfsReader;

/// Highest drive bay on any supported platform.
pub const MAX_PORT: i32 = 24;

/// Bays handled by one MG9098 chip.
pub const BAYS_PER_CHIP: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Nvme,
    Sata,
}

/// A located drive. Built fresh for every request, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Drive {
    /// Physical bay number, 1-based.
    pub port: u8,
    /// One-hot bay bitmask. For SATA the bit is already relative to the chip.
    pub drive_bay: u32,
    pub kind: DeviceKind,
}

/// Where drive location looks things up.
#[derive(Debug, Clone, Copy)]
pub struct LocateOptions<'a> {
    pub platform: AmdPlatform,
    /// Usually `/sys/bus/pci/slots`.
    pub slots_dir: &'a Path,
    pub max_depth: usize,
}

/// Resolve the drive behind `cntrl_path`.
pub fn locate(fs: &impl SysfsReader, opts: &LocateOptions<'_>, cntrl_path: &Path) -> Result<Drive> {
    let drive = match find_path(fs, cntrl_path, "nvme", opts.max_depth) {
        Some(nvme_dir) => {
            let port = nvme_port(fs, opts, &nvme_dir)?;
            Drive {
                port,
                drive_bay: 1 << (port - 1),
                kind: DeviceKind::Nvme,
            }
        }
        None => {
            let port = sata_port(cntrl_path)?;
            let mut shift = port - 1;
            // Each MG9098 handles 8 bays; later chips restart at bit 0.
            if shift >= BAYS_PER_CHIP {
                shift %= BAYS_PER_CHIP;
            }
            Drive {
                port,
                drive_bay: 1 << shift,
                kind: DeviceKind::Sata,
            }
        }
    };

    log::debug!(
        "AMD drive: port {}, bay {:#x}, {:?}",
        drive.port,
        drive.drive_bay,
        drive.kind
    );
    Ok(drive)
}

/// Physical NVMe bay for the PCI device directory holding the `nvme` marker.
fn nvme_port(fs: &impl SysfsReader, opts: &LocateOptions<'_>, nvme_dir: &Path) -> Result<u8> {
    let address = pci_slot_address(nvme_dir)?;

    let slots = fs.scan_dir(opts.slots_dir).map_err(|e| {
        LedError::NotFound(format!("cannot scan {}: {e}", opts.slots_dir.display()))
    })?;

    let slot = slots
        .iter()
        .find(|slot| fs.read_text(&slot.join("address")).as_deref() == Some(address))
        .ok_or_else(|| {
            log::info!("no PCI slot with address {address}");
            LedError::NotFound(format!("PCI slot for {address}"))
        })?;

    let raw = slot
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.parse::<i32>().ok())
        .ok_or_else(|| {
            LedError::InvalidTopology(format!("slot name {} is not a number", slot.display()))
        })?;

    validate_port(raw - opts.platform.nvme_port_offset(), "NVMe")
}

/// `0000:e3:00.0` -> `0000:e3:00`: the slot `address` attribute omits the function.
fn pci_slot_address(nvme_dir: &Path) -> Result<&str> {
    let name = nvme_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            LedError::InvalidTopology(format!("no PCI device in {}", nvme_dir.display()))
        })?;
    match name.split_once('.') {
        Some((addr, _)) => Ok(addr),
        None => {
            let e = LedError::InvalidTopology(format!("no PCI function in {name}"));
            log::error!("couldn't parse NVMe port address: {e}");
            Err(e)
        }
    }
}

/// Port number from the `ataNN/` component of a SATA controller path.
fn sata_port(cntrl_path: &Path) -> Result<u8> {
    let path = cntrl_path.to_string_lossy();
    let malformed = || {
        let e = LedError::InvalidTopology(format!("no ataNN/ component in {path}"));
        log::error!("could not retrieve port number: {e}");
        e
    };

    let start = path.find("ata").ok_or_else(malformed)? + "ata".len();
    let rest = &path[start..];
    if !rest.contains('/') {
        return Err(malformed());
    }
    let digits: &str = &rest[..rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len())];
    let raw: i32 = digits.parse().map_err(|_| malformed())?;

    validate_port(raw, "SATA")
}

fn validate_port(port: i32, kind: &str) -> Result<u8> {
    if !(1..=MAX_PORT).contains(&port) {
        log::error!("AMD IPMI: invalid {kind} physical port {port}");
        return Err(LedError::InvalidTopology(format!(
            "{kind} port {port} outside 1..={MAX_PORT}"
        )));
    }
    Ok(port as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::MAX_SCAN_DEPTH;
    use crate::sysfs::mock::MockSysfs;

    const SLOTS: &str = "/sys/bus/pci/slots";
    const NVME_CNTRL: &str = "/sys/devices/pci0000:e0/0000:e0:03.3";

    fn opts(platform: AmdPlatform) -> LocateOptions<'static> {
        LocateOptions {
            platform,
            slots_dir: Path::new(SLOTS),
            max_depth: MAX_SCAN_DEPTH,
        }
    }

    fn nvme_tree(slot: &str, address: &str) -> MockSysfs {
        let mut fs = MockSysfs::new();
        fs.add_file(format!("{SLOTS}/3/address"), "0000:41:00\n")
            .add_file(format!("{SLOTS}/{slot}/address"), &format!("{address}\n"))
            .add_dir(format!("{NVME_CNTRL}/0000:e3:00.0/nvme/nvme0"));
        fs
    }

    #[test]
    fn nvme_on_ethanol_applies_offset() {
        let fs = nvme_tree("19", "0000:e3:00");
        let drive = locate(&fs, &opts(AmdPlatform::EthanolX), Path::new(NVME_CNTRL)).unwrap();
        assert_eq!(drive.kind, DeviceKind::Nvme);
        assert_eq!(drive.port, 12);
        assert_eq!(drive.drive_bay, 1 << 11);
    }

    #[test]
    fn nvme_on_daytona_applies_offset() {
        let fs = nvme_tree("23", "0000:e3:00");
        let drive = locate(&fs, &opts(AmdPlatform::DaytonaX), Path::new(NVME_CNTRL)).unwrap();
        assert_eq!(drive.port, 21);
        assert_eq!(drive.drive_bay, 1 << 20);
    }

    #[test]
    fn nvme_without_offset() {
        let fs = nvme_tree("5", "0000:e3:00");
        let drive = locate(&fs, &opts(AmdPlatform::Other), Path::new(NVME_CNTRL)).unwrap();
        assert_eq!(drive.port, 5);
        assert_eq!(drive.drive_bay, 0x10);
    }

    #[test]
    fn nvme_bay_has_single_bit_for_every_port() {
        for slot in 8..=31 {
            let fs = nvme_tree(&slot.to_string(), "0000:e3:00");
            let drive = locate(&fs, &opts(AmdPlatform::EthanolX), Path::new(NVME_CNTRL)).unwrap();
            assert_eq!(drive.drive_bay.count_ones(), 1);
            assert_eq!(drive.drive_bay, 1 << (drive.port - 1));
        }
    }

    #[test]
    fn nvme_port_out_of_range_is_error() {
        // slot 7 - 7 = 0
        let fs = nvme_tree("7", "0000:e3:00");
        let err = locate(&fs, &opts(AmdPlatform::EthanolX), Path::new(NVME_CNTRL)).unwrap_err();
        assert!(matches!(err, LedError::InvalidTopology(_)));

        let fs = nvme_tree("32", "0000:e3:00");
        let err = locate(&fs, &opts(AmdPlatform::EthanolX), Path::new(NVME_CNTRL)).unwrap_err();
        assert!(matches!(err, LedError::InvalidTopology(_)));
    }

    #[test]
    fn nvme_without_matching_slot_is_not_found() {
        let fs = nvme_tree("19", "0000:e4:00");
        let err = locate(&fs, &opts(AmdPlatform::EthanolX), Path::new(NVME_CNTRL)).unwrap_err();
        assert!(matches!(err, LedError::NotFound(_)));
    }

    #[test]
    fn nvme_slot_name_must_be_numeric() {
        let fs = nvme_tree("slot14", "0000:e3:00");
        let err = locate(&fs, &opts(AmdPlatform::DaytonaX), Path::new(NVME_CNTRL)).unwrap_err();
        assert!(matches!(err, LedError::InvalidTopology(_)));
    }

    #[test]
    fn nvme_device_without_function_is_error() {
        let mut fs = MockSysfs::new();
        fs.add_file(format!("{SLOTS}/19/address"), "0000:e3:00\n")
            .add_dir(format!("{NVME_CNTRL}/0000:e3:00/nvme/nvme0"));
        let err = locate(&fs, &opts(AmdPlatform::EthanolX), Path::new(NVME_CNTRL)).unwrap_err();
        assert!(matches!(err, LedError::InvalidTopology(_)));
        // Rejected before the slot directory is consulted.
        assert!(!fs.scans.borrow().contains(&Path::new(SLOTS).to_path_buf()));
    }

    #[test]
    fn sata_port_from_path() {
        let fs = MockSysfs::new();
        let cntrl = "/sys/devices/pci0000:e0/0000:e0:03.3/0000:e3:00.0/ata5/host4/target4:0:0";
        let drive = locate(&fs, &opts(AmdPlatform::EthanolX), Path::new(cntrl)).unwrap();
        assert_eq!(drive.kind, DeviceKind::Sata);
        assert_eq!(drive.port, 5);
        assert_eq!(drive.drive_bay, 0x10);
    }

    #[test]
    fn sata_bay_is_relative_to_chip() {
        let fs = MockSysfs::new();
        for port in 1..=24u8 {
            let cntrl = format!("/sys/devices/pci0000:00/0000:00:08.1/ata{port}/host0");
            let drive = locate(&fs, &opts(AmdPlatform::DaytonaX), Path::new(&cntrl)).unwrap();
            assert_eq!(drive.port, port);
            assert_eq!(drive.drive_bay, 1 << ((port - 1) % 8));
        }
    }

    #[test]
    fn sata_ignores_platform_offset() {
        let fs = MockSysfs::new();
        let cntrl = "/sys/devices/pci0000:00/ata12/host11";
        let drive = locate(&fs, &opts(AmdPlatform::EthanolX), Path::new(cntrl)).unwrap();
        assert_eq!(drive.port, 12);
        assert_eq!(drive.drive_bay, 1 << 3);
    }

    #[test]
    fn sata_out_of_range_is_error() {
        let fs = MockSysfs::new();
        for cntrl in ["/sys/devices/ata0/host0", "/sys/devices/ata25/host0"] {
            let err = locate(&fs, &opts(AmdPlatform::Other), Path::new(cntrl)).unwrap_err();
            assert!(matches!(err, LedError::InvalidTopology(_)), "{cntrl}");
        }
    }

    #[test]
    fn malformed_sata_paths_are_errors() {
        let fs = MockSysfs::new();
        for cntrl in [
            "/sys/devices/pci0000:00/host0",
            "/sys/devices/pci0000:00/ata5",
            "/sys/devices/pci0000:00/ataX/host0",
        ] {
            let err = locate(&fs, &opts(AmdPlatform::Other), Path::new(cntrl)).unwrap_err();
            assert!(matches!(err, LedError::InvalidTopology(_)), "{cntrl}");
        }
    }
}
