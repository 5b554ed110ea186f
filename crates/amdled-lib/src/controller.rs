//! LED controller: picks SGPIO or IPMI once and routes every request.
//!
//! [`AmdLed`] owns the collaborators (sysfs reader, IPMI transport, sideband
//! backend) and the platform selection, which is made on first use and kept
//! for the controller's lifetime.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::device::BlockDevice;
use crate::dispatch::{self, Target};
use crate::drive::{self, Drive, LocateOptions};
use crate::error::{LedError, Result};
use crate::ibpi::IbpiPattern;
use crate::ipmi::{self, IpmiTransport};
use crate::path::find_path;
use crate::platform::{self, LedInterface, PlatformSelection};
use crate::sideband::SidebandBackend;
use crate::sysfs::SysfsReader;

/// Marker of the SGPIO enclosure-management buffer.
pub const EM_BUFFER: &str = "em_buffer";

pub struct AmdLed<F, T, S> {
    fs: F,
    transport: T,
    sideband: S,
    config: Config,
    selection: OnceCell<PlatformSelection>,
}

impl<F: SysfsReader, T: IpmiTransport, S: SidebandBackend> AmdLed<F, T, S> {
    pub fn new(fs: F, transport: T, sideband: S, config: Config) -> Self {
        AmdLed {
            fs,
            transport,
            sideband,
            config,
            selection: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sideband(&self) -> &S {
        &self.sideband
    }

    /// The product name this controller classifies, if any.
    pub fn product_name(&self) -> Option<String> {
        match self.config.product_name_override() {
            Some(name) => Some(name.to_string()),
            None => self.fs.read_text(&self.config.sysfs.dmi_product_name),
        }
    }

    /// Interface and platform, detected on the first call only.
    pub fn selection(&self) -> PlatformSelection {
        *self.selection.get_or_init(|| {
            let selection = platform::classify(self.product_name().as_deref());
            log::info!(
                "AMD LED interface: {} ({})",
                selection.interface,
                selection.platform
            );
            selection
        })
    }

    /// True if the selected interface can drive LEDs for the controller at `path`.
    pub fn interface_enabled(&self, path: &Path) -> bool {
        let selection = self.selection();
        match selection.interface {
            LedInterface::Sgpio => self.sideband.em_enabled(path),
            LedInterface::Ipmi => ipmi::enablement_probe(&self.transport, selection.platform),
            LedInterface::Unset => {
                log::info!("unknown AMD platform");
                false
            }
        }
    }

    /// Drive `device`'s LEDs to `pattern`. A request for the pattern already
    /// applied succeeds without touching hardware.
    pub fn write_pattern(&self, device: &BlockDevice, pattern: IbpiPattern) -> Result<()> {
        if pattern == device.ibpi_prev {
            return Ok(());
        }

        let selection = self.selection();
        match selection.interface {
            LedInterface::Sgpio => self.sideband.write(device, pattern),
            LedInterface::Ipmi => {
                log::info!("setting {pattern} on {}", device.cntrl_path.display());
                let drive = self.locate(&device.cntrl_path)?;
                let target = Target {
                    transport: &self.transport,
                    platform: selection.platform,
                    drive: &drive,
                };
                dispatch::apply_pattern(&target, pattern)
            }
            LedInterface::Unset => Err(LedError::NotSupported(
                "no LED interface selected".into(),
            )),
        }
    }

    /// Locate the drive behind `cntrl_path` on this platform.
    pub fn locate(&self, cntrl_path: &Path) -> Result<Drive> {
        let opts = LocateOptions {
            platform: self.selection().platform,
            slots_dir: &self.config.sysfs.pci_slots,
            max_depth: self.config.max_scan_depth,
        };
        drive::locate(&self.fs, &opts, cntrl_path)
    }

    /// Path of the SGPIO `em_buffer` file below `cntrl_path`.
    pub fn resolve_led_file_path(&self, cntrl_path: &Path) -> Option<PathBuf> {
        match find_path(&self.fs, cntrl_path, EM_BUFFER, self.config.max_scan_depth) {
            Some(dir) => Some(dir.join(EM_BUFFER)),
            None => {
                log::error!("couldn't find EM buffer for {}", cntrl_path.display());
                None
            }
        }
    }

    /// Path the daemon should associate with `device`'s LEDs on the
    /// selected interface.
    ///
    /// SGPIO uses the `em_buffer` file. IPMI has no LED file: NVMe drives are
    /// keyed by their own sysfs path and SATA drives by the controller path up
    /// to and including the `ataNN/` component.
    pub fn led_path(&self, device: &BlockDevice) -> Option<PathBuf> {
        match self.selection().interface {
            LedInterface::Ipmi => ipmi_led_path(device),
            _ => self.resolve_led_file_path(&device.cntrl_path),
        }
    }
}

fn ipmi_led_path(device: &BlockDevice) -> Option<PathBuf> {
    let cntrl = device.cntrl_path.to_string_lossy();
    if cntrl.contains("nvme") {
        return Some(device.sysfs_path.clone());
    }

    let ata = cntrl.find("ata")?;
    let Some(slash) = cntrl[ata..].find('/') else {
        log::error!("no ataNN/ component in {cntrl}");
        return None;
    };
    Some(PathBuf::from(&cntrl[..=ata + slash]))
}
