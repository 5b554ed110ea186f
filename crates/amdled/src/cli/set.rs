//! `set` subcommand: drive one drive's LEDs to an IBPI pattern.

use std::path::PathBuf;

use super::{BlockDevice, Config, IbpiPattern, Result, host_controller};

pub(super) fn cmd_set(
    config: Config,
    cntrl_path: PathBuf,
    sysfs_path: Option<PathBuf>,
    pattern: IbpiPattern,
    previous: IbpiPattern,
) -> Result<()> {
    let led = host_controller(config);
    let device =
        BlockDevice::new(cntrl_path, sysfs_path.unwrap_or_default()).with_previous(previous);
    // Unchanged patterns are skipped by the controller without touching hardware.
    led.write_pattern(&device, pattern)?;
    println!("{pattern} applied to {}", device.cntrl_path.display());
    Ok(())
}
