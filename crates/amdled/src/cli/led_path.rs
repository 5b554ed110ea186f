//! `path` subcommand: resolve where a controller's LEDs are addressed.

use std::path::{Path, PathBuf};

use super::{
    BlockDevice, Config, LedError, PathOutput, Result, host_controller, kv, kv_width, print_json,
};

pub(super) fn cmd_path(
    config: Config,
    cntrl_path: &Path,
    sysfs_path: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let led = host_controller(config);
    let interface = led.selection().interface;

    let resolved = match sysfs_path {
        Some(sysfs_path) => led.led_path(&BlockDevice::new(cntrl_path.to_path_buf(), sysfs_path)),
        None => led.resolve_led_file_path(cntrl_path),
    };

    if json {
        return print_json(&PathOutput {
            cntrl_path: cntrl_path.display().to_string(),
            interface,
            led_path: resolved.as_ref().map(|p| p.display().to_string()),
        });
    }

    let Some(resolved) = resolved else {
        return Err(LedError::NotFound(format!(
            "no LED path below {}",
            cntrl_path.display()
        )));
    };
    let w = kv_width(&["Interface:", "LED path:"], &[]);
    kv("Interface:", interface, w);
    kv("LED path:", resolved.display(), w);
    Ok(())
}
