//! `locate` subcommand: resolve the drive bay behind a controller path.

use std::path::Path;

use super::{
    Config, LocateOutput, Result, hex_or_none, host_controller, ipmi, kv, kv_width, print_json,
};

pub(super) fn cmd_locate(config: Config, cntrl_path: &Path, json: bool) -> Result<()> {
    let led = host_controller(config);
    let platform = led.selection().platform;
    let drive = led.locate(cntrl_path)?;

    // Addressing is only defined on IPMI platforms; report it when known.
    let channel = ipmi::channel_for(platform).ok();
    let slave_address = ipmi::slave_address_for(platform, Some(&drive)).ok();
    let register_mask = slave_address.and_then(|slave| ipmi::bay_mask(slave, &drive).ok());

    if json {
        return print_json(&LocateOutput {
            cntrl_path: cntrl_path.display().to_string(),
            platform,
            drive,
            channel,
            slave_address,
            register_mask,
        });
    }

    let w = kv_width(
        &[
            "Controller:",
            "Platform:",
            "Kind:",
            "Port:",
            "Drive bay:",
            "Channel:",
            "Slave address:",
            "Register mask:",
        ],
        &[],
    );
    kv("Controller:", cntrl_path.display(), w);
    kv("Platform:", platform, w);
    kv("Kind:", format_args!("{:?}", drive.kind), w);
    kv("Port:", drive.port, w);
    kv("Drive bay:", format_args!("{:#x}", drive.drive_bay), w);
    kv("Channel:", hex_or_none(channel), w);
    kv("Slave address:", hex_or_none(slave_address), w);
    kv("Register mask:", hex_or_none(register_mask), w);
    Ok(())
}
