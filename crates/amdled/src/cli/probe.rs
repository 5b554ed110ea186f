//! `probe` subcommand: check whether the selected LED interface is usable.

use std::path::Path;

use super::{Config, LedInterface, ProbeOutput, Result, host_controller, kv, kv_width, print_json};

pub(super) fn cmd_probe(config: Config, path: &Path, json: bool) -> Result<()> {
    let led = host_controller(config);
    let selection = led.selection();
    let enabled = led.interface_enabled(path);

    if json {
        return print_json(&ProbeOutput {
            path: path.display().to_string(),
            interface: selection.interface,
            platform: selection.platform,
            enabled,
        });
    }

    let w = kv_width(&["Interface:", "Platform:", "Enabled:"], &[]);
    kv("Interface:", selection.interface, w);
    kv("Platform:", selection.platform, w);
    let status = match (enabled, selection.interface) {
        (true, _) => "yes",
        (false, LedInterface::Ipmi) => "no (MG9098 not found behind BMC)",
        (false, LedInterface::Sgpio) => "no (enclosure management unavailable)",
        (false, LedInterface::Unset) => "no (no interface selected)",
    };
    kv("Enabled:", status, w);
    Ok(())
}
