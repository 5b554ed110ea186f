//! `platform` subcommand: show the detected platform and LED interface.

use super::{Config, PlatformOutput, Result, host_controller, ipmi, kv, kv_width, print_json};

pub(super) fn cmd_platform(config: &Config, json: bool) -> Result<()> {
    let led = host_controller(config.clone());
    let product_name = led.product_name();
    let selection = led.selection();
    let channel = ipmi::channel_for(selection.platform).ok();

    if json {
        return print_json(&PlatformOutput {
            product_name,
            interface: selection.interface,
            platform: selection.platform,
            channel,
            nvme_port_offset: selection.platform.nvme_port_offset(),
        });
    }

    let w = kv_width(
        &["Product:", "Interface:", "Platform:", "IPMI channel:", "NVMe offset:"],
        &[],
    );
    let source = if config.product_name_override().is_some() {
        " (config)"
    } else {
        ""
    };
    match product_name {
        Some(name) => kv("Product:", format_args!("{name}{source}"), w),
        None => kv("Product:", "(unreadable)", w),
    }
    kv("Interface:", selection.interface, w);
    kv("Platform:", selection.platform, w);
    kv("IPMI channel:", super::hex_or_none(channel), w);
    kv("NVMe offset:", selection.platform.nvme_port_offset(), w);
    Ok(())
}
