//! `config` subcommand: show current configuration and file paths.

use std::path::Path;

use super::{Config, ConfigOutput, Result, kv, kv_indent, kv_width, print_json};

pub(super) fn cmd_config(json: bool, custom_path: Option<&Path>) -> Result<()> {
    let config = super::read_config(custom_path);
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let errors: Vec<String> = match config.validate() {
        Ok(()) => vec![],
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    };

    if json {
        return print_json(&ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
            errors,
        });
    }

    let w = kv_width(
        &["Config file:"],
        &[
            "product_name:",
            "max_scan_depth:",
            "sysfs.dmi_product_name:",
            "sysfs.pci_slots:",
            "ipmi.tool:",
            "ipmi.interface:",
        ],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    kv_indent(
        "product_name:",
        config.product_name_override().unwrap_or("(read from DMI)"),
        w,
    );
    kv_indent("max_scan_depth:", config.max_scan_depth, w);
    kv_indent(
        "sysfs.dmi_product_name:",
        config.sysfs.dmi_product_name.display(),
        w,
    );
    kv_indent("sysfs.pci_slots:", config.sysfs.pci_slots.display(), w);
    kv_indent("ipmi.tool:", &config.ipmi.tool, w);
    let interface = config.ipmi.interface.trim();
    kv_indent(
        "ipmi.interface:",
        if interface.is_empty() { "(default)" } else { interface },
        w,
    );

    if !errors.is_empty() {
        println!();
        println!("Problems:");
        for e in &errors {
            println!("  {e}");
        }
    }
    Ok(())
}
