//! CLI subcommands: platform detection, drive location, LED control.

mod config_cmd;
mod led_path;
mod locate;
mod platform;
mod probe;
mod set;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use amdled_lib::AmdLed;
pub(super) use amdled_lib::config::Config;
pub(super) use amdled_lib::device::BlockDevice;
pub(super) use amdled_lib::drive::Drive;
pub(super) use amdled_lib::error::{LedError, Result};
pub(super) use amdled_lib::ibpi::IbpiPattern;
pub(super) use amdled_lib::ipmi::{self, IpmitoolTransport};
pub(super) use amdled_lib::platform::{AmdPlatform, LedInterface};
pub(super) use amdled_lib::sideband::Unavailable;
pub(super) use amdled_lib::sysfs::HostFs;

/// Controller wired to the real system.
pub(super) type HostLed = AmdLed<HostFs, IpmitoolTransport, Unavailable>;

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{key:<width$}{value}", width = w);
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// Print `value` as pretty JSON.
pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| LedError::Io(std::io::Error::other(e)))?;
    println!("{text}");
    Ok(())
}

pub(super) fn hex_or_none(value: Option<u8>) -> String {
    value.map_or_else(|| "(none)".to_string(), |v| format!("{v:#04x}"))
}

/// Read the config from `custom_path` or the default location, logging
/// parse warnings. Not validated.
pub(super) fn read_config(custom_path: Option<&Path>) -> Config {
    let (config, warnings) = match custom_path {
        Some(p) => Config::load_from(p),
        None => Config::load_with_warnings(),
    };
    for w in &warnings {
        log::warn!("{w}");
    }
    config
}

/// Read and validate the config.
pub(super) fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = read_config(custom_path);
    config.validate().map_err(|errors| {
        let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        LedError::Config(msgs.join("; "))
    })?;
    Ok(config)
}

pub(super) fn host_controller(config: Config) -> HostLed {
    let transport = config.ipmitool_transport();
    AmdLed::new(HostFs, transport, Unavailable, config)
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct PlatformOutput {
    pub product_name: Option<String>,
    pub interface: LedInterface,
    pub platform: AmdPlatform,
    pub channel: Option<u8>,
    pub nvme_port_offset: i32,
}

#[derive(Serialize)]
pub(super) struct LocateOutput {
    pub cntrl_path: String,
    pub platform: AmdPlatform,
    pub drive: Drive,
    pub channel: Option<u8>,
    pub slave_address: Option<u8>,
    pub register_mask: Option<u8>,
}

#[derive(Serialize)]
pub(super) struct PathOutput {
    pub cntrl_path: String,
    pub interface: LedInterface,
    pub led_path: Option<String>,
}

#[derive(Serialize)]
pub(super) struct ProbeOutput {
    pub path: String,
    pub interface: LedInterface,
    pub platform: AmdPlatform,
    pub enabled: bool,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
    pub errors: Vec<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the detected platform and LED interface
    Platform,

    /// Resolve the drive bay behind a controller path
    Locate {
        /// Controller path in sysfs
        cntrl_path: PathBuf,
    },

    /// Resolve the LED file / key path for a controller
    Path {
        /// Controller path in sysfs
        cntrl_path: PathBuf,
        /// Block device sysfs path; routes by interface when given
        #[arg(long)]
        sysfs_path: Option<PathBuf>,
    },

    /// Check whether the LED interface is usable
    Probe {
        /// Controller path handed to the SGPIO backend
        #[arg(default_value = "/sys/devices")]
        path: PathBuf,
    },

    /// Set an IBPI pattern on a drive
    Set {
        /// Controller path in sysfs
        cntrl_path: PathBuf,
        /// Pattern: normal, locate, locate-off, pfa, failed-drive, failed-array, rebuild, hotspare
        pattern: IbpiPattern,
        /// Block device sysfs path (used by the SGPIO backend)
        #[arg(long)]
        sysfs_path: Option<PathBuf>,
        /// Pattern currently applied; an identical request is skipped
        #[arg(long, default_value = "unknown")]
        previous: IbpiPattern,
    },

    /// Show current configuration and file paths
    Config,
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, json: bool, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        Command::Config => config_cmd::cmd_config(json, config_path),
        Command::Platform => platform::cmd_platform(&load_config(config_path)?, json),
        Command::Locate { cntrl_path } => {
            locate::cmd_locate(load_config(config_path)?, &cntrl_path, json)
        }
        Command::Path {
            cntrl_path,
            sysfs_path,
        } => led_path::cmd_path(load_config(config_path)?, &cntrl_path, sysfs_path, json),
        Command::Probe { path } => probe::cmd_probe(load_config(config_path)?, &path, json),
        Command::Set {
            cntrl_path,
            pattern,
            sysfs_path,
            previous,
        } => {
            if json {
                warn_json_unsupported("set");
            }
            set::cmd_set(
                load_config(config_path)?,
                cntrl_path,
                sysfs_path,
                pattern,
                previous,
            )
        }
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn kv_width_top_only() {
        let w = kv_width(&["Short:", "Longer key:"], &[]);
        // "Longer key:" = 11 + PADDING = 13
        assert_eq!(w, 13);
    }

    #[test]
    fn kv_width_indent_drives_width() {
        let w = kv_width(&["A:"], &["Very long indent key:"]);
        // 21 + PADDING + 2
        assert_eq!(w, 25);
    }

    #[test]
    fn kv_width_empty() {
        assert_eq!(kv_width(&[], &[]), 0);
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(hex_or_none(Some(0x0d)), "0x0d");
        assert_eq!(hex_or_none(None), "(none)");
    }

    #[test]
    fn load_config_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_scan_depth = 0\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("max_scan_depth"));
    }

    #[test]
    fn load_config_missing_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("none.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }
}

#[cfg(test)]
mod json_struct_tests {
    use super::*;
    use amdled_lib::drive::DeviceKind;

    #[test]
    fn locate_output_shape() {
        let output = LocateOutput {
            cntrl_path: "/sys/devices/pci0000:00/ata5/host4".into(),
            platform: AmdPlatform::EthanolX,
            drive: Drive {
                port: 5,
                drive_bay: 0x10,
                kind: DeviceKind::Sata,
            },
            channel: Some(0x0d),
            slave_address: Some(0xc0),
            register_mask: Some(0x10),
        };
        let v: serde_json::Value = serde_json::to_value(&output).unwrap();
        assert_eq!(v["platform"], "ethanol_x");
        assert_eq!(v["drive"]["port"], 5);
        assert_eq!(v["drive"]["drive_bay"], 16);
        assert_eq!(v["drive"]["kind"], "sata");
        assert_eq!(v["channel"], 13);
        assert_eq!(v["slave_address"], 192);
    }

    #[test]
    fn platform_output_without_channel() {
        let output = PlatformOutput {
            product_name: None,
            interface: LedInterface::Sgpio,
            platform: AmdPlatform::Other,
            channel: None,
            nvme_port_offset: 0,
        };
        let v: serde_json::Value = serde_json::to_value(&output).unwrap();
        assert_eq!(v["interface"], "sgpio");
        assert_eq!(v["platform"], "other");
        assert!(v["product_name"].is_null());
        assert!(v["channel"].is_null());
    }

    #[test]
    fn config_output_embeds_settings() {
        let output = ConfigOutput {
            config_file: Some("/tmp/config.toml".into()),
            config_file_exists: false,
            settings: Config::default(),
            errors: vec![],
        };
        let v: serde_json::Value = serde_json::to_value(&output).unwrap();
        assert_eq!(v["settings"]["ipmi"]["tool"], "ipmitool");
        assert_eq!(v["settings"]["max_scan_depth"], 32);
        assert_eq!(v["errors"].as_array().unwrap().len(), 0);
    }
}
