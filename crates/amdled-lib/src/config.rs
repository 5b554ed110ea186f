//! Configuration: TOML file with sysfs locations and IPMI transport settings.
//!
//! Every field has a default, so an absent or partial file is fine. The
//! defaults describe a stock Linux host.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ipmi::IpmitoolTransport;
use crate::path::MAX_SCAN_DEPTH;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Force the DMI product name instead of reading it. Empty = read from sysfs.
    #[serde(default)]
    pub product_name: String,

    /// Depth bound for marker searches below a controller path.
    #[serde(default = "default_max_scan_depth")]
    pub max_scan_depth: usize,

    #[serde(default)]
    pub sysfs: SysfsPaths,

    #[serde(default)]
    pub ipmi: IpmiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SysfsPaths {
    #[serde(default = "default_dmi_product_name")]
    pub dmi_product_name: PathBuf,

    /// PCI hotplug slot directory; each slot has an `address` attribute.
    #[serde(default = "default_pci_slots")]
    pub pci_slots: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpmiConfig {
    /// Program used for raw IPMI requests.
    #[serde(default = "default_ipmi_tool")]
    pub tool: String,

    /// ipmitool `-I` interface. Empty = ipmitool's default.
    #[serde(default)]
    pub interface: String,
}

fn default_max_scan_depth() -> usize {
    MAX_SCAN_DEPTH
}
fn default_dmi_product_name() -> PathBuf {
    PathBuf::from("/sys/class/dmi/id/product_name")
}
fn default_pci_slots() -> PathBuf {
    PathBuf::from("/sys/bus/pci/slots")
}
fn default_ipmi_tool() -> String {
    "ipmitool".into()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            product_name: String::new(),
            max_scan_depth: default_max_scan_depth(),
            sysfs: SysfsPaths::default(),
            ipmi: IpmiConfig::default(),
        }
    }
}

impl Default for SysfsPaths {
    fn default() -> Self {
        SysfsPaths {
            dmi_product_name: default_dmi_product_name(),
            pci_slots: default_pci_slots(),
        }
    }
}

impl Default for IpmiConfig {
    fn default() -> Self {
        IpmiConfig {
            tool: default_ipmi_tool(),
            interface: String::new(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// `max_scan_depth` is zero, so no subdirectory would ever be searched.
    ZeroScanDepth,
    /// A sysfs path is not absolute.
    RelativePath { field: &'static str, path: PathBuf },
    /// `ipmi.tool` is empty or whitespace-only.
    EmptyIpmiTool,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ZeroScanDepth => write!(f, "max_scan_depth must be at least 1"),
            ValidationError::RelativePath { field, path } => {
                write!(f, "{field} must be absolute: {}", path.display())
            }
            ValidationError::EmptyIpmiTool => write!(f, "ipmi.tool cannot be empty"),
        }
    }
}

impl Config {
    /// Per-user config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("amdled"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Product name override, if one is set.
    pub fn product_name_override(&self) -> Option<&str> {
        let name = self.product_name.trim();
        (!name.is_empty()).then_some(name)
    }

    /// IPMI transport described by the `[ipmi]` table.
    pub fn ipmitool_transport(&self) -> IpmitoolTransport {
        let interface = self.ipmi.interface.trim();
        IpmitoolTransport {
            program: self.ipmi.tool.trim().to_string(),
            interface: (!interface.is_empty()).then(|| interface.to_string()),
        }
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.max_scan_depth == 0 {
            errors.push(ValidationError::ZeroScanDepth);
        }
        for (field, path) in [
            ("sysfs.dmi_product_name", &self.sysfs.dmi_product_name),
            ("sysfs.pci_slots", &self.sysfs.pci_slots),
        ] {
            if !path.is_absolute() {
                errors.push(ValidationError::RelativePath {
                    field,
                    path: path.clone(),
                });
            }
        }
        if self.ipmi.tool.trim().is_empty() {
            errors.push(ValidationError::EmptyIpmiTool);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
