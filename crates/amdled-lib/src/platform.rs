//! Platform identity: which LED interface a board uses and which board it is.
//!
//! The DMI product name is matched against a short table of known AMD
//! reference platforms. Anything unrecognized (or unreadable) falls back to
//! the SGPIO sideband, which is what the majority of AMD boards wire up.

use std::fmt;

use serde::Serialize;

/// LED control interface in use on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedInterface {
    Unset,
    /// GPIO-style sideband driven through the AHCI enclosure buffer.
    Sgpio,
    /// Out-of-band access to MG9098 chips through the BMC.
    Ipmi,
}

impl fmt::Display for LedInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedInterface::Unset => write!(f, "unset"),
            LedInterface::Sgpio => write!(f, "SGPIO"),
            LedInterface::Ipmi => write!(f, "IPMI"),
        }
    }
}

/// AMD reference platform model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmdPlatform {
    EthanolX,
    DaytonaX,
    /// Any board without IPMI register mappings.
    Other,
}

impl AmdPlatform {
    /// Amount subtracted from a PCI slot number to get the physical NVMe bay.
    ///
    /// The BIOS numbers hotplug slots from a platform-specific base.
    pub fn nvme_port_offset(self) -> i32 {
        match self {
            AmdPlatform::EthanolX => 7,
            AmdPlatform::DaytonaX => 2,
            AmdPlatform::Other => 0,
        }
    }
}

impl fmt::Display for AmdPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmdPlatform::EthanolX => write!(f, "Ethanol-X"),
            AmdPlatform::DaytonaX => write!(f, "Daytona-X"),
            AmdPlatform::Other => write!(f, "unknown AMD platform"),
        }
    }
}

/// The interface + model pair chosen for the lifetime of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformSelection {
    pub interface: LedInterface,
    pub platform: AmdPlatform,
}

impl PlatformSelection {
    pub const SGPIO_DEFAULT: PlatformSelection = PlatformSelection {
        interface: LedInterface::Sgpio,
        platform: AmdPlatform::Other,
    };
}

/// Known DMI product name prefixes.
///
/// Matching compares exactly `prefix.len()` bytes, so trailing revision
/// suffixes in the product name are ignored.
pub const KNOWN_PLATFORMS: &[(&str, PlatformSelection)] = &[
    (
        "ETHANOL_X",
        PlatformSelection {
            interface: LedInterface::Ipmi,
            platform: AmdPlatform::EthanolX,
        },
    ),
    (
        "DAYTONA_X",
        PlatformSelection {
            interface: LedInterface::Ipmi,
            platform: AmdPlatform::DaytonaX,
        },
    ),
    ("GRANDSTAND", PlatformSelection::SGPIO_DEFAULT),
    ("Speedway", PlatformSelection::SGPIO_DEFAULT),
];

/// Classify a DMI product name. `None` means the name could not be read.
pub fn classify(product_name: Option<&str>) -> PlatformSelection {
    let Some(name) = product_name else {
        log::info!("no DMI product name, assuming SGPIO interface");
        return PlatformSelection::SGPIO_DEFAULT;
    };

    KNOWN_PLATFORMS
        .iter()
        .find(|(prefix, _)| name.as_bytes().starts_with(prefix.as_bytes()))
        .map(|&(_, sel)| sel)
        .unwrap_or_else(|| {
            log::info!("unrecognized AMD platform {name:?}, defaulting to SGPIO");
            PlatformSelection::SGPIO_DEFAULT
        })
}
