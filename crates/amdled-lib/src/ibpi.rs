//! IBPI patterns: abstract drive indicator states requested by the daemon.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Drive indicator pattern (IBPI, SFF-8489).
///
/// The set is owned by the monitoring daemon; this crate only maps the
/// subset it can express onto MG9098 registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IbpiPattern {
    #[default]
    Unknown,
    Normal,
    OneshotNormal,
    Degraded,
    Rebuild,
    FailedArray,
    Hotspare,
    Pfa,
    FailedDrive,
    Locate,
    LocateOff,
    Added,
    Removed,
}

impl IbpiPattern {
    pub const ALL: [IbpiPattern; 13] = [
        IbpiPattern::Unknown,
        IbpiPattern::Normal,
        IbpiPattern::OneshotNormal,
        IbpiPattern::Degraded,
        IbpiPattern::Rebuild,
        IbpiPattern::FailedArray,
        IbpiPattern::Hotspare,
        IbpiPattern::Pfa,
        IbpiPattern::FailedDrive,
        IbpiPattern::Locate,
        IbpiPattern::LocateOff,
        IbpiPattern::Added,
        IbpiPattern::Removed,
    ];

    /// Canonical kebab-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            IbpiPattern::Unknown => "unknown",
            IbpiPattern::Normal => "normal",
            IbpiPattern::OneshotNormal => "oneshot-normal",
            IbpiPattern::Degraded => "degraded",
            IbpiPattern::Rebuild => "rebuild",
            IbpiPattern::FailedArray => "failed-array",
            IbpiPattern::Hotspare => "hotspare",
            IbpiPattern::Pfa => "pfa",
            IbpiPattern::FailedDrive => "failed-drive",
            IbpiPattern::Locate => "locate",
            IbpiPattern::LocateOff => "locate-off",
            IbpiPattern::Added => "added",
            IbpiPattern::Removed => "removed",
        }
    }
}

impl fmt::Display for IbpiPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IbpiPattern {
    type Err = String;

    /// Case-insensitive; `_` and `-` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        IbpiPattern::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| format!("unknown IBPI pattern: {s}"))
    }
}
