//! Unified error type for the amdled-lib crate.
//!
//! [`LedError`] covers every way an LED request can fail, from a missing
//! sysfs marker to a BMC that refuses a command. `From` impls let `?`
//! carry transport and I/O errors across module boundaries.

use std::fmt;

use crate::ibpi::IbpiPattern;
use crate::ipmi::TransportError;
use crate::platform::AmdPlatform;

// errno values reported to the daemon through `LedError::code`.
const EIO: i32 = 5;
const ENODEV: i32 = 19;
const EINVAL: i32 = 22;
const ENOTSUP: i32 = 95;

/// Unified error type for amdled-lib operations.
#[derive(Debug)]
pub enum LedError {
    /// Marker file, PCI slot or LED file is absent. The caller skips the device.
    NotFound(String),
    /// Port out of range or controller path of an unexpected shape.
    InvalidTopology(String),
    /// No IPMI channel/slave address mapping for this platform.
    UnsupportedPlatform(AmdPlatform),
    /// The management-controller command primitive failed.
    Transport(TransportError),
    /// The selected backend does not implement the operation.
    NotSupported(String),
    /// Pattern has no LED register on this hardware.
    UnmappedPattern(IbpiPattern),
    /// Standard I/O error (config file access).
    Io(std::io::Error),
    /// Configuration validation error.
    Config(String),
}

impl LedError {
    /// Negative errno-style status for C-style callers.
    pub fn code(&self) -> i32 {
        let errno = match self {
            LedError::NotFound(_) | LedError::UnsupportedPlatform(_) => ENODEV,
            LedError::InvalidTopology(_) | LedError::UnmappedPattern(_) => EINVAL,
            LedError::Config(_) => EINVAL,
            LedError::Transport(_) => EIO,
            LedError::Io(e) => e.raw_os_error().unwrap_or(EIO),
            LedError::NotSupported(_) => ENOTSUP,
        };
        -errno
    }
}

impl fmt::Display for LedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedError::NotFound(e) => write!(f, "Not found: {e}"),
            LedError::InvalidTopology(e) => write!(f, "Invalid topology: {e}"),
            LedError::UnsupportedPlatform(p) => {
                write!(f, "Unsupported platform: {p} has no IPMI mapping")
            }
            LedError::Transport(e) => write!(f, "{e}"),
            LedError::NotSupported(e) => write!(f, "Operation not supported: {e}"),
            LedError::UnmappedPattern(p) => write!(f, "No LED register for pattern {p}"),
            LedError::Io(e) => write!(f, "I/O error: {e}"),
            LedError::Config(e) => write!(f, "Config error: {e}"),
        }
    }
}

impl std::error::Error for LedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedError::Transport(e) => Some(e),
            LedError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for LedError {
    fn from(e: TransportError) -> Self {
        LedError::Transport(e)
    }
}

impl From<std::io::Error> for LedError {
    fn from(e: std::io::Error) -> Self {
        LedError::Io(e)
    }
}

/// Crate-level Result alias using [`LedError`].
pub type Result<T> = std::result::Result<T, LedError>;
