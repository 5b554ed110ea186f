//! amdled: drive bay LED control for AMD server platforms.
//!
//! Requests arrive as IBPI patterns and leave either through the SGPIO
//! sideband or as MG9098 register updates sent through the BMC.

pub mod config;
pub mod controller;
pub mod device;
pub mod dispatch;
pub mod drive;
pub mod error;
pub mod ibpi;
pub mod ipmi;
pub mod path;
pub mod platform;
pub mod sideband;
pub mod sysfs;

pub use controller::AmdLed;
pub use error::{LedError, Result};
pub use ibpi::IbpiPattern;
