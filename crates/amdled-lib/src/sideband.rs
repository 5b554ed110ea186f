//! SGPIO sideband seam.
//!
//! The sideband backend itself (AHCI enclosure message buffer writes) lives
//! with the daemon; this crate only routes to it.

use std::path::Path;

use crate::device::BlockDevice;
use crate::error::{LedError, Result};
use crate::ibpi::IbpiPattern;

/// GPIO-style LED interface reached through the controller's `em_buffer`.
pub trait SidebandBackend {
    /// True if enclosure management is usable on the controller at `path`.
    fn em_enabled(&self, path: &Path) -> bool;

    /// Drive `device`'s LEDs to `pattern`.
    fn write(&self, device: &BlockDevice, pattern: IbpiPattern) -> Result<()>;
}

/// Stand-in for builds without an SGPIO backend: never enabled, never writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unavailable;

impl SidebandBackend for Unavailable {
    fn em_enabled(&self, path: &Path) -> bool {
        log::info!("SGPIO backend not available for {}", path.display());
        false
    }

    fn write(&self, _device: &BlockDevice, pattern: IbpiPattern) -> Result<()> {
        Err(LedError::NotSupported(format!(
            "SGPIO backend not available (pattern {pattern})"
        )))
    }
}

// ── Mock sideband for testing ──

/// Recording sideband backend for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;

    #[derive(Default)]
    pub struct MockSideband {
        pub enabled: Cell<bool>,
        /// Paths passed to `em_enabled`.
        pub probes: RefCell<Vec<PathBuf>>,
        /// `(sysfs path, pattern)` of every write.
        pub writes: RefCell<Vec<(PathBuf, IbpiPattern)>>,
    }

    impl MockSideband {
        pub fn new(enabled: bool) -> Self {
            MockSideband {
                enabled: Cell::new(enabled),
                ..Default::default()
            }
        }
    }

    impl SidebandBackend for MockSideband {
        fn em_enabled(&self, path: &Path) -> bool {
            self.probes.borrow_mut().push(path.to_path_buf());
            self.enabled.get()
        }

        fn write(&self, device: &BlockDevice, pattern: IbpiPattern) -> Result<()> {
            self.writes
                .borrow_mut()
                .push((device.sysfs_path.clone(), pattern));
            Ok(())
        }
    }
}
