//! IBPI pattern to MG9098 register sequencing.

use crate::drive::Drive;
use crate::error::{LedError, Result};
use crate::ibpi::IbpiPattern;
use crate::ipmi::{self, IpmiTransport, REG_SMBUS_CONTROL};
use crate::platform::AmdPlatform;

/// LED function register for `pattern`.
///
/// Normal / locate-off are expressed as disables and have no register of
/// their own; degraded, added, removed and unknown are not wired to any LED.
pub fn register_for(pattern: IbpiPattern) -> Result<u8> {
    match pattern {
        IbpiPattern::Pfa => Ok(0x41),
        IbpiPattern::Locate => Ok(0x42),
        IbpiPattern::FailedDrive => Ok(0x44),
        IbpiPattern::FailedArray => Ok(0x45),
        IbpiPattern::Rebuild => Ok(0x46),
        IbpiPattern::Hotspare => Ok(0x47),
        other => Err(LedError::UnmappedPattern(other)),
    }
}

/// Patterns cleared when a drive returns to normal. Hotspare is left alone.
pub const CLEARED_ON_NORMAL: [IbpiPattern; 5] = [
    IbpiPattern::Pfa,
    IbpiPattern::Locate,
    IbpiPattern::FailedDrive,
    IbpiPattern::FailedArray,
    IbpiPattern::Rebuild,
];

/// Register-level target of one IPMI write call.
pub struct Target<'a, T: IpmiTransport> {
    pub transport: &'a T,
    pub platform: AmdPlatform,
    pub drive: &'a Drive,
}

impl<T: IpmiTransport> Target<'_, T> {
    fn enable(&self, pattern: IbpiPattern) -> Result<()> {
        let register = register_for(pattern)?;
        log::debug!("enabling {pattern} LED");
        ipmi::set_register_bit(self.transport, self.platform, true, register, self.drive)
    }

    fn disable(&self, pattern: IbpiPattern) -> Result<()> {
        let register = register_for(pattern)?;
        log::debug!("disabling {pattern} LED");
        ipmi::set_register_bit(self.transport, self.platform, false, register, self.drive)
    }

    fn enable_smbus_control(&self) -> Result<()> {
        log::debug!("enabling SMBus control");
        ipmi::set_register_bit(
            self.transport,
            self.platform,
            true,
            REG_SMBUS_CONTROL,
            self.drive,
        )
    }

    /// Every disable is attempted even after a failure; the first error wins.
    fn disable_all(&self) -> Result<()> {
        CLEARED_ON_NORMAL
            .into_iter()
            .map(|pattern| self.disable(pattern))
            .fold(Ok(()), |acc, r| acc.and(r))
    }
}

/// Drive the LEDs of an already located drive to `pattern`.
pub fn apply_pattern<T: IpmiTransport>(target: &Target<'_, T>, pattern: IbpiPattern) -> Result<()> {
    match pattern {
        IbpiPattern::Normal | IbpiPattern::OneshotNormal => target.disable_all(),
        IbpiPattern::LocateOff => target.disable(IbpiPattern::Locate),
        _ => {
            // Reject before touching the bus.
            register_for(pattern)?;
            target.enable_smbus_control()?;
            target.enable(pattern)
        }
    }
}
