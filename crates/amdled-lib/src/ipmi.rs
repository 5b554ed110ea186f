//! MG9098 register access over IPMI.
//!
//! Drive bay LEDs on IPMI platforms are owned by daisy-chained MG9098 chips
//! behind the BMC, each driving 8 bays. Every LED function (fault, locate,
//! rebuild, ...) is a separate 8-bit register on each chip with one bit per
//! bay. Requests use the BMC "master write-read" command: the request names
//! the I2C channel and chip, the number of bytes to read back, and the bytes
//! to write (register address, then optionally a value).

use std::fmt;
use std::process::Command;

use crate::drive::{BAYS_PER_CHIP, DeviceKind, Drive};
use crate::error::{LedError, Result};
use crate::platform::AmdPlatform;

// ── Command constants ──

/// BMC slave address on the IPMB.
pub const BMC_SA: u8 = 0x20;
/// App network function.
pub const NETFN_APP: u8 = 0x06;
/// Master write-read.
pub const CMD_MASTER_WRITE_READ: u8 = 0x52;

pub const CHANNEL_ETHANOL_X: u8 = 0x0d;
pub const CHANNEL_DAYTONA_X: u8 = 0x17;

/// MG9098 for bays 1-8.
pub const SLAVE_ADDR_CHIP_A: u8 = 0xc0;
/// MG9098 for bays 9-16.
pub const SLAVE_ADDR_CHIP_B: u8 = 0xc2;
/// MG9098 for bays 17-24 (all NVMe-capable bays on Daytona-X).
pub const SLAVE_ADDR_CHIP_C: u8 = 0xc4;

/// Chip identification register.
pub const REG_CHIP_ID: u8 = 0x63;
/// Value of [`REG_CHIP_ID`] on an MG9098.
pub const MG9098_CHIP_ID: u8 = 98;
/// SMBus control: a bay's bit must be set before its LEDs follow register writes.
pub const REG_SMBUS_CONTROL: u8 = 0x3c;

// ── Transport ──

/// Failure of the management-controller command primitive.
#[derive(Debug)]
pub enum TransportError {
    /// The transport could not be reached at all (tool missing, no device node).
    Unavailable(String),
    /// The BMC rejected or failed the command.
    Failed(String),
    /// Fewer response bytes than requested.
    ShortResponse { expected: usize, got: usize },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Unavailable(e) => write!(f, "IPMI transport unavailable: {e}"),
            TransportError::Failed(e) => write!(f, "IPMI command failed: {e}"),
            TransportError::ShortResponse { expected, got } => {
                write!(f, "IPMI response too short: expected {expected} bytes, got {got}")
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Send one IPMI request and receive its response data.
///
/// Blocks until the BMC answers; timeouts are the implementation's business.
pub trait IpmiTransport {
    fn ipmi_cmd(
        &self,
        sa: u8,
        lun: u8,
        netfn: u8,
        cmd: u8,
        data: &[u8],
        resp_len: usize,
    ) -> std::result::Result<Vec<u8>, TransportError>;
}

// ── Platform addressing ──

/// I2C channel behind the BMC that reaches the MG9098 chips.
pub fn channel_for(platform: AmdPlatform) -> Result<u8> {
    match platform {
        AmdPlatform::EthanolX => Ok(CHANNEL_ETHANOL_X),
        AmdPlatform::DaytonaX => Ok(CHANNEL_DAYTONA_X),
        AmdPlatform::Other => {
            log::error!("AMD platform does not have a defined IPMI channel");
            Err(LedError::UnsupportedPlatform(platform))
        }
    }
}

/// Slave address of the chip owning `drive`, or of the base chip when no
/// drive is known yet (enablement probing).
pub fn slave_address_for(platform: AmdPlatform, drive: Option<&Drive>) -> Result<u8> {
    match platform {
        AmdPlatform::EthanolX => Ok(SLAVE_ADDR_CHIP_A),
        AmdPlatform::DaytonaX => Ok(match drive {
            None => SLAVE_ADDR_CHIP_A,
            // Only bays 19-24 take NVMe drives on Daytona-X.
            Some(d) if d.kind == DeviceKind::Nvme => SLAVE_ADDR_CHIP_C,
            Some(d) => match d.port {
                ..=8 => SLAVE_ADDR_CHIP_A,
                9..=16 => SLAVE_ADDR_CHIP_B,
                _ => SLAVE_ADDR_CHIP_C,
            },
        }),
        AmdPlatform::Other => {
            log::error!("AMD platform does not have a defined IPMI slave address");
            Err(LedError::UnsupportedPlatform(platform))
        }
    }
}

/// Bit of `drive` in the LED registers of the chip at `slave`.
///
/// SATA bays are already relative to their chip. An NVMe bay must fall in
/// the chip's own 8-bay range, otherwise the bit would belong to another bay.
pub fn bay_mask(slave: u8, drive: &Drive) -> Result<u8> {
    let invalid = || {
        LedError::InvalidTopology(format!(
            "{:?} bay {} is not wired to chip {slave:#04x}",
            drive.kind, drive.port
        ))
    };

    match drive.kind {
        DeviceKind::Sata => u8::try_from(drive.drive_bay)
            .ok()
            .filter(|mask| mask.count_ones() == 1)
            .ok_or_else(invalid),
        DeviceKind::Nvme => {
            let first_bay = match slave {
                SLAVE_ADDR_CHIP_A => 1,
                SLAVE_ADDR_CHIP_B => 9,
                SLAVE_ADDR_CHIP_C => 17,
                _ => return Err(invalid()),
            };
            let bit = drive
                .port
                .checked_sub(first_bay)
                .filter(|bit| *bit < BAYS_PER_CHIP)
                .ok_or_else(invalid)?;
            Ok(1 << bit)
        }
    }
}

fn master_write_read(
    transport: &impl IpmiTransport,
    data: &[u8],
) -> std::result::Result<u8, TransportError> {
    let resp = transport.ipmi_cmd(BMC_SA, 0, NETFN_APP, CMD_MASTER_WRITE_READ, data, 1)?;
    resp.first().copied().ok_or(TransportError::ShortResponse {
        expected: 1,
        got: 0,
    })
}

/// Read-modify-write one bay bit of an LED register.
///
/// Not atomic: concurrent callers targeting the same chip must serialize,
/// or one of the updates is lost.
pub fn set_register_bit(
    transport: &impl IpmiTransport,
    platform: AmdPlatform,
    enable: bool,
    register: u8,
    drive: &Drive,
) -> Result<()> {
    let channel = channel_for(platform)?;
    let slave = slave_address_for(platform, Some(drive))?;
    let mask = bay_mask(slave, drive).map_err(|e| {
        log::error!("AMD IPMI: {e}");
        e
    })?;

    log::debug!("reading register {register:#04x} (channel {channel:#04x}, slave {slave:#04x})");
    let old = master_write_read(transport, &[channel, slave, 1, register]).map_err(|e| {
        log::error!("could not determine current register {register:#04x} setting: {e}");
        e
    })?;

    let new = if enable { old | mask } else { old & !mask };
    log::debug!("updating register {register:#04x}: {old:#04x} -> {new:#04x}");

    master_write_read(transport, &[channel, slave, 1, register, new]).map_err(|e| {
        log::error!("could not update register {register:#04x}: {e}");
        e
    })?;
    Ok(())
}

/// True if an MG9098 answers on the platform's base chip address.
///
/// Never fails: any problem means IPMI LED control is not available.
pub fn enablement_probe(transport: &impl IpmiTransport, platform: AmdPlatform) -> bool {
    let (Ok(channel), Ok(slave)) = (
        channel_for(platform),
        slave_address_for(platform, None),
    ) else {
        return false;
    };

    match master_write_read(transport, &[channel, slave, 1, REG_CHIP_ID]) {
        Ok(MG9098_CHIP_ID) => true,
        Ok(other) => {
            log::error!("not a MG9098 (chip id {other})");
            false
        }
        Err(e) => {
            log::error!("can't determine MG9098 status: {e}");
            false
        }
    }
}

// ── ipmitool backend ──

/// Transport that shells out to `ipmitool raw`.
#[derive(Debug, Clone)]
pub struct IpmitoolTransport {
    /// Program to run. Default: `ipmitool`.
    pub program: String,
    /// `-I` interface, e.g. `open`. `None` lets ipmitool pick.
    pub interface: Option<String>,
}

impl Default for IpmitoolTransport {
    fn default() -> Self {
        IpmitoolTransport {
            program: "ipmitool".into(),
            interface: None,
        }
    }
}

impl IpmitoolTransport {
    /// Arguments for one raw request.
    pub fn args(&self, sa: u8, lun: u8, netfn: u8, cmd: u8, data: &[u8]) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(ref iface) = self.interface {
            args.push("-I".into());
            args.push(iface.clone());
        }
        if sa != BMC_SA {
            args.push("-t".into());
            args.push(format!("{sa:#04x}"));
        }
        if lun != 0 {
            args.push("-l".into());
            args.push(lun.to_string());
        }
        args.push("raw".into());
        args.extend([netfn, cmd].iter().chain(data).map(|b| format!("{b:#04x}")));
        args
    }
}

/// Parse `ipmitool raw` output: whitespace-separated hex bytes, possibly
/// wrapped over several lines.
pub fn parse_raw_response(stdout: &str) -> std::result::Result<Vec<u8>, TransportError> {
    stdout
        .split_whitespace()
        .map(|tok| {
            u8::from_str_radix(tok, 16)
                .map_err(|_| TransportError::Failed(format!("unexpected output {tok:?}")))
        })
        .collect()
}

impl IpmiTransport for IpmitoolTransport {
    fn ipmi_cmd(
        &self,
        sa: u8,
        lun: u8,
        netfn: u8,
        cmd: u8,
        data: &[u8],
        resp_len: usize,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let output = Command::new(&self.program)
            .args(self.args(sa, lun, netfn, cmd, data))
            .output()
            .map_err(|e| TransportError::Unavailable(format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransportError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let resp = parse_raw_response(&String::from_utf8_lossy(&output.stdout))?;
        if resp.len() < resp_len {
            return Err(TransportError::ShortResponse {
                expected: resp_len,
                got: resp.len(),
            });
        }
        Ok(resp)
    }
}

// ── Mock BMC for testing ──

/// Simulated BMC with MG9098 chips, for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// Register file keyed by `(channel, slave, register)`. Unset registers
    /// read as zero, except the chip-ID register of chips added with
    /// [`MockBmc::with_chip`].
    #[derive(Default)]
    pub struct MockBmc {
        pub registers: RefCell<HashMap<(u8, u8, u8), u8>>,
        /// Every request payload, in order.
        pub requests: RefCell<Vec<Vec<u8>>>,
        /// Fail every request once this many have succeeded.
        pub fail_after: Cell<Option<usize>>,
        /// Fail only 5-byte (write) requests.
        pub fail_writes: Cell<bool>,
    }

    impl MockBmc {
        pub fn new() -> Self {
            Self::default()
        }

        /// A BMC with an MG9098 at `(channel, slave)`.
        pub fn with_chip(channel: u8, slave: u8) -> Self {
            let bmc = Self::new();
            bmc.add_chip(channel, slave);
            bmc
        }

        pub fn add_chip(&self, channel: u8, slave: u8) {
            self.set_register(channel, slave, REG_CHIP_ID, MG9098_CHIP_ID);
        }

        pub fn register(&self, channel: u8, slave: u8, register: u8) -> u8 {
            self.registers
                .borrow()
                .get(&(channel, slave, register))
                .copied()
                .unwrap_or(0)
        }

        pub fn set_register(&self, channel: u8, slave: u8, register: u8, value: u8) {
            self.registers
                .borrow_mut()
                .insert((channel, slave, register), value);
        }

        pub fn request_count(&self) -> usize {
            self.requests.borrow().len()
        }

        /// Registers written so far, in order.
        pub fn writes(&self) -> Vec<(u8, u8, u8, u8)> {
            self.requests
                .borrow()
                .iter()
                .filter(|r| r.len() == 5)
                .map(|r| (r[0], r[1], r[3], r[4]))
                .collect()
        }
    }

    impl IpmiTransport for MockBmc {
        fn ipmi_cmd(
            &self,
            sa: u8,
            _lun: u8,
            netfn: u8,
            cmd: u8,
            data: &[u8],
            resp_len: usize,
        ) -> std::result::Result<Vec<u8>, TransportError> {
            let seen = self.request_count();
            self.requests.borrow_mut().push(data.to_vec());

            if self.fail_after.get().is_some_and(|n| seen >= n) {
                return Err(TransportError::Failed("mock: failure injected".into()));
            }
            if sa != BMC_SA || netfn != NETFN_APP || cmd != CMD_MASTER_WRITE_READ {
                return Err(TransportError::Failed(format!(
                    "mock: unexpected sa/netfn/cmd {sa:#x}/{netfn:#x}/{cmd:#x}"
                )));
            }

            match data {
                &[channel, slave, 1, register] => {
                    let mut resp = vec![self.register(channel, slave, register)];
                    resp.resize(resp_len.max(1), 0);
                    Ok(resp)
                }
                &[channel, slave, 1, register, value] => {
                    if self.fail_writes.get() {
                        return Err(TransportError::Failed("mock: write rejected".into()));
                    }
                    self.set_register(channel, slave, register, value);
                    Ok(vec![0; resp_len])
                }
                _ => Err(TransportError::Failed(format!(
                    "mock: malformed request {data:02x?}"
                ))),
            }
        }
    }
}
