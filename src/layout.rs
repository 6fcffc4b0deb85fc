// AdamNet control structure geometry
//
// +----------------+--------------------------------------------+
// | Offset         | Description                                |
// +----------------+--------------------------------------------+
// | base + 0       | Header command / status                    |
// | base + 1..=2   | Relocation target (little endian)          |
// | base + 3       | Active device count                        |
// | base + 4 + 21n | Device control block n (n = 0..15)         |
// +----------------+--------------------------------------------+

pub const DEFAULT_BASE: u16 = 0xFEC0;
pub const HEADER_SIZE: usize = 4;
pub const DCB_SIZE: usize = 21;
pub const MAX_DEVICES: usize = 15;
pub const WINDOW_SIZE: usize = HEADER_SIZE + DCB_SIZE * MAX_DEVICES;

pub const HEADER_COMMAND: u16 = 0;
pub const HEADER_TARGET_LO: u16 = 1;
pub const HEADER_TARGET_HI: u16 = 2;
pub const HEADER_DEVICE_COUNT: u16 = 3;

pub const DCB_STATUS: u16 = 0;
pub const DCB_BUFFER: u16 = 1;
pub const DCB_COUNT: u16 = 3;
pub const DCB_BLOCK: u16 = 5;
pub const DCB_ID_HI: u16 = 9;
pub const DCB_ID_LO: u16 = 16;
pub const DCB_NODE_STATUS: u16 = 20;

/// Bit 7 on a status byte: the bus has answered.
pub const RSP_STATUS: u8 = 0x80;
/// Device not present.
pub const RSP_NAK: u8 = 0x9B;
/// Keyboard ran out of keys before the requested count.
pub const RSP_SHORT: u8 = 0x8C;

pub const CMD_SYNC_CPU: u8 = 1;
pub const CMD_SYNC_PERIPHERALS: u8 = 2;
pub const CMD_RELOCATE: u8 = 3;

/// Device commands written to a DCB status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    SoftReset,
    Write,
    Read,
    Other(u8),
}

impl From<u8> for Command {
    fn from(value: u8) -> Self {
        match value {
            1 => Command::Status,
            2 => Command::SoftReset,
            3 => Command::Write,
            4 => Command::Read,
            other => Command::Other(other),
        }
    }
}

/// Where an address falls inside the control structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Header(u16),
    Dcb { slot: usize, offset: u16 },
}

/// Locates `address` relative to a control structure at `base`. Returns
/// `None` outside the 319-byte window.
pub fn locate(base: u16, address: u16) -> Option<Location> {
    let offset = address.wrapping_sub(base) as usize;
    if offset < HEADER_SIZE {
        Some(Location::Header(offset as u16))
    } else if offset < WINDOW_SIZE {
        let rel = offset - HEADER_SIZE;
        Some(Location::Dcb {
            slot: rel / DCB_SIZE,
            offset: (rel % DCB_SIZE) as u16,
        })
    } else {
        None
    }
}

/// First address of DCB `slot` for a structure at `base`.
pub fn dcb_address(base: u16, slot: usize) -> u16 {
    debug_assert!(slot < MAX_DEVICES, "slot {} out of range", slot);
    base.wrapping_add((HEADER_SIZE + DCB_SIZE * slot) as u16)
}

/// Exclusive end offset (from base) of the live part of the structure.
pub fn live_extent(active_devices: u8) -> usize {
    HEADER_SIZE + DCB_SIZE * active_devices as usize
}
