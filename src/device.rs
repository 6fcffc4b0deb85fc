use std::fmt;

pub const DISK_COUNT: usize = 4;
pub const TAPE_COUNT: usize = 4;

/// Peripheral a device control block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceId {
    Keyboard,
    Printer,
    Disk(u8),
    Tape(u8),
    /// Re-run the command on whichever disk was addressed last.
    RepeatLastDisk,
    Unknown(u16),
}

impl DeviceId {
    /// Decodes the identity from DCB bytes 9 (high nibble) and 16 (low
    /// nibble). Byte 9 is not masked: values above 0x0F never match.
    pub fn decode(id_hi: u8, id_lo: u8) -> Self {
        Self::from_code(((id_hi as u16) << 4) | (id_lo & 0x0F) as u16)
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            0x01 => DeviceId::Keyboard,
            0x02 => DeviceId::Printer,
            0x04..=0x07 => DeviceId::Disk((code - 0x04) as u8),
            0x08 | 0x09 | 0x18 | 0x19 => DeviceId::Tape(((code >> 4) + ((code & 1) << 1)) as u8),
            0x52 => DeviceId::RepeatLastDisk,
            other => DeviceId::Unknown(other),
        }
    }

    /// The identity code EOS places in a DCB for this device.
    pub fn code(&self) -> u16 {
        match *self {
            DeviceId::Keyboard => 0x01,
            DeviceId::Printer => 0x02,
            DeviceId::Disk(index) => 0x04 + index as u16,
            DeviceId::Tape(index) => {
                let index = index as u16;
                0x08 | (index & 1) << 4 | (index >> 1)
            }
            DeviceId::RepeatLastDisk => 0x52,
            DeviceId::Unknown(code) => code,
        }
    }

    /// Splits the code into the (byte 9, byte 16) pair.
    pub fn nibbles(&self) -> (u8, u8) {
        let code = self.code();
        ((code >> 4) as u8, (code & 0x0F) as u8)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceId::Keyboard => write!(f, "keyboard"),
            DeviceId::Printer => write!(f, "printer"),
            DeviceId::Disk(index) => write!(f, "disk {}", index),
            DeviceId::Tape(index) => write!(f, "tape {}", index),
            DeviceId::RepeatLastDisk => write!(f, "last disk"),
            DeviceId::Unknown(code) => write!(f, "unknown device {:#04X}", code),
        }
    }
}
