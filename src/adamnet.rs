// AdamNet bus engine
//
// The ADAM talks to its peripherals through a control structure in RAM: a
// 4-byte header followed by up to 15 device control blocks (DCBs). The CPU
// writes commands into status bytes and polls them until bit 7 comes back
// set. This module recognises accesses to that structure and answers them
// the way the peripheral controller would.

use crate::{
    device::DeviceId,
    keyboard::Keyboard,
    layout::{
        self, Location, CMD_RELOCATE, CMD_SYNC_CPU, CMD_SYNC_PERIPHERALS, DCB_ID_HI, DCB_ID_LO,
        DCB_STATUS, DEFAULT_BASE, HEADER_COMMAND, HEADER_DEVICE_COUNT, HEADER_TARGET_LO,
        MAX_DEVICES, RSP_NAK, RSP_STATUS, WINDOW_SIZE,
    },
    media::MediaHost,
    memory::{BankedAddressSpace, MappingMode},
    presence::PresenceIndex,
    printer,
    storage::{self, DriveKind},
};

#[derive(Debug, Clone)]
pub struct AdamNet {
    base: u16,
    presence: PresenceIndex,
    active_devices: u8,
    last_disk: u8,
    keyboard: Keyboard,
    dispatching: bool,
}

impl Default for AdamNet {
    fn default() -> Self {
        Self::new(Keyboard::new())
    }
}

impl AdamNet {
    pub fn new(keyboard: Keyboard) -> Self {
        let mut adamnet = Self {
            base: DEFAULT_BASE,
            presence: PresenceIndex::new(),
            active_devices: MAX_DEVICES as u8,
            last_disk: 0,
            keyboard,
            dispatching: false,
        };
        adamnet.reset();
        adamnet
    }

    /// Power-on state: structure at 0xFEC0 with all 15 slots armed.
    pub fn reset(&mut self) {
        self.presence.clear();
        self.base = DEFAULT_BASE;
        self.presence.insert_range(self.base, WINDOW_SIZE);
        self.active_devices = MAX_DEVICES as u8;
        self.last_disk = 0;
        self.keyboard.reset();
        tracing::info!("[ADAMNET] Reset, control structure at {:04X}", self.base);
    }

    pub fn base(&self) -> u16 {
        self.base
    }

    pub fn active_devices(&self) -> u8 {
        self.active_devices
    }

    pub fn keyboard_status(&self) -> u8 {
        self.keyboard.status()
    }

    pub fn last_disk(&self) -> u8 {
        self.last_disk
    }

    pub fn presence(&self) -> &PresenceIndex {
        &self.presence
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn keyboard_mut(&mut self) -> &mut Keyboard {
        &mut self.keyboard
    }

    pub fn enqueue_key(&mut self, code: u16) {
        self.keyboard.enqueue(code);
    }

    /// Whether `address` currently belongs to the bus. Called on every CPU
    /// memory access.
    #[inline]
    pub fn is_live(&self, address: u16, mode: MappingMode) -> bool {
        if !self.presence.contains(address) {
            return false;
        }

        if !mode.exposes_bus(address) {
            return false;
        }

        (address.wrapping_sub(self.base) as usize) < layout::live_extent(self.active_devices)
    }

    /// Moves the control structure to `new_base` and re-arms all 15 slots.
    pub fn relocate(&mut self, new_base: u16) {
        self.presence.remove_range(self.base, WINDOW_SIZE);
        self.presence.insert_range(new_base, WINDOW_SIZE);
        tracing::info!(
            "[ADAMNET] Control structure moved {:04X} -> {:04X}",
            self.base,
            new_base
        );
        self.base = new_base;
        self.active_devices = MAX_DEVICES as u8;
    }

    /// CPU read of a live address.
    pub fn read(&self, address: u16, memory: &BankedAddressSpace) -> u8 {
        if let Some(Location::Dcb {
            slot,
            offset: DCB_STATUS,
        }) = layout::locate(self.base, address)
        {
            if self.device_at(slot, memory) == DeviceId::Keyboard {
                tracing::trace!("[KBD] Status read {:02X}", self.keyboard.status());
                return self.keyboard.status();
            }
        }

        memory.read_byte(address)
    }

    /// CPU write to a live address. The byte is stored first; protocol
    /// responses overwrite it.
    pub fn write(
        &mut self,
        address: u16,
        value: u8,
        memory: &mut BankedAddressSpace,
        host: &mut dyn MediaHost,
    ) {
        memory.write_byte(address, value);

        match layout::locate(self.base, address) {
            Some(Location::Header(offset)) => self.header_write(offset, value, memory),
            Some(Location::Dcb { slot, offset }) => {
                if slot == 0 && offset == DCB_STATUS {
                    memory.write_byte(address, value | RSP_STATUS);
                }
                if offset == DCB_STATUS {
                    self.dcb_write(slot, value, memory, host);
                }
            }
            None => {}
        }
    }

    fn header_write(&mut self, offset: u16, value: u8, memory: &mut BankedAddressSpace) {
        let address = self.base.wrapping_add(offset);
        match offset {
            HEADER_COMMAND => match value {
                CMD_SYNC_CPU | CMD_SYNC_PERIPHERALS => {
                    tracing::debug!("[ADAMNET] Sync command {:02X}", value);
                    memory.write_byte(address, RSP_STATUS | value);
                }
                CMD_RELOCATE => {
                    memory.write_byte(address, RSP_STATUS | value);
                    let target = memory.read_word(self.base.wrapping_add(HEADER_TARGET_LO));
                    self.relocate(target);
                }
                0 | 0x80..=0xFF => {}
                other => {
                    tracing::warn!("[ADAMNET] Unimplemented header command {:02X}", other);
                }
            },
            HEADER_DEVICE_COUNT => {
                memory.write_byte(address, value | RSP_STATUS);
                self.active_devices = (value & 0x7F).min(MAX_DEVICES as u8);
                tracing::trace!("[ADAMNET] Active devices {}", self.active_devices);
            }
            _ => {}
        }
    }

    fn dcb_write(
        &mut self,
        slot: usize,
        value: u8,
        memory: &mut BankedAddressSpace,
        host: &mut dyn MediaHost,
    ) {
        if value == 0 || value >= 0x80 {
            return;
        }

        debug_assert!(!self.dispatching, "re-entrant AdamNet dispatch");
        self.dispatching = true;

        let dcb = layout::dcb_address(self.base, slot);
        let device = self.device_at(slot, memory);
        tracing::debug!("[ADAMNET] DCB {} ({}) command {:02X}", slot, device, value);

        match device {
            DeviceId::Keyboard => self.keyboard.command(dcb, value, memory),
            DeviceId::Printer => printer::command(dcb, value, memory, host),
            DeviceId::Disk(index) => {
                self.last_disk = index;
                storage::command(DriveKind::Disk, index as usize, dcb, value, memory, host);
            }
            DeviceId::RepeatLastDisk => {
                let index = self.last_disk as usize;
                storage::command(DriveKind::Disk, index, dcb, value, memory, host);
            }
            DeviceId::Tape(index) => {
                storage::command(DriveKind::Tape, index as usize, dcb, value, memory, host);
            }
            DeviceId::Unknown(code) => {
                tracing::warn!(
                    "[ADAMNET] Command {:02X} to unknown device {:#04X} in DCB {}",
                    value,
                    code,
                    slot
                );
                memory.write_byte(dcb, RSP_NAK);
            }
        }

        self.dispatching = false;
    }

    /// Decodes the identity of the device owning DCB `slot`.
    pub fn device_at(&self, slot: usize, memory: &BankedAddressSpace) -> DeviceId {
        let dcb = layout::dcb_address(self.base, slot);
        DeviceId::decode(
            memory.read_byte(dcb.wrapping_add(DCB_ID_HI)),
            memory.read_byte(dcb.wrapping_add(DCB_ID_LO)),
        )
    }
}
