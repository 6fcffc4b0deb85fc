use derivative::Derivative;

use crate::{
    adamnet::AdamNet,
    keyboard::Keyboard,
    media::{MediaHost, NullHost},
    memory::{BankedAddressSpace, MappingMode, PAGE_COUNT, PAGE_SIZE},
};

// +-----------+------------------------------------------------+
// | Port      | Description                                    |
// +-----------+------------------------------------------------+
// | 0x7F      | Memory map register (MappingMode)              |
// +-----------+------------------------------------------------+
pub const PORT_MEMORY_MAP: u8 = 0x7F;

/// What a CPU core needs from the machine: memory and port access.
pub trait CpuIo {
    fn read_byte(&self, address: u16) -> u8;
    fn write_byte(&mut self, address: u16, value: u8);
    fn port_in(&self, port: u16) -> u8;
    fn port_out(&mut self, port: u16, value: u8);
}

/// Address decoder in front of the banked memory. Accesses to live AdamNet
/// addresses go to the bus engine, everything else to plain memory.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Bus {
    pub memory: BankedAddressSpace,
    pub adamnet: AdamNet,

    #[derivative(Debug = "ignore")]
    host: Box<dyn MediaHost>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(BankedAddressSpace::default(), Keyboard::new(), Box::new(NullHost))
    }
}

impl Bus {
    pub fn new(memory: BankedAddressSpace, keyboard: Keyboard, host: Box<dyn MediaHost>) -> Self {
        Self {
            memory,
            adamnet: AdamNet::new(keyboard),
            host,
        }
    }

    pub fn reset(&mut self) {
        self.memory.reset();
        self.adamnet.reset();
    }

    pub fn host(&self) -> &dyn MediaHost {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> &mut dyn MediaHost {
        self.host.as_mut()
    }

    pub fn set_host(&mut self, host: Box<dyn MediaHost>) {
        self.host = host;
    }

    pub fn mode(&self) -> MappingMode {
        self.memory.mode()
    }

    pub fn enqueue_key(&mut self, code: u16) {
        self.adamnet.enqueue_key(code);
    }

    pub fn is_live(&self, address: u16) -> bool {
        self.adamnet.is_live(address, self.memory.mode())
    }

    pub fn read_byte(&self, address: u16) -> u8 {
        if self.is_live(address) {
            self.adamnet.read(address, &self.memory)
        } else {
            self.memory.read_byte(address)
        }
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        if self.is_live(address) {
            tracing::trace!("[BUS] AdamNet write {:04X} = {:02X}", address, value);
            self.adamnet
                .write(address, value, &mut self.memory, self.host.as_mut());
        } else {
            self.memory.write_byte(address, value);
        }
    }

    pub fn read_word(&self, address: u16) -> u16 {
        let low_byte = self.read_byte(address) as u16;
        let high_byte = self.read_byte(address.wrapping_add(1)) as u16;
        (high_byte << 8) | low_byte
    }

    pub fn write_word(&mut self, address: u16, value: u16) {
        let low_byte = (value & 0x00FF) as u8;
        let high_byte = ((value & 0xFF00) >> 8) as u8;
        self.write_byte(address, low_byte);
        self.write_byte(address.wrapping_add(1), high_byte);
    }

    pub fn write_block(&mut self, start_addr: u16, data: &[u8]) {
        let mut addr = start_addr;
        for &byte in data {
            self.write_byte(addr, byte);
            addr = addr.wrapping_add(1);
        }
    }

    pub fn input(&self, port: u8) -> u8 {
        match port {
            PORT_MEMORY_MAP => self.memory.mode().bits(),
            _ => {
                tracing::trace!("[BUS] Invalid port {:02X} read", port);
                0xFF
            }
        }
    }

    pub fn output(&mut self, port: u8, data: u8) {
        match port {
            PORT_MEMORY_MAP => {
                tracing::debug!("[BUS] Memory map <- {:02X}", data);
                self.memory.set_mode(MappingMode::new(data));
            }
            _ => {
                tracing::trace!("[BUS] Invalid port {:02X} write = {:02X}", port, data);
            }
        }
    }

    pub fn print_memory_page_info(&self) {
        for page in 0..PAGE_COUNT {
            let start_address = page * PAGE_SIZE;
            let read = self.memory.read_mapping(page);
            let write = self.memory.write_mapping(page);

            tracing::info!(
                "Memory page {} (0x{:04X} - 0x{:04X}): read {} +{:#06X}, write {} +{:#06X}",
                page,
                start_address,
                start_address + PAGE_SIZE - 1,
                read.region,
                read.offset,
                write.region,
                write.offset
            );
        }
    }
}

impl CpuIo for Bus {
    fn read_byte(&self, address: u16) -> u8 {
        self.read_byte(address)
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        self.write_byte(address, value);
    }

    fn port_in(&self, port: u16) -> u8 {
        self.input(port as u8)
    }

    fn port_out(&mut self, port: u16, value: u8) {
        self.output(port as u8, value)
    }
}
