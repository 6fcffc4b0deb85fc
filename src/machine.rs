use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    bus::{Bus, CpuIo},
    config::AdamConfig,
    hexdump,
    keyboard::{Keyboard, DEFAULT_QUEUE_CAPACITY},
    media::{MediaHost, NullHost},
    memory::{BankedAddressSpace, MappingMode},
    region::RomRegion,
};

/// An ADAM with its memory map and AdamNet engine. The CPU core lives
/// outside this crate and drives the machine through [`Io`].
pub struct Machine {
    pub bus: Rc<RefCell<Bus>>,
    initial_mode: MappingMode,
}

impl Machine {
    pub fn new(bus: Bus) -> Self {
        let initial_mode = bus.mode();
        tracing::info!("Initializing ADAM: {:?}", bus.memory);
        Self {
            bus: Rc::new(RefCell::new(bus)),
            initial_mode,
        }
    }

    /// Handle for the CPU core's memory and port accesses.
    pub fn io(&self) -> Io {
        Io::new(self.bus.clone())
    }

    pub fn reset(&mut self) {
        let mut bus = self.bus.borrow_mut();
        bus.reset();
        bus.memory.set_mode(self.initial_mode);
    }

    pub fn enqueue_key(&mut self, code: u16) {
        self.bus.borrow_mut().enqueue_key(code);
    }

    pub fn key_down(&mut self, key: &str) {
        self.bus.borrow_mut().adamnet.keyboard_mut().key_down(key);
    }

    pub fn read_byte(&self, address: u16) -> u8 {
        self.bus.borrow().read_byte(address)
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        self.bus.borrow_mut().write_byte(address, value);
    }

    pub fn port_out(&mut self, port: u8, value: u8) {
        self.bus.borrow_mut().output(port, value);
    }

    pub fn port_in(&self, port: u8) -> u8 {
        self.bus.borrow().input(port)
    }

    pub fn mode(&self) -> MappingMode {
        self.bus.borrow().mode()
    }

    pub fn adamnet_base(&self) -> u16 {
        self.bus.borrow().adamnet.base()
    }

    pub fn keyboard_status(&self) -> u8 {
        self.bus.borrow().adamnet.keyboard_status()
    }

    pub fn mem_size(&self) -> usize {
        64 * 1024
    }

    /// The CPU's current view of the address space.
    pub fn ram(&self) -> Vec<u8> {
        let bus = self.bus.borrow();
        (0..self.mem_size())
            .map(|address| bus.read_byte(address as u16))
            .collect()
    }

    pub fn memory_dump(&self, start: u16, end: u16) -> String {
        hexdump(&self.ram(), start, end)
    }

    pub fn print_memory_page_info(&self) {
        self.bus.borrow().print_memory_page_info();
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bus = self.bus.borrow();
        f.debug_struct("Machine")
            .field("mode", &bus.mode())
            .field("adamnet_base", &bus.adamnet.base())
            .field("active_devices", &bus.adamnet.active_devices())
            .field("keyboard_status", &bus.adamnet.keyboard_status())
            .finish()
    }
}

pub struct MachineBuilder {
    writer_rom: Option<RomRegion>,
    os7_rom: Option<RomRegion>,
    expansion_rom: Option<RomRegion>,
    cartridge: Option<RomRegion>,
    expansion_ram: bool,
    keyboard_capacity: usize,
    mapping_mode: MappingMode,
    host: Option<Box<dyn MediaHost>>,
}

impl Default for MachineBuilder {
    fn default() -> Self {
        Self {
            writer_rom: None,
            os7_rom: None,
            expansion_rom: None,
            cartridge: None,
            expansion_ram: false,
            keyboard_capacity: DEFAULT_QUEUE_CAPACITY,
            mapping_mode: MappingMode::default(),
            host: None,
        }
    }
}

impl MachineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every ROM named in `config` from disk.
    pub fn from_config(config: &AdamConfig) -> anyhow::Result<Self> {
        let load = |path: &Option<std::path::PathBuf>, size: usize| -> anyhow::Result<_> {
            path.as_ref()
                .map(|path| RomRegion::load(path.clone(), size))
                .transpose()
        };

        let mut builder = Self::new();
        builder.writer_rom = load(&config.writer_rom, crate::memory::WRITER_ROM_SIZE)?;
        builder.os7_rom = load(&config.os7_rom, crate::memory::OS7_ROM_SIZE)?;
        builder.expansion_rom = load(&config.expansion_rom, crate::memory::EXPANSION_ROM_SIZE)?;
        builder.cartridge = load(&config.cartridge, crate::memory::CARTRIDGE_SIZE)?;
        builder
            .expansion_ram(config.expansion_ram)
            .keyboard_capacity(config.keyboard_capacity)
            .mapping_mode(config.mapping_mode);
        Ok(builder)
    }

    pub fn writer_rom(&mut self, data: &[u8]) -> &mut Self {
        self.writer_rom = Some(RomRegion::new(data, crate::memory::WRITER_ROM_SIZE));
        self
    }

    pub fn os7_rom(&mut self, data: &[u8]) -> &mut Self {
        self.os7_rom = Some(RomRegion::new(data, crate::memory::OS7_ROM_SIZE));
        self
    }

    pub fn expansion_rom(&mut self, data: &[u8]) -> &mut Self {
        self.expansion_rom = Some(RomRegion::new(data, crate::memory::EXPANSION_ROM_SIZE));
        self
    }

    pub fn cartridge(&mut self, data: &[u8]) -> &mut Self {
        self.cartridge = Some(RomRegion::new(data, crate::memory::CARTRIDGE_SIZE));
        self
    }

    pub fn expansion_ram(&mut self, enabled: bool) -> &mut Self {
        self.expansion_ram = enabled;
        self
    }

    pub fn keyboard_capacity(&mut self, capacity: usize) -> &mut Self {
        self.keyboard_capacity = capacity;
        self
    }

    pub fn mapping_mode(&mut self, mode: u8) -> &mut Self {
        self.mapping_mode = MappingMode::new(mode);
        self
    }

    pub fn host<H: MediaHost + 'static>(&mut self, host: H) -> &mut Self {
        self.host = Some(Box::new(host));
        self
    }

    pub fn build(&mut self) -> Machine {
        let mut memory = BankedAddressSpace::new(self.expansion_ram);
        if let Some(rom) = self.writer_rom.take() {
            memory.set_writer_rom(rom);
        }
        if let Some(rom) = self.os7_rom.take() {
            memory.set_os7_rom(rom);
        }
        if let Some(rom) = self.expansion_rom.take() {
            memory.set_expansion_rom(rom);
        }
        if let Some(rom) = self.cartridge.take() {
            memory.set_cartridge(rom);
        }
        memory.set_mode(self.mapping_mode);

        let host = self
            .host
            .take()
            .unwrap_or_else(|| Box::new(NullHost) as Box<dyn MediaHost>);
        let keyboard = Keyboard::with_capacity(self.keyboard_capacity);

        Machine::new(Bus::new(memory, keyboard, host))
    }
}

/// The CPU core's view of the machine.
pub struct Io {
    pub bus: Rc<RefCell<Bus>>,
}

impl Io {
    pub fn new(bus: Rc<RefCell<Bus>>) -> Self {
        Self { bus }
    }
}

impl CpuIo for Io {
    fn read_byte(&self, address: u16) -> u8 {
        self.bus.borrow().read_byte(address)
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        self.bus.borrow_mut().write_byte(address, value)
    }

    fn port_in(&self, port: u16) -> u8 {
        self.bus.borrow().input(port as u8)
    }

    fn port_out(&mut self, port: u16, value: u8) {
        self.bus.borrow_mut().output(port as u8, value)
    }
}
