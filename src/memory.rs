use derivative::Derivative;
use serde::{Deserialize, Serialize};

use crate::region::{RamRegion, ReadSource, Region, RomRegion, WriteTarget};

pub const PAGE_SIZE: usize = 0x2000;
pub const PAGE_COUNT: usize = 8;

pub const WRITER_ROM_SIZE: usize = 0x8000;
pub const OS7_ROM_SIZE: usize = 0x2000;
pub const RAM_SIZE: usize = 0x10000;
pub const EXPANSION_ROM_SIZE: usize = 0x8000;
pub const CARTRIDGE_SIZE: usize = 0x8000;

/// What backs the lower 32 KiB (bits 0-1 of the mapping register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LowerMap {
    WriterRom,
    InternalRam,
    ExpansionRam,
    /// OS7 ROM at 0x0000-0x1FFF, internal RAM above it.
    Os7Ram,
}

/// What backs the upper 32 KiB (bits 2-3 of the mapping register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpperMap {
    InternalRam,
    ExpansionRam,
    ExpansionRom,
    Cartridge,
}

/// The ADAM memory-map register, written through port 0x7F.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingMode(u8);

impl MappingMode {
    pub const fn new(value: u8) -> Self {
        Self(value & 0x0F)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn lower(self) -> LowerMap {
        match self.0 & 0x03 {
            0 => LowerMap::WriterRom,
            1 => LowerMap::InternalRam,
            2 => LowerMap::ExpansionRam,
            _ => LowerMap::Os7Ram,
        }
    }

    pub fn upper(self) -> UpperMap {
        match (self.0 >> 2) & 0x03 {
            0 => UpperMap::InternalRam,
            1 => UpperMap::ExpansionRam,
            2 => UpperMap::ExpansionRom,
            _ => UpperMap::Cartridge,
        }
    }

    /// Whether the band containing `address` is currently backed by the
    /// internal RAM the AdamNet control blocks live in.
    pub fn exposes_bus(self, address: u16) -> bool {
        match address {
            0x0000..=0x1FFF => self.lower() == LowerMap::InternalRam,
            0x2000..=0x7FFF => matches!(self.lower(), LowerMap::InternalRam | LowerMap::Os7Ram),
            0x8000..=0xFFFF => self.upper() == UpperMap::InternalRam,
        }
    }
}

impl From<u8> for MappingMode {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

/// Page handle: which store backs a page and where in it the page starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMapping<T> {
    pub region: T,
    pub offset: usize,
}

impl<T> PageMapping<T> {
    const fn new(region: T, offset: usize) -> Self {
        Self { region, offset }
    }
}

/// The 64 KiB CPU address space as eight 8 KiB pages, each with its own read
/// and write mapping.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct BankedAddressSpace {
    mode: MappingMode,
    read_map: [PageMapping<ReadSource>; PAGE_COUNT],
    write_map: [PageMapping<WriteTarget>; PAGE_COUNT],

    #[derivative(Debug = "ignore")]
    writer_rom: RomRegion,
    #[derivative(Debug = "ignore")]
    os7_rom: RomRegion,
    #[derivative(Debug = "ignore")]
    expansion_rom: RomRegion,
    #[derivative(Debug = "ignore")]
    cartridge: RomRegion,
    #[derivative(Debug = "ignore")]
    open_bus: RomRegion,
    #[derivative(Debug = "ignore")]
    ram: RamRegion,
    #[derivative(Debug = "ignore")]
    expansion_ram: Option<RamRegion>,
    #[derivative(Debug = "ignore")]
    scratch: RamRegion,
}

impl Default for BankedAddressSpace {
    fn default() -> Self {
        Self::new(false)
    }
}

impl BankedAddressSpace {
    pub fn new(expansion_ram: bool) -> Self {
        let mut memory = Self {
            mode: MappingMode::default(),
            read_map: [PageMapping::new(ReadSource::OpenBus, 0); PAGE_COUNT],
            write_map: [PageMapping::new(WriteTarget::Scratch, 0); PAGE_COUNT],
            writer_rom: RomRegion::blank(WRITER_ROM_SIZE),
            os7_rom: RomRegion::blank(OS7_ROM_SIZE),
            expansion_rom: RomRegion::blank(EXPANSION_ROM_SIZE),
            cartridge: RomRegion::blank(CARTRIDGE_SIZE),
            open_bus: RomRegion::blank(PAGE_SIZE),
            ram: RamRegion::new(RAM_SIZE),
            expansion_ram: expansion_ram.then(|| RamRegion::new(RAM_SIZE)),
            scratch: RamRegion::new(PAGE_SIZE),
        };
        memory.remap();
        memory
    }

    pub fn reset(&mut self) {
        self.ram.clear();
        if let Some(expansion_ram) = &mut self.expansion_ram {
            expansion_ram.clear();
        }
        self.set_mode(MappingMode::default());
    }

    pub fn mode(&self) -> MappingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: MappingMode) {
        self.mode = mode;
        self.remap();
        tracing::trace!(
            "[MEM] Mapping mode {:02X}: lower {:?}, upper {:?}",
            mode.bits(),
            mode.lower(),
            mode.upper()
        );
    }

    pub fn has_expansion_ram(&self) -> bool {
        self.expansion_ram.is_some()
    }

    pub fn load_writer_rom(&mut self, rom: &[u8]) {
        self.writer_rom.replace(rom);
    }

    pub fn load_os7_rom(&mut self, rom: &[u8]) {
        self.os7_rom.replace(rom);
    }

    pub fn load_expansion_rom(&mut self, rom: &[u8]) {
        self.expansion_rom.replace(rom);
    }

    pub fn load_cartridge(&mut self, rom: &[u8]) {
        self.cartridge.replace(rom);
    }

    pub(crate) fn set_writer_rom(&mut self, rom: RomRegion) {
        self.writer_rom = RomRegion::new(rom.bytes(), WRITER_ROM_SIZE);
        self.writer_rom.rom_path = rom.rom_path;
    }

    pub(crate) fn set_os7_rom(&mut self, rom: RomRegion) {
        self.os7_rom = RomRegion::new(rom.bytes(), OS7_ROM_SIZE);
        self.os7_rom.rom_path = rom.rom_path;
    }

    pub(crate) fn set_expansion_rom(&mut self, rom: RomRegion) {
        self.expansion_rom = RomRegion::new(rom.bytes(), EXPANSION_ROM_SIZE);
        self.expansion_rom.rom_path = rom.rom_path;
    }

    pub(crate) fn set_cartridge(&mut self, rom: RomRegion) {
        self.cartridge = RomRegion::new(rom.bytes(), CARTRIDGE_SIZE);
        self.cartridge.rom_path = rom.rom_path;
    }

    pub fn read_mapping(&self, page: usize) -> PageMapping<ReadSource> {
        debug_assert!(page < PAGE_COUNT, "page {} out of range", page);
        self.read_map[page]
    }

    pub fn write_mapping(&self, page: usize) -> PageMapping<WriteTarget> {
        debug_assert!(page < PAGE_COUNT, "page {} out of range", page);
        self.write_map[page]
    }

    /// The 8 KiB slice the CPU sees when reading `page`.
    pub fn read_view(&self, page: usize) -> &[u8] {
        let mapping = self.read_mapping(page);
        let bytes = match mapping.region {
            ReadSource::WriterRom => self.writer_rom.bytes(),
            ReadSource::Os7Rom => self.os7_rom.bytes(),
            ReadSource::Ram => self.ram.bytes(),
            ReadSource::ExpansionRam => match &self.expansion_ram {
                Some(expansion_ram) => expansion_ram.bytes(),
                None => return self.open_bus.bytes(),
            },
            ReadSource::ExpansionRom => self.expansion_rom.bytes(),
            ReadSource::Cartridge => self.cartridge.bytes(),
            ReadSource::OpenBus => return self.open_bus.bytes(),
        };
        &bytes[mapping.offset..mapping.offset + PAGE_SIZE]
    }

    /// The 8 KiB slice CPU writes to `page` land in.
    pub fn write_view(&mut self, page: usize) -> &mut [u8] {
        let mapping = self.write_mapping(page);
        let bytes = match mapping.region {
            WriteTarget::Ram => self.ram.bytes_mut(),
            WriteTarget::ExpansionRam => match &mut self.expansion_ram {
                Some(expansion_ram) => expansion_ram.bytes_mut(),
                None => return self.scratch.bytes_mut(),
            },
            WriteTarget::Scratch => return self.scratch.bytes_mut(),
        };
        &mut bytes[mapping.offset..mapping.offset + PAGE_SIZE]
    }

    pub fn read_byte(&self, address: u16) -> u8 {
        let page = (address >> 13) as usize;
        self.read_view(page)[address as usize & (PAGE_SIZE - 1)]
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        let page = (address >> 13) as usize;
        self.write_view(page)[address as usize & (PAGE_SIZE - 1)] = value;
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

    /// Reads `buffer.len()` bytes starting at `address`, wrapping at 64 KiB.
    pub fn read_block(&self, address: u16, buffer: &mut [u8]) {
        let mut addr = address;
        for byte in buffer.iter_mut() {
            *byte = self.read_byte(addr);
            addr = addr.wrapping_add(1);
        }
    }

    /// Writes `data` starting at `address`, wrapping at 64 KiB.
    pub fn write_block(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.write_byte(addr, byte);
            addr = addr.wrapping_add(1);
        }
    }

    /// Contents of internal RAM regardless of the current mapping.
    pub fn ram(&self) -> &[u8] {
        self.ram.bytes()
    }

    fn remap(&mut self) {
        let lower = self.mode.lower();
        for page in 0..4 {
            let offset = page * PAGE_SIZE;
            let (read, write) = match lower {
                LowerMap::WriterRom => (
                    PageMapping::new(ReadSource::WriterRom, offset),
                    PageMapping::new(WriteTarget::Scratch, 0),
                ),
                LowerMap::InternalRam => (
                    PageMapping::new(ReadSource::Ram, offset),
                    PageMapping::new(WriteTarget::Ram, offset),
                ),
                LowerMap::ExpansionRam => self.expansion_ram_page(offset),
                LowerMap::Os7Ram if page == 0 => (
                    PageMapping::new(ReadSource::Os7Rom, 0),
                    PageMapping::new(WriteTarget::Scratch, 0),
                ),
                LowerMap::Os7Ram => (
                    PageMapping::new(ReadSource::Ram, offset),
                    PageMapping::new(WriteTarget::Ram, offset),
                ),
            };
            self.read_map[page] = read;
            self.write_map[page] = write;
        }

        for page in 4..PAGE_COUNT {
            let offset = page * PAGE_SIZE;
            let rom_offset = (page - 4) * PAGE_SIZE;
            let (read, write) = match self.mode.upper() {
                UpperMap::InternalRam => (
                    PageMapping::new(ReadSource::Ram, offset),
                    PageMapping::new(WriteTarget::Ram, offset),
                ),
                UpperMap::ExpansionRam => self.expansion_ram_page(offset),
                UpperMap::ExpansionRom => (
                    PageMapping::new(ReadSource::ExpansionRom, rom_offset),
                    PageMapping::new(WriteTarget::Scratch, 0),
                ),
                UpperMap::Cartridge => (
                    PageMapping::new(ReadSource::Cartridge, rom_offset),
                    PageMapping::new(WriteTarget::Scratch, 0),
                ),
            };
            self.read_map[page] = read;
            self.write_map[page] = write;
        }
    }

    fn expansion_ram_page(
        &self,
        offset: usize,
    ) -> (PageMapping<ReadSource>, PageMapping<WriteTarget>) {
        if self.expansion_ram.is_some() {
            (
                PageMapping::new(ReadSource::ExpansionRam, offset),
                PageMapping::new(WriteTarget::ExpansionRam, offset),
            )
        } else {
            (
                PageMapping::new(ReadSource::OpenBus, 0),
                PageMapping::new(WriteTarget::Scratch, 0),
            )
        }
    }
}
