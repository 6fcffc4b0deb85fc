use std::{
    fmt::{self, Debug},
    fs::File,
    io::Read,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

/// Physical backing store that can appear in a page's read view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadSource {
    WriterRom,
    Os7Rom,
    Ram,
    ExpansionRam,
    ExpansionRom,
    Cartridge,
    /// Unpopulated address space, always reads 0xFF.
    OpenBus,
}

/// Physical backing store that can appear in a page's write view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WriteTarget {
    Ram,
    ExpansionRam,
    /// Sink for writes aimed at ROM or absent memory.
    Scratch,
}

impl fmt::Display for ReadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadSource::WriterRom => "SmartWriter ROM",
            ReadSource::Os7Rom => "OS7 ROM",
            ReadSource::Ram => "RAM",
            ReadSource::ExpansionRam => "expansion RAM",
            ReadSource::ExpansionRom => "expansion ROM",
            ReadSource::Cartridge => "cartridge ROM",
            ReadSource::OpenBus => "open bus",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for WriteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteTarget::Ram => "RAM",
            WriteTarget::ExpansionRam => "expansion RAM",
            WriteTarget::Scratch => "scratch",
        };
        write!(f, "{}", name)
    }
}

pub trait Region: Debug {
    fn bytes(&self) -> &[u8];

    fn size(&self) -> usize {
        self.bytes().len()
    }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Clone)]
pub struct RomRegion {
    pub rom_path: Option<PathBuf>,
    pub data: Vec<u8>,
}

impl RomRegion {
    /// Builds a ROM of `size` bytes. Images shorter than `size` are padded
    /// with 0xFF, longer ones are truncated.
    pub fn new(rom: &[u8], size: usize) -> Self {
        let mut data = vec![0xFF; size];
        let len = rom.len().min(size);
        data[..len].copy_from_slice(&rom[..len]);

        if rom.len() > size {
            tracing::warn!(
                "[MEM] ROM image of {:#06X} bytes truncated to {:#06X}",
                rom.len(),
                size
            );
        }

        RomRegion {
            rom_path: None,
            data,
        }
    }

    /// An unpopulated region.
    pub fn blank(size: usize) -> Self {
        Self::new(&[], size)
    }

    pub fn load(rom_path: PathBuf, size: usize) -> anyhow::Result<Self> {
        let mut file = File::open(&rom_path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        let mut rom = Self::new(&buffer, size);
        rom.rom_path = Some(rom_path);

        Ok(rom)
    }

    pub fn replace(&mut self, rom: &[u8]) {
        let size = self.data.len();
        *self = Self::new(rom, size);
    }
}

impl Region for RomRegion {
    fn bytes(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Clone)]
pub struct RamRegion {
    pub data: Vec<u8>,
}

impl RamRegion {
    pub fn new(size: usize) -> Self {
        RamRegion {
            data: vec![0x00; size],
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0x00);
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Region for RamRegion {
    fn bytes(&self) -> &[u8] {
        &self.data
    }
}
