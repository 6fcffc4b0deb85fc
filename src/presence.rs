const WORDS: usize = 0x10000 / 64;

/// One bit per CPU address, set for every address owned by the AdamNet
/// control structure.
#[derive(Clone, PartialEq, Eq)]
pub struct PresenceIndex {
    bits: Box<[u64; WORDS]>,
}

impl Default for PresenceIndex {
    fn default() -> Self {
        Self {
            bits: Box::new([0; WORDS]),
        }
    }
}

impl PresenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, address: u16) -> bool {
        let address = address as usize;
        self.bits[address >> 6] & (1 << (address & 63)) != 0
    }

    pub fn insert(&mut self, address: u16) {
        let address = address as usize;
        self.bits[address >> 6] |= 1 << (address & 63);
    }

    pub fn remove(&mut self, address: u16) {
        let address = address as usize;
        self.bits[address >> 6] &= !(1 << (address & 63));
    }

    /// Flags `len` addresses from `start`, wrapping at 64 KiB.
    pub fn insert_range(&mut self, start: u16, len: usize) {
        for offset in 0..len {
            self.insert(start.wrapping_add(offset as u16));
        }
    }

    /// Clears `len` addresses from `start`, wrapping at 64 KiB.
    pub fn remove_range(&mut self, start: u16, len: usize) {
        for offset in 0..len {
            self.remove(start.wrapping_add(offset as u16));
        }
    }

    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    pub fn count(&self) -> usize {
        self.bits.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        (0..=u16::MAX).filter(|&address| self.contains(address))
    }
}

impl std::fmt::Debug for PresenceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceIndex")
            .field("count", &self.count())
            .finish()
    }
}
