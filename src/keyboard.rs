use std::collections::VecDeque;

use crate::{
    layout::{Command, DCB_BUFFER, DCB_COUNT, RSP_NAK, RSP_SHORT, RSP_STATUS},
    memory::BankedAddressSpace,
};

pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// AdamNet keyboard: a FIFO of key codes fed by the host and drained by the
/// guest through the keyboard DCB.
#[derive(Debug, Clone)]
pub struct Keyboard {
    status: u8,
    queue: VecDeque<u16>,
    capacity: usize,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Keyboard {
            status: 0,
            queue: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn reset(&mut self) {
        self.status = 0;
        self.queue.clear();
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn enqueue(&mut self, code: u16) {
        if self.queue.len() >= self.capacity {
            tracing::debug!("[KBD] Queue full, dropping key {:#06X}", code);
            return;
        }
        self.queue.push_back(code);
    }

    /// Maps a browser `KeyboardEvent.code` name to its ADAM key code and
    /// queues it.
    pub fn key_down(&mut self, key: &str) {
        if let Some(mapping) = DEFAULT_MAPPING.iter().find(|m| m.key == key) {
            self.enqueue(mapping.code);
        }
    }

    /// Handles a command written to the keyboard DCB status byte at `dcb`.
    pub fn command(&mut self, dcb: u16, value: u8, memory: &mut BankedAddressSpace) {
        match Command::from(value) {
            Command::Status | Command::SoftReset => {
                self.status = RSP_STATUS;
                memory.write_byte(dcb, self.status);
            }
            Command::Write => {
                memory.write_byte(dcb, RSP_NAK);
                self.status = RSP_STATUS;
            }
            Command::Read => self.read_into(dcb, memory),
            Command::Other(other) => {
                tracing::debug!("[KBD] Command {:02X} acknowledged", other);
                memory.write_byte(dcb, RSP_STATUS | other);
            }
        }
    }

    fn read_into(&mut self, dcb: u16, memory: &mut BankedAddressSpace) {
        let mut buffer = memory.read_word(dcb.wrapping_add(DCB_BUFFER));
        let count = memory.read_word(dcb.wrapping_add(DCB_COUNT));

        for delivered in 0..count {
            let Some(code) = self.queue.pop_front() else {
                tracing::trace!("[KBD] Short read: {} of {} keys", delivered, count);
                self.status = RSP_SHORT;
                return;
            };
            memory.write_byte(buffer, code as u8);
            buffer = buffer.wrapping_add(1);
        }

        tracing::trace!("[KBD] Delivered {} keys", count);
        self.status = RSP_STATUS;
        memory.write_byte(dcb, 0x00);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Mapping {
    key: &'static str,
    code: u16,
}

impl Mapping {
    const fn new(key: &'static str, code: u16) -> Self {
        Mapping { key, code }
    }
}

static DEFAULT_MAPPING: &[Mapping] = &[
    Mapping::new("Digit0", b'0' as u16),
    Mapping::new("Digit1", b'1' as u16),
    Mapping::new("Digit2", b'2' as u16),
    Mapping::new("Digit3", b'3' as u16),
    Mapping::new("Digit4", b'4' as u16),
    Mapping::new("Digit5", b'5' as u16),
    Mapping::new("Digit6", b'6' as u16),
    Mapping::new("Digit7", b'7' as u16),
    Mapping::new("Digit8", b'8' as u16),
    Mapping::new("Digit9", b'9' as u16),
    Mapping::new("KeyA", b'a' as u16),
    Mapping::new("KeyB", b'b' as u16),
    Mapping::new("KeyC", b'c' as u16),
    Mapping::new("KeyD", b'd' as u16),
    Mapping::new("KeyE", b'e' as u16),
    Mapping::new("KeyF", b'f' as u16),
    Mapping::new("KeyG", b'g' as u16),
    Mapping::new("KeyH", b'h' as u16),
    Mapping::new("KeyI", b'i' as u16),
    Mapping::new("KeyJ", b'j' as u16),
    Mapping::new("KeyK", b'k' as u16),
    Mapping::new("KeyL", b'l' as u16),
    Mapping::new("KeyM", b'm' as u16),
    Mapping::new("KeyN", b'n' as u16),
    Mapping::new("KeyO", b'o' as u16),
    Mapping::new("KeyP", b'p' as u16),
    Mapping::new("KeyQ", b'q' as u16),
    Mapping::new("KeyR", b'r' as u16),
    Mapping::new("KeyS", b's' as u16),
    Mapping::new("KeyT", b't' as u16),
    Mapping::new("KeyU", b'u' as u16),
    Mapping::new("KeyV", b'v' as u16),
    Mapping::new("KeyW", b'w' as u16),
    Mapping::new("KeyX", b'x' as u16),
    Mapping::new("KeyY", b'y' as u16),
    Mapping::new("KeyZ", b'z' as u16),
    Mapping::new("Minus", b'-' as u16),
    Mapping::new("Equal", b'=' as u16),
    Mapping::new("Backslash", b'\\' as u16),
    Mapping::new("BracketLeft", b'[' as u16),
    Mapping::new("BracketRight", b']' as u16),
    Mapping::new("Semicolon", b';' as u16),
    Mapping::new("Quote", b'\'' as u16),
    Mapping::new("Comma", b',' as u16),
    Mapping::new("Period", b'.' as u16),
    Mapping::new("Slash", b'/' as u16),
    Mapping::new("Space", b' ' as u16),
    Mapping::new("Enter", 0x0D),
    Mapping::new("Backspace", 0x08),
    Mapping::new("Tab", 0x09),
    Mapping::new("Escape", 0x1B),
    // Smart keys I-VI
    Mapping::new("F1", 0x81),
    Mapping::new("F2", 0x82),
    Mapping::new("F3", 0x83),
    Mapping::new("F4", 0x84),
    Mapping::new("F5", 0x85),
    Mapping::new("F6", 0x86),
    Mapping::new("Home", 0x80),
    Mapping::new("Insert", 0x94),
    Mapping::new("Delete", 0x97),
    Mapping::new("ArrowUp", 0xA0),
    Mapping::new("ArrowRight", 0xA1),
    Mapping::new("ArrowDown", 0xA2),
    Mapping::new("ArrowLeft", 0xA3),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_queue_drops_new_keys() {
        let mut keyboard = Keyboard::with_capacity(2);
        keyboard.enqueue(1);
        keyboard.enqueue(2);
        keyboard.enqueue(3);
        assert_eq!(keyboard.pending(), 2);
        assert_eq!(keyboard.queue.front(), Some(&1));
    }

    #[test]
    fn test_key_names() {
        let mut keyboard = Keyboard::new();
        keyboard.key_down("KeyQ");
        keyboard.key_down("Enter");
        keyboard.key_down("NotAKey");
        assert_eq!(keyboard.queue, [b'q' as u16, 0x0D]);
    }
}
