use crate::{
    layout::{Command, DCB_BUFFER, DCB_COUNT, RSP_STATUS},
    media::MediaHost,
    memory::BankedAddressSpace,
};

/// Handles a command written to the printer DCB status byte at `dcb`. A
/// write command sends `count` bytes from the DCB buffer to the host.
pub fn command(dcb: u16, value: u8, memory: &mut BankedAddressSpace, host: &mut dyn MediaHost) {
    if Command::from(value) == Command::Write {
        let buffer = memory.read_word(dcb.wrapping_add(DCB_BUFFER));
        let count = memory.read_word(dcb.wrapping_add(DCB_COUNT));

        let mut data = vec![0; count as usize];
        memory.read_block(buffer, &mut data);
        tracing::debug!("[PRN] Printing {} bytes from {:04X}", count, buffer);
        host.print(&data);
    }

    memory.write_byte(dcb, RSP_STATUS | value);
}
