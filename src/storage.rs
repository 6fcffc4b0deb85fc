// Disk and tape drive DCB handling
//
// Both drive kinds speak the same block protocol: buffer pointer, byte count
// and a 32-bit block number in the DCB, status answered in byte 0 and the
// media outcome in byte 20.

use crate::{
    layout::{Command, DCB_BLOCK, DCB_BUFFER, DCB_COUNT, DCB_NODE_STATUS, RSP_STATUS},
    media::{MediaHost, MediaRequest, MediaStatus},
    memory::BankedAddressSpace,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveKind {
    Disk,
    Tape,
}

impl MediaRequest {
    /// Reads the command parameters out of the DCB at `dcb`.
    pub fn from_dcb(dcb: u16, command: Command, memory: &BankedAddressSpace) -> Self {
        let block_lo = memory.read_word(dcb.wrapping_add(DCB_BLOCK)) as u32;
        let block_hi = memory.read_word(dcb.wrapping_add(DCB_BLOCK + 2)) as u32;

        MediaRequest {
            command,
            block: (block_hi << 16) | block_lo,
            buffer: memory.read_word(dcb.wrapping_add(DCB_BUFFER)),
            len: memory.read_word(dcb.wrapping_add(DCB_COUNT)),
        }
    }
}

/// Runs a command written to the status byte of a disk or tape DCB.
pub fn command(
    kind: DriveKind,
    index: usize,
    dcb: u16,
    value: u8,
    memory: &mut BankedAddressSpace,
    host: &mut dyn MediaHost,
) {
    let request = MediaRequest::from_dcb(dcb, Command::from(value), memory);

    let mut data = match request.command {
        Command::Read => vec![0; request.len as usize],
        Command::Write => {
            let mut data = vec![0; request.len as usize];
            memory.read_block(request.buffer, &mut data);
            data
        }
        _ => Vec::new(),
    };

    let status = match kind {
        DriveKind::Disk => host.disk_op(index, &request, &mut data),
        DriveKind::Tape => host.tape_op(index, &request, &mut data),
    };

    if request.command == Command::Read && status == MediaStatus::Ok {
        memory.write_block(request.buffer, &data);
    }

    tracing::debug!(
        "[{:?}] Drive {} command {:02X} block {} -> {:?}",
        kind,
        index,
        value,
        request.block,
        status
    );

    memory.write_byte(dcb.wrapping_add(DCB_NODE_STATUS), status.code());
    memory.write_byte(dcb, RSP_STATUS | value);
}
