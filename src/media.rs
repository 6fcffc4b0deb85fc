// Boundary to the disk/tape image subsystem and the printer
//
// The AdamNet engine never touches image files. Disk, tape and printer DCB
// commands are turned into calls on a `MediaHost`, which answers with a
// status code the engine stores in the DCB for the guest to inspect.

use std::{cell::RefCell, rc::Rc};

use thiserror::Error;

use crate::{
    device::{DISK_COUNT, TAPE_COUNT},
    layout::Command,
};

pub const BLOCK_SIZE: usize = 1024;

/// Outcome of a media operation, stored in DCB byte 20.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaStatus {
    Ok,
    CrcError,
    MissingBlock,
    MissingMedia,
    NoDevice,
    WriteProtected,
}

impl MediaStatus {
    pub fn code(&self) -> u8 {
        match self {
            MediaStatus::Ok => 0x00,
            MediaStatus::CrcError => 0x02,
            MediaStatus::MissingBlock => 0x03,
            MediaStatus::MissingMedia => 0x04,
            MediaStatus::NoDevice => 0x05,
            MediaStatus::WriteProtected => 0x06,
        }
    }
}

/// Parameters a block device command carries in its DCB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaRequest {
    pub command: Command,
    pub block: u32,
    pub buffer: u16,
    pub len: u16,
}

/// Synchronous collaborator performing the actual media work.
///
/// For `Command::Read` the host fills `data`; for `Command::Write` `data`
/// holds the bytes gathered from guest memory. Other commands get an empty
/// slice.
pub trait MediaHost {
    fn disk_op(&mut self, index: usize, request: &MediaRequest, data: &mut [u8]) -> MediaStatus;

    fn tape_op(&mut self, index: usize, request: &MediaRequest, data: &mut [u8]) -> MediaStatus;

    fn print(&mut self, data: &[u8]);
}

/// A host with nothing attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl MediaHost for NullHost {
    fn disk_op(&mut self, _index: usize, _request: &MediaRequest, _data: &mut [u8]) -> MediaStatus {
        MediaStatus::MissingMedia
    }

    fn tape_op(&mut self, _index: usize, _request: &MediaRequest, _data: &mut [u8]) -> MediaStatus {
        MediaStatus::MissingMedia
    }

    fn print(&mut self, data: &[u8]) {
        tracing::trace!("[PRN] Discarding {} bytes", data.len());
    }
}

/// Lets the machine and its owner share one host.
impl<T: MediaHost> MediaHost for Rc<RefCell<T>> {
    fn disk_op(&mut self, index: usize, request: &MediaRequest, data: &mut [u8]) -> MediaStatus {
        self.borrow_mut().disk_op(index, request, data)
    }

    fn tape_op(&mut self, index: usize, request: &MediaRequest, data: &mut [u8]) -> MediaStatus {
        self.borrow_mut().tape_op(index, request, data)
    }

    fn print(&mut self, data: &[u8]) {
        self.borrow_mut().print(data)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("invalid {kind} drive {index}")]
    InvalidDrive { kind: &'static str, index: usize },
    #[error("no media in {kind} drive {index}")]
    NoMedia { kind: &'static str, index: usize },
    #[error("image size {0} is not a multiple of 1024 bytes")]
    InvalidSize(usize),
}

/// An inserted disk or tape image, kept in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaImage {
    data: Vec<u8>,
    write_protected: bool,
}

impl MediaImage {
    pub fn new(data: Vec<u8>) -> Result<Self, MediaError> {
        if data.len() % BLOCK_SIZE != 0 {
            return Err(MediaError::InvalidSize(data.len()));
        }

        Ok(Self {
            data,
            write_protected: false,
        })
    }

    pub fn blank(blocks: usize) -> Self {
        Self {
            data: vec![0; blocks * BLOCK_SIZE],
            write_protected: false,
        }
    }

    pub fn set_write_protected(&mut self, write_protected: bool) {
        self.write_protected = write_protected;
    }

    pub fn is_write_protected(&self) -> bool {
        self.write_protected
    }

    pub fn blocks(&self) -> usize {
        self.data.len() / BLOCK_SIZE
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn apply(&mut self, request: &MediaRequest, data: &mut [u8]) -> MediaStatus {
        match request.command {
            Command::Status | Command::SoftReset | Command::Other(_) => MediaStatus::Ok,
            Command::Read => {
                let Some(range) = self.range(request.block, data.len()) else {
                    return MediaStatus::MissingBlock;
                };
                data.copy_from_slice(&self.data[range]);
                MediaStatus::Ok
            }
            Command::Write => {
                if self.write_protected {
                    return MediaStatus::WriteProtected;
                }
                let Some(range) = self.range(request.block, data.len()) else {
                    return MediaStatus::MissingBlock;
                };
                self.data[range].copy_from_slice(data);
                MediaStatus::Ok
            }
        }
    }

    fn range(&self, block: u32, len: usize) -> Option<std::ops::Range<usize>> {
        let start = (block as usize).checked_mul(BLOCK_SIZE)?;
        let end = start.checked_add(len)?;
        (end <= self.data.len()).then_some(start..end)
    }
}

/// In-memory media: four disk drives, four tape drives and a printer
/// capture buffer.
#[derive(Debug, Default, Clone)]
pub struct MediaSet {
    disks: [Option<MediaImage>; DISK_COUNT],
    tapes: [Option<MediaImage>; TAPE_COUNT],
    printed: Vec<u8>,
}

impl MediaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_disk(&mut self, index: usize, image: MediaImage) -> Result<(), MediaError> {
        let slot = self
            .disks
            .get_mut(index)
            .ok_or(MediaError::InvalidDrive { kind: "disk", index })?;
        *slot = Some(image);
        tracing::info!("[DISK] Media inserted in disk drive {}", index);
        Ok(())
    }

    pub fn eject_disk(&mut self, index: usize) -> Result<MediaImage, MediaError> {
        let slot = self
            .disks
            .get_mut(index)
            .ok_or(MediaError::InvalidDrive { kind: "disk", index })?;
        let image = slot.take().ok_or(MediaError::NoMedia { kind: "disk", index })?;
        tracing::info!("[DISK] Media ejected from disk drive {}", index);
        Ok(image)
    }

    pub fn insert_tape(&mut self, index: usize, image: MediaImage) -> Result<(), MediaError> {
        let slot = self
            .tapes
            .get_mut(index)
            .ok_or(MediaError::InvalidDrive { kind: "tape", index })?;
        *slot = Some(image);
        tracing::info!("[TAPE] Media inserted in tape drive {}", index);
        Ok(())
    }

    pub fn eject_tape(&mut self, index: usize) -> Result<MediaImage, MediaError> {
        let slot = self
            .tapes
            .get_mut(index)
            .ok_or(MediaError::InvalidDrive { kind: "tape", index })?;
        let image = slot.take().ok_or(MediaError::NoMedia { kind: "tape", index })?;
        tracing::info!("[TAPE] Media ejected from tape drive {}", index);
        Ok(image)
    }

    pub fn disk(&self, index: usize) -> Option<&MediaImage> {
        self.disks.get(index).and_then(Option::as_ref)
    }

    pub fn tape(&self, index: usize) -> Option<&MediaImage> {
        self.tapes.get(index).and_then(Option::as_ref)
    }

    pub fn printed(&self) -> &[u8] {
        &self.printed
    }

    pub fn take_printed(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.printed)
    }

    fn run(
        drive: Option<&mut Option<MediaImage>>,
        request: &MediaRequest,
        data: &mut [u8],
    ) -> MediaStatus {
        match drive {
            None => MediaStatus::NoDevice,
            Some(None) => MediaStatus::MissingMedia,
            Some(Some(image)) => image.apply(request, data),
        }
    }
}

impl MediaHost for MediaSet {
    fn disk_op(&mut self, index: usize, request: &MediaRequest, data: &mut [u8]) -> MediaStatus {
        let status = Self::run(self.disks.get_mut(index), request, data);
        tracing::debug!(
            "[DISK] Drive {} {:?} block {} len {} -> {:?}",
            index,
            request.command,
            request.block,
            request.len,
            status
        );
        status
    }

    fn tape_op(&mut self, index: usize, request: &MediaRequest, data: &mut [u8]) -> MediaStatus {
        let status = Self::run(self.tapes.get_mut(index), request, data);
        tracing::debug!(
            "[TAPE] Drive {} {:?} block {} len {} -> {:?}",
            index,
            request.command,
            request.block,
            request.len,
            status
        );
        status
    }

    fn print(&mut self, data: &[u8]) {
        self.printed.extend_from_slice(data);
    }
}
