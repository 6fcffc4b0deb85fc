use std::{cell::RefCell, rc::Rc};

use tracing_subscriber::fmt;
use wasmadam::{
    layout::{dcb_address, DEFAULT_BASE},
    media::BLOCK_SIZE,
    DeviceId, Machine, MachineBuilder, MediaImage, MediaSet, MediaStatus,
};

#[cfg(test)]
#[ctor::ctor]
fn init() {
    let fmt_subscriber = fmt::Subscriber::builder()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(fmt_subscriber)
        .expect("Unable to set global tracing subscriber");
}

fn get_machine() -> (Machine, Rc<RefCell<MediaSet>>) {
    let media = Rc::new(RefCell::new(MediaSet::new()));
    let machine = MachineBuilder::new()
        .mapping_mode(0x01)
        .host(media.clone())
        .build();
    (machine, media)
}

/// Fills DCB `slot` for `device` and returns its address.
fn setup_dcb(
    machine: &mut Machine,
    slot: usize,
    device: DeviceId,
    buffer: u16,
    count: u16,
    block: u32,
) -> u16 {
    let dcb = dcb_address(DEFAULT_BASE, slot);
    let (id_hi, id_lo) = device.nibbles();
    let mut bus = machine.bus.borrow_mut();
    bus.write_word(dcb + 1, buffer);
    bus.write_word(dcb + 3, count);
    bus.write_word(dcb + 5, block as u16);
    bus.write_word(dcb + 7, (block >> 16) as u16);
    bus.write_byte(dcb + 9, id_hi);
    bus.write_byte(dcb + 16, id_lo);
    dcb
}

fn patterned_image(blocks: usize) -> MediaImage {
    let data = (0..blocks * BLOCK_SIZE)
        .map(|i| (i / BLOCK_SIZE) as u8 ^ i as u8)
        .collect();
    MediaImage::new(data).unwrap()
}

#[test]
fn test_disk_read_block() {
    let (mut machine, media) = get_machine();
    media
        .borrow_mut()
        .insert_disk(1, patterned_image(4))
        .unwrap();
    let dcb = setup_dcb(&mut machine, 3, DeviceId::Disk(1), 0x6000, 1024, 2);

    machine.write_byte(dcb, 0x04);

    assert_eq!(machine.read_byte(dcb), 0x84);
    assert_eq!(machine.read_byte(dcb + 20), MediaStatus::Ok.code());
    let media = media.borrow();
    let expected = &media.disk(1).unwrap().data()[2 * BLOCK_SIZE..3 * BLOCK_SIZE];
    assert_eq!(&machine.ram()[0x6000..0x6400], expected);
    assert_eq!(machine.bus.borrow().adamnet.last_disk(), 1);
}

#[test]
fn test_disk_write_block() {
    let (mut machine, media) = get_machine();
    media
        .borrow_mut()
        .insert_disk(0, MediaImage::blank(2))
        .unwrap();
    machine.bus.borrow_mut().write_block(0x5000, b"ADAM");
    let dcb = setup_dcb(&mut machine, 4, DeviceId::Disk(0), 0x5000, 4, 1);

    machine.write_byte(dcb, 0x03);

    assert_eq!(machine.read_byte(dcb), 0x83);
    assert_eq!(machine.read_byte(dcb + 20), 0x00);
    let media = media.borrow();
    let data = media.disk(0).unwrap().data();
    assert_eq!(&data[BLOCK_SIZE..BLOCK_SIZE + 4], b"ADAM");
    assert!(data[..BLOCK_SIZE].iter().all(|&b| b == 0));
}

#[test]
fn test_write_protected_disk() {
    let (mut machine, media) = get_machine();
    let mut image = MediaImage::blank(1);
    image.set_write_protected(true);
    media.borrow_mut().insert_disk(0, image).unwrap();
    let dcb = setup_dcb(&mut machine, 4, DeviceId::Disk(0), 0x5000, 16, 0);

    machine.write_byte(dcb, 0x03);

    assert_eq!(machine.read_byte(dcb), 0x83);
    assert_eq!(machine.read_byte(dcb + 20), MediaStatus::WriteProtected.code());
}

#[test]
fn test_empty_drive_reports_missing_media() {
    let (mut machine, _media) = get_machine();
    let dcb = setup_dcb(&mut machine, 4, DeviceId::Disk(2), 0x5000, 1024, 0);
    machine.write_byte(0x5000, 0xAA);

    machine.write_byte(dcb, 0x04);

    assert_eq!(machine.read_byte(dcb), 0x84);
    assert_eq!(machine.read_byte(dcb + 20), MediaStatus::MissingMedia.code());
    assert_eq!(machine.read_byte(0x5000), 0xAA);
}

#[test]
fn test_repeat_last_disk() {
    let (mut machine, media) = get_machine();
    media
        .borrow_mut()
        .insert_disk(3, patterned_image(2))
        .unwrap();

    let first = setup_dcb(&mut machine, 3, DeviceId::Disk(3), 0x6000, 1, 0);
    machine.write_byte(first, 0x01);
    assert_eq!(machine.bus.borrow().adamnet.last_disk(), 3);

    let repeat = setup_dcb(&mut machine, 5, DeviceId::RepeatLastDisk, 0x6800, 16, 1);
    machine.write_byte(repeat, 0x04);

    assert_eq!(machine.read_byte(repeat), 0x84);
    assert_eq!(machine.read_byte(repeat + 20), 0x00);
    let media = media.borrow();
    let expected = &media.disk(3).unwrap().data()[BLOCK_SIZE..BLOCK_SIZE + 16];
    assert_eq!(&machine.ram()[0x6800..0x6810], expected);
}

#[test]
fn test_tape_index_decoding() {
    let (mut machine, media) = get_machine();
    media
        .borrow_mut()
        .insert_tape(3, patterned_image(1))
        .unwrap();

    let dcb = dcb_address(DEFAULT_BASE, 6);
    {
        let mut bus = machine.bus.borrow_mut();
        bus.write_word(dcb + 1, 0x4000);
        bus.write_word(dcb + 3, 8);
        bus.write_byte(dcb + 9, 0x01);
        bus.write_byte(dcb + 16, 0x09);
    }

    machine.write_byte(dcb, 0x04);

    assert_eq!(machine.read_byte(dcb), 0x84);
    assert_eq!(machine.read_byte(dcb + 20), 0x00);
    assert_eq!(&machine.ram()[0x4000..0x4008], &[0, 1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn test_block_number_uses_all_four_bytes() {
    let (mut machine, media) = get_machine();
    media
        .borrow_mut()
        .insert_disk(0, MediaImage::blank(1))
        .unwrap();
    let dcb = setup_dcb(&mut machine, 4, DeviceId::Disk(0), 0x5000, 16, 0x0001_0000);

    machine.write_byte(dcb, 0x04);

    assert_eq!(machine.read_byte(dcb + 20), MediaStatus::MissingBlock.code());
}

#[test]
fn test_printer_captures_buffer() {
    let (mut machine, media) = get_machine();
    machine.bus.borrow_mut().write_block(0x3000, b"HELLO ADAM");
    let dcb = setup_dcb(&mut machine, 1, DeviceId::Printer, 0x3000, 10, 0);

    machine.write_byte(dcb, 0x03);

    assert_eq!(machine.read_byte(dcb), 0x83);
    assert_eq!(media.borrow().printed(), b"HELLO ADAM");

    machine.write_byte(dcb, 0x01);
    assert_eq!(machine.read_byte(dcb), 0x81);
    assert_eq!(media.borrow_mut().take_printed(), b"HELLO ADAM".to_vec());
}

#[test]
fn test_null_host_reports_missing_media() {
    let mut machine = MachineBuilder::new().mapping_mode(0x01).build();
    let dcb = setup_dcb(&mut machine, 2, DeviceId::Tape(0), 0x5000, 16, 0);

    machine.write_byte(dcb, 0x04);

    assert_eq!(machine.read_byte(dcb), 0x84);
    assert_eq!(machine.read_byte(dcb + 20), MediaStatus::MissingMedia.code());
}
