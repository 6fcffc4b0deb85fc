use tracing_subscriber::fmt;
use wasmadam::{
    layout::{dcb_address, DEFAULT_BASE, WINDOW_SIZE},
    Machine, MachineBuilder,
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

fn get_machine() -> Machine {
    MachineBuilder::new().mapping_mode(0x01).build()
}

fn is_live(machine: &Machine, address: u16) -> bool {
    machine.bus.borrow().is_live(address)
}

fn in_window(base: u16, address: u16) -> bool {
    (address.wrapping_sub(base) as usize) < WINDOW_SIZE
}

#[test]
fn test_reset_arms_default_window() {
    let mut machine = get_machine();
    machine.write_byte(0xFEC0, 0x03);
    machine.reset();

    assert_eq!(machine.adamnet_base(), DEFAULT_BASE);
    for address in 0..=u16::MAX {
        assert_eq!(
            is_live(&machine, address),
            in_window(DEFAULT_BASE, address),
            "address {:04X}",
            address
        );
    }

    let bus = machine.bus.borrow();
    assert_eq!(bus.adamnet.active_devices(), 15);
    assert_eq!(bus.adamnet.keyboard_status(), 0);
    assert_eq!(bus.adamnet.last_disk(), 0);
    assert_eq!(bus.adamnet.presence().count(), WINDOW_SIZE);
}

#[test]
fn test_sync_commands_echo_with_bit_seven() {
    let mut machine = get_machine();
    machine.write_byte(0xFEC0, 0x01);
    assert_eq!(machine.read_byte(0xFEC0), 0x81);

    machine.write_byte(0xFEC0, 0x02);
    assert_eq!(machine.read_byte(0xFEC0), 0x82);
}

#[test]
fn test_unimplemented_header_command_is_stored_raw() {
    let mut machine = get_machine();
    machine.write_byte(0xFEC0, 0x05);
    assert_eq!(machine.read_byte(0xFEC0), 0x05);

    machine.write_byte(0xFEC0, 0x00);
    assert_eq!(machine.read_byte(0xFEC0), 0x00);
    assert_eq!(machine.adamnet_base(), DEFAULT_BASE);
}

#[test]
fn test_relocation_moves_the_window() {
    let mut machine = get_machine();
    machine.write_byte(0xFEC1, 0x00);
    machine.write_byte(0xFEC2, 0x40);
    machine.write_byte(0xFEC0, 0x03);

    assert_eq!(machine.adamnet_base(), 0x4000);
    assert_eq!(machine.read_byte(0xFEC0), 0x83);

    for address in 0..=u16::MAX {
        assert_eq!(
            is_live(&machine, address),
            in_window(0x4000, address),
            "address {:04X}",
            address
        );
    }

    // Header at the new base answers
    machine.write_byte(0x4000, 0x01);
    assert_eq!(machine.read_byte(0x4000), 0x81);
}

#[test]
fn test_relocation_is_idempotent_on_presence() {
    let machine = get_machine();
    let mut bus = machine.bus.borrow_mut();
    bus.adamnet.relocate(0x9000);
    let once: Vec<u16> = bus.adamnet.presence().iter().collect();
    bus.adamnet.relocate(0x9000);
    let twice: Vec<u16> = bus.adamnet.presence().iter().collect();

    assert_eq!(once, twice);
    assert_eq!(twice.len(), WINDOW_SIZE);
    assert!(twice.iter().all(|&address| in_window(0x9000, address)));
}

#[test]
fn test_relocation_wraps_at_top_of_memory() {
    let machine = get_machine();
    let mut bus = machine.bus.borrow_mut();
    bus.adamnet.relocate(0xFFF0);

    assert!(bus.is_live(0xFFF0));
    assert!(bus.is_live(0xFFFF));
    assert!(bus.is_live(0x0000));
    assert!(bus.is_live(0xFFF0u16.wrapping_add(WINDOW_SIZE as u16 - 1)));
    assert!(!bus.is_live(0xFFF0u16.wrapping_add(WINDOW_SIZE as u16)));
    assert!(!bus.is_live(DEFAULT_BASE));
}

#[test]
fn test_device_count_truncates_live_window() {
    let mut machine = get_machine();
    machine.write_byte(0xFEC3, 0x02);

    assert_eq!(machine.read_byte(0xFEC3), 0x82);
    assert_eq!(machine.bus.borrow().adamnet.active_devices(), 2);

    let end = dcb_address(DEFAULT_BASE, 2);
    assert!(is_live(&machine, end - 1));
    assert!(!is_live(&machine, end));
    assert!(machine.bus.borrow().adamnet.presence().contains(end));

    // Count field is 7 bits, clamped to 15
    machine.write_byte(0xFEC3, 0x7F);
    assert_eq!(machine.read_byte(0xFEC3), 0xFF);
    assert_eq!(machine.bus.borrow().adamnet.active_devices(), 15);
}

#[test]
fn test_zero_devices_leaves_header_live() {
    let mut machine = get_machine();
    machine.write_byte(0xFEC3, 0x00);

    assert!(is_live(&machine, 0xFEC0));
    assert!(is_live(&machine, 0xFEC3));
    assert!(!is_live(&machine, 0xFEC4));
}

#[test]
fn test_relocation_rearms_all_slots() {
    let mut machine = get_machine();
    machine.write_byte(0xFEC3, 0x01);
    machine.write_byte(0xFEC1, 0x00);
    machine.write_byte(0xFEC2, 0x80);
    machine.write_byte(0xFEC0, 0x03);

    assert_eq!(machine.bus.borrow().adamnet.active_devices(), 15);
    assert!(is_live(&machine, dcb_address(0x8000, 14)));
}

#[test]
fn test_unknown_device_is_nacked() {
    let mut machine = get_machine();
    let dcb = dcb_address(DEFAULT_BASE, 2);
    machine.write_byte(dcb + 9, 0x03);
    machine.write_byte(dcb + 16, 0x03);
    machine.write_byte(dcb, 0x01);

    assert_eq!(machine.read_byte(dcb), 0x9B);
}

#[test]
fn test_status_writes_with_bit_seven_or_zero_are_plain_stores() {
    let mut machine = get_machine();
    let dcb = dcb_address(DEFAULT_BASE, 2);
    machine.write_byte(dcb + 9, 0x03);
    machine.write_byte(dcb + 16, 0x03);

    machine.write_byte(dcb, 0x00);
    assert_eq!(machine.read_byte(dcb), 0x00);
    machine.write_byte(dcb, 0x85);
    assert_eq!(machine.read_byte(dcb), 0x85);
}

#[test]
fn test_non_status_dcb_bytes_do_not_dispatch() {
    let mut machine = get_machine();
    let dcb = dcb_address(DEFAULT_BASE, 2);
    machine.write_byte(dcb + 9, 0x03);
    machine.write_byte(dcb + 16, 0x03);

    machine.write_byte(dcb + 1, 0x01);
    assert_eq!(machine.read_byte(dcb + 1), 0x01);
    assert_eq!(machine.read_byte(dcb), 0x00);
}

#[test]
fn test_first_slot_echoes_before_dispatch() {
    let mut machine = get_machine();
    let dcb = dcb_address(DEFAULT_BASE, 0);
    // Printer in slot 0
    machine.write_byte(dcb + 16, 0x02);

    machine.write_byte(dcb, 0x01);
    assert_eq!(machine.read_byte(dcb), 0x81);

    // Echo happens even for values the dispatcher ignores
    machine.write_byte(dcb, 0x80);
    assert_eq!(machine.read_byte(dcb), 0x80);
}

#[test]
fn test_bus_hidden_when_upper_band_is_not_internal_ram() {
    let mut machine = get_machine();
    machine.port_out(0x7F, 0x0D);

    assert!(!is_live(&machine, DEFAULT_BASE));
    // Writes land in scratch and reads come from the cartridge
    machine.write_byte(0xFEC0, 0x01);
    assert_eq!(machine.read_byte(0xFEC0), 0xFF);

    machine.port_out(0x7F, 0x01);
    assert!(is_live(&machine, DEFAULT_BASE));
    assert_eq!(machine.read_byte(0xFEC0), 0x00);
}

#[test]
fn test_lower_band_rules() {
    let machine = get_machine();
    let mut bus = machine.bus.borrow_mut();
    bus.adamnet.relocate(0x1000);
    bus.output(0x7F, 0x03);
    assert!(!bus.is_live(0x1000));
    bus.output(0x7F, 0x01);
    assert!(bus.is_live(0x1000));

    bus.adamnet.relocate(0x3000);
    bus.output(0x7F, 0x03);
    assert!(bus.is_live(0x3000));
    bus.output(0x7F, 0x00);
    assert!(!bus.is_live(0x3000));
    bus.output(0x7F, 0x02);
    assert!(!bus.is_live(0x3000));
}
