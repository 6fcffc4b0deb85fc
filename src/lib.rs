pub mod adamnet;
pub mod bus;
pub mod config;
pub mod device;
pub mod keyboard;
pub mod layout;
pub mod machine;
pub mod media;
pub mod memory;
pub mod presence;
pub mod printer;
pub mod region;
pub mod storage;
pub mod utils;

pub use adamnet::AdamNet;
pub use bus::{Bus, CpuIo};
pub use config::{AdamConfig, ConfigError};
pub use device::DeviceId;
pub use keyboard::Keyboard;
pub use machine::{Io, Machine, MachineBuilder};
pub use media::{MediaError, MediaHost, MediaImage, MediaRequest, MediaSet, MediaStatus, NullHost};
pub use memory::{BankedAddressSpace, MappingMode};
pub use utils::hexdump;
use wasm_bindgen::prelude::*;

/// Builds a machine with the given OS7 ROM and the memory map used by
/// cartridge games (OS7 + internal RAM).
pub fn get_machine(os7_rom: &[u8]) -> Machine {
    MachineBuilder::new()
        .os7_rom(os7_rom)
        .mapping_mode(0x03)
        .build()
}

/// Installs a `tracing` subscriber for native hosts. Honours `RUST_LOG`
/// and falls back to `info`.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[wasm_bindgen(js_name = Machine)]
pub struct JsMachine(Machine);

#[wasm_bindgen(js_class = Machine)]
impl JsMachine {
    #[wasm_bindgen(constructor)]
    pub fn new(os7_rom: &[u8]) -> Self {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();

        Self(get_machine(os7_rom))
    }

    pub fn reset(&mut self) {
        self.0.reset();
    }

    #[wasm_bindgen(getter)]
    pub fn ram(&self) -> Vec<u8> {
        self.0.ram()
    }

    #[wasm_bindgen(getter)]
    pub fn base(&self) -> u16 {
        self.0.adamnet_base()
    }

    #[wasm_bindgen(getter = keyboardStatus)]
    pub fn keyboard_status(&self) -> u8 {
        self.0.keyboard_status()
    }

    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, key: String) {
        self.0.key_down(&key);
    }

    #[wasm_bindgen(js_name = enqueueKey)]
    pub fn enqueue_key(&mut self, code: u16) {
        self.0.enqueue_key(code);
    }

    pub fn read(&self, address: u16) -> u8 {
        self.0.read_byte(address)
    }

    pub fn write(&mut self, address: u16, value: u8) {
        self.0.write_byte(address, value);
    }

    #[wasm_bindgen(js_name = portOut)]
    pub fn port_out(&mut self, port: u8, value: u8) {
        self.0.port_out(port, value);
    }

    #[wasm_bindgen(js_name = portIn)]
    pub fn port_in(&self, port: u8) -> u8 {
        self.0.port_in(port)
    }

    #[wasm_bindgen(js_name = memoryDump)]
    pub fn memory_dump(&self, start: u16, end: u16) -> String {
        self.0.memory_dump(start, end)
    }
}
