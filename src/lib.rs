#![doc = r#"
famicore: a cycle-stepped NES emulator core.

Modules:
- bus: CPU address decoding, work RAM, controller ports, OAM DMA and the system tick
- cartridge: iNES / NES 2.0 loader; owns PRG/CHR memory and the mapper
- config: JSON frontend settings
- controller: standard controller shift register
- cpu: 6502 core (opcode table, addressing modes, instruction semantics, interrupts)
- mapper: `Mapper` trait and the closed `Board` enum
- mappers: NROM, MMC1, UxROM, CNROM, MMC3, GxROM
- nes: the top-level machine and save-state files
- ppu: 2C02 registers, rendering pipeline and pixel output
- ppu_bus: the PPU's view of the cartridge
- savestate: binary state encoding
- frontend (feature `display`): winit + pixels window

In tests, shared iNES builders are available under `crate::test_utils`.
"#]

pub mod bus;
pub mod cartridge;
pub mod config;
pub mod controller;
pub mod cpu;
pub mod mapper;
pub mod mappers;
pub mod nes;
pub mod ppu;
pub mod ppu_bus;
pub mod savestate;

#[cfg(feature = "display")]
pub mod frontend;

pub use bus::Bus;
pub use cartridge::Cartridge;
pub use config::Config;
pub use controller::{Button, Controller};
pub use cpu::Cpu;
pub use nes::Nes;
pub use ppu::{FrameBuffer, PixelSink, Ppu};

// Shared test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;
