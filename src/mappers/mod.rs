/*
Module: mappers

Dispatcher module: declares one submodule per supported board and re-exports
their public types. `crate::mapper::Board` selects between them by iNES number.

Implemented:
- NROM (Mapper 0)
- MMC1 (Mapper 1)
- UxROM (Mapper 2)
- CNROM (Mapper 3)
- MMC3 (Mapper 4) with scanline IRQ counter
- GxROM (Mapper 66)
*/

pub mod cnrom;
pub mod gxrom;
pub mod mmc1;
pub mod mmc3;
pub mod nrom;
pub mod uxrom;

pub use cnrom::Cnrom;
pub use gxrom::Gxrom;
pub use mmc1::Mmc1;
pub use mmc3::Mmc3;
pub use nrom::Nrom;
pub use uxrom::Uxrom;
