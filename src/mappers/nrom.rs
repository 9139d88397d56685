//! NROM (mapper 0).
//!
//! - PRG: 16 KiB (mirrored into both halves of $8000-$FFFF) or 32 KiB direct.
//! - CHR: a fixed 8 KiB window. Writable only when the cartridge carries CHR RAM.
//! - No registers. CPU writes into $8000-$FFFF land in PRG memory at the mirrored offset.

use crate::mapper::{MapRead, MapWrite, Mapper, load_bank_counts, save_bank_counts};
use crate::savestate::{SaveStateError, StateReader, StateWriter};

#[derive(Debug, Clone)]
pub struct Nrom {
    prg_banks: u16,
    chr_banks: u16,
}

impl Nrom {
    pub fn new(prg_banks: u16, chr_banks: u16) -> Self {
        Self {
            prg_banks,
            chr_banks,
        }
    }

    fn prg_mask(&self) -> u16 {
        if self.prg_banks > 1 { 0x7FFF } else { 0x3FFF }
    }
}

impl Mapper for Nrom {
    fn mapper_id(&self) -> u8 {
        0
    }

    fn cpu_map_read(&self, addr: u16) -> Option<MapRead> {
        (addr >= 0x8000).then(|| MapRead::Prg((addr & self.prg_mask()) as usize))
    }

    fn cpu_map_write(&mut self, addr: u16, _data: u8) -> Option<MapWrite> {
        (addr >= 0x8000).then(|| MapWrite::Prg((addr & self.prg_mask()) as usize))
    }

    fn ppu_map_read(&self, addr: u16) -> Option<usize> {
        (addr < 0x2000).then_some(addr as usize)
    }

    fn ppu_map_write(&self, addr: u16) -> Option<usize> {
        (addr < 0x2000 && self.chr_banks == 0).then_some(addr as usize)
    }

    fn reset(&mut self) {}

    fn save(&self, w: &mut StateWriter) {
        save_bank_counts(w, self.prg_banks, self.chr_banks);
    }

    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError> {
        (self.prg_banks, self.chr_banks) = load_bank_counts(r)?;
        Ok(())
    }
}
