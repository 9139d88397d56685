//! CNROM (mapper 3).
//!
//! - PRG: fixed 16 KiB (mirrored) or 32 KiB.
//! - CHR: 8 KiB bank selected by the low two bits of any write to $8000-$FFFF.

use crate::mapper::{MapRead, MapWrite, Mapper, load_bank_counts, save_bank_counts};
use crate::savestate::{SaveStateError, StateReader, StateWriter};

#[derive(Debug, Clone)]
pub struct Cnrom {
    prg_banks: u16,
    chr_banks: u16,
    chr_bank: u8,
}

impl Cnrom {
    pub fn new(prg_banks: u16, chr_banks: u16) -> Self {
        Self {
            prg_banks,
            chr_banks,
            chr_bank: 0,
        }
    }

    pub(crate) fn current_chr_bank(&self) -> u8 {
        self.chr_bank
    }
}

impl Mapper for Cnrom {
    fn mapper_id(&self) -> u8 {
        3
    }

    fn cpu_map_read(&self, addr: u16) -> Option<MapRead> {
        if addr < 0x8000 {
            return None;
        }
        let mask = if self.prg_banks > 1 { 0x7FFF } else { 0x3FFF };
        Some(MapRead::Prg((addr & mask) as usize))
    }

    fn cpu_map_write(&mut self, addr: u16, data: u8) -> Option<MapWrite> {
        if addr >= 0x8000 {
            self.chr_bank = data & 0x03;
        }
        None
    }

    fn ppu_map_read(&self, addr: u16) -> Option<usize> {
        (addr < 0x2000).then(|| self.chr_bank as usize * 0x2000 + addr as usize)
    }

    fn ppu_map_write(&self, _addr: u16) -> Option<usize> {
        None
    }

    fn reset(&mut self) {
        self.chr_bank = 0;
    }

    fn save(&self, w: &mut StateWriter) {
        save_bank_counts(w, self.prg_banks, self.chr_banks);
        w.u8(self.chr_bank);
    }

    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError> {
        (self.prg_banks, self.chr_banks) = load_bank_counts(r)?;
        self.chr_bank = r.u8()?;
        Ok(())
    }
}
