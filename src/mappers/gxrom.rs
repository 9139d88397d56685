//! GxROM (mapper 66): one register selects a 32 KiB PRG bank (bits 4-5)
//! and an 8 KiB CHR bank (bits 0-1).
//!
//! Register writes update the bank selects but report the write as unclaimed.

use crate::mapper::{MapRead, MapWrite, Mapper, load_bank_counts, save_bank_counts};
use crate::savestate::{SaveStateError, StateReader, StateWriter};

#[derive(Debug, Clone)]
pub struct Gxrom {
    prg_banks: u16,
    chr_banks: u16,
    prg_bank: u8,
    chr_bank: u8,
}

impl Gxrom {
    pub fn new(prg_banks: u16, chr_banks: u16) -> Self {
        Self {
            prg_banks,
            chr_banks,
            prg_bank: 0,
            chr_bank: 0,
        }
    }
}

impl Mapper for Gxrom {
    fn mapper_id(&self) -> u8 {
        66
    }

    fn cpu_map_read(&self, addr: u16) -> Option<MapRead> {
        (addr >= 0x8000)
            .then(|| MapRead::Prg(self.prg_bank as usize * 0x8000 + (addr & 0x7FFF) as usize))
    }

    fn cpu_map_write(&mut self, addr: u16, data: u8) -> Option<MapWrite> {
        if addr >= 0x8000 {
            self.chr_bank = data & 0x03;
            self.prg_bank = (data & 0x30) >> 4;
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
        self.prg_bank = 0;
        self.chr_bank = 0;
    }

    fn save(&self, w: &mut StateWriter) {
        save_bank_counts(w, self.prg_banks, self.chr_banks);
        w.u8(self.chr_bank);
        w.u8(self.prg_bank);
    }

    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError> {
        (self.prg_banks, self.chr_banks) = load_bank_counts(r)?;
        self.chr_bank = r.u8()?;
        self.prg_bank = r.u8()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_write_selects_both_banks_but_is_unclaimed() {
        let mut m = Gxrom::new(8, 4);
        assert_eq!(m.cpu_map_write(0x8000, 0x21), None);
        assert_eq!(m.cpu_map_read(0x8004), Some(MapRead::Prg(2 * 0x8000 + 4)));
        assert_eq!(m.ppu_map_read(0x0004), Some(0x2000 + 4));
    }

    #[test]
    fn chr_is_read_only() {
        assert_eq!(Gxrom::new(2, 1).ppu_map_write(0), None);
    }

    #[test]
    fn reset_selects_first_banks() {
        let mut m = Gxrom::new(8, 4);
        m.cpu_map_write(0xFFFF, 0x33);
        m.reset();
        assert_eq!(m.cpu_map_read(0x8000), Some(MapRead::Prg(0)));
        assert_eq!(m.ppu_map_read(0), Some(0));
    }
}
