//! UxROM (mapper 2): switchable 16 KiB bank at $8000, last bank fixed at $C000.

use crate::mapper::{MapRead, MapWrite, Mapper, load_bank_counts, save_bank_counts};
use crate::savestate::{SaveStateError, StateReader, StateWriter};

#[derive(Debug, Clone)]
pub struct Uxrom {
    prg_banks: u16,
    chr_banks: u16,
    prg_bank_lo: u8,
    prg_bank_hi: u8,
}

impl Uxrom {
    pub fn new(prg_banks: u16, chr_banks: u16) -> Self {
        let mut m = Self {
            prg_banks,
            chr_banks,
            prg_bank_lo: 0,
            prg_bank_hi: 0,
        };
        m.reset();
        m
    }
}

impl Mapper for Uxrom {
    fn mapper_id(&self) -> u8 {
        2
    }

    fn cpu_map_read(&self, addr: u16) -> Option<MapRead> {
        let bank = match addr {
            0x8000..=0xBFFF => self.prg_bank_lo,
            0xC000..=0xFFFF => self.prg_bank_hi,
            _ => return None,
        };
        Some(MapRead::Prg(
            bank as usize * 0x4000 + (addr & 0x3FFF) as usize,
        ))
    }

    fn cpu_map_write(&mut self, addr: u16, data: u8) -> Option<MapWrite> {
        if addr >= 0x8000 {
            self.prg_bank_lo = data & 0x0F;
        }
        None
    }

    fn ppu_map_read(&self, addr: u16) -> Option<usize> {
        (addr < 0x2000).then_some(addr as usize)
    }

    fn ppu_map_write(&self, addr: u16) -> Option<usize> {
        (addr < 0x2000 && self.chr_banks == 0).then_some(addr as usize)
    }

    fn reset(&mut self) {
        self.prg_bank_lo = 0;
        self.prg_bank_hi = self.prg_banks.saturating_sub(1) as u8;
    }

    fn save(&self, w: &mut StateWriter) {
        save_bank_counts(w, self.prg_banks, self.chr_banks);
        w.u8(self.prg_bank_lo);
        w.u8(self.prg_bank_hi);
    }

    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError> {
        (self.prg_banks, self.chr_banks) = load_bank_counts(r)?;
        self.prg_bank_lo = r.u8()?;
        self.prg_bank_hi = r.u8()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_bank_is_fixed_high() {
        let m = Uxrom::new(8, 0);
        assert_eq!(m.cpu_map_read(0xC000), Some(MapRead::Prg(7 * 0x4000)));
        assert_eq!(m.cpu_map_read(0x8123), Some(MapRead::Prg(0x0123)));
    }

    #[test]
    fn bank_select_switches_low_window_only() {
        let mut m = Uxrom::new(8, 0);
        assert_eq!(m.cpu_map_write(0x8000, 0xF3), None);
        assert_eq!(m.cpu_map_read(0x8001), Some(MapRead::Prg(3 * 0x4000 + 1)));
        assert_eq!(m.cpu_map_read(0xC001), Some(MapRead::Prg(7 * 0x4000 + 1)));
        m.reset();
        assert_eq!(m.cpu_map_read(0x8001), Some(MapRead::Prg(1)));
    }

    #[test]
    fn chr_ram_is_writable() {
        let m = Uxrom::new(2, 0);
        assert_eq!(m.ppu_map_write(0x1FFF), Some(0x1FFF));
        assert_eq!(Uxrom::new(2, 1).ppu_map_write(0x1FFF), None);
    }
}
