//! MMC1 (Mapper 1) implementation.
//!
//! Implements:
//! - Serial shift register writes (5-bit) to control / CHR0 / CHR1 / PRG registers
//! - PRG banking modes (32K switch, or 16K with fixed low or high)
//! - CHR banking (8K or 4K+4K), or direct CHR RAM when the cartridge has no CHR ROM
//! - Mapper-controlled mirroring (one-screen low/high, vertical, horizontal)
//! - 8 KiB on-board RAM at $6000-$7FFF
//!
//! Deferred / Simplified:
//! - PRG RAM disable bit enforcement (treated as always enabled)
//! - Battery-backed persistence
//! - Large board variants (SUROM / SOROM / etc.)

use log::debug;

use crate::mapper::{
    MapRead, MapWrite, Mapper, MapperMirroring, load_bank_counts, save_bank_counts,
};
use crate::savestate::{SaveStateError, StateReader, StateWriter};

const PRG_RAM_SIZE: usize = 0x2000;

#[derive(Debug, Clone)]
pub struct Mmc1 {
    prg_banks: u16,
    chr_banks: u16,

    // 5-bit registers
    control: u8,
    chr_bank_4k_lo: u8,
    chr_bank_4k_hi: u8,
    chr_bank_8k: u8,
    prg_bank_16k_lo: u8,
    prg_bank_16k_hi: u8,
    prg_bank_32k: u8,

    // Serial latch
    shift_reg: u8,
    shift_count: u8,

    mirroring: MapperMirroring,
    prg_ram: Vec<u8>,
}

impl Mmc1 {
    pub fn new(prg_banks: u16, chr_banks: u16) -> Self {
        let mut m = Self {
            prg_banks,
            chr_banks,
            control: 0,
            chr_bank_4k_lo: 0,
            chr_bank_4k_hi: 0,
            chr_bank_8k: 0,
            prg_bank_16k_lo: 0,
            prg_bank_16k_hi: 0,
            prg_bank_32k: 0,
            shift_reg: 0,
            shift_count: 0,
            mirroring: MapperMirroring::Horizontal,
            prg_ram: vec![0; PRG_RAM_SIZE],
        };
        m.reset();
        m
    }

    fn prg_16k_mode(&self) -> bool {
        self.control & 0x08 != 0
    }

    fn chr_4k_mode(&self) -> bool {
        self.control & 0x10 != 0
    }

    fn serial_write(&mut self, addr: u16, data: u8) {
        if data & 0x80 != 0 {
            self.shift_reg = 0;
            self.shift_count = 0;
            self.control |= 0x0C;
            return;
        }

        self.shift_reg >>= 1;
        self.shift_reg |= (data & 0x01) << 4;
        self.shift_count += 1;
        if self.shift_count < 5 {
            return;
        }

        let value = self.shift_reg & 0x1F;
        debug!("MMC1 register {} <- {:02X}", (addr >> 13) & 0x03, value);
        match (addr >> 13) & 0x03 {
            0 => {
                self.control = value;
                self.mirroring = match value & 0x03 {
                    0 => MapperMirroring::OneScreenLo,
                    1 => MapperMirroring::OneScreenHi,
                    2 => MapperMirroring::Vertical,
                    _ => MapperMirroring::Horizontal,
                };
            }
            1 => {
                if self.chr_4k_mode() {
                    self.chr_bank_4k_lo = value;
                } else {
                    self.chr_bank_8k = value & 0x1E;
                }
            }
            2 => {
                if self.chr_4k_mode() {
                    self.chr_bank_4k_hi = value;
                }
            }
            _ => match (self.control >> 2) & 0x03 {
                0 | 1 => self.prg_bank_32k = (value & 0x0E) >> 1,
                2 => {
                    self.prg_bank_16k_lo = 0;
                    self.prg_bank_16k_hi = value & 0x0F;
                }
                _ => {
                    self.prg_bank_16k_lo = value & 0x0F;
                    self.prg_bank_16k_hi = self.prg_banks.saturating_sub(1) as u8;
                }
            },
        }

        self.shift_reg = 0;
        self.shift_count = 0;
    }

    #[cfg(test)]
    pub fn debug_prg_banks(&self) -> (u8, u8) {
        (self.prg_bank_16k_lo, self.prg_bank_16k_hi)
    }
}

impl Mapper for Mmc1 {
    fn mapper_id(&self) -> u8 {
        1
    }

    fn cpu_map_read(&self, addr: u16) -> Option<MapRead> {
        match addr {
            0x6000..=0x7FFF => Some(MapRead::Data(
                self.prg_ram[(addr & 0x1FFF) as usize],
            )),
            0x8000..=0xFFFF => {
                let offset = if self.prg_16k_mode() {
                    let bank = if addr < 0xC000 {
                        self.prg_bank_16k_lo
                    } else {
                        self.prg_bank_16k_hi
                    };
                    bank as usize * 0x4000 + (addr & 0x3FFF) as usize
                } else {
                    self.prg_bank_32k as usize * 0x8000 + (addr & 0x7FFF) as usize
                };
                Some(MapRead::Prg(offset))
            }
            _ => None,
        }
    }

    fn cpu_map_write(&mut self, addr: u16, data: u8) -> Option<MapWrite> {
        match addr {
            0x6000..=0x7FFF => {
                self.prg_ram[(addr & 0x1FFF) as usize] = data;
                Some(MapWrite::Consumed)
            }
            0x8000..=0xFFFF => {
                self.serial_write(addr, data);
                None
            }
            _ => None,
        }
    }

    fn ppu_map_read(&self, addr: u16) -> Option<usize> {
        if addr >= 0x2000 {
            return None;
        }
        if self.chr_banks == 0 {
            return Some(addr as usize);
        }
        let offset = if self.chr_4k_mode() {
            let bank = if addr < 0x1000 {
                self.chr_bank_4k_lo
            } else {
                self.chr_bank_4k_hi
            };
            bank as usize * 0x1000 + (addr & 0x0FFF) as usize
        } else {
            // The 8K select holds an even 4K bank number.
            self.chr_bank_8k as usize * 0x1000 + (addr & 0x1FFF) as usize
        };
        Some(offset)
    }

    fn ppu_map_write(&self, addr: u16) -> Option<usize> {
        (addr < 0x2000 && self.chr_banks == 0).then_some(addr as usize)
    }

    fn reset(&mut self) {
        self.control = 0x1C;
        self.shift_reg = 0;
        self.shift_count = 0;
        self.chr_bank_4k_lo = 0;
        self.chr_bank_4k_hi = 0;
        self.chr_bank_8k = 0;
        self.prg_bank_32k = 0;
        self.prg_bank_16k_lo = 0;
        self.prg_bank_16k_hi = self.prg_banks.saturating_sub(1) as u8;
    }

    fn mirror(&self) -> MapperMirroring {
        self.mirroring
    }

    fn save(&self, w: &mut StateWriter) {
        save_bank_counts(w, self.prg_banks, self.chr_banks);
        w.u8(self.chr_bank_4k_lo);
        w.u8(self.chr_bank_4k_hi);
        w.u8(self.chr_bank_8k);
        w.u8(self.prg_bank_16k_lo);
        w.u8(self.prg_bank_16k_hi);
        w.u8(self.prg_bank_32k);
        w.u8(self.shift_reg);
        w.u8(self.shift_count);
        w.u8(self.control);
        w.u8(self.mirroring.to_byte());
        w.sized_bytes(&self.prg_ram);
    }

    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError> {
        (self.prg_banks, self.chr_banks) = load_bank_counts(r)?;
        self.chr_bank_4k_lo = r.u8()?;
        self.chr_bank_4k_hi = r.u8()?;
        self.chr_bank_8k = r.u8()?;
        self.prg_bank_16k_lo = r.u8()?;
        self.prg_bank_16k_hi = r.u8()?;
        self.prg_bank_32k = r.u8()?;
        self.shift_reg = r.u8()?;
        self.shift_count = r.u8()?;
        self.control = r.u8()?;
        self.mirroring = MapperMirroring::from_byte(r.u8()?);
        let mut ram = r.sized_bytes()?;
        ram.resize(PRG_RAM_SIZE, 0);
        self.prg_ram = ram;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Mmc1;
    use crate::mapper::{MapRead, MapWrite, Mapper, MapperMirroring};
    use crate::savestate::{StateReader, StateWriter};

    fn write_serial(mapper: &mut Mmc1, addr: u16, value5: u8) {
        for i in 0..5 {
            let bit = (value5 >> i) & 1;
            mapper.cpu_map_write(addr, bit);
        }
    }

    #[test]
    fn power_on_fixes_last_bank_high() {
        let m = Mmc1::new(8, 2);
        assert_eq!(m.debug_prg_banks(), (0, 7));
        assert_eq!(m.cpu_map_read(0xC000), Some(MapRead::Prg(7 * 0x4000)));
        assert_eq!(m.cpu_map_read(0x8000), Some(MapRead::Prg(0)));
        assert_eq!(m.mirror(), MapperMirroring::Horizontal);
    }

    #[test]
    fn prg_mode3_switches_low_bank() {
        let mut m = Mmc1::new(8, 2);
        write_serial(&mut m, 0xE000, 0x05);
        assert_eq!(m.debug_prg_banks(), (5, 7));
        assert_eq!(m.cpu_map_read(0x8010), Some(MapRead::Prg(5 * 0x4000 + 0x10)));
    }

    #[test]
    fn prg_mode2_fixes_first_bank_low() {
        let mut m = Mmc1::new(8, 2);
        write_serial(&mut m, 0x8000, 0x0A); // PRG mode 2, vertical
        write_serial(&mut m, 0xE000, 0x03);
        assert_eq!(m.debug_prg_banks(), (0, 3));
        assert_eq!(m.mirror(), MapperMirroring::Vertical);
    }

    #[test]
    fn prg_32k_mode_ignores_low_bit() {
        let mut m = Mmc1::new(8, 2);
        write_serial(&mut m, 0x8000, 0x00);
        write_serial(&mut m, 0xE000, 0x05);
        assert_eq!(m.cpu_map_read(0xC000), Some(MapRead::Prg(2 * 0x8000 + 0x4000)));
        assert_eq!(m.mirror(), MapperMirroring::OneScreenLo);
    }

    #[test]
    fn reset_bit_clears_shift_and_forces_16k_mode() {
        let mut m = Mmc1::new(8, 2);
        write_serial(&mut m, 0x8000, 0x00);
        m.cpu_map_write(0x8000, 1);
        m.cpu_map_write(0x8000, 0x80);
        // A full 5-write sequence is needed again after the reset bit.
        write_serial(&mut m, 0xE000, 0x02);
        assert_eq!(m.debug_prg_banks(), (2, 7));
    }

    #[test]
    fn chr_4k_banks() {
        let mut m = Mmc1::new(2, 4);
        write_serial(&mut m, 0x8000, 0x1D); // 4K CHR, one-screen high
        write_serial(&mut m, 0xA000, 0x03);
        write_serial(&mut m, 0xC000, 0x05);
        assert_eq!(m.ppu_map_read(0x0001), Some(3 * 0x1000 + 1));
        assert_eq!(m.ppu_map_read(0x1001), Some(5 * 0x1000 + 1));
        assert_eq!(m.mirror(), MapperMirroring::OneScreenHi);
    }

    #[test]
    fn chr_8k_bank_uses_even_select() {
        let mut m = Mmc1::new(2, 4);
        write_serial(&mut m, 0x8000, 0x0C); // 8K CHR
        write_serial(&mut m, 0xA000, 0x03);
        assert_eq!(m.ppu_map_read(0x1000), Some(2 * 0x1000 + 0x1000));
    }

    #[test]
    fn chr_ram_maps_directly() {
        let m = Mmc1::new(2, 0);
        assert_eq!(m.ppu_map_read(0x1234), Some(0x1234));
        assert_eq!(m.ppu_map_write(0x1234), Some(0x1234));
        assert_eq!(Mmc1::new(2, 1).ppu_map_write(0x1234), None);
    }

    #[test]
    fn prg_ram_read_write() {
        let mut m = Mmc1::new(2, 1);
        assert_eq!(m.cpu_map_write(0x6001, 0x42), Some(MapWrite::Consumed));
        assert_eq!(m.cpu_map_read(0x6001), Some(MapRead::Data(0x42)));
    }

    #[test]
    fn snapshot_restores_registers_and_ram() {
        let mut m = Mmc1::new(8, 2);
        write_serial(&mut m, 0xE000, 0x04);
        m.cpu_map_write(0x7000, 0x99);
        m.cpu_map_write(0x8000, 1); // partial shift
        let mut w = StateWriter::new();
        m.save(&mut w);
        let bytes = w.into_bytes();

        let mut restored = Mmc1::new(8, 2);
        restored.load(&mut StateReader::new(&bytes)).unwrap();
        assert_eq!(restored.debug_prg_banks(), (4, 7));
        assert_eq!(restored.cpu_map_read(0x7000), Some(MapRead::Data(0x99)));
        assert_eq!(restored.shift_count, 1);
    }
}
