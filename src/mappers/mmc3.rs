/*!
MMC3 (Mapper 4)

Implemented:
- Bank select ($8000 even) / bank data ($8001 odd) registers
- PRG banking modes (bit 6) with two switchable 8K banks + fixed second-last + fixed last
- CHR banking (two 2KB + four 1KB banks) with inversion (bit 7)
- Runtime nametable mirroring control ($A000 even write bit 0: 0=Vertical, 1=Horizontal)
- Scanline IRQ counter: latch ($C000), reload ($C001), disable/acknowledge ($E000), enable ($E001)
- 8 KiB on-board RAM at $6000-$7FFF

Notes:
- The IRQ counter is clocked by the PPU once per visible scanline rather than by A12 edges.
- Register writes update the bank tables but are reported to the cartridge as unclaimed.
*/

use log::debug;

use crate::mapper::{
    MapRead, MapWrite, Mapper, MapperMirroring, load_bank_counts, save_bank_counts,
};
use crate::savestate::{SaveStateError, StateReader, StateWriter};

const PRG_RAM_SIZE: usize = 0x2000;

#[derive(Debug, Clone)]
pub struct Mmc3 {
    prg_banks: u16,
    chr_banks: u16,

    // Bank registers R0..R7
    registers: [u8; 8],
    target_register: u8,
    prg_bank_mode: bool,
    chr_inversion: bool,
    mirroring: MapperMirroring,

    // Resolved window offsets
    chr_bank: [usize; 8],
    prg_bank: [usize; 4],

    irq_active: bool,
    irq_enable: bool,
    irq_counter: u16,
    irq_reload: u16,

    prg_ram: Vec<u8>,
}

impl Mmc3 {
    pub fn new(prg_banks: u16, chr_banks: u16) -> Self {
        let mut m = Self {
            prg_banks,
            chr_banks,
            registers: [0; 8],
            target_register: 0,
            prg_bank_mode: false,
            chr_inversion: false,
            mirroring: MapperMirroring::Horizontal,
            chr_bank: [0; 8],
            prg_bank: [0; 4],
            irq_active: false,
            irq_enable: false,
            irq_counter: 0,
            irq_reload: 0,
            prg_ram: vec![0; PRG_RAM_SIZE],
        };
        m.reset();
        m
    }

    /// 8K PRG bank index counted from the end of PRG ROM.
    fn prg_from_end(&self, n: usize) -> usize {
        (self.prg_banks as usize * 2).saturating_sub(n) * 0x2000
    }

    fn update_banks(&mut self) {
        let r = self.registers.map(|v| v as usize);
        let pairs = [
            (r[0] & 0xFE) * 0x0400,
            r[0] * 0x0400 + 0x0400,
            (r[1] & 0xFE) * 0x0400,
            r[1] * 0x0400 + 0x0400,
        ];
        let singles = [r[2] * 0x0400, r[3] * 0x0400, r[4] * 0x0400, r[5] * 0x0400];
        if self.chr_inversion {
            self.chr_bank[..4].copy_from_slice(&singles);
            self.chr_bank[4..].copy_from_slice(&pairs);
        } else {
            self.chr_bank[..4].copy_from_slice(&pairs);
            self.chr_bank[4..].copy_from_slice(&singles);
        }

        let switchable = (r[6] & 0x3F) * 0x2000;
        if self.prg_bank_mode {
            self.prg_bank[2] = switchable;
            self.prg_bank[0] = self.prg_from_end(2);
        } else {
            self.prg_bank[0] = switchable;
            self.prg_bank[2] = self.prg_from_end(2);
        }
        self.prg_bank[1] = (r[7] & 0x3F) * 0x2000;
        self.prg_bank[3] = self.prg_from_end(1);
    }
}

impl Mapper for Mmc3 {
    fn mapper_id(&self) -> u8 {
        4
    }

    fn cpu_map_read(&self, addr: u16) -> Option<MapRead> {
        match addr {
            0x6000..=0x7FFF => Some(MapRead::Data(
                self.prg_ram[(addr & 0x1FFF) as usize],
            )),
            0x8000..=0xFFFF => {
                let window = ((addr - 0x8000) >> 13) as usize;
                Some(MapRead::Prg(
                    self.prg_bank[window] + (addr & 0x1FFF) as usize,
                ))
            }
            _ => None,
        }
    }

    fn cpu_map_write(&mut self, addr: u16, data: u8) -> Option<MapWrite> {
        let even = addr & 0x0001 == 0;
        match addr {
            0x6000..=0x7FFF => {
                self.prg_ram[(addr & 0x1FFF) as usize] = data;
                return Some(MapWrite::Consumed);
            }
            0x8000..=0x9FFF => {
                if even {
                    self.target_register = data & 0x07;
                    self.prg_bank_mode = data & 0x40 != 0;
                    self.chr_inversion = data & 0x80 != 0;
                } else {
                    self.registers[self.target_register as usize] = data;
                    debug!("MMC3 R{} <- {:02X}", self.target_register, data);
                    self.update_banks();
                }
            }
            0xA000..=0xBFFF => {
                if even {
                    self.mirroring = if data & 0x01 != 0 {
                        MapperMirroring::Horizontal
                    } else {
                        MapperMirroring::Vertical
                    };
                }
            }
            0xC000..=0xDFFF => {
                if even {
                    self.irq_reload = data as u16;
                } else {
                    self.irq_counter = 0;
                }
            }
            0xE000..=0xFFFF => {
                if even {
                    self.irq_enable = false;
                    self.irq_active = false;
                } else {
                    self.irq_enable = true;
                }
            }
            _ => {}
        }
        None
    }

    fn ppu_map_read(&self, addr: u16) -> Option<usize> {
        (addr < 0x2000)
            .then(|| self.chr_bank[(addr >> 10) as usize] + (addr & 0x03FF) as usize)
    }

    fn ppu_map_write(&self, addr: u16) -> Option<usize> {
        (addr < 0x2000 && self.chr_banks == 0).then_some(addr as usize)
    }

    fn reset(&mut self) {
        self.target_register = 0;
        self.prg_bank_mode = false;
        self.chr_inversion = false;
        self.mirroring = MapperMirroring::Horizontal;

        self.irq_active = false;
        self.irq_enable = false;
        self.irq_counter = 0;
        self.irq_reload = 0;

        self.registers = [0; 8];
        self.chr_bank = [0; 8];
        self.prg_bank = [0, 0x2000, self.prg_from_end(2), self.prg_from_end(1)];
    }

    fn mirror(&self) -> MapperMirroring {
        self.mirroring
    }

    fn irq_state(&self) -> bool {
        self.irq_active
    }

    fn irq_clear(&mut self) {
        self.irq_active = false;
    }

    fn scanline(&mut self) {
        if self.irq_counter == 0 {
            self.irq_counter = self.irq_reload;
        } else {
            self.irq_counter -= 1;
        }

        if self.irq_counter == 0 && self.irq_enable {
            self.irq_active = true;
        }
    }

    fn save(&self, w: &mut StateWriter) {
        save_bank_counts(w, self.prg_banks, self.chr_banks);
        w.u8(self.target_register);
        w.bool(self.prg_bank_mode);
        w.bool(self.chr_inversion);
        w.u8(self.mirroring.to_byte());
        w.bytes(&self.registers);
        for bank in self.chr_bank {
            w.u32(bank as u32);
        }
        for bank in self.prg_bank {
            w.u32(bank as u32);
        }
        w.bool(self.irq_active);
        w.bool(self.irq_enable);
        w.u16(self.irq_counter);
        w.u16(self.irq_reload);
        w.sized_bytes(&self.prg_ram);
    }

    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError> {
        (self.prg_banks, self.chr_banks) = load_bank_counts(r)?;
        self.target_register = r.u8()? & 0x07;
        self.prg_bank_mode = r.bool()?;
        self.chr_inversion = r.bool()?;
        self.mirroring = MapperMirroring::from_byte(r.u8()?);
        r.fill(&mut self.registers)?;
        for bank in self.chr_bank.iter_mut() {
            *bank = r.u32()? as usize;
        }
        for bank in self.prg_bank.iter_mut() {
            *bank = r.u32()? as usize;
        }
        self.irq_active = r.bool()?;
        self.irq_enable = r.bool()?;
        self.irq_counter = r.u16()?;
        self.irq_reload = r.u16()?;
        let mut ram = r.sized_bytes()?;
        ram.resize(PRG_RAM_SIZE, 0);
        self.prg_ram = ram;
        Ok(())
    }
}
