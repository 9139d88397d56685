/*!
ppu_bus: the cartridge-facing half of the PPU address space.

The PPU owns nametables, palette RAM and fallback pattern tables, but every PPU
access is first offered to whatever sits in the cartridge slot. Expressing that
slot as a trait keeps the PPU free of any `Bus` or `Cartridge` ownership: the
machine lends the cartridge for the duration of one PPU clock or one register
access.

Implementors:
- `Cartridge`: mapper-translated CHR access, mapper-driven mirroring and the
  per-scanline mapper hook.
- `Option<Cartridge>`: an empty slot claims nothing and reports horizontal
  mirroring.
*/

use crate::cartridge::{Cartridge, Mirroring};

pub trait PpuBus {
    /// CHR read; `None` leaves the access to the PPU's own memory.
    fn chr_read(&self, addr: u16) -> Option<u8>;

    /// CHR write; `true` when the cartridge claimed the write.
    fn chr_write(&mut self, addr: u16, data: u8) -> bool;

    fn mirroring(&self) -> Mirroring;

    /// Scanline notification for IRQ-counting mappers.
    fn scanline(&mut self) {}
}

impl PpuBus for Cartridge {
    #[inline]
    fn chr_read(&self, addr: u16) -> Option<u8> {
        self.ppu_read(addr)
    }

    #[inline]
    fn chr_write(&mut self, addr: u16, data: u8) -> bool {
        self.ppu_write(addr, data)
    }

    fn mirroring(&self) -> Mirroring {
        Cartridge::mirroring(self)
    }

    fn scanline(&mut self) {
        Cartridge::scanline(self);
    }
}

impl PpuBus for Option<Cartridge> {
    fn chr_read(&self, addr: u16) -> Option<u8> {
        self.as_ref().and_then(|c| c.ppu_read(addr))
    }

    fn chr_write(&mut self, addr: u16, data: u8) -> bool {
        self.as_mut().is_some_and(|c| c.ppu_write(addr, data))
    }

    fn mirroring(&self) -> Mirroring {
        self.as_ref()
            .map_or(Mirroring::Horizontal, Cartridge::mirroring)
    }

    fn scanline(&mut self) {
        if let Some(c) = self.as_mut() {
            c.scanline();
        }
    }
}
