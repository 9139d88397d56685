#![doc = r#"
PPU memory submodule

Responsibilities
- The PPU side of the 14-bit PPU address space:
  * $0000-$1FFF pattern tables (cartridge CHR, or the PPU's own 8 KiB when the
    cartridge does not claim the access)
  * $2000-$3EFF nametables, folded onto two physical 1 KiB tables by the
    cartridge's mirroring mode
  * $3F00-$3FFF palette RAM, 32 bytes with the sprite backdrop entries aliased
    onto the background ones
- OAM byte access for DMA.
- Colour lookup from a (palette, pixel) pair.

Every access first goes through `PpuBus`, so mapper CHR banking always wins.
"#]

use super::{COLORS, Ppu};
use crate::cartridge::Mirroring;
use crate::ppu::output::Rgba;
use crate::ppu::registers::PpuMask;
use crate::ppu_bus::PpuBus;

/// Physical nametable (0 or 1) backing a logical address in $2000-$3EFF.
pub(in crate::ppu) fn nametable_slot(mirroring: Mirroring, addr: u16) -> usize {
    let quadrant = ((addr & 0x0FFF) >> 10) as usize;
    match mirroring {
        Mirroring::Vertical => quadrant & 1,
        Mirroring::Horizontal => quadrant >> 1,
        Mirroring::OneScreenLo => 0,
        Mirroring::OneScreenHi => 1,
    }
}

/// Palette RAM index with $3F10/$3F14/$3F18/$3F1C folded onto $3F00/$3F04/$3F08/$3F0C.
#[inline]
fn palette_index(addr: u16) -> usize {
    let i = (addr & 0x1F) as usize;
    if i & 0x13 == 0x10 { i & 0x0F } else { i }
}

impl Ppu {
    pub fn ppu_read<B: PpuBus + ?Sized>(&self, cart: &B, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        if let Some(data) = cart.chr_read(addr) {
            return data;
        }
        match addr {
            0x0000..=0x1FFF => {
                self.pattern_tables[(addr >> 12) as usize][(addr & 0x0FFF) as usize]
            }
            0x2000..=0x3EFF => {
                let slot = nametable_slot(cart.mirroring(), addr);
                self.name_tables[slot][(addr & 0x03FF) as usize]
            }
            _ => {
                let mask = if self.mask.contains(PpuMask::GREYSCALE) { 0x30 } else { 0x3F };
                self.palette[palette_index(addr)] & mask
            }
        }
    }

    pub fn ppu_write<B: PpuBus + ?Sized>(&mut self, cart: &mut B, addr: u16, data: u8) {
        let addr = addr & 0x3FFF;
        if cart.chr_write(addr, data) {
            return;
        }
        match addr {
            0x0000..=0x1FFF => {
                self.pattern_tables[(addr >> 12) as usize][(addr & 0x0FFF) as usize] = data;
            }
            0x2000..=0x3EFF => {
                let slot = nametable_slot(cart.mirroring(), addr);
                self.name_tables[slot][(addr & 0x03FF) as usize] = data;
            }
            _ => self.palette[palette_index(addr)] = data,
        }
    }

    /// Store one OAM byte; the DMA engine's write half.
    #[inline]
    pub fn write_oam_byte(&mut self, index: u8, data: u8) {
        self.oam[index as usize] = data;
    }

    pub fn oam(&self) -> &[u8; 256] {
        &self.oam
    }

    /// Screen colour for a 3-bit palette selector and 2-bit pixel value.
    pub(in crate::ppu) fn color<B: PpuBus + ?Sized>(&self, cart: &B, palette: u8, pixel: u8) -> Rgba {
        let entry = self.ppu_read(cart, 0x3F00 + ((palette as u16) << 2) + pixel as u16);
        COLORS[(entry & 0x3F) as usize]
    }
}
