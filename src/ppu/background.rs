#![doc = r#"
Background pipeline

Per-tile fetch sequence (one step every other dot within an 8-dot group):
  0: reload shifters with the previous fetch, read next tile id from the nametable
  2: read the attribute byte and reduce it to the tile's 2-bit palette selector
  4: pattern low plane
  6: pattern high plane
  7: coarse X increment

Shifters are 16 bits wide; the high byte feeds the current pixel (selected by
fine X) and the low byte holds the tile fetched ahead. Scroll increments and
`t` -> `v` transfers only happen while rendering is enabled.
"#]

use super::Ppu;
use super::registers::{PpuCtrl, PpuMask};
use crate::ppu_bus::PpuBus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BackgroundPipeline {
    pub next_tile_id: u8,
    pub next_tile_attr: u8,
    pub next_tile_lsb: u8,
    pub next_tile_msb: u8,
    pub pattern_lo: u16,
    pub pattern_hi: u16,
    pub attr_lo: u16,
    pub attr_hi: u16,
}

impl BackgroundPipeline {
    /// Move the fetched tile into the low byte of every shifter.
    pub fn load_shifters(&mut self) {
        self.pattern_lo = (self.pattern_lo & 0xFF00) | self.next_tile_lsb as u16;
        self.pattern_hi = (self.pattern_hi & 0xFF00) | self.next_tile_msb as u16;
        self.attr_lo = (self.attr_lo & 0xFF00) | if self.next_tile_attr & 0b01 != 0 { 0xFF } else { 0x00 };
        self.attr_hi = (self.attr_hi & 0xFF00) | if self.next_tile_attr & 0b10 != 0 { 0xFF } else { 0x00 };
    }

    pub fn shift(&mut self) {
        self.pattern_lo <<= 1;
        self.pattern_hi <<= 1;
        self.attr_lo <<= 1;
        self.attr_hi <<= 1;
    }

    /// `(palette, pixel)` at fine X offset `fine_x`.
    pub fn pixel(&self, fine_x: u8) -> (u8, u8) {
        let mux = 0x8000u16 >> fine_x;
        let bit = |v: u16| u8::from(v & mux != 0);
        let pixel = (bit(self.pattern_hi) << 1) | bit(self.pattern_lo);
        let palette = (bit(self.attr_hi) << 1) | bit(self.attr_lo);
        (palette, pixel)
    }
}

impl Ppu {
    pub(in crate::ppu) fn fetch_tile_id<B: PpuBus + ?Sized>(&mut self, cart: &B) {
        self.bg.next_tile_id = self.ppu_read(cart, 0x2000 | (self.v.0 & 0x0FFF));
    }

    pub(in crate::ppu) fn fetch_tile_attr<B: PpuBus + ?Sized>(&mut self, cart: &B) {
        let v = self.v;
        let addr = 0x23C0
            | (v.nametable_y() << 11)
            | (v.nametable_x() << 10)
            | ((v.coarse_y() >> 2) << 3)
            | (v.coarse_x() >> 2);
        let mut attr = self.ppu_read(cart, addr);
        if v.coarse_y() & 0x02 != 0 {
            attr >>= 4;
        }
        if v.coarse_x() & 0x02 != 0 {
            attr >>= 2;
        }
        self.bg.next_tile_attr = attr & 0x03;
    }

    fn tile_row_addr(&self) -> u16 {
        let table = if self.ctrl.contains(PpuCtrl::BACKGROUND_TABLE) { 0x1000 } else { 0 };
        table + ((self.bg.next_tile_id as u16) << 4) + self.v.fine_y()
    }

    pub(in crate::ppu) fn fetch_tile_lsb<B: PpuBus + ?Sized>(&mut self, cart: &B) {
        self.bg.next_tile_lsb = self.ppu_read(cart, self.tile_row_addr());
    }

    pub(in crate::ppu) fn fetch_tile_msb<B: PpuBus + ?Sized>(&mut self, cart: &B) {
        self.bg.next_tile_msb = self.ppu_read(cart, self.tile_row_addr() + 8);
    }

    pub(in crate::ppu) fn increment_scroll_x(&mut self) {
        if !self.mask.rendering() {
            return;
        }
        if self.v.coarse_x() == 31 {
            self.v.set_coarse_x(0);
            self.v.set_nametable_x(!self.v.nametable_x());
        } else {
            self.v.set_coarse_x(self.v.coarse_x() + 1);
        }
    }

    pub(in crate::ppu) fn increment_scroll_y(&mut self) {
        if !self.mask.rendering() {
            return;
        }
        if self.v.fine_y() < 7 {
            self.v.set_fine_y(self.v.fine_y() + 1);
            return;
        }
        self.v.set_fine_y(0);
        match self.v.coarse_y() {
            29 => {
                self.v.set_coarse_y(0);
                self.v.set_nametable_y(!self.v.nametable_y());
            }
            // attribute rows written as scroll values wrap without switching tables
            31 => self.v.set_coarse_y(0),
            y => self.v.set_coarse_y(y + 1),
        }
    }

    pub(in crate::ppu) fn transfer_address_x(&mut self) {
        if !self.mask.rendering() {
            return;
        }
        self.v.set_nametable_x(self.t.nametable_x());
        self.v.set_coarse_x(self.t.coarse_x());
    }

    pub(in crate::ppu) fn transfer_address_y(&mut self) {
        if !self.mask.rendering() {
            return;
        }
        self.v.set_fine_y(self.t.fine_y());
        self.v.set_nametable_y(self.t.nametable_y());
        self.v.set_coarse_y(self.t.coarse_y());
    }

    /// Background half of the per-dot shifter update.
    pub(in crate::ppu) fn shift_background(&mut self) {
        if self.mask.contains(PpuMask::SHOW_BACKGROUND) {
            self.bg.shift();
        }
    }
}
