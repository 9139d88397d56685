#![doc = r#"
PPU registers module

Purpose
- Flag types for PPUCTRL ($2000), PPUMASK ($2001) and PPUSTATUS ($2002).
- `VramAddr`, the 15-bit composite scroll/address ("loopy") register used for
  both the current address `v` and the latched address `t`.
- CPU-visible register semantics: status side effects, OAM port, the shared
  first/second write latch of $2005/$2006, and buffered PPUDATA.

Notes
- Addresses are reduced to the 8-byte register window with `addr & 7`, so callers
  may pass either the raw CPU address or the register index.
- Bit positions here are part of the save-state layout.
"#]

use bitflags::bitflags;

use super::Ppu;
use crate::ppu_bus::PpuBus;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuCtrl: u8 {
        const NAMETABLE_X = 0b0000_0001;
        const NAMETABLE_Y = 0b0000_0010;
        const INCREMENT_32 = 0b0000_0100;
        const SPRITE_TABLE = 0b0000_1000;
        const BACKGROUND_TABLE = 0b0001_0000;
        const SPRITE_16 = 0b0010_0000;
        const SLAVE = 0b0100_0000;
        const NMI_ENABLE = 0b1000_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuMask: u8 {
        const GREYSCALE = 0b0000_0001;
        const SHOW_BACKGROUND_LEFT = 0b0000_0010;
        const SHOW_SPRITES_LEFT = 0b0000_0100;
        const SHOW_BACKGROUND = 0b0000_1000;
        const SHOW_SPRITES = 0b0001_0000;
        const EMPHASIZE_RED = 0b0010_0000;
        const EMPHASIZE_GREEN = 0b0100_0000;
        const EMPHASIZE_BLUE = 0b1000_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuStatus: u8 {
        const OVERFLOW = 0b0010_0000;
        const ZERO_HIT = 0b0100_0000;
        const VBLANK = 0b1000_0000;
    }
}

impl PpuCtrl {
    /// VRAM address step applied after each PPUDATA access.
    #[inline]
    pub fn increment(self) -> u16 {
        if self.contains(PpuCtrl::INCREMENT_32) { 32 } else { 1 }
    }

    #[inline]
    pub fn sprite_height(self) -> i16 {
        if self.contains(PpuCtrl::SPRITE_16) { 16 } else { 8 }
    }
}

impl PpuMask {
    /// Either background or sprite rendering is on.
    #[inline]
    pub fn rendering(self) -> bool {
        self.intersects(PpuMask::SHOW_BACKGROUND | PpuMask::SHOW_SPRITES)
    }
}

/// Loopy register layout:
///
/// ```text
/// yyy N N YYYYY XXXXX
/// |   | | |     +------ coarse X (bits 0-4)
/// |   | | +------------ coarse Y (bits 5-9)
/// |   | +-------------- nametable X (bit 10)
/// |   +---------------- nametable Y (bit 11)
/// +-------------------- fine Y (bits 12-14)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VramAddr(pub u16);

impl VramAddr {
    const COARSE_X: u16 = 0x001F;
    const COARSE_Y: u16 = 0x03E0;
    const NAMETABLE_X: u16 = 0x0400;
    const NAMETABLE_Y: u16 = 0x0800;
    const FINE_Y: u16 = 0x7000;

    #[inline]
    pub fn coarse_x(self) -> u16 {
        self.0 & Self::COARSE_X
    }

    #[inline]
    pub fn set_coarse_x(&mut self, v: u16) {
        self.0 = (self.0 & !Self::COARSE_X) | (v & 0x1F);
    }

    #[inline]
    pub fn coarse_y(self) -> u16 {
        (self.0 & Self::COARSE_Y) >> 5
    }

    #[inline]
    pub fn set_coarse_y(&mut self, v: u16) {
        self.0 = (self.0 & !Self::COARSE_Y) | ((v & 0x1F) << 5);
    }

    #[inline]
    pub fn nametable_x(self) -> u16 {
        (self.0 & Self::NAMETABLE_X) >> 10
    }

    #[inline]
    pub fn set_nametable_x(&mut self, v: u16) {
        self.0 = (self.0 & !Self::NAMETABLE_X) | ((v & 1) << 10);
    }

    #[inline]
    pub fn nametable_y(self) -> u16 {
        (self.0 & Self::NAMETABLE_Y) >> 11
    }

    #[inline]
    pub fn set_nametable_y(&mut self, v: u16) {
        self.0 = (self.0 & !Self::NAMETABLE_Y) | ((v & 1) << 11);
    }

    #[inline]
    pub fn fine_y(self) -> u16 {
        (self.0 & Self::FINE_Y) >> 12
    }

    #[inline]
    pub fn set_fine_y(&mut self, v: u16) {
        self.0 = (self.0 & !Self::FINE_Y) | ((v & 0x07) << 12);
    }

    #[inline]
    fn advance(&mut self, step: u16) {
        self.0 = self.0.wrapping_add(step) & 0x7FFF;
    }
}

impl Ppu {
    /// CPU read of a PPU register.
    ///
    /// PPUSTATUS returns the top three status bits over stale PPUDATA buffer bits,
    /// then clears VBlank and the write latch. PPUDATA is delayed by one read except
    /// for palette addresses.
    pub fn cpu_read<B: PpuBus + ?Sized>(&mut self, cart: &B, addr: u16) -> u8 {
        match addr & 0x7 {
            0x2 => {
                let data = (self.status.bits() & 0xE0) | (self.data_buffer & 0x1F);
                self.status.remove(PpuStatus::VBLANK);
                self.write_latch = false;
                data
            }
            0x4 => self.oam[self.oam_addr as usize],
            0x7 => {
                let mut data = self.data_buffer;
                let target = self.v.0 & 0x3FFF;
                self.data_buffer = self.ppu_read(cart, target);
                if target >= 0x3F00 {
                    data = self.data_buffer;
                }
                self.v.advance(self.ctrl.increment());
                data
            }
            // control, mask, OAM address, scroll and address are write-only
            _ => 0,
        }
    }

    pub fn cpu_write<B: PpuBus + ?Sized>(&mut self, cart: &mut B, addr: u16, data: u8) {
        match addr & 0x7 {
            0x0 => {
                self.ctrl = PpuCtrl::from_bits_retain(data);
                self.t.set_nametable_x(data as u16);
                self.t.set_nametable_y((data >> 1) as u16);
            }
            0x1 => self.mask = PpuMask::from_bits_retain(data),
            0x2 => {}
            0x3 => self.oam_addr = data,
            0x4 => {
                self.oam[self.oam_addr as usize] = data;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            0x5 => {
                if !self.write_latch {
                    self.fine_x = data & 0x07;
                    self.t.set_coarse_x((data >> 3) as u16);
                } else {
                    self.t.set_fine_y((data & 0x07) as u16);
                    self.t.set_coarse_y((data >> 3) as u16);
                }
                self.write_latch = !self.write_latch;
            }
            0x6 => {
                if !self.write_latch {
                    self.t.0 = (((data & 0x3F) as u16) << 8) | (self.t.0 & 0x00FF);
                } else {
                    self.t.0 = (self.t.0 & 0xFF00) | data as u16;
                    self.v = self.t;
                }
                self.write_latch = !self.write_latch;
            }
            _ => {
                self.ppu_write(cart, self.v.0, data);
                self.v.advance(self.ctrl.increment());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Mirroring;
    use crate::ppu_bus::tests::OpenBus;

    fn set_addr(p: &mut Ppu, bus: &mut OpenBus, addr: u16) {
        p.cpu_write(bus, 0x2006, (addr >> 8) as u8);
        p.cpu_write(bus, 0x2006, addr as u8);
    }

    #[test]
    fn loopy_fields_pack_into_fifteen_bits() {
        let mut a = VramAddr::default();
        a.set_coarse_x(31);
        a.set_coarse_y(29);
        a.set_nametable_x(1);
        a.set_nametable_y(1);
        a.set_fine_y(7);
        assert_eq!(a.0, 0x7FBF);
        assert_eq!(a.coarse_x(), 31);
        assert_eq!(a.coarse_y(), 29);
        assert_eq!(a.nametable_x(), 1);
        assert_eq!(a.nametable_y(), 1);
        assert_eq!(a.fine_y(), 7);
    }

    #[test]
    fn status_read_returns_buffer_bits_and_clears_vblank_and_latch() {
        let mut p = Ppu::new();
        let mut bus = OpenBus::new(Mirroring::Horizontal);
        p.status = PpuStatus::VBLANK | PpuStatus::ZERO_HIT;
        p.data_buffer = 0x3F;
        p.write_latch = true;

        assert_eq!(p.cpu_read(&bus, 0x2002), 0xC0 | 0x1F);
        assert!(!p.status.contains(PpuStatus::VBLANK));
        assert!(p.status.contains(PpuStatus::ZERO_HIT));
        assert!(!p.write_latch);

        // second write of a pair now starts over as a first write
        p.cpu_write(&mut bus, 0x2006, 0x21);
        assert!(p.write_latch);
    }

    #[test]
    fn ctrl_write_copies_nametable_bits_into_t() {
        let mut p = Ppu::new();
        let mut bus = OpenBus::new(Mirroring::Horizontal);
        p.cpu_write(&mut bus, 0x2000, 0x03);
        assert_eq!(p.t.nametable_x(), 1);
        assert_eq!(p.t.nametable_y(), 1);
        p.cpu_write(&mut bus, 0x2000, 0x00);
        assert_eq!(p.t.0 & 0x0C00, 0);
    }

    #[test]
    fn scroll_writes_split_coarse_and_fine() {
        let mut p = Ppu::new();
        let mut bus = OpenBus::new(Mirroring::Horizontal);
        p.cpu_write(&mut bus, 0x2005, 0x7D); // x = 15 tiles + 5
        p.cpu_write(&mut bus, 0x2005, 0x5E); // y = 11 tiles + 6
        assert_eq!(p.fine_x, 5);
        assert_eq!(p.t.coarse_x(), 15);
        assert_eq!(p.t.coarse_y(), 11);
        assert_eq!(p.t.fine_y(), 6);
        assert!(!p.write_latch);
    }

    #[test]
    fn address_writes_copy_t_into_v_on_second_write() {
        let mut p = Ppu::new();
        let mut bus = OpenBus::new(Mirroring::Horizontal);
        p.cpu_write(&mut bus, 0x2006, 0xFF);
        assert_eq!(p.v.0, 0);
        p.cpu_write(&mut bus, 0x2006, 0x45);
        assert_eq!(p.v.0, 0x3F45);
        assert_eq!(p.t, p.v);
    }

    #[test]
    fn data_reads_are_buffered_below_palette() {
        let mut p = Ppu::new();
        let mut bus = OpenBus::new(Mirroring::Vertical);
        set_addr(&mut p, &mut bus, 0x2400);
        p.cpu_write(&mut bus, 0x2007, 0x11);
        p.cpu_write(&mut bus, 0x2007, 0x22);

        set_addr(&mut p, &mut bus, 0x2400);
        assert_eq!(p.cpu_read(&bus, 0x2007), 0x00);
        assert_eq!(p.cpu_read(&bus, 0x2007), 0x11);
        assert_eq!(p.cpu_read(&bus, 0x2007), 0x22);
    }

    #[test]
    fn palette_reads_are_immediate() {
        let mut p = Ppu::new();
        let mut bus = OpenBus::new(Mirroring::Horizontal);
        set_addr(&mut p, &mut bus, 0x3F01);
        p.cpu_write(&mut bus, 0x2007, 0x2A);
        set_addr(&mut p, &mut bus, 0x3F01);
        assert_eq!(p.cpu_read(&bus, 0x2007), 0x2A);
    }

    #[test]
    fn data_access_increments_by_control_step() {
        let mut p = Ppu::new();
        let mut bus = OpenBus::new(Mirroring::Horizontal);
        p.cpu_write(&mut bus, 0x2000, 0x04);
        set_addr(&mut p, &mut bus, 0x2000);
        p.cpu_write(&mut bus, 0x2007, 0xAA);
        assert_eq!(p.v.0, 0x2020);
        p.cpu_read(&bus, 0x2007);
        assert_eq!(p.v.0, 0x2040);

        p.cpu_write(&mut bus, 0x2000, 0x00);
        p.cpu_write(&mut bus, 0x2007, 0xBB);
        assert_eq!(p.v.0, 0x2041);
    }

    #[test]
    fn oam_port_writes_advance_address() {
        let mut p = Ppu::new();
        let mut bus = OpenBus::new(Mirroring::Horizontal);
        p.cpu_write(&mut bus, 0x2003, 0xFF);
        p.cpu_write(&mut bus, 0x2004, 0x12);
        p.cpu_write(&mut bus, 0x2004, 0x34);
        assert_eq!(p.oam[0xFF], 0x12);
        assert_eq!(p.oam[0x00], 0x34);
        p.cpu_write(&mut bus, 0x2003, 0x00);
        assert_eq!(p.cpu_read(&bus, 0x2004), 0x34);
    }

    #[test]
    fn registers_mirror_every_eight_bytes() {
        let mut p = Ppu::new();
        let mut bus = OpenBus::new(Mirroring::Horizontal);
        p.cpu_write(&mut bus, 0x3FF8, 0x80);
        assert!(p.ctrl.contains(PpuCtrl::NMI_ENABLE));
        p.status = PpuStatus::VBLANK;
        assert_eq!(p.cpu_read(&bus, 0x2FFA) & 0x80, 0x80);
    }
}
