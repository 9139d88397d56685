/*!
Picture processing unit.

The PPU is clocked once per master tick by the bus, three times per CPU cycle.
Each call to `clock` advances one dot through a 341 x 262 grid (scanlines -1 to
260). Visible pixels are composed from the background and sprite pipelines and
handed to a `PixelSink`.

STRUCTURE:
- `registers.rs`  PPUCTRL/PPUMASK/PPUSTATUS flags, the loopy address register and
                  the CPU-visible register file.
- `memory.rs`     PPU address space: cartridge intercept, pattern tables, nametable
                  mirroring, palette RAM.
- `background.rs` tile fetch, scroll increments, background shifters.
- `sprites.rs`    per-scanline sprite evaluation, pattern fetch, sprite shifters.
- `renderer.rs`   the dot/scanline state machine and pixel composition.
- `output.rs`     `PixelSink`, `Rgba`, `FrameBuffer`.

The cartridge is never owned here. Every operation that touches CHR or needs the
mirroring mode borrows a `PpuBus` for the duration of the call.
*/

pub mod background;
pub mod memory;
pub mod output;
pub mod registers;
pub mod renderer;
pub mod sprites;

pub use output::{BYTES_PER_PIXEL, FrameBuffer, NES_HEIGHT, NES_WIDTH, NullSink, PixelSink, Rgba};
pub use registers::{PpuCtrl, PpuMask, PpuStatus, VramAddr};
pub use sprites::OamEntry;

use background::BackgroundPipeline;
use sprites::{MAX_SPRITES_PER_LINE, SpritePipeline};

use crate::savestate::{SaveStateError, Snapshot, StateReader, StateWriter};

/// 2C02 NTSC output colours indexed by palette RAM values.
pub(crate) const COLORS: [Rgba; 64] = [
    Rgba::rgb(84, 84, 84),
    Rgba::rgb(0, 30, 116),
    Rgba::rgb(8, 16, 144),
    Rgba::rgb(48, 0, 136),
    Rgba::rgb(68, 0, 100),
    Rgba::rgb(92, 0, 48),
    Rgba::rgb(84, 4, 0),
    Rgba::rgb(60, 24, 0),
    Rgba::rgb(32, 42, 0),
    Rgba::rgb(8, 58, 0),
    Rgba::rgb(0, 64, 0),
    Rgba::rgb(0, 60, 0),
    Rgba::rgb(0, 50, 60),
    Rgba::rgb(0, 0, 0),
    Rgba::rgb(0, 0, 0),
    Rgba::rgb(0, 0, 0),
    Rgba::rgb(152, 150, 152),
    Rgba::rgb(8, 76, 196),
    Rgba::rgb(48, 50, 236),
    Rgba::rgb(92, 30, 228),
    Rgba::rgb(136, 20, 176),
    Rgba::rgb(160, 20, 100),
    Rgba::rgb(152, 34, 32),
    Rgba::rgb(120, 60, 0),
    Rgba::rgb(84, 90, 0),
    Rgba::rgb(40, 114, 0),
    Rgba::rgb(8, 124, 0),
    Rgba::rgb(0, 118, 40),
    Rgba::rgb(0, 102, 120),
    Rgba::rgb(0, 0, 0),
    Rgba::rgb(0, 0, 0),
    Rgba::rgb(0, 0, 0),
    Rgba::rgb(236, 238, 236),
    Rgba::rgb(76, 154, 236),
    Rgba::rgb(120, 124, 236),
    Rgba::rgb(176, 98, 236),
    Rgba::rgb(228, 84, 236),
    Rgba::rgb(236, 88, 180),
    Rgba::rgb(236, 106, 100),
    Rgba::rgb(212, 136, 32),
    Rgba::rgb(160, 170, 0),
    Rgba::rgb(116, 196, 0),
    Rgba::rgb(76, 208, 32),
    Rgba::rgb(56, 204, 108),
    Rgba::rgb(56, 180, 204),
    Rgba::rgb(60, 60, 60),
    Rgba::rgb(0, 0, 0),
    Rgba::rgb(0, 0, 0),
    Rgba::rgb(236, 238, 236),
    Rgba::rgb(168, 204, 236),
    Rgba::rgb(188, 188, 236),
    Rgba::rgb(212, 178, 236),
    Rgba::rgb(236, 174, 236),
    Rgba::rgb(236, 174, 212),
    Rgba::rgb(236, 180, 176),
    Rgba::rgb(228, 196, 144),
    Rgba::rgb(204, 210, 120),
    Rgba::rgb(180, 222, 120),
    Rgba::rgb(168, 226, 144),
    Rgba::rgb(152, 226, 180),
    Rgba::rgb(160, 214, 228),
    Rgba::rgb(160, 162, 160),
    Rgba::rgb(0, 0, 0),
    Rgba::rgb(0, 0, 0),
];

#[derive(Clone)]
pub struct Ppu {
    // Video memory
    name_tables: [[u8; 0x400]; 2],
    pattern_tables: [[u8; 0x1000]; 2],
    palette: [u8; 32],
    oam: [u8; 256],
    oam_addr: u8,

    // CPU-visible registers
    ctrl: PpuCtrl,
    mask: PpuMask,
    status: PpuStatus,

    // Scroll/address state
    v: VramAddr,
    t: VramAddr,
    fine_x: u8,
    write_latch: bool,
    data_buffer: u8,

    // Timing
    scanline: i16,
    cycle: i16,
    odd_frame: bool,

    bg: BackgroundPipeline,
    sprites: SpritePipeline,

    nmi: bool,
    frame_complete: bool,

    /// Emit pixels to the sink this frame. Timing and flags run regardless.
    pub render_this_frame: bool,
}

impl std::fmt::Debug for Ppu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ppu")
            .field("scanline", &self.scanline)
            .field("cycle", &self.cycle)
            .field("ctrl", &self.ctrl)
            .field("mask", &self.mask)
            .field("status", &self.status)
            .field("v", &format_args!("{:04X}", self.v.0))
            .field("t", &format_args!("{:04X}", self.t.0))
            .field("fine_x", &self.fine_x)
            .finish_non_exhaustive()
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            name_tables: [[0; 0x400]; 2],
            pattern_tables: [[0; 0x1000]; 2],
            palette: [0; 32],
            oam: [0; 256],
            oam_addr: 0,
            ctrl: PpuCtrl::empty(),
            mask: PpuMask::empty(),
            status: PpuStatus::empty(),
            v: VramAddr::default(),
            t: VramAddr::default(),
            fine_x: 0,
            write_latch: false,
            data_buffer: 0,
            scanline: 0,
            cycle: 0,
            odd_frame: false,
            bg: BackgroundPipeline::default(),
            sprites: SpritePipeline::default(),
            nmi: false,
            frame_complete: false,
            render_this_frame: true,
        }
    }

    /// Return registers, scroll state and pipelines to power-on values.
    /// Video memory and OAM are left as they are.
    pub fn reset(&mut self) {
        self.fine_x = 0;
        self.write_latch = false;
        self.data_buffer = 0;
        self.scanline = 0;
        self.cycle = 0;
        self.bg = BackgroundPipeline::default();
        self.sprites = SpritePipeline::default();
        self.nmi = false;
        self.frame_complete = false;
        self.status = PpuStatus::empty();
        self.mask = PpuMask::empty();
        self.ctrl = PpuCtrl::empty();
        self.v = VramAddr::default();
        self.t = VramAddr::default();
        self.odd_frame = false;
    }

    /// Returns and clears the end-of-frame flag.
    pub fn take_frame_complete(&mut self) -> bool {
        std::mem::take(&mut self.frame_complete)
    }

    /// Returns and clears a pending VBlank NMI request.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi)
    }

    pub fn scanline(&self) -> i16 {
        self.scanline
    }

    pub fn cycle(&self) -> i16 {
        self.cycle
    }

    pub fn ctrl(&self) -> PpuCtrl {
        self.ctrl
    }

    pub fn mask(&self) -> PpuMask {
        self.mask
    }

    pub fn status(&self) -> PpuStatus {
        self.status
    }

    pub fn vram_addr(&self) -> VramAddr {
        self.v
    }

    pub fn temp_addr(&self) -> VramAddr {
        self.t
    }

    pub fn fine_x(&self) -> u8 {
        self.fine_x
    }

    pub fn odd_frame(&self) -> bool {
        self.odd_frame
    }
}

impl Snapshot for Ppu {
    fn save(&self, w: &mut StateWriter) {
        w.bool(self.nmi);
        w.bool(self.frame_complete);
        for table in &self.name_tables {
            w.bytes(table);
        }
        for table in &self.pattern_tables {
            w.bytes(table);
        }
        w.bytes(&self.palette);

        w.u8(self.status.bits());
        w.u8(self.mask.bits());
        w.u8(self.ctrl.bits());
        w.u16(self.v.0);
        w.u16(self.t.0);
        w.u8(self.fine_x);
        w.bool(self.write_latch);
        w.u8(self.data_buffer);
        w.i16(self.scanline);
        w.i16(self.cycle);
        w.bool(self.odd_frame);

        let bg = &self.bg;
        w.bytes(&[bg.next_tile_id, bg.next_tile_attr, bg.next_tile_lsb, bg.next_tile_msb]);
        w.u16(bg.pattern_lo);
        w.u16(bg.pattern_hi);
        w.u16(bg.attr_lo);
        w.u16(bg.attr_hi);

        w.bytes(&self.oam);
        w.u8(self.oam_addr);

        let sp = &self.sprites;
        for slot in &sp.slots {
            w.bytes(&slot.to_bytes());
        }
        w.u8(sp.count);
        w.bytes(&sp.pattern_lo);
        w.bytes(&sp.pattern_hi);
        w.bool(sp.zero_hit_possible);
        w.bool(sp.zero_being_rendered);
    }

    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError> {
        self.nmi = r.bool()?;
        self.frame_complete = r.bool()?;
        for table in &mut self.name_tables {
            r.fill(table)?;
        }
        for table in &mut self.pattern_tables {
            r.fill(table)?;
        }
        r.fill(&mut self.palette)?;

        self.status = PpuStatus::from_bits_retain(r.u8()?);
        self.mask = PpuMask::from_bits_retain(r.u8()?);
        self.ctrl = PpuCtrl::from_bits_retain(r.u8()?);
        self.v = VramAddr(r.u16()?);
        self.t = VramAddr(r.u16()?);
        self.fine_x = r.u8()?;
        self.write_latch = r.bool()?;
        self.data_buffer = r.u8()?;
        self.scanline = r.i16()?;
        self.cycle = r.i16()?;
        self.odd_frame = r.bool()?;

        let mut next = [0u8; 4];
        r.fill(&mut next)?;
        self.bg = BackgroundPipeline {
            next_tile_id: next[0],
            next_tile_attr: next[1],
            next_tile_lsb: next[2],
            next_tile_msb: next[3],
            pattern_lo: r.u16()?,
            pattern_hi: r.u16()?,
            attr_lo: r.u16()?,
            attr_hi: r.u16()?,
        };

        r.fill(&mut self.oam)?;
        self.oam_addr = r.u8()?;

        let mut slots = [OamEntry::EMPTY; MAX_SPRITES_PER_LINE];
        for slot in &mut slots {
            let mut raw = [0u8; 4];
            r.fill(&mut raw)?;
            *slot = OamEntry::from_bytes(&raw);
        }
        self.sprites.slots = slots;
        self.sprites.count = r.u8()?;
        r.fill(&mut self.sprites.pattern_lo)?;
        r.fill(&mut self.sprites.pattern_hi)?;
        self.sprites.zero_hit_possible = r.bool()?;
        self.sprites.zero_being_rendered = r.bool()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_registers_but_keeps_memory() {
        let mut p = Ppu::new();
        p.name_tables[0][3] = 0x42;
        p.oam[7] = 0x11;
        p.ctrl = PpuCtrl::NMI_ENABLE;
        p.status = PpuStatus::VBLANK;
        p.v = VramAddr(0x2345);
        p.fine_x = 3;
        p.scanline = 100;
        p.odd_frame = true;

        p.reset();
        assert_eq!(p.ctrl, PpuCtrl::empty());
        assert_eq!(p.status, PpuStatus::empty());
        assert_eq!(p.v.0, 0);
        assert_eq!(p.fine_x, 0);
        assert_eq!(p.scanline, 0);
        assert!(!p.odd_frame);
        assert_eq!(p.name_tables[0][3], 0x42);
        assert_eq!(p.oam[7], 0x11);
    }

    #[test]
    fn reset_drops_pending_sprites_and_flags() {
        let mut p = Ppu::new();
        p.sprites.count = 3;
        p.sprites.slots[0] = OamEntry::from_bytes(&[10, 1, 0, 20]);
        p.sprites.pattern_lo[0] = 0xFF;
        p.sprites.pattern_hi[2] = 0x81;
        p.sprites.zero_hit_possible = true;
        p.sprites.zero_being_rendered = true;
        p.nmi = true;
        p.frame_complete = true;

        p.reset();
        assert_eq!(p.sprites, SpritePipeline::default());
        assert!(!p.take_nmi());
        assert!(!p.take_frame_complete());
    }

    #[test]
    fn take_flags_clear_on_read() {
        let mut p = Ppu::new();
        p.nmi = true;
        p.frame_complete = true;
        assert!(p.take_nmi());
        assert!(!p.take_nmi());
        assert!(p.take_frame_complete());
        assert!(!p.take_frame_complete());
    }

    #[test]
    fn snapshot_restores_everything() {
        let mut p = Ppu::new();
        p.name_tables[1][0x3FF] = 9;
        p.pattern_tables[0][5] = 8;
        p.palette[31] = 7;
        p.oam[255] = 6;
        p.ctrl = PpuCtrl::from_bits_retain(0x90);
        p.v = VramAddr(0x7ABC);
        p.scanline = -1;
        p.cycle = 300;
        p.bg.attr_hi = 0xF00F;
        p.sprites.count = 3;
        p.sprites.slots[7] = OamEntry { y: 1, id: 2, attr: 3, x: 4 };
        p.sprites.pattern_hi[7] = 0x5A;

        let mut w = StateWriter::new();
        p.save(&mut w);
        let bytes = w.into_bytes();

        let mut q = Ppu::new();
        let mut r = StateReader::new(&bytes);
        q.load(&mut r).unwrap();
        assert_eq!(r.remaining(), 0);

        assert_eq!(q.name_tables[1][0x3FF], 9);
        assert_eq!(q.pattern_tables[0][5], 8);
        assert_eq!(q.palette[31], 7);
        assert_eq!(q.oam[255], 6);
        assert_eq!(q.ctrl.bits(), 0x90);
        assert_eq!(q.v.0, 0x7ABC);
        assert_eq!(q.scanline, -1);
        assert_eq!(q.cycle, 300);
        assert_eq!(q.bg, p.bg);
        assert_eq!(q.sprites, p.sprites);
    }
}
