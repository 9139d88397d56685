#![doc = r#"
PPU renderer: the dot/scanline state machine.

Timeline per frame (NTSC, 341 dots x 262 lines):
- Scanline -1 (pre-render): dot 1 clears VBlank, sprite-zero hit and overflow;
  dots 280-304 copy the vertical scroll bits from `t`.
- Scanlines 0-239 (visible): background fetches run on dots 2-257 and 321-337,
  sprites are evaluated at dot 257 and fetched at dot 340, and each of dots
  1-256 composes one output pixel.
- Scanline 241, dot 1: VBlank begins and an NMI is requested if enabled.
- After scanline 260 the counter wraps to -1, the frame-complete flag is raised
  and frame parity toggles. With rendering on, odd frames skip dot 0 of line 0.

While rendering is enabled the cartridge sees one `scanline()` call per line at
dot 260 of lines -1..=239.
"#]

use super::Ppu;
use super::output::PixelSink;
use super::registers::{PpuCtrl, PpuMask, PpuStatus};
use crate::ppu_bus::PpuBus;

impl Ppu {
    /// Advance one dot.
    pub fn clock<B, S>(&mut self, cart: &mut B, sink: &mut S)
    where
        B: PpuBus + ?Sized,
        S: PixelSink + ?Sized,
    {
        let rendering = self.mask.rendering();

        if (-1..240).contains(&self.scanline) {
            self.render_line_step(cart, rendering);
        }

        if self.scanline == 241 && self.cycle == 1 {
            self.status.insert(PpuStatus::VBLANK);
            if self.ctrl.contains(PpuCtrl::NMI_ENABLE) {
                self.nmi = true;
            }
        }

        if (0..240).contains(&self.scanline) && (1..=256).contains(&self.cycle) {
            let (palette, pixel) = self.compose();
            if self.render_this_frame {
                let color = self.color(cart, palette, pixel);
                sink.set_pixel((self.cycle - 1) as usize, self.scanline as usize, color);
            }
        }

        self.cycle += 1;
        if rendering && self.cycle == 260 && self.scanline < 240 {
            cart.scanline();
        }

        if self.cycle >= 341 {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline >= 261 {
                self.scanline = -1;
                self.frame_complete = true;
                self.odd_frame = !self.odd_frame;
            }
        }
    }

    /// Fetch/scroll/sprite work for the pre-render and visible lines.
    fn render_line_step<B: PpuBus + ?Sized>(&mut self, cart: &B, rendering: bool) {
        if self.scanline == 0 && self.cycle == 0 && self.odd_frame && rendering {
            self.cycle = 1;
        }

        if self.scanline == -1 && self.cycle == 1 {
            self.status
                .remove(PpuStatus::VBLANK | PpuStatus::OVERFLOW | PpuStatus::ZERO_HIT);
            // line 0 never shows sprites left over from line 239
            self.sprites.count = 0;
            self.sprites.clear_shifters();
        }

        if (2..258).contains(&self.cycle) || (321..338).contains(&self.cycle) {
            self.shift_background();
            self.shift_sprites();

            match (self.cycle - 1) % 8 {
                0 => {
                    self.bg.load_shifters();
                    self.fetch_tile_id(cart);
                }
                2 => self.fetch_tile_attr(cart),
                4 => self.fetch_tile_lsb(cart),
                6 => self.fetch_tile_msb(cart),
                7 => self.increment_scroll_x(),
                _ => {}
            }
        }

        if self.cycle == 256 {
            self.increment_scroll_y();
        }
        if self.cycle == 257 {
            self.bg.load_shifters();
            self.transfer_address_x();
        }
        if self.cycle == 338 || self.cycle == 340 {
            self.fetch_tile_id(cart);
        }
        if self.scanline == -1 && (280..305).contains(&self.cycle) {
            self.transfer_address_y();
        }

        if self.cycle == 257 && self.scanline >= 0 {
            self.evaluate_sprites();
        }
        if self.cycle == 340 {
            self.fetch_sprite_patterns(cart);
        }
    }

    /// Resolve the background and sprite candidates for the current dot into
    /// a `(palette, pixel)` pair, updating the sprite-zero hit flag.
    fn compose(&mut self) -> (u8, u8) {
        let left_edge = self.cycle >= 9;

        let (bg_palette, bg_pixel) = if self.mask.contains(PpuMask::SHOW_BACKGROUND)
            && (left_edge || self.mask.contains(PpuMask::SHOW_BACKGROUND_LEFT))
        {
            self.bg.pixel(self.fine_x)
        } else {
            (0, 0)
        };

        let fg = if self.mask.contains(PpuMask::SHOW_SPRITES)
            && (left_edge || self.mask.contains(PpuMask::SHOW_SPRITES_LEFT))
        {
            self.sprites.pixel()
        } else {
            Default::default()
        };

        match (bg_pixel, fg.pixel) {
            (0, 0) => (0, 0),
            (0, _) => (fg.palette, fg.pixel),
            (_, 0) => (bg_palette, bg_pixel),
            _ => {
                self.check_sprite_zero_hit();
                if fg.in_front {
                    (fg.palette, fg.pixel)
                } else {
                    (bg_palette, bg_pixel)
                }
            }
        }
    }

    fn check_sprite_zero_hit(&mut self) {
        if !(self.sprites.zero_hit_possible && self.sprites.zero_being_rendered) {
            return;
        }
        if !self
            .mask
            .contains(PpuMask::SHOW_BACKGROUND | PpuMask::SHOW_SPRITES)
        {
            return;
        }
        let clipped = !self
            .mask
            .intersects(PpuMask::SHOW_BACKGROUND_LEFT | PpuMask::SHOW_SPRITES_LEFT);
        let first = if clipped { 9 } else { 1 };
        if (first..258).contains(&self.cycle) {
            self.status.insert(PpuStatus::ZERO_HIT);
        }
    }
}
