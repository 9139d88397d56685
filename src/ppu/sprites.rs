#![doc = r#"
Sprite pipeline

- Evaluation runs once per visible scanline (dot 257): OAM is scanned in index
  order and up to eight entries whose rows cover the scanline are copied into the
  slot table. A ninth match sets the overflow flag.
- Pattern fetch runs at dot 340: each slot's row is resolved for 8x8 or 8x16
  mode and vertical flip, then both bit planes are loaded into that slot's
  shifters (bit-reversed for horizontal flip).
- During the next scanline each slot's X byte counts down to zero; from then on
  its shifters advance one bit per dot.
"#]

use super::Ppu;
use super::registers::{PpuCtrl, PpuMask, PpuStatus};
use crate::ppu_bus::PpuBus;

pub(crate) const MAX_SPRITES_PER_LINE: usize = 8;

const ATTR_FLIP_V: u8 = 0x80;
const ATTR_FLIP_H: u8 = 0x40;
const ATTR_BEHIND_BG: u8 = 0x20;

/// One four-byte OAM record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OamEntry {
    pub y: u8,
    pub id: u8,
    pub attr: u8,
    pub x: u8,
}

impl OamEntry {
    /// Cleared slot contents.
    pub const EMPTY: OamEntry = OamEntry {
        y: 0xFF,
        id: 0xFF,
        attr: 0xFF,
        x: 0xFF,
    };

    pub fn from_bytes(b: &[u8; 4]) -> Self {
        Self {
            y: b[0],
            id: b[1],
            attr: b[2],
            x: b[3],
        }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.y, self.id, self.attr, self.x]
    }
}

impl Default for OamEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Foreground candidate for one dot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SpritePixel {
    pub pixel: u8,
    pub palette: u8,
    pub in_front: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SpritePipeline {
    /// Selected entries; `x` doubles as the remaining delay counter.
    pub slots: [OamEntry; MAX_SPRITES_PER_LINE],
    pub count: u8,
    pub pattern_lo: [u8; MAX_SPRITES_PER_LINE],
    pub pattern_hi: [u8; MAX_SPRITES_PER_LINE],
    pub zero_hit_possible: bool,
    pub zero_being_rendered: bool,
}

impl Default for SpritePipeline {
    fn default() -> Self {
        Self {
            slots: [OamEntry::EMPTY; MAX_SPRITES_PER_LINE],
            count: 0,
            pattern_lo: [0; MAX_SPRITES_PER_LINE],
            pattern_hi: [0; MAX_SPRITES_PER_LINE],
            zero_hit_possible: false,
            zero_being_rendered: false,
        }
    }
}

impl SpritePipeline {
    pub fn clear_shifters(&mut self) {
        self.pattern_lo = [0; MAX_SPRITES_PER_LINE];
        self.pattern_hi = [0; MAX_SPRITES_PER_LINE];
    }

    fn active(&self) -> usize {
        (self.count as usize).min(MAX_SPRITES_PER_LINE)
    }

    /// Count down X delays; slots already at zero shift out one bit.
    pub fn shift(&mut self) {
        for i in 0..self.active() {
            if self.slots[i].x > 0 {
                self.slots[i].x -= 1;
            } else {
                self.pattern_lo[i] <<= 1;
                self.pattern_hi[i] <<= 1;
            }
        }
    }

    /// First opaque pixel among the slots that have reached their X position.
    pub fn pixel(&mut self) -> SpritePixel {
        self.zero_being_rendered = false;
        for i in 0..self.active() {
            let slot = self.slots[i];
            if slot.x != 0 {
                continue;
            }
            let pixel = ((self.pattern_hi[i] >> 7) << 1) | (self.pattern_lo[i] >> 7);
            if pixel != 0 {
                self.zero_being_rendered = i == 0;
                return SpritePixel {
                    pixel,
                    palette: (slot.attr & 0x03) + 0x04,
                    in_front: slot.attr & ATTR_BEHIND_BG == 0,
                };
            }
        }
        SpritePixel::default()
    }
}

impl Ppu {
    /// Pick the sprites drawn on the scanline after `self.scanline`.
    pub(in crate::ppu) fn evaluate_sprites(&mut self) {
        let sprites = &mut self.sprites;
        sprites.slots = [OamEntry::EMPTY; MAX_SPRITES_PER_LINE];
        sprites.count = 0;
        sprites.clear_shifters();
        sprites.zero_hit_possible = false;

        let height = self.ctrl.sprite_height();
        let mut overflow = false;
        for (index, raw) in self.oam.chunks_exact(4).enumerate() {
            let entry = OamEntry::from_bytes(&[raw[0], raw[1], raw[2], raw[3]]);
            let diff = self.scanline - entry.y as i16;
            if !(0..height).contains(&diff) {
                continue;
            }
            if (sprites.count as usize) == MAX_SPRITES_PER_LINE {
                overflow = true;
                break;
            }
            if index == 0 {
                sprites.zero_hit_possible = true;
            }
            sprites.slots[sprites.count as usize] = entry;
            sprites.count += 1;
        }

        if overflow {
            self.status.insert(PpuStatus::OVERFLOW);
        }
    }

    /// Pattern address of the low bit plane for `entry` on the current scanline.
    fn sprite_row_addr(&self, entry: OamEntry) -> u16 {
        let row = self.scanline.wrapping_sub(entry.y as i16) as u16;
        let flip_v = entry.attr & ATTR_FLIP_V != 0;
        let fine = if flip_v { 7 - (row & 0x07) } else { row & 0x07 };

        if !self.ctrl.contains(PpuCtrl::SPRITE_16) {
            let table = if self.ctrl.contains(PpuCtrl::SPRITE_TABLE) { 0x1000 } else { 0 };
            table | ((entry.id as u16) << 4) | fine
        } else {
            // 8x16: bit 0 of the id picks the table, the rest the top tile
            let table = ((entry.id & 0x01) as u16) << 12;
            let top = (entry.id & 0xFE) as u16;
            let tile = if (row < 8) != flip_v { top } else { top + 1 };
            table | (tile << 4) | fine
        }
    }

    pub(in crate::ppu) fn fetch_sprite_patterns<B: PpuBus + ?Sized>(&mut self, cart: &B) {
        for i in 0..self.sprites.active() {
            let entry = self.sprites.slots[i];
            let addr = self.sprite_row_addr(entry);
            let mut lo = self.ppu_read(cart, addr);
            let mut hi = self.ppu_read(cart, addr.wrapping_add(8));
            if entry.attr & ATTR_FLIP_H != 0 {
                lo = lo.reverse_bits();
                hi = hi.reverse_bits();
            }
            self.sprites.pattern_lo[i] = lo;
            self.sprites.pattern_hi[i] = hi;
        }
    }

    /// Sprite half of the per-dot shifter update.
    pub(in crate::ppu) fn shift_sprites(&mut self) {
        if self.mask.contains(PpuMask::SHOW_SPRITES) && (1..258).contains(&self.cycle) {
            self.sprites.shift();
        }
    }
}
