/*!
OamDma: OAM DMA state machine.

Behavioral model
- A write to $4014 latches the source page and arms the transfer. The engine
  starts idle and waits for an odd CPU cycle; that cycle is spent becoming active,
  so the first transfer cycle is always even.
- Active cycles alternate: even cycles read one byte from the CPU bus at
  `page << 8 | addr`, odd cycles store it into OAM at `addr` and advance `addr`.
- When `addr` wraps to 0 all 256 bytes have moved and the engine returns to idle.
- The CPU is not clocked on any cycle the engine is in progress.

The engine never touches memory itself. `advance` reports what the cycle does
and the bus performs the access, so DMA reads carry the same side effects as
CPU reads.
*/

use log::debug;

use crate::savestate::{SaveStateError, StateReader, StateWriter};

/// Work requested from the bus for one DMA cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaAction {
    /// Alignment; no bus access.
    Wait,
    /// Read the CPU bus and hand the byte back through `latch`.
    Read(u16),
    /// Store a byte into OAM.
    Write { index: u8, data: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OamDma {
    page: u8,
    addr: u8,
    data: u8,
    idle: bool,
    in_progress: bool,
}

impl Default for OamDma {
    fn default() -> Self {
        Self {
            page: 0,
            addr: 0,
            data: 0,
            idle: true,
            in_progress: false,
        }
    }
}

impl OamDma {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Arm a transfer from `page << 8`.
    pub fn start(&mut self, page: u8) {
        debug!("OAM DMA from ${:02X}00", page);
        self.page = page;
        self.addr = 0;
        self.in_progress = true;
    }

    #[inline]
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// One CPU cycle of the transfer; `odd` is the parity of the master clock.
    pub fn advance(&mut self, odd: bool) -> DmaAction {
        if self.idle {
            if odd {
                self.idle = false;
            }
            return DmaAction::Wait;
        }

        if !odd {
            return DmaAction::Read(((self.page as u16) << 8) | self.addr as u16);
        }

        let action = DmaAction::Write {
            index: self.addr,
            data: self.data,
        };
        self.addr = self.addr.wrapping_add(1);
        if self.addr == 0 {
            self.in_progress = false;
            self.idle = true;
        }
        action
    }

    /// Byte fetched by the preceding `Read`.
    #[inline]
    pub fn latch(&mut self, data: u8) {
        self.data = data;
    }

    pub(crate) fn save(&self, w: &mut StateWriter) {
        w.u8(self.page);
        w.u8(self.addr);
        w.u8(self.data);
        w.bool(self.idle);
        w.bool(self.in_progress);
    }

    pub(crate) fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError> {
        self.page = r.u8()?;
        self.addr = r.u8()?;
        self.data = r.u8()?;
        self.idle = r.bool()?;
        self.in_progress = r.bool()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_for_odd_cycle_before_transferring() {
        let mut dma = OamDma::new();
        dma.start(0x02);
        assert_eq!(dma.advance(false), DmaAction::Wait);
        assert_eq!(dma.advance(true), DmaAction::Wait);
        assert_eq!(dma.advance(false), DmaAction::Read(0x0200));
        dma.latch(0x5A);
        assert_eq!(
            dma.advance(true),
            DmaAction::Write {
                index: 0,
                data: 0x5A
            }
        );
        assert_eq!(dma.advance(false), DmaAction::Read(0x0201));
    }

    #[test]
    fn finishes_after_256_pairs() {
        let mut dma = OamDma::new();
        dma.start(0x07);
        assert_eq!(dma.advance(true), DmaAction::Wait);

        let mut cycles = 1;
        let mut odd = false;
        while dma.in_progress() {
            if let DmaAction::Read(addr) = dma.advance(odd) {
                dma.latch(addr as u8);
            }
            odd = !odd;
            cycles += 1;
        }
        assert_eq!(cycles, 1 + 512);
        // back to idle: a fresh start waits again
        dma.start(0x07);
        assert_eq!(dma.advance(false), DmaAction::Wait);
    }
}
