/*!
addressing.rs - Operand resolution for the 12 addressing modes.

`resolve` consumes the operand bytes at PC, leaves the effective address in
`addr_abs` (or the sign-extended branch offset in `addr_rel`) and reports
whether indexing crossed a page boundary. The caller decides whether the
crossing costs a cycle.

Quirks reproduced:
- Zero-page indexing wraps within page zero.
- `JMP ($xxFF)` fetches the high byte from the start of the same page.
- `(zp),Y` pointer fetch wraps within page zero.
*/

use crate::cpu::table::AddrMode;
use crate::cpu::{Cpu, CpuBus};

impl Cpu {
    pub(crate) fn fetch_byte<B: CpuBus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let v = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        v
    }

    fn fetch_word<B: CpuBus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_byte(bus) as u16;
        let hi = self.fetch_byte(bus) as u16;
        (hi << 8) | lo
    }

    /// Resolve the operand for `mode`. Returns true when indexing crossed a page.
    pub(crate) fn resolve<B: CpuBus + ?Sized>(&mut self, mode: AddrMode, bus: &mut B) -> bool {
        match mode {
            AddrMode::Implied => {
                self.fetched = self.regs.a;
                false
            }
            AddrMode::Immediate => {
                self.addr_abs = self.regs.pc;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                false
            }
            AddrMode::ZeroPage => {
                self.addr_abs = self.fetch_byte(bus) as u16;
                false
            }
            AddrMode::ZeroPageX => {
                self.addr_abs = self.fetch_byte(bus).wrapping_add(self.regs.x) as u16;
                false
            }
            AddrMode::ZeroPageY => {
                self.addr_abs = self.fetch_byte(bus).wrapping_add(self.regs.y) as u16;
                false
            }
            AddrMode::Relative => {
                let offset = self.fetch_byte(bus);
                self.addr_rel = offset as i8 as i16 as u16;
                false
            }
            AddrMode::Absolute => {
                self.addr_abs = self.fetch_word(bus);
                false
            }
            AddrMode::AbsoluteX => {
                let base = self.fetch_word(bus);
                self.addr_abs = base.wrapping_add(self.regs.x as u16);
                page_crossed(base, self.addr_abs)
            }
            AddrMode::AbsoluteY => {
                let base = self.fetch_word(bus);
                self.addr_abs = base.wrapping_add(self.regs.y as u16);
                page_crossed(base, self.addr_abs)
            }
            AddrMode::Indirect => {
                let ptr = self.fetch_word(bus);
                let hi_addr = if ptr & 0x00FF == 0x00FF {
                    ptr & 0xFF00
                } else {
                    ptr.wrapping_add(1)
                };
                let lo = bus.read(ptr) as u16;
                let hi = bus.read(hi_addr) as u16;
                self.addr_abs = (hi << 8) | lo;
                false
            }
            AddrMode::IndirectX => {
                let zp = self.fetch_byte(bus).wrapping_add(self.regs.x);
                self.addr_abs = read_word_zp(bus, zp);
                false
            }
            AddrMode::IndirectY => {
                let zp = self.fetch_byte(bus);
                let base = read_word_zp(bus, zp);
                self.addr_abs = base.wrapping_add(self.regs.y as u16);
                page_crossed(base, self.addr_abs)
            }
        }
    }
}

#[inline]
fn page_crossed(a: u16, b: u16) -> bool {
    (a & 0xFF00) != (b & 0xFF00)
}

/// Little-endian pointer stored in page zero; the high byte wraps to $00.
fn read_word_zp<B: CpuBus + ?Sized>(bus: &mut B, zp: u8) -> u16 {
    let lo = bus.read(zp as u16) as u16;
    let hi = bus.read(zp.wrapping_add(1) as u16) as u16;
    (hi << 8) | lo
}
