/*!
state.rs - Architectural 6502 register state.

`CpuState` holds the programmer-visible registers. Execution bookkeeping
(current opcode, resolved operand address, remaining cycles) lives on `Cpu`.

6502 Status Register Bit Layout (for reference)
===============================================
Bit: 7 6 5 4 3 2 1 0
     N V 1 B D I Z C
Where:
  N = NEGATIVE
  V = OVERFLOW
  1 = UNUSED (always reads as 1)
  B = BREAK (PHP/BRK only; hardware IRQ/NMI push with B clear)
  D = DECIMAL (unused on NES but still toggled by instructions / flags)
  I = IRQ_DISABLE
  Z = ZERO
  C = CARRY
*/

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatusFlags: u8 {
        const CARRY = 0b0000_0001;
        const ZERO = 0b0000_0010;
        const IRQ_DISABLE = 0b0000_0100;
        const DECIMAL = 0b0000_1000;
        const BREAK = 0b0001_0000;
        const UNUSED = 0b0010_0000;
        const OVERFLOW = 0b0100_0000;
        const NEGATIVE = 0b1000_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: StatusFlags,
}

impl Default for CpuState {
    fn default() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0x0000,
            status: StatusFlags::UNUSED,
        }
    }
}

impl CpuState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn flag(&self, f: StatusFlags) -> bool {
        self.status.contains(f)
    }

    #[inline]
    pub fn set_flag(&mut self, f: StatusFlags, on: bool) {
        self.status.set(f, on);
    }

    /// Update ZERO and NEGATIVE from `value`.
    #[inline]
    pub fn update_zn(&mut self, value: u8) {
        self.status.set(StatusFlags::ZERO, value == 0);
        self.status.set(StatusFlags::NEGATIVE, value & 0x80 != 0);
    }
}
