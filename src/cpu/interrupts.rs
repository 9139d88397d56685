//! Reset, IRQ and NMI sequences.
//!
//! IRQ and NMI push PC and then status with BREAK clear and UNUSED set, set
//! IRQ_DISABLE, and load PC from their vector. The cost is loaded into the
//! cycle counter, so the following `step` calls are idle.

use log::debug;

use crate::cpu::state::{CpuState, StatusFlags};
use crate::cpu::{Cpu, CpuBus};

const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
const IRQ_VECTOR: u16 = 0xFFFE;

impl Cpu {
    /// Load PC from the reset vector and return registers to power-on values.
    pub fn reset<B: CpuBus + ?Sized>(&mut self, bus: &mut B) {
        self.regs = CpuState::default();
        self.regs.pc = bus.read_word(RESET_VECTOR);
        self.addr_rel = 0;
        self.addr_abs = 0;
        self.fetched = 0;
        self.cycles = 8;
    }

    /// Maskable interrupt; ignored while IRQ_DISABLE is set.
    pub fn irq<B: CpuBus + ?Sized>(&mut self, bus: &mut B) {
        if self.regs.flag(StatusFlags::IRQ_DISABLE) {
            return;
        }
        debug!("IRQ at PC={:04X}", self.regs.pc);
        self.interrupt(bus, IRQ_VECTOR);
        self.cycles = 7;
    }

    pub fn nmi<B: CpuBus + ?Sized>(&mut self, bus: &mut B) {
        debug!("NMI at PC={:04X}", self.regs.pc);
        self.interrupt(bus, NMI_VECTOR);
        self.cycles = 8;
    }

    fn interrupt<B: CpuBus + ?Sized>(&mut self, bus: &mut B, vector: u16) {
        self.push_word(bus, self.regs.pc);
        let mut pushed = self.regs.status;
        pushed.remove(StatusFlags::BREAK);
        pushed.insert(StatusFlags::UNUSED);
        self.push(bus, pushed.bits());
        self.regs.status.insert(StatusFlags::IRQ_DISABLE);
        self.regs.pc = bus.read_word(vector);
    }
}
