/*!
cpu::mod - Public facade for the 6502 CPU core.

Layout:

```text
state.rs       - Architectural registers and `StatusFlags`.
table.rs       - 256-entry opcode table (operation, addressing mode, base cycles).
addressing.rs  - Operand resolution for the 12 addressing modes.
execute.rs     - Instruction semantics.
interrupts.rs  - Reset, IRQ and NMI sequences.
```

Timing model:
- `step` is called once per CPU cycle. When no cycles remain, the next instruction
  is fetched and executed in full, and its cost (base + page-cross + branch extras)
  is loaded into the cycle counter. Every call then consumes one cycle, so the
  remaining calls for that instruction are idle.

The CPU talks to memory only through `CpuBus`.
*/

pub mod addressing;
pub mod execute;
pub mod interrupts;
pub mod state;
pub mod table;

use log::trace;

pub use crate::cpu::state::{CpuState, StatusFlags};
pub use crate::cpu::table::{AddrMode, INSTRUCTIONS, Instruction, Op};

use crate::savestate::{SaveStateError, Snapshot, StateReader, StateWriter};

/// CPU-visible memory.
pub trait CpuBus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cpu {
    pub(crate) regs: CpuState,

    // Execution bookkeeping for the instruction in flight
    opcode: u8,
    addr_abs: u16,
    addr_rel: u16,
    fetched: u8,
    cycles: u8,
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one CPU cycle.
    pub fn step<B: CpuBus + ?Sized>(&mut self, bus: &mut B) {
        if self.cycles == 0 {
            let pc = self.regs.pc;
            self.opcode = self.fetch_byte(bus);
            self.regs.status.insert(StatusFlags::UNUSED);

            let ins = INSTRUCTIONS[self.opcode as usize];
            self.cycles = ins.cycles;
            let crossed = self.resolve(ins.mode, bus);
            self.execute(ins.op, bus);
            if crossed && ins.op.page_penalty() {
                self.cycles += 1;
            }

            self.regs.status.insert(StatusFlags::UNUSED);
            trace!(
                "{:04X}  {:02X}  {}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
                pc,
                self.opcode,
                ins.op.mnemonic(),
                self.regs.a,
                self.regs.x,
                self.regs.y,
                self.regs.status.bits(),
                self.regs.sp
            );
        }
        self.cycles -= 1;
    }

    /// True once the current instruction has used up all of its cycles.
    pub fn complete(&self) -> bool {
        self.cycles == 0
    }

    pub fn cycles_remaining(&self) -> u8 {
        self.cycles
    }

    pub fn state(&self) -> &CpuState {
        &self.regs
    }

    pub fn state_mut(&mut self) -> &mut CpuState {
        &mut self.regs
    }

    #[inline]
    pub fn a(&self) -> u8 {
        self.regs.a
    }
    #[inline]
    pub fn x(&self) -> u8 {
        self.regs.x
    }
    #[inline]
    pub fn y(&self) -> u8 {
        self.regs.y
    }
    #[inline]
    pub fn sp(&self) -> u8 {
        self.regs.sp
    }
    #[inline]
    pub fn pc(&self) -> u16 {
        self.regs.pc
    }
    #[inline]
    pub fn status(&self) -> StatusFlags {
        self.regs.status
    }

    pub(crate) fn push<B: CpuBus + ?Sized>(&mut self, bus: &mut B, value: u8) {
        bus.write(0x0100 | self.regs.sp as u16, value);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
    }

    pub(crate) fn pop<B: CpuBus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        bus.read(0x0100 | self.regs.sp as u16)
    }

    pub(crate) fn push_word<B: CpuBus + ?Sized>(&mut self, bus: &mut B, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    pub(crate) fn pop_word<B: CpuBus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pop(bus) as u16;
        let hi = self.pop(bus) as u16;
        (hi << 8) | lo
    }
}

impl Snapshot for Cpu {
    fn save(&self, w: &mut StateWriter) {
        w.u8(self.regs.a);
        w.u8(self.regs.x);
        w.u8(self.regs.y);
        w.u8(self.regs.sp);
        w.u16(self.regs.pc);
        w.u8(self.regs.status.bits());
        w.u8(self.opcode);
        w.u16(self.addr_abs);
        w.u16(self.addr_rel);
        w.u8(self.cycles);
        w.u8(self.fetched);
    }

    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), SaveStateError> {
        self.regs.a = r.u8()?;
        self.regs.x = r.u8()?;
        self.regs.y = r.u8()?;
        self.regs.sp = r.u8()?;
        self.regs.pc = r.u16()?;
        self.regs.status = StatusFlags::from_bits_retain(r.u8()?);
        self.opcode = r.u8()?;
        self.addr_abs = r.u16()?;
        self.addr_rel = r.u16()?;
        self.cycles = r.u8()?;
        self.fetched = r.u8()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FlatBus;

    #[test]
    fn step_spends_instruction_cycles_before_next_fetch() {
        // LDA #$01 ; LDA #$02
        let mut bus = FlatBus::with_program(0x8000, &[0xA9, 0x01, 0xA9, 0x02]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        bus.run_until_complete(&mut cpu);

        cpu.step(&mut bus);
        assert_eq!(cpu.a(), 0x01);
        assert_eq!(cpu.cycles_remaining(), 1);
        cpu.step(&mut bus);
        assert!(cpu.complete());
        assert_eq!(cpu.pc(), 0x8002);
        cpu.step(&mut bus);
        assert_eq!(cpu.a(), 0x02);
    }

    #[test]
    fn unused_flag_always_set_after_step() {
        // PLP with 0x00 on the stack
        let mut bus = FlatBus::with_program(0x8000, &[0x28]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        bus.run_until_complete(&mut cpu);
        bus.mem[0x01FE] = 0x00;
        bus.run_until_complete(&mut cpu);
        assert!(cpu.status().contains(StatusFlags::UNUSED));
    }

    #[test]
    fn snapshot_round_trip() {
        let mut bus = FlatBus::with_program(0x8000, &[0xA2, 0x33, 0xEA]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        bus.run_until_complete(&mut cpu);
        cpu.step(&mut bus); // mid-instruction

        let mut w = StateWriter::new();
        cpu.save(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 14);

        let mut restored = Cpu::new();
        restored.load(&mut StateReader::new(&bytes)).unwrap();
        assert_eq!(restored.x(), 0x33);
        assert_eq!(restored.pc(), cpu.pc());
        assert_eq!(restored.cycles_remaining(), cpu.cycles_remaining());
        assert_eq!(restored.status(), cpu.status());
    }
}
