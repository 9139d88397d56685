/*!
execute.rs - Instruction semantics.

Every operation runs after `resolve` has consumed its operand bytes. Operations
that read memory go through `fetch_operand`, which returns the accumulator for
implied/accumulator forms and otherwise reads `addr_abs`. Read-modify-write
operations store back to the accumulator or memory through `write_back`.

Branches add their own extra cycles (+1 taken, +1 more for a page change);
page-cross penalties for indexed reads are added by `Cpu::step`.
*/

use crate::cpu::state::StatusFlags;
use crate::cpu::table::{AddrMode, INSTRUCTIONS, Op};
use crate::cpu::{Cpu, CpuBus};

impl Cpu {
    fn current_mode(&self) -> AddrMode {
        INSTRUCTIONS[self.opcode as usize].mode
    }

    fn fetch_operand<B: CpuBus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        if self.current_mode() != AddrMode::Implied {
            self.fetched = bus.read(self.addr_abs);
        }
        self.fetched
    }

    fn write_back<B: CpuBus + ?Sized>(&mut self, bus: &mut B, value: u8) {
        if self.current_mode() == AddrMode::Implied {
            self.regs.a = value;
        } else {
            bus.write(self.addr_abs, value);
        }
    }

    fn branch_if(&mut self, condition: bool) {
        if !condition {
            return;
        }
        self.cycles += 1;
        self.addr_abs = self.regs.pc.wrapping_add(self.addr_rel);
        if (self.addr_abs & 0xFF00) != (self.regs.pc & 0xFF00) {
            self.cycles += 1;
        }
        self.regs.pc = self.addr_abs;
    }

    fn add_with_carry(&mut self, value: u8) {
        let a = self.regs.a as u16;
        let m = value as u16;
        let sum = a + m + self.regs.flag(StatusFlags::CARRY) as u16;
        let result = sum as u8;
        self.regs.set_flag(StatusFlags::CARRY, sum > 0xFF);
        self.regs.set_flag(
            StatusFlags::OVERFLOW,
            (!(a ^ m) & (a ^ sum)) & 0x0080 != 0,
        );
        self.regs.a = result;
        self.regs.update_zn(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.regs.set_flag(StatusFlags::CARRY, register >= value);
        self.regs.update_zn(register.wrapping_sub(value));
    }

    fn read_modify_write<B, F>(&mut self, bus: &mut B, f: F)
    where
        B: CpuBus + ?Sized,
        F: FnOnce(&mut Self, u8) -> u8,
    {
        let value = self.fetch_operand(bus);
        let result = f(self, value);
        self.regs.update_zn(result);
        self.write_back(bus, result);
    }

    pub(crate) fn execute<B: CpuBus + ?Sized>(&mut self, op: Op, bus: &mut B) {
        match op {
            // ---------------- Loads / stores ----------------
            Op::Lda => {
                self.regs.a = self.fetch_operand(bus);
                self.regs.update_zn(self.regs.a);
            }
            Op::Ldx => {
                self.regs.x = self.fetch_operand(bus);
                self.regs.update_zn(self.regs.x);
            }
            Op::Ldy => {
                self.regs.y = self.fetch_operand(bus);
                self.regs.update_zn(self.regs.y);
            }
            Op::Sta => bus.write(self.addr_abs, self.regs.a),
            Op::Stx => bus.write(self.addr_abs, self.regs.x),
            Op::Sty => bus.write(self.addr_abs, self.regs.y),

            // ---------------- Transfers ----------------
            Op::Tax => {
                self.regs.x = self.regs.a;
                self.regs.update_zn(self.regs.x);
            }
            Op::Tay => {
                self.regs.y = self.regs.a;
                self.regs.update_zn(self.regs.y);
            }
            Op::Tsx => {
                self.regs.x = self.regs.sp;
                self.regs.update_zn(self.regs.x);
            }
            Op::Txa => {
                self.regs.a = self.regs.x;
                self.regs.update_zn(self.regs.a);
            }
            Op::Txs => self.regs.sp = self.regs.x,
            Op::Tya => {
                self.regs.a = self.regs.y;
                self.regs.update_zn(self.regs.a);
            }

            // ---------------- Stack ----------------
            Op::Pha => self.push(bus, self.regs.a),
            Op::Php => {
                let pushed = self.regs.status | StatusFlags::BREAK | StatusFlags::UNUSED;
                self.push(bus, pushed.bits());
            }
            Op::Pla => {
                self.regs.a = self.pop(bus);
                self.regs.update_zn(self.regs.a);
            }
            Op::Plp => {
                self.regs.status = StatusFlags::from_bits_retain(self.pop(bus));
                self.regs.status.remove(StatusFlags::BREAK);
                self.regs.status.insert(StatusFlags::UNUSED);
            }

            // ---------------- Logic / arithmetic ----------------
            Op::And => {
                self.regs.a &= self.fetch_operand(bus);
                self.regs.update_zn(self.regs.a);
            }
            Op::Ora => {
                self.regs.a |= self.fetch_operand(bus);
                self.regs.update_zn(self.regs.a);
            }
            Op::Eor => {
                self.regs.a ^= self.fetch_operand(bus);
                self.regs.update_zn(self.regs.a);
            }
            Op::Bit => {
                let m = self.fetch_operand(bus);
                self.regs.set_flag(StatusFlags::ZERO, self.regs.a & m == 0);
                self.regs.set_flag(StatusFlags::NEGATIVE, m & 0x80 != 0);
                self.regs.set_flag(StatusFlags::OVERFLOW, m & 0x40 != 0);
            }
            Op::Adc => {
                let m = self.fetch_operand(bus);
                self.add_with_carry(m);
            }
            // Subtraction is addition of the one's complement.
            Op::Sbc => {
                let m = self.fetch_operand(bus);
                self.add_with_carry(m ^ 0xFF);
            }
            Op::Cmp => {
                let m = self.fetch_operand(bus);
                self.compare(self.regs.a, m);
            }
            Op::Cpx => {
                let m = self.fetch_operand(bus);
                self.compare(self.regs.x, m);
            }
            Op::Cpy => {
                let m = self.fetch_operand(bus);
                self.compare(self.regs.y, m);
            }

            // ---------------- Increments ----------------
            Op::Inc => {
                let v = self.fetch_operand(bus).wrapping_add(1);
                bus.write(self.addr_abs, v);
                self.regs.update_zn(v);
            }
            Op::Dec => {
                let v = self.fetch_operand(bus).wrapping_sub(1);
                bus.write(self.addr_abs, v);
                self.regs.update_zn(v);
            }
            Op::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.update_zn(self.regs.x);
            }
            Op::Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.update_zn(self.regs.y);
            }
            Op::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.update_zn(self.regs.x);
            }
            Op::Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.update_zn(self.regs.y);
            }

            // ---------------- Shifts / rotates ----------------
            Op::Asl => self.read_modify_write(bus, |cpu, v| {
                cpu.regs.set_flag(StatusFlags::CARRY, v & 0x80 != 0);
                v << 1
            }),
            Op::Lsr => self.read_modify_write(bus, |cpu, v| {
                cpu.regs.set_flag(StatusFlags::CARRY, v & 0x01 != 0);
                v >> 1
            }),
            Op::Rol => self.read_modify_write(bus, |cpu, v| {
                let carry_in = cpu.regs.flag(StatusFlags::CARRY) as u8;
                cpu.regs.set_flag(StatusFlags::CARRY, v & 0x80 != 0);
                (v << 1) | carry_in
            }),
            Op::Ror => self.read_modify_write(bus, |cpu, v| {
                let carry_in = (cpu.regs.flag(StatusFlags::CARRY) as u8) << 7;
                cpu.regs.set_flag(StatusFlags::CARRY, v & 0x01 != 0);
                (v >> 1) | carry_in
            }),

            // ---------------- Jumps / calls ----------------
            Op::Jmp => self.regs.pc = self.addr_abs,
            Op::Jsr => {
                let ret = self.regs.pc.wrapping_sub(1);
                self.push_word(bus, ret);
                self.regs.pc = self.addr_abs;
            }
            Op::Rts => {
                self.regs.pc = self.pop_word(bus).wrapping_add(1);
            }
            Op::Rti => {
                self.regs.status = StatusFlags::from_bits_retain(self.pop(bus));
                self.regs.status.remove(StatusFlags::BREAK);
                self.regs.status.insert(StatusFlags::UNUSED);
                self.regs.pc = self.pop_word(bus);
            }
            Op::Brk => {
                // The padding byte was consumed as an immediate operand.
                self.push_word(bus, self.regs.pc);
                // I is raised before the status push, so the stacked copy has it set.
                self.regs.status.insert(StatusFlags::IRQ_DISABLE);
                let pushed = self.regs.status | StatusFlags::BREAK | StatusFlags::UNUSED;
                self.push(bus, pushed.bits());
                self.regs.pc = bus.read_word(0xFFFE);
            }

            // ---------------- Branches ----------------
            Op::Bcc => self.branch_if(!self.regs.flag(StatusFlags::CARRY)),
            Op::Bcs => self.branch_if(self.regs.flag(StatusFlags::CARRY)),
            Op::Bne => self.branch_if(!self.regs.flag(StatusFlags::ZERO)),
            Op::Beq => self.branch_if(self.regs.flag(StatusFlags::ZERO)),
            Op::Bpl => self.branch_if(!self.regs.flag(StatusFlags::NEGATIVE)),
            Op::Bmi => self.branch_if(self.regs.flag(StatusFlags::NEGATIVE)),
            Op::Bvc => self.branch_if(!self.regs.flag(StatusFlags::OVERFLOW)),
            Op::Bvs => self.branch_if(self.regs.flag(StatusFlags::OVERFLOW)),

            // ---------------- Flags ----------------
            Op::Clc => self.regs.set_flag(StatusFlags::CARRY, false),
            Op::Cld => self.regs.set_flag(StatusFlags::DECIMAL, false),
            Op::Cli => self.regs.set_flag(StatusFlags::IRQ_DISABLE, false),
            Op::Clv => self.regs.set_flag(StatusFlags::OVERFLOW, false),
            Op::Sec => self.regs.set_flag(StatusFlags::CARRY, true),
            Op::Sed => self.regs.set_flag(StatusFlags::DECIMAL, true),
            Op::Sei => self.regs.set_flag(StatusFlags::IRQ_DISABLE, true),

            Op::Nop | Op::Unofficial => {}
        }
    }
}
