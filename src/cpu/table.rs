/*!
table.rs - Opcode metadata for all 256 opcodes.

Each entry carries the operation, its addressing mode and the base cycle cost.
`Cpu::step` decodes through `INSTRUCTIONS`, resolves the operand with the mode,
runs the operation, then adds one cycle when the mode crossed a page and the
operation is one that pays for it (`Op::page_penalty`).

Undocumented opcodes decode to `Op::Unofficial` or an implied `Op::Nop` and
cost their listed cycles. They never read an operand, so each advances PC by
one byte and never pays a page-cross penalty. 0xEB is SBC in implied form,
which subtracts the accumulator from itself.
*/

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddrMode {
    Implied,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    /// (zp,X)
    IndirectX,
    /// (zp),Y
    IndirectY,
}

#[rustfmt::skip]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    Unofficial,
}

impl Op {
    /// Whether a page crossed during operand resolution costs this operation a cycle.
    pub fn page_penalty(self) -> bool {
        matches!(
            self,
            Op::Adc
                | Op::And
                | Op::Cmp
                | Op::Eor
                | Op::Lda
                | Op::Ldx
                | Op::Ldy
                | Op::Ora
                | Op::Sbc
        )
    }

    #[rustfmt::skip]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::Adc => "ADC", Op::And => "AND", Op::Asl => "ASL", Op::Bcc => "BCC",
            Op::Bcs => "BCS", Op::Beq => "BEQ", Op::Bit => "BIT", Op::Bmi => "BMI",
            Op::Bne => "BNE", Op::Bpl => "BPL", Op::Brk => "BRK", Op::Bvc => "BVC",
            Op::Bvs => "BVS", Op::Clc => "CLC", Op::Cld => "CLD", Op::Cli => "CLI",
            Op::Clv => "CLV", Op::Cmp => "CMP", Op::Cpx => "CPX", Op::Cpy => "CPY",
            Op::Dec => "DEC", Op::Dex => "DEX", Op::Dey => "DEY", Op::Eor => "EOR",
            Op::Inc => "INC", Op::Inx => "INX", Op::Iny => "INY", Op::Jmp => "JMP",
            Op::Jsr => "JSR", Op::Lda => "LDA", Op::Ldx => "LDX", Op::Ldy => "LDY",
            Op::Lsr => "LSR", Op::Nop => "NOP", Op::Ora => "ORA", Op::Pha => "PHA",
            Op::Php => "PHP", Op::Pla => "PLA", Op::Plp => "PLP", Op::Rol => "ROL",
            Op::Ror => "ROR", Op::Rti => "RTI", Op::Rts => "RTS", Op::Sbc => "SBC",
            Op::Sec => "SEC", Op::Sed => "SED", Op::Sei => "SEI", Op::Sta => "STA",
            Op::Stx => "STX", Op::Sty => "STY", Op::Tax => "TAX", Op::Tay => "TAY",
            Op::Tsx => "TSX", Op::Txa => "TXA", Op::Txs => "TXS", Op::Tya => "TYA",
            Op::Unofficial => "???",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub mode: AddrMode,
    pub cycles: u8,
}

const fn op(op: Op, mode: AddrMode, cycles: u8) -> Instruction {
    Instruction { op, mode, cycles }
}

use AddrMode::*;
use Op::*;

#[rustfmt::skip]
pub static INSTRUCTIONS: [Instruction; 256] = [
    // 0x00
    op(Brk, Immediate, 7), op(Ora, IndirectX, 6), op(Unofficial, Implied, 2), op(Unofficial, Implied, 8),
    op(Nop, Implied, 3), op(Ora, ZeroPage, 3), op(Asl, ZeroPage, 5), op(Unofficial, Implied, 5),
    op(Php, Implied, 3), op(Ora, Immediate, 2), op(Asl, Implied, 2), op(Unofficial, Implied, 2),
    op(Nop, Implied, 4), op(Ora, Absolute, 4), op(Asl, Absolute, 6), op(Unofficial, Implied, 6),
    // 0x10
    op(Bpl, Relative, 2), op(Ora, IndirectY, 5), op(Unofficial, Implied, 2), op(Unofficial, Implied, 8),
    op(Nop, Implied, 4), op(Ora, ZeroPageX, 4), op(Asl, ZeroPageX, 6), op(Unofficial, Implied, 6),
    op(Clc, Implied, 2), op(Ora, AbsoluteY, 4), op(Nop, Implied, 2), op(Unofficial, Implied, 7),
    op(Nop, Implied, 4), op(Ora, AbsoluteX, 4), op(Asl, AbsoluteX, 7), op(Unofficial, Implied, 7),
    // 0x20
    op(Jsr, Absolute, 6), op(And, IndirectX, 6), op(Unofficial, Implied, 2), op(Unofficial, Implied, 8),
    op(Bit, ZeroPage, 3), op(And, ZeroPage, 3), op(Rol, ZeroPage, 5), op(Unofficial, Implied, 5),
    op(Plp, Implied, 4), op(And, Immediate, 2), op(Rol, Implied, 2), op(Unofficial, Implied, 2),
    op(Bit, Absolute, 4), op(And, Absolute, 4), op(Rol, Absolute, 6), op(Unofficial, Implied, 6),
    // 0x30
    op(Bmi, Relative, 2), op(And, IndirectY, 5), op(Unofficial, Implied, 2), op(Unofficial, Implied, 8),
    op(Nop, Implied, 4), op(And, ZeroPageX, 4), op(Rol, ZeroPageX, 6), op(Unofficial, Implied, 6),
    op(Sec, Implied, 2), op(And, AbsoluteY, 4), op(Nop, Implied, 2), op(Unofficial, Implied, 7),
    op(Nop, Implied, 4), op(And, AbsoluteX, 4), op(Rol, AbsoluteX, 7), op(Unofficial, Implied, 7),
    // 0x40
    op(Rti, Implied, 6), op(Eor, IndirectX, 6), op(Unofficial, Implied, 2), op(Unofficial, Implied, 8),
    op(Nop, Implied, 3), op(Eor, ZeroPage, 3), op(Lsr, ZeroPage, 5), op(Unofficial, Implied, 5),
    op(Pha, Implied, 3), op(Eor, Immediate, 2), op(Lsr, Implied, 2), op(Unofficial, Implied, 2),
    op(Jmp, Absolute, 3), op(Eor, Absolute, 4), op(Lsr, Absolute, 6), op(Unofficial, Implied, 6),
    // 0x50
    op(Bvc, Relative, 2), op(Eor, IndirectY, 5), op(Unofficial, Implied, 2), op(Unofficial, Implied, 8),
    op(Nop, Implied, 4), op(Eor, ZeroPageX, 4), op(Lsr, ZeroPageX, 6), op(Unofficial, Implied, 6),
    op(Cli, Implied, 2), op(Eor, AbsoluteY, 4), op(Nop, Implied, 2), op(Unofficial, Implied, 7),
    op(Nop, Implied, 4), op(Eor, AbsoluteX, 4), op(Lsr, AbsoluteX, 7), op(Unofficial, Implied, 7),
    // 0x60
    op(Rts, Implied, 6), op(Adc, IndirectX, 6), op(Unofficial, Implied, 2), op(Unofficial, Implied, 8),
    op(Nop, Implied, 3), op(Adc, ZeroPage, 3), op(Ror, ZeroPage, 5), op(Unofficial, Implied, 5),
    op(Pla, Implied, 4), op(Adc, Immediate, 2), op(Ror, Implied, 2), op(Unofficial, Implied, 2),
    op(Jmp, Indirect, 5), op(Adc, Absolute, 4), op(Ror, Absolute, 6), op(Unofficial, Implied, 6),
    // 0x70
    op(Bvs, Relative, 2), op(Adc, IndirectY, 5), op(Unofficial, Implied, 2), op(Unofficial, Implied, 8),
    op(Nop, Implied, 4), op(Adc, ZeroPageX, 4), op(Ror, ZeroPageX, 6), op(Unofficial, Implied, 6),
    op(Sei, Implied, 2), op(Adc, AbsoluteY, 4), op(Nop, Implied, 2), op(Unofficial, Implied, 7),
    op(Nop, Implied, 4), op(Adc, AbsoluteX, 4), op(Ror, AbsoluteX, 7), op(Unofficial, Implied, 7),
    // 0x80
    op(Nop, Implied, 2), op(Sta, IndirectX, 6), op(Nop, Implied, 2), op(Unofficial, Implied, 6),
    op(Sty, ZeroPage, 3), op(Sta, ZeroPage, 3), op(Stx, ZeroPage, 3), op(Unofficial, Implied, 3),
    op(Dey, Implied, 2), op(Nop, Implied, 2), op(Txa, Implied, 2), op(Unofficial, Implied, 2),
    op(Sty, Absolute, 4), op(Sta, Absolute, 4), op(Stx, Absolute, 4), op(Unofficial, Implied, 4),
    // 0x90
    op(Bcc, Relative, 2), op(Sta, IndirectY, 6), op(Unofficial, Implied, 2), op(Unofficial, Implied, 6),
    op(Sty, ZeroPageX, 4), op(Sta, ZeroPageX, 4), op(Stx, ZeroPageY, 4), op(Unofficial, Implied, 4),
    op(Tya, Implied, 2), op(Sta, AbsoluteY, 5), op(Txs, Implied, 2), op(Unofficial, Implied, 5),
    op(Nop, Implied, 5), op(Sta, AbsoluteX, 5), op(Unofficial, Implied, 5), op(Unofficial, Implied, 5),
    // 0xA0
    op(Ldy, Immediate, 2), op(Lda, IndirectX, 6), op(Ldx, Immediate, 2), op(Unofficial, Implied, 6),
    op(Ldy, ZeroPage, 3), op(Lda, ZeroPage, 3), op(Ldx, ZeroPage, 3), op(Unofficial, Implied, 3),
    op(Tay, Implied, 2), op(Lda, Immediate, 2), op(Tax, Implied, 2), op(Unofficial, Implied, 2),
    op(Ldy, Absolute, 4), op(Lda, Absolute, 4), op(Ldx, Absolute, 4), op(Unofficial, Implied, 4),
    // 0xB0
    op(Bcs, Relative, 2), op(Lda, IndirectY, 5), op(Unofficial, Implied, 2), op(Unofficial, Implied, 5),
    op(Ldy, ZeroPageX, 4), op(Lda, ZeroPageX, 4), op(Ldx, ZeroPageY, 4), op(Unofficial, Implied, 4),
    op(Clv, Implied, 2), op(Lda, AbsoluteY, 4), op(Tsx, Implied, 2), op(Unofficial, Implied, 4),
    op(Ldy, AbsoluteX, 4), op(Lda, AbsoluteX, 4), op(Ldx, AbsoluteY, 4), op(Unofficial, Implied, 4),
    // 0xC0
    op(Cpy, Immediate, 2), op(Cmp, IndirectX, 6), op(Nop, Implied, 2), op(Unofficial, Implied, 8),
    op(Cpy, ZeroPage, 3), op(Cmp, ZeroPage, 3), op(Dec, ZeroPage, 5), op(Unofficial, Implied, 5),
    op(Iny, Implied, 2), op(Cmp, Immediate, 2), op(Dex, Implied, 2), op(Unofficial, Implied, 2),
    op(Cpy, Absolute, 4), op(Cmp, Absolute, 4), op(Dec, Absolute, 6), op(Unofficial, Implied, 6),
    // 0xD0
    op(Bne, Relative, 2), op(Cmp, IndirectY, 5), op(Unofficial, Implied, 2), op(Unofficial, Implied, 8),
    op(Nop, Implied, 4), op(Cmp, ZeroPageX, 4), op(Dec, ZeroPageX, 6), op(Unofficial, Implied, 6),
    op(Cld, Implied, 2), op(Cmp, AbsoluteY, 4), op(Nop, Implied, 2), op(Unofficial, Implied, 7),
    op(Nop, Implied, 4), op(Cmp, AbsoluteX, 4), op(Dec, AbsoluteX, 7), op(Unofficial, Implied, 7),
    // 0xE0
    op(Cpx, Immediate, 2), op(Sbc, IndirectX, 6), op(Nop, Implied, 2), op(Unofficial, Implied, 8),
    op(Cpx, ZeroPage, 3), op(Sbc, ZeroPage, 3), op(Inc, ZeroPage, 5), op(Unofficial, Implied, 5),
    op(Inx, Implied, 2), op(Sbc, Immediate, 2), op(Nop, Implied, 2), op(Sbc, Implied, 2),
    op(Cpx, Absolute, 4), op(Sbc, Absolute, 4), op(Inc, Absolute, 6), op(Unofficial, Implied, 6),
    // 0xF0
    op(Beq, Relative, 2), op(Sbc, IndirectY, 5), op(Unofficial, Implied, 2), op(Unofficial, Implied, 8),
    op(Nop, Implied, 4), op(Sbc, ZeroPageX, 4), op(Inc, ZeroPageX, 6), op(Unofficial, Implied, 6),
    op(Sed, Implied, 2), op(Sbc, AbsoluteY, 4), op(Nop, Implied, 2), op(Unofficial, Implied, 7),
    op(Nop, Implied, 4), op(Sbc, AbsoluteX, 4), op(Inc, AbsoluteX, 7), op(Unofficial, Implied, 7),
];
