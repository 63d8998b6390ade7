//! The 256-entry decode table shared by every [`Cpu`](super::cpu::Cpu).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Imp,
    Acc,
    Imm,
    Rel,
    Zp0,
    Zpx,
    Zpy,
    Abs,
    Abx,
    Aby,
    /// JMP only. Reproduces the page-wrap bug of the pointer fetch.
    Ind,
    Izx,
    Izy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    /// Undocumented opcode, executed as a no-op of its listed cost.
    Illegal,
}

impl Instruction {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Adc => "ADC",
            Self::And => "AND",
            Self::Asl => "ASL",
            Self::Bcc => "BCC",
            Self::Bcs => "BCS",
            Self::Beq => "BEQ",
            Self::Bit => "BIT",
            Self::Bmi => "BMI",
            Self::Bne => "BNE",
            Self::Bpl => "BPL",
            Self::Brk => "BRK",
            Self::Bvc => "BVC",
            Self::Bvs => "BVS",
            Self::Clc => "CLC",
            Self::Cld => "CLD",
            Self::Cli => "CLI",
            Self::Clv => "CLV",
            Self::Cmp => "CMP",
            Self::Cpx => "CPX",
            Self::Cpy => "CPY",
            Self::Dec => "DEC",
            Self::Dex => "DEX",
            Self::Dey => "DEY",
            Self::Eor => "EOR",
            Self::Inc => "INC",
            Self::Inx => "INX",
            Self::Iny => "INY",
            Self::Jmp => "JMP",
            Self::Jsr => "JSR",
            Self::Lda => "LDA",
            Self::Ldx => "LDX",
            Self::Ldy => "LDY",
            Self::Lsr => "LSR",
            Self::Nop => "NOP",
            Self::Ora => "ORA",
            Self::Pha => "PHA",
            Self::Php => "PHP",
            Self::Pla => "PLA",
            Self::Plp => "PLP",
            Self::Rol => "ROL",
            Self::Ror => "ROR",
            Self::Rti => "RTI",
            Self::Rts => "RTS",
            Self::Sbc => "SBC",
            Self::Sec => "SEC",
            Self::Sed => "SED",
            Self::Sei => "SEI",
            Self::Sta => "STA",
            Self::Stx => "STX",
            Self::Sty => "STY",
            Self::Tax => "TAX",
            Self::Tay => "TAY",
            Self::Tsx => "TSX",
            Self::Txa => "TXA",
            Self::Txs => "TXS",
            Self::Tya => "TYA",
            Self::Illegal => "???",
        }
    }
}

/// One decode table entry.
///
/// `page_cycles` is charged when operand resolution crosses a page. For
/// branches it is charged on top of the taken-branch cycle when the target
/// lands on another page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub instruction: Instruction,
    pub mode: AddressingMode,
    pub cycles: u8,
    pub page_cycles: u8,
}

impl Opcode {
    pub const fn name(&self) -> &'static str {
        self.instruction.mnemonic()
    }
}

const fn op(instruction: Instruction, mode: AddressingMode, cycles: u8, page_cycles: u8) -> Opcode {
    Opcode {
        instruction,
        mode,
        cycles,
        page_cycles,
    }
}

use AddressingMode::*;
use Instruction::*;

#[rustfmt::skip]
pub static OPCODES: [Opcode; 256] = [
    /* 00 */ op(Brk, Imp, 7, 0), op(Ora, Izx, 6, 0), op(Illegal, Imp, 2, 0), op(Illegal, Izx, 8, 0),
    /* 04 */ op(Nop, Zp0, 3, 0), op(Ora, Zp0, 3, 0), op(Asl, Zp0, 5, 0), op(Illegal, Zp0, 5, 0),
    /* 08 */ op(Php, Imp, 3, 0), op(Ora, Imm, 2, 0), op(Asl, Acc, 2, 0), op(Illegal, Imm, 2, 0),
    /* 0C */ op(Nop, Abs, 4, 0), op(Ora, Abs, 4, 0), op(Asl, Abs, 6, 0), op(Illegal, Abs, 6, 0),
    /* 10 */ op(Bpl, Rel, 2, 1), op(Ora, Izy, 5, 1), op(Illegal, Imp, 2, 0), op(Illegal, Izy, 8, 0),
    /* 14 */ op(Nop, Zpx, 4, 0), op(Ora, Zpx, 4, 0), op(Asl, Zpx, 6, 0), op(Illegal, Zpx, 6, 0),
    /* 18 */ op(Clc, Imp, 2, 0), op(Ora, Aby, 4, 1), op(Nop, Imp, 2, 0), op(Illegal, Aby, 7, 0),
    /* 1C */ op(Nop, Abx, 4, 1), op(Ora, Abx, 4, 1), op(Asl, Abx, 7, 0), op(Illegal, Abx, 7, 0),
    /* 20 */ op(Jsr, Abs, 6, 0), op(And, Izx, 6, 0), op(Illegal, Imp, 2, 0), op(Illegal, Izx, 8, 0),
    /* 24 */ op(Bit, Zp0, 3, 0), op(And, Zp0, 3, 0), op(Rol, Zp0, 5, 0), op(Illegal, Zp0, 5, 0),
    /* 28 */ op(Plp, Imp, 4, 0), op(And, Imm, 2, 0), op(Rol, Acc, 2, 0), op(Illegal, Imm, 2, 0),
    /* 2C */ op(Bit, Abs, 4, 0), op(And, Abs, 4, 0), op(Rol, Abs, 6, 0), op(Illegal, Abs, 6, 0),
    /* 30 */ op(Bmi, Rel, 2, 1), op(And, Izy, 5, 1), op(Illegal, Imp, 2, 0), op(Illegal, Izy, 8, 0),
    /* 34 */ op(Nop, Zpx, 4, 0), op(And, Zpx, 4, 0), op(Rol, Zpx, 6, 0), op(Illegal, Zpx, 6, 0),
    /* 38 */ op(Sec, Imp, 2, 0), op(And, Aby, 4, 1), op(Nop, Imp, 2, 0), op(Illegal, Aby, 7, 0),
    /* 3C */ op(Nop, Abx, 4, 1), op(And, Abx, 4, 1), op(Rol, Abx, 7, 0), op(Illegal, Abx, 7, 0),
    /* 40 */ op(Rti, Imp, 6, 0), op(Eor, Izx, 6, 0), op(Illegal, Imp, 2, 0), op(Illegal, Izx, 8, 0),
    /* 44 */ op(Nop, Zp0, 3, 0), op(Eor, Zp0, 3, 0), op(Lsr, Zp0, 5, 0), op(Illegal, Zp0, 5, 0),
    /* 48 */ op(Pha, Imp, 3, 0), op(Eor, Imm, 2, 0), op(Lsr, Acc, 2, 0), op(Illegal, Imm, 2, 0),
    /* 4C */ op(Jmp, Abs, 3, 0), op(Eor, Abs, 4, 0), op(Lsr, Abs, 6, 0), op(Illegal, Abs, 6, 0),
    /* 50 */ op(Bvc, Rel, 2, 1), op(Eor, Izy, 5, 1), op(Illegal, Imp, 2, 0), op(Illegal, Izy, 8, 0),
    /* 54 */ op(Nop, Zpx, 4, 0), op(Eor, Zpx, 4, 0), op(Lsr, Zpx, 6, 0), op(Illegal, Zpx, 6, 0),
    /* 58 */ op(Cli, Imp, 2, 0), op(Eor, Aby, 4, 1), op(Nop, Imp, 2, 0), op(Illegal, Aby, 7, 0),
    /* 5C */ op(Nop, Abx, 4, 1), op(Eor, Abx, 4, 1), op(Lsr, Abx, 7, 0), op(Illegal, Abx, 7, 0),
    /* 60 */ op(Rts, Imp, 6, 0), op(Adc, Izx, 6, 0), op(Illegal, Imp, 2, 0), op(Illegal, Izx, 8, 0),
    /* 64 */ op(Nop, Zp0, 3, 0), op(Adc, Zp0, 3, 0), op(Ror, Zp0, 5, 0), op(Illegal, Zp0, 5, 0),
    /* 68 */ op(Pla, Imp, 4, 0), op(Adc, Imm, 2, 0), op(Ror, Acc, 2, 0), op(Illegal, Imm, 2, 0),
    /* 6C */ op(Jmp, Ind, 5, 0), op(Adc, Abs, 4, 0), op(Ror, Abs, 6, 0), op(Illegal, Abs, 6, 0),
    /* 70 */ op(Bvs, Rel, 2, 1), op(Adc, Izy, 5, 1), op(Illegal, Imp, 2, 0), op(Illegal, Izy, 8, 0),
    /* 74 */ op(Nop, Zpx, 4, 0), op(Adc, Zpx, 4, 0), op(Ror, Zpx, 6, 0), op(Illegal, Zpx, 6, 0),
    /* 78 */ op(Sei, Imp, 2, 0), op(Adc, Aby, 4, 1), op(Nop, Imp, 2, 0), op(Illegal, Aby, 7, 0),
    /* 7C */ op(Nop, Abx, 4, 1), op(Adc, Abx, 4, 1), op(Ror, Abx, 7, 0), op(Illegal, Abx, 7, 0),
    /* 80 */ op(Nop, Imm, 2, 0), op(Sta, Izx, 6, 0), op(Nop, Imm, 2, 0), op(Illegal, Izx, 6, 0),
    /* 84 */ op(Sty, Zp0, 3, 0), op(Sta, Zp0, 3, 0), op(Stx, Zp0, 3, 0), op(Illegal, Zp0, 3, 0),
    /* 88 */ op(Dey, Imp, 2, 0), op(Nop, Imm, 2, 0), op(Txa, Imp, 2, 0), op(Illegal, Imm, 2, 0),
    /* 8C */ op(Sty, Abs, 4, 0), op(Sta, Abs, 4, 0), op(Stx, Abs, 4, 0), op(Illegal, Abs, 4, 0),
    /* 90 */ op(Bcc, Rel, 2, 1), op(Sta, Izy, 6, 0), op(Illegal, Imp, 2, 0), op(Illegal, Izy, 6, 0),
    /* 94 */ op(Sty, Zpx, 4, 0), op(Sta, Zpx, 4, 0), op(Stx, Zpy, 4, 0), op(Illegal, Zpy, 4, 0),
    /* 98 */ op(Tya, Imp, 2, 0), op(Sta, Aby, 5, 0), op(Txs, Imp, 2, 0), op(Illegal, Aby, 5, 0),
    /* 9C */ op(Illegal, Abx, 5, 0), op(Sta, Abx, 5, 0), op(Illegal, Aby, 5, 0), op(Illegal, Aby, 5, 0),
    /* A0 */ op(Ldy, Imm, 2, 0), op(Lda, Izx, 6, 0), op(Ldx, Imm, 2, 0), op(Illegal, Izx, 6, 0),
    /* A4 */ op(Ldy, Zp0, 3, 0), op(Lda, Zp0, 3, 0), op(Ldx, Zp0, 3, 0), op(Illegal, Zp0, 3, 0),
    /* A8 */ op(Tay, Imp, 2, 0), op(Lda, Imm, 2, 0), op(Tax, Imp, 2, 0), op(Illegal, Imm, 2, 0),
    /* AC */ op(Ldy, Abs, 4, 0), op(Lda, Abs, 4, 0), op(Ldx, Abs, 4, 0), op(Illegal, Abs, 4, 0),
    /* B0 */ op(Bcs, Rel, 2, 1), op(Lda, Izy, 5, 1), op(Illegal, Imp, 2, 0), op(Illegal, Izy, 5, 1),
    /* B4 */ op(Ldy, Zpx, 4, 0), op(Lda, Zpx, 4, 0), op(Ldx, Zpy, 4, 0), op(Illegal, Zpy, 4, 0),
    /* B8 */ op(Clv, Imp, 2, 0), op(Lda, Aby, 4, 1), op(Tsx, Imp, 2, 0), op(Illegal, Aby, 4, 1),
    /* BC */ op(Ldy, Abx, 4, 1), op(Lda, Abx, 4, 1), op(Ldx, Aby, 4, 1), op(Illegal, Aby, 4, 1),
    /* C0 */ op(Cpy, Imm, 2, 0), op(Cmp, Izx, 6, 0), op(Nop, Imm, 2, 0), op(Illegal, Izx, 8, 0),
    /* C4 */ op(Cpy, Zp0, 3, 0), op(Cmp, Zp0, 3, 0), op(Dec, Zp0, 5, 0), op(Illegal, Zp0, 5, 0),
    /* C8 */ op(Iny, Imp, 2, 0), op(Cmp, Imm, 2, 0), op(Dex, Imp, 2, 0), op(Illegal, Imm, 2, 0),
    /* CC */ op(Cpy, Abs, 4, 0), op(Cmp, Abs, 4, 0), op(Dec, Abs, 6, 0), op(Illegal, Abs, 6, 0),
    /* D0 */ op(Bne, Rel, 2, 1), op(Cmp, Izy, 5, 1), op(Illegal, Imp, 2, 0), op(Illegal, Izy, 8, 0),
    /* D4 */ op(Nop, Zpx, 4, 0), op(Cmp, Zpx, 4, 0), op(Dec, Zpx, 6, 0), op(Illegal, Zpx, 6, 0),
    /* D8 */ op(Cld, Imp, 2, 0), op(Cmp, Aby, 4, 1), op(Nop, Imp, 2, 0), op(Illegal, Aby, 7, 0),
    /* DC */ op(Nop, Abx, 4, 1), op(Cmp, Abx, 4, 1), op(Dec, Abx, 7, 0), op(Illegal, Abx, 7, 0),
    /* E0 */ op(Cpx, Imm, 2, 0), op(Sbc, Izx, 6, 0), op(Nop, Imm, 2, 0), op(Illegal, Izx, 8, 0),
    /* E4 */ op(Cpx, Zp0, 3, 0), op(Sbc, Zp0, 3, 0), op(Inc, Zp0, 5, 0), op(Illegal, Zp0, 5, 0),
    /* E8 */ op(Inx, Imp, 2, 0), op(Sbc, Imm, 2, 0), op(Nop, Imp, 2, 0), op(Sbc, Imm, 2, 0),
    /* EC */ op(Cpx, Abs, 4, 0), op(Sbc, Abs, 4, 0), op(Inc, Abs, 6, 0), op(Illegal, Abs, 6, 0),
    /* F0 */ op(Beq, Rel, 2, 1), op(Sbc, Izy, 5, 1), op(Illegal, Imp, 2, 0), op(Illegal, Izy, 8, 0),
    /* F4 */ op(Nop, Zpx, 4, 0), op(Sbc, Zpx, 4, 0), op(Inc, Zpx, 6, 0), op(Illegal, Zpx, 6, 0),
    /* F8 */ op(Sed, Imp, 2, 0), op(Sbc, Aby, 4, 1), op(Nop, Imp, 2, 0), op(Illegal, Aby, 7, 0),
    /* FC */ op(Nop, Abx, 4, 1), op(Sbc, Abx, 4, 1), op(Inc, Abx, 7, 0), op(Illegal, Abx, 7, 0),
];

#[inline]
pub fn lookup(opcode: u8) -> &'static Opcode {
    &OPCODES[opcode as usize]
}
