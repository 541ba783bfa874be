use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Operand layout of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    /// Registers only
    Regs(usize),
    /// Registers followed by an immediate
    RegsImm(usize),
    /// Registers followed by a memory displacement
    RegsMem(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OpKind {
    ADD,
    SUB,
    AND,
    OR,
    XOR,
    EQ,
    NEQ,
    LT,
    LTS,
    SR,
    SRS,
    SRR,
    SL,
    SLR,
    NOP,
    MOV,
    ADDI,
    SUBI,
    ANDI,
    ORI,
    XORI,
    EQI,
    NEQI,
    LTI,
    LTSI,
    NOT,
    LOADI,
    LOAD,
    STORE,
    IF,
    IFR,
    JUMP,
    JUMPR,
    CALL,
    RET,
    IRET,
}

impl OpKind {
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    pub fn form(self) -> Form {
        use OpKind::*;
        match self {
            ADD | SUB | AND | OR | XOR | EQ | NEQ | LT | LTS => Form::Regs(3),
            SR | SRS | SRR | SL | SLR | MOV | NOT => Form::Regs(2),
            NOP | RET | IRET => Form::Regs(0),
            ADDI | SUBI | ANDI | ORI | XORI | EQI | NEQI | LTI | LTSI => Form::RegsImm(2),
            LOADI | IF | IFR => Form::RegsImm(1),
            JUMP | JUMPR | CALL => Form::RegsImm(0),
            LOAD | STORE => Form::RegsMem(2),
        }
    }
}
