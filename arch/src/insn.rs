use rkasm::bytecode::{Bytecode, BytecodeExt, FinalizeCtx};
use rkasm::expr::Expr;
use rkasm::operand::{EffAddr, ImmVal};
use rkasm::print::Printer;
use rkasm::{pline, Error, Location};
use std::any::Any;
use std::fmt;

use crate::error::InsnError;
use crate::op::{Form, OpKind};
use crate::reg::Reg;

/// Every RK16 instruction is one 32-bit word.
pub const INSN_LEN: u64 = 4;

/// RK16 instruction bytecode.
#[derive(Debug)]
pub struct Insn {
    op: OpKind,
    regs: Vec<Reg>,
    imm: Option<ImmVal>,
    mem: Option<EffAddr>,
    value: Option<u16>,
}

impl Insn {
    pub fn new(op: OpKind, regs: Vec<Reg>, operand: Option<Expr>) -> Result<Self, InsnError> {
        let (nregs, imm, mem) = match (op.form(), operand) {
            (Form::Regs(n), None) => (n, None, None),
            (Form::RegsImm(n), Some(e)) => {
                let imm = match e.get_int() {
                    Some(v) => ImmVal::from_int(v),
                    None => ImmVal::from_expr(e),
                };
                (n, Some(imm), None)
            }
            (Form::RegsMem(n), Some(e)) => {
                let mut ea = EffAddr::new(Some(e));
                EffAddr::set_len(Some(&mut ea), 2);
                (n, None, Some(ea))
            }
            (Form::Regs(_), Some(_)) => return Err(InsnError::UnexpectedOperand(op)),
            (_, None) => return Err(InsnError::MissingOperand(op)),
        };
        if regs.len() != nregs {
            return Err(InsnError::RegCount {
                op,
                expected: nregs,
                got: regs.len(),
            });
        }
        Ok(Insn {
            op,
            regs,
            imm,
            mem,
            value: None,
        })
    }

    pub fn into_bytecode(self, loc: Location) -> Bytecode {
        let mut bc = Bytecode::ext(Box::new(self), loc);
        bc.len = INSN_LEN;
        bc
    }

    pub fn op(&self) -> OpKind {
        self.op
    }

    pub fn regs(&self) -> &[Reg] {
        &self.regs
    }

    pub fn imm(&self) -> Option<&ImmVal> {
        self.imm.as_ref()
    }

    pub fn mem(&self) -> Option<&EffAddr> {
        self.mem.as_ref()
    }

    /// Operand value, once known.
    pub fn value(&self) -> Option<u16> {
        self.value
    }

    fn operand(&self) -> Option<&Expr> {
        match (&self.imm, &self.mem) {
            (Some(imm), _) => Some(&imm.val),
            (None, Some(ea)) => ea.disp.as_ref(),
            (None, None) => None,
        }
    }
}

/// 16-bit value, also accepting sign-extended negatives.
fn fit16(v: u64) -> Option<(u16, bool)> {
    if v <= 0xFFFF {
        Some((v as u16, false))
    } else if v >= u64::MAX - 0x7FFF {
        Some((v as u16, true))
    } else {
        None
    }
}

impl BytecodeExt for Insn {
    fn name(&self) -> &'static str {
        "insn"
    }

    fn print(&self, p: &mut Printer<'_>) -> fmt::Result {
        pline!(p, "_Instruction_")?;
        p.nest(|p| {
            pline!(p, "Op={}", self.op)?;
            let regs: Vec<String> = self.regs.iter().map(|r| r.to_string()).collect();
            pline!(p, "Regs={}", regs.join(","))?;
            if let Some(imm) = &self.imm {
                pline!(p, "Imm={} (len={})", imm.val, imm.len)?;
            }
            if let Some(EffAddr { disp: Some(disp), len, .. }) = &self.mem {
                pline!(p, "Disp={} (len={})", disp, len)?;
            }
            match self.value {
                Some(v) => pline!(p, "Value=0x{:04X}", v),
                None => pline!(p, "Value=?"),
            }
        })
    }

    fn finalize(&mut self, loc: &Location, ctx: &mut FinalizeCtx<'_>) -> Result<(), Error> {
        let Some(e) = self.operand() else {
            return Ok(());
        };
        let symtab = ctx.symtab;
        // labels stay open until layout
        let Some(v) = e.eval(&|name| symtab.equ_value(name)) else {
            return Ok(());
        };
        match fit16(v) {
            Some((value, neg)) => {
                self.value = Some(value);
                if let Some(imm) = &mut self.imm {
                    imm.len = 2;
                    imm.is_neg = neg;
                }
            }
            None => ctx.diags.error(
                loc,
                format!("value 0x{:X} of `{}` does not fit in 16 bits", v, self.op),
            ),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
