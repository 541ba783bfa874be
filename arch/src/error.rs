use thiserror::Error;

use crate::op::OpKind;

/// Instruction shape errors, caught while building an `Insn`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InsnError {
    #[error("`{0}` takes no immediate")]
    UnexpectedOperand(OpKind),

    #[error("`{0}` needs an immediate")]
    MissingOperand(OpKind),

    #[error("`{op}` takes {expected} registers, got {got}")]
    RegCount {
        op: OpKind,
        expected: usize,
        got: usize,
    },
}
