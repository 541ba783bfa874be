//! Operand pieces shared by architecture bytecodes.

use crate::expr::Expr;

/// Immediate operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmVal {
    pub val: Expr,
    /// Final length in bytes, 0 while unknown
    pub len: u8,
    pub is_neg: bool,
}

impl ImmVal {
    pub fn from_int(v: u64) -> Self {
        let len = if v & 0xFF == v {
            1
        } else if v & 0xFFFF == v {
            2
        } else {
            4
        };
        ImmVal {
            val: Expr::int(v),
            len,
            is_neg: false,
        }
    }

    pub fn from_expr(val: Expr) -> Self {
        ImmVal {
            val,
            len: 0,
            is_neg: false,
        }
    }
}

/// Effective address operand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffAddr {
    pub disp: Option<Expr>,
    /// Displacement length in bytes, 0 while unknown
    pub len: u8,
    pub nosplit: bool,
}

impl EffAddr {
    pub fn new(disp: Option<Expr>) -> Self {
        EffAddr {
            disp,
            ..Default::default()
        }
    }

    /// Explicit size override; truncation is not diagnosed.
    pub fn set_len(ea: Option<&mut EffAddr>, len: u8) {
        if let Some(ea) = ea {
            ea.len = len;
        }
    }

    pub fn set_nosplit(ea: Option<&mut EffAddr>, nosplit: bool) {
        if let Some(ea) = ea {
            ea.nosplit = nosplit;
        }
    }
}
