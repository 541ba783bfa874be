use std::fmt;
use std::rc::Rc;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum UnaryOp {
    #[strum(serialize = "-")]
    Neg,
    #[strum(serialize = "~")]
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "&")]
    And,
    #[strum(serialize = "|")]
    Or,
    #[strum(serialize = "^")]
    Xor,
    #[strum(serialize = "<<")]
    Shl,
    #[strum(serialize = ">>")]
    Shr,
}

/// Expression node. Bytecodes and symbols own their expressions; dropping
/// the owner drops the whole tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(u64),
    Sym(Rc<str>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Box an integer literal as an identifier leaf.
    pub fn int(v: u64) -> Expr {
        Expr::Int(v)
    }

    pub fn sym(name: impl Into<Rc<str>>) -> Expr {
        Expr::Sym(name.into())
    }

    pub fn unary(op: UnaryOp, e: Expr) -> Expr {
        Expr::Unary(op, Box::new(e))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn mul(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Mul, self, rhs)
    }

    /// Fold a tree without symbols.
    pub fn get_int(&self) -> Option<u64> {
        self.eval(&|_| None)
    }

    /// Fold a tree, asking `env` for symbol values.
    pub fn eval(&self, env: &dyn Fn(&str) -> Option<u64>) -> Option<u64> {
        match self {
            Expr::Int(v) => Some(*v),
            Expr::Sym(name) => env(name),
            Expr::Unary(op, e) => {
                let v = e.eval(env)?;
                Some(match op {
                    UnaryOp::Neg => v.wrapping_neg(),
                    UnaryOp::Not => !v,
                })
            }
            Expr::Binary(op, lhs, rhs) => {
                let l = lhs.eval(env)?;
                let r = rhs.eval(env)?;
                match op {
                    BinaryOp::Add => Some(l.wrapping_add(r)),
                    BinaryOp::Sub => Some(l.wrapping_sub(r)),
                    BinaryOp::Mul => Some(l.wrapping_mul(r)),
                    BinaryOp::Div => l.checked_div(r),
                    BinaryOp::Mod => l.checked_rem(r),
                    BinaryOp::And => Some(l & r),
                    BinaryOp::Or => Some(l | r),
                    BinaryOp::Xor => Some(l ^ r),
                    BinaryOp::Shl => Some(shift(r).and_then(|r| l.checked_shl(r)).unwrap_or(0)),
                    BinaryOp::Shr => Some(shift(r).and_then(|r| l.checked_shr(r)).unwrap_or(0)),
                }
            }
        }
    }
}

fn shift(r: u64) -> Option<u32> {
    u32::try_from(r).ok()
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(v) => write!(f, "{}", v),
            Expr::Sym(name) => write!(f, "{}", name),
            Expr::Unary(op, e) => write!(f, "{}{}", op, Paren(e)),
            Expr::Binary(op, lhs, rhs) => write!(f, "{}{}{}", Paren(lhs), op, Paren(rhs)),
        }
    }
}

struct Paren<'a>(&'a Expr);

impl fmt::Display for Paren<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Int(_) | Expr::Sym(_) => write!(f, "{}", self.0),
            e => write!(f, "({})", e),
        }
    }
}
