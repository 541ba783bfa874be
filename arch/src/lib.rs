pub mod error;
pub mod insn;
pub mod op;
pub mod reg;

pub use error::InsnError;
pub use insn::Insn;
pub use op::{Form, OpKind};
pub use reg::Reg;
