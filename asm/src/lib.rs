pub mod assembly;
pub mod bytecode;
pub mod config;
pub mod error;
pub mod expr;
mod flags;
pub mod loc;
pub mod msg;
pub mod objfmt;
pub mod operand;
pub mod print;
pub mod section;
pub mod symrec;

pub use assembly::Assembly;
pub use bytecode::{Bytecode, BytecodeExt, Bytecodes, Contents, DataValue, DataValues, FinalizeCtx};
pub use config::Config;
pub use error::Error;
pub use expr::Expr;
pub use loc::Location;
pub use msg::{Diags, Msg, MsgKind};
pub use objfmt::{DbgObjfmt, ObjectFormat, ObjfmtData};
pub use print::Printer;
pub use section::{BytecodeRef, Section, SectionId, Sections};
pub use symrec::{Status, SymKind, SymRef, Symbol, SymbolId, SymbolTable, Visibility};
