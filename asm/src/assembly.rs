use std::fmt;
use std::rc::Rc;
use tracing::debug;

use crate::bytecode::FinalizeCtx;
use crate::config::Config;
use crate::error::Error;
use crate::loc::Location;
use crate::msg::Diags;
use crate::objfmt::ObjectFormat;
use crate::pline;
use crate::print::Printer;
use crate::section::Sections;
use crate::symrec::SymbolTable;

/// Everything one assembly run mutates. Built once per run and torn down
/// explicitly, so separate runs never share state.
pub struct Assembly {
    pub config: Config,
    pub symtab: SymbolTable,
    pub sections: Sections,
    pub diags: Diags,
    pos: Location,
}

impl Assembly {
    pub fn new(config: Config, objfmt: Rc<dyn ObjectFormat>) -> Self {
        let diags = Diags::with_limit(config.max_errors, config.color);
        Assembly {
            config,
            symtab: SymbolTable::with_objfmt(objfmt),
            sections: Sections::new(),
            diags,
            pos: Location::default(),
        }
    }

    pub fn set_position(&mut self, file: &str, line: u64) {
        if self.pos.file.as_deref() != Some(file) {
            self.pos.file = Some(Rc::from(file));
        }
        self.pos.line = line;
    }

    /// Current parse position, stamped onto new bytecodes and symbols.
    pub fn location(&self) -> Location {
        self.pos.clone()
    }

    /// Post-parse pass: undefined symbol check, then late binding of every
    /// bytecode in every section.
    pub fn finalize(&mut self) -> Result<(), Error> {
        debug!("parser finalize");
        self.symtab.finalize(&mut self.diags);
        let mut ctx = FinalizeCtx {
            symtab: &self.symtab,
            diags: &mut self.diags,
        };
        for (_, sect) in self.sections.iter_mut() {
            sect.bcs.finalize_all(&mut ctx)?;
        }
        Ok(())
    }

    pub fn dump(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let mut p = Printer::with_width(out, self.config.indent);
        self.sections.print(&mut p)?;
        pline!(p, "Symbols:")?;
        p.nest(|p| self.symtab.print_all(p, &self.sections))
    }

    pub fn teardown(&mut self) -> Result<(), Error> {
        debug!("teardown");
        self.symtab.delete_all()?;
        self.sections.clear();
        Ok(())
    }
}
