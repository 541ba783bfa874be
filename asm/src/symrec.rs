//! Symbol table.
//!
//! Records are created on first lookup and accumulate status and visibility
//! bits as parsing goes on. Constant symbols own their expression; labels
//! only hold a [`BytecodeRef`] into [`Sections`], never the bytecode itself.

use indexmap::IndexMap;
use std::fmt;
use std::ops::{ControlFlow, Index};
use std::rc::Rc;
use tracing::{debug, trace};

use crate::error::Error;
use crate::expr::Expr;
use crate::flags;
use crate::loc::Location;
use crate::msg::Diags;
use crate::objfmt::{ObjectFormat, ObjfmtData};
use crate::pline;
use crate::print::Printer;
use crate::section::{BytecodeRef, Sections};

flags! {
    /// Definition state. `DEFINED` is also set by COMMON/EXTERN declarations.
    Status: u8 {
        USED = 1 << 0,
        DEFINED = 1 << 1,
        VALUED = 1 << 2,
        NOT_IN_TABLE = 1 << 3,
    }
}

flags! {
    /// Linkage. No bits set means local.
    Visibility: u8 {
        GLOBAL = 1 << 0,
        COMMON = 1 << 1,
        EXTERN = 1 << 2,
    }
}

impl Visibility {
    pub const LOCAL: Visibility = Visibility::empty();
}

fn join(names: &[&str]) -> String {
    names.join(",")
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "None");
        }
        let mut names = vec![];
        if self.contains(Status::USED) {
            names.push("Used");
        }
        if self.contains(Status::DEFINED) {
            names.push("Defined");
        }
        if self.contains(Status::VALUED) {
            names.push("Valued");
        }
        if self.contains(Status::NOT_IN_TABLE) {
            names.push("Not in Table");
        }
        write!(f, "{}", join(&names))
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Local");
        }
        let mut names = vec![];
        if self.contains(Visibility::GLOBAL) {
            names.push("Global");
        }
        if self.contains(Visibility::COMMON) {
            names.push("Common");
        }
        if self.contains(Visibility::EXTERN) {
            names.push("Extern");
        }
        write!(f, "{}", join(&names))
    }
}

#[derive(Debug)]
pub enum SymKind {
    /// Declared only (common/extern) or merely used
    Unknown,
    /// EQU constant
    Equ(Expr),
    Label(BytecodeRef),
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Define,
    Declare(Visibility),
}

#[derive(Debug)]
pub struct Symbol {
    name: Rc<str>,
    kind: SymKind,
    status: Status,
    vis: Visibility,
    loc: Location,
    // common and extern share one slot
    vis_ce: Option<ObjfmtData>,
    vis_g: Option<ObjfmtData>,
}

impl Symbol {
    fn new(name: Rc<str>, status: Status, loc: &Location) -> Self {
        Symbol {
            name,
            kind: SymKind::Unknown,
            status,
            vis: Visibility::LOCAL,
            loc: loc.clone(),
            vis_ce: None,
            vis_g: None,
        }
    }

    /// The one place deciding whether a definition or declaration may be
    /// applied to this record.
    fn accepts(&self, action: Action) -> bool {
        match action {
            Action::Define => !self.status.contains(Status::DEFINED),
            Action::Declare(vis) => {
                if vis.contains(Visibility::COMMON | Visibility::EXTERN) {
                    return false;
                }
                let defined = self.status.contains(Status::DEFINED)
                    && !self.vis.contains(Visibility::EXTERN);
                let common_extern = self.vis.contains(Visibility::COMMON)
                    && vis.contains(Visibility::EXTERN);
                let extern_common = self.vis.contains(Visibility::EXTERN)
                    && vis.contains(Visibility::COMMON);
                !(defined || common_extern || extern_common)
            }
        }
    }

    fn duplicate(&self, loc: &Location, diags: &mut Diags) {
        diags.error(
            loc,
            format!(
                "duplicate definition of `{}'; first defined on line {}",
                self.name, self.loc.line
            ),
        );
    }

    /// Mark defined if allowed. Reports a duplicate otherwise.
    fn define(&mut self, loc: &Location, diags: &mut Diags) -> bool {
        if !self.accepts(Action::Define) {
            self.duplicate(loc, diags);
            return false;
        }
        self.loc = loc.clone();
        self.status |= Status::DEFINED;
        true
    }

    fn release(&mut self, objfmt: &dyn ObjectFormat) {
        if let Some(data) = self.vis_g.take() {
            if self.vis.contains(Visibility::GLOBAL) {
                objfmt.release_vis_data(Visibility::GLOBAL, data);
            }
        }
        if let Some(data) = self.vis_ce.take() {
            if self.vis.contains(Visibility::COMMON) {
                objfmt.release_vis_data(Visibility::COMMON, data);
            } else if self.vis.contains(Visibility::EXTERN) {
                objfmt.release_vis_data(Visibility::EXTERN, data);
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &SymKind {
        &self.kind
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn visibility(&self) -> Visibility {
        self.vis
    }

    pub fn location(&self) -> &Location {
        &self.loc
    }

    /// The constant's expression; `None` unless this is an EQU.
    pub fn equ(&self) -> Option<&Expr> {
        match &self.kind {
            SymKind::Equ(e) => Some(e),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&BytecodeRef> {
        match &self.kind {
            SymKind::Label(r) => Some(r),
            _ => None,
        }
    }
}

/// Handle to a symbol inside a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(usize);

/// Result of defining a label: either a table entry or a record the caller
/// owns and must hand back to [`SymbolTable::delete`].
#[derive(Debug)]
pub enum SymRef {
    InTable(SymbolId),
    Standalone(Symbol),
}

impl SymRef {
    pub fn id(&self) -> Option<SymbolId> {
        match self {
            SymRef::InTable(id) => Some(*id),
            SymRef::Standalone(_) => None,
        }
    }

    pub fn symbol<'a>(&'a self, symtab: &'a SymbolTable) -> &'a Symbol {
        match self {
            SymRef::InTable(id) => &symtab[*id],
            SymRef::Standalone(sym) => sym,
        }
    }
}

/// Per-run symbol table.
#[derive(Default)]
pub struct SymbolTable {
    syms: IndexMap<Rc<str>, Symbol>,
    objfmt: Option<Rc<dyn ObjectFormat>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objfmt(objfmt: Rc<dyn ObjectFormat>) -> Self {
        SymbolTable {
            syms: IndexMap::new(),
            objfmt: Some(objfmt),
        }
    }

    pub fn set_objfmt(&mut self, objfmt: Rc<dyn ObjectFormat>) {
        self.objfmt = Some(objfmt);
    }

    fn objfmt(&self) -> Result<Rc<dyn ObjectFormat>, Error> {
        self.objfmt.clone().ok_or(Error::NoObjectFormat)
    }

    fn get_or_new(&mut self, name: &str, loc: &Location) -> SymbolId {
        if let Some(index) = self.syms.get_index_of(name) {
            return SymbolId(index);
        }
        let name: Rc<str> = Rc::from(name);
        let sym = Symbol::new(name.clone(), Status::empty(), loc);
        SymbolId(self.syms.insert_full(name, sym).0)
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.syms.get_index_of(name).map(SymbolId)
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.syms.get_index(id.0).map(|(_, sym)| sym)
    }

    pub fn len(&self) -> usize {
        self.syms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syms.is_empty()
    }

    /// Reference `name`, creating it if this is the first mention.
    pub fn use_symbol(&mut self, name: &str, loc: &Location) -> SymbolId {
        let id = self.get_or_new(name, loc);
        self.syms[id.0].status |= Status::USED;
        id
    }

    /// Define an EQU constant. On a duplicate the original value stays and
    /// `e` is dropped.
    pub fn define_equ(&mut self, name: &str, e: Expr, loc: &Location, diags: &mut Diags) -> SymbolId {
        let id = self.get_or_new(name, loc);
        let sym = &mut self.syms[id.0];
        if sym.define(loc, diags) {
            sym.kind = SymKind::Equ(e);
            sym.status |= Status::VALUED;
        } else {
            trace!("drop rejected value `{}` for `{}`", e, name);
        }
        id
    }

    /// Define a label after `at`. With `in_table` false the record is built
    /// outside the table and cannot clash with anything.
    pub fn define_label(
        &mut self,
        name: &str,
        at: BytecodeRef,
        in_table: bool,
        loc: &Location,
        diags: &mut Diags,
    ) -> SymRef {
        if !in_table {
            let mut sym = Symbol::new(Rc::from(name), Status::NOT_IN_TABLE, loc);
            sym.define(loc, diags);
            sym.kind = SymKind::Label(at);
            return SymRef::Standalone(sym);
        }
        let id = self.get_or_new(name, loc);
        let sym = &mut self.syms[id.0];
        if sym.define(loc, diags) {
            sym.kind = SymKind::Label(at);
        }
        SymRef::InTable(id)
    }

    /// Add visibility to `name`. A rejected declaration hands `data` back to
    /// the object format right away.
    pub fn declare(
        &mut self,
        name: &str,
        vis: Visibility,
        data: Option<ObjfmtData>,
        loc: &Location,
        diags: &mut Diags,
    ) -> Result<SymbolId, Error> {
        let objfmt = self.objfmt()?;
        let id = self.get_or_new(name, loc);
        let sym = &mut self.syms[id.0];

        if !sym.accepts(Action::Declare(vis)) {
            sym.duplicate(loc, diags);
            if let Some(data) = data {
                debug!("release rejected {} data for `{}`", vis, name);
                objfmt.release_vis_data(vis, data);
            }
            return Ok(id);
        }

        let slot = match data {
            Some(data) if vis == Visibility::GLOBAL => Some((&mut sym.vis_g, data)),
            Some(data) if vis == Visibility::COMMON || vis == Visibility::EXTERN => {
                Some((&mut sym.vis_ce, data))
            }
            Some(data) => {
                objfmt.release_vis_data(vis, data);
                return Err(Error::UnexpectedVisibility(vis));
            }
            None => None,
        };
        if let Some((slot, data)) = slot {
            if let Some(old) = slot.replace(data) {
                objfmt.release_vis_data(vis, old);
            }
        }

        sym.loc = loc.clone();
        sym.vis |= vis;
        if vis.intersects(Visibility::COMMON | Visibility::EXTERN) {
            sym.status |= Status::DEFINED;
        }
        Ok(id)
    }

    /// Visit every symbol in the table. Returns false if `f` stopped early.
    pub fn traverse<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&Symbol) -> ControlFlow<()>,
    {
        for sym in self.syms.values() {
            if f(sym).is_break() {
                return false;
            }
        }
        true
    }

    /// Report every used but undefined symbol, then one note at the
    /// earliest of them.
    pub fn finalize(&self, diags: &mut Diags) {
        debug!("finalize {} symbols", self.syms.len());
        let mut first: Option<Location> = None;
        self.traverse(|sym| {
            if sym.status.contains(Status::USED) && !sym.status.contains(Status::DEFINED) {
                diags.error(&sym.loc, format!("undefined symbol `{}' (first use)", sym.name));
                if first.as_ref().map_or(true, |f| sym.loc.line < f.line) {
                    first = Some(sym.loc.clone());
                }
            }
            ControlFlow::Continue(())
        });
        if let Some(loc) = first {
            diags.note(&loc, " (Each undefined symbol is reported only once.)");
        }
    }

    /// Integer value of a symbol if it can be known now. Labels only
    /// resolve with `resolve_label` and a known offset.
    pub fn get_int_value(&self, id: SymbolId, resolve_label: bool, sections: &Sections) -> Option<u64> {
        let sym = self.get(id)?;
        match &sym.kind {
            SymKind::Equ(e) if sym.status.contains(Status::VALUED) => e.get_int(),
            SymKind::Label(r) if resolve_label => sections.get_offset(r),
            _ => None,
        }
    }

    /// Value of a constant symbol by name.
    pub fn equ_value(&self, name: &str) -> Option<u64> {
        let sym = self.get(self.lookup(name)?)?;
        match &sym.kind {
            SymKind::Equ(e) if sym.status.contains(Status::VALUED) => e.get_int(),
            _ => None,
        }
    }

    /// Drop every symbol and give payloads back to the object format.
    pub fn delete_all(&mut self) -> Result<(), Error> {
        let objfmt = self.objfmt()?;
        debug!("delete {} symbols", self.syms.len());
        for (_, mut sym) in self.syms.drain(..) {
            sym.release(&*objfmt);
        }
        Ok(())
    }

    /// Delete a standalone record. Table entries are left alone; the table
    /// owns them.
    pub fn delete(&self, sym: SymRef) -> Result<(), Error> {
        match sym {
            SymRef::InTable(_) => Ok(()),
            SymRef::Standalone(mut sym) => {
                let objfmt = self.objfmt()?;
                sym.release(&*objfmt);
                Ok(())
            }
        }
    }

    pub fn print(&self, sym: &Symbol, p: &mut Printer<'_>, sections: &Sections) -> fmt::Result {
        match &sym.kind {
            SymKind::Unknown => pline!(p, "-Unknown (Common/Extern)-")?,
            SymKind::Equ(e) => {
                pline!(p, "_EQU_")?;
                pline!(p, "Expn={}", e)?;
            }
            SymKind::Label(r) => {
                pline!(p, "_Label_")?;
                pline!(p, "Section:")?;
                p.nest(|p| match sections.get(r.section) {
                    Some(sect) => sect.print(p, false),
                    None => pline!(p, "(removed)"),
                })?;
                match r.index {
                    None => pline!(p, "First bytecode")?,
                    Some(_) => {
                        pline!(p, "Preceding bytecode:")?;
                        p.nest(|p| match sections.resolve(r) {
                            Some(bc) => bc.print(p),
                            None => pline!(p, "(removed)"),
                        })?;
                    }
                }
            }
        }
        pline!(p, "Status={}", sym.status)?;
        pline!(p, "Visibility={}", sym.vis)?;

        if let Some(objfmt) = &self.objfmt {
            if sym.vis.contains(Visibility::GLOBAL) {
                pline!(p, "Global object format-specific data:")?;
                p.nest(|p| objfmt.print_vis_data(p, Visibility::GLOBAL, sym.vis_g.as_ref()))?;
            }
            if sym.vis.intersects(Visibility::COMMON | Visibility::EXTERN) {
                let vis = if sym.vis.contains(Visibility::COMMON) {
                    Visibility::COMMON
                } else {
                    Visibility::EXTERN
                };
                pline!(p, "Common/Extern object format-specific data:")?;
                p.nest(|p| objfmt.print_vis_data(p, vis, sym.vis_ce.as_ref()))?;
            }
        }

        pline!(
            p,
            "Filename=\"{}\" Line Number={}",
            sym.loc.file_name(),
            sym.loc.line
        )
    }

    pub fn print_all(&self, p: &mut Printer<'_>, sections: &Sections) -> fmt::Result {
        for sym in self.syms.values() {
            pline!(p, "Symbol `{}'", sym.name)?;
            p.nest(|p| self.print(sym, p, sections))?;
        }
        Ok(())
    }
}

impl Index<SymbolId> for SymbolTable {
    type Output = Symbol;

    /// Panics on an id from before `delete_all`.
    fn index(&self, id: SymbolId) -> &Symbol {
        &self.syms[id.0]
    }
}
