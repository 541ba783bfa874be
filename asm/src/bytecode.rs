use std::any::Any;
use std::fmt;
use tracing::{debug, trace};

use crate::error::Error;
use crate::expr::Expr;
use crate::loc::Location;
use crate::msg::Diags;
use crate::pline;
use crate::print::Printer;
use crate::symrec::SymbolTable;

// ----------------------------------------------------------------------------
// Architecture extension

/// Bytecode kind owned by an architecture module.
///
/// The core never looks inside an extension: printing and finalizing are
/// routed through this trait, and deleting is the payload's `Drop`.
pub trait BytecodeExt: fmt::Debug {
    fn name(&self) -> &'static str;

    fn print(&self, p: &mut Printer<'_>) -> fmt::Result;

    /// One-time late binding after parsing.
    fn finalize(&mut self, loc: &Location, ctx: &mut FinalizeCtx<'_>) -> Result<(), Error>;

    fn as_any(&self) -> &dyn Any;
}

/// What an extension may look at while finalizing.
pub struct FinalizeCtx<'a> {
    pub symtab: &'a SymbolTable,
    pub diags: &'a mut Diags,
}

// ----------------------------------------------------------------------------
// Data values

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataValue {
    Empty,
    Expr(Expr),
    String(Vec<u8>),
}

impl DataValue {
    pub fn from_expr(e: Expr) -> Self {
        DataValue::Expr(e)
    }

    pub fn from_string(s: impl Into<Vec<u8>>) -> Self {
        DataValue::String(s.into())
    }

    fn print(&self, p: &mut Printer<'_>) -> fmt::Result {
        match self {
            DataValue::Empty => pline!(p, "Empty"),
            DataValue::Expr(e) => pline!(p, "Expr={}", e),
            DataValue::String(s) => pline!(p, "String={}", String::from_utf8_lossy(s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataValues(Vec<DataValue>);

impl DataValues {
    pub fn new() -> Self {
        DataValues(Vec::new())
    }

    pub fn push(&mut self, dv: DataValue) -> &DataValue {
        self.0.push(dv);
        &self.0[self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataValue> {
        self.0.iter()
    }

    pub fn print(&self, p: &mut Printer<'_>) -> fmt::Result {
        for dv in &self.0 {
            dv.print(p)?;
        }
        Ok(())
    }
}

impl FromIterator<DataValue> for DataValues {
    fn from_iter<I: IntoIterator<Item = DataValue>>(iter: I) -> Self {
        DataValues(iter.into_iter().collect())
    }
}

// ----------------------------------------------------------------------------
// Bytecode

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    pub values: DataValues,
    /// Final size of each element in bytes
    pub size: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reserve {
    pub numitems: Expr,
    /// Size of each item in bytes
    pub itemsize: u8,
}

#[derive(Debug)]
pub enum Contents {
    Empty,
    Data(Data),
    Reserve(Reserve),
    Ext(Box<dyn BytecodeExt>),
}

#[derive(Debug)]
pub struct Bytecode {
    contents: Contents,
    multiple: Option<Expr>,
    pub len: u64,
    loc: Location,
    pub offset: u64,
}

impl Bytecode {
    fn new_common(contents: Contents, loc: Location) -> Self {
        Bytecode {
            contents,
            multiple: None,
            len: 0,
            loc,
            offset: 0,
        }
    }

    pub fn empty(loc: Location) -> Self {
        Self::new_common(Contents::Empty, loc)
    }

    pub fn data(values: DataValues, size: u8, loc: Location) -> Self {
        Self::new_common(Contents::Data(Data { values, size }), loc)
    }

    pub fn reserve(numitems: Expr, itemsize: u8, loc: Location) -> Self {
        Self::new_common(Contents::Reserve(Reserve { numitems, itemsize }), loc)
    }

    pub fn ext(ext: Box<dyn BytecodeExt>, loc: Location) -> Self {
        Self::new_common(Contents::Ext(ext), loc)
    }

    /// Repeated calls multiply: `set_multiple(a); set_multiple(b)` is `a*b`.
    pub fn set_multiple(&mut self, e: Expr) {
        self.multiple = Some(match self.multiple.take() {
            Some(prev) => prev.mul(e),
            None => e,
        });
    }

    pub fn multiple(&self) -> Option<&Expr> {
        self.multiple.as_ref()
    }

    pub fn contents(&self) -> &Contents {
        &self.contents
    }

    pub fn location(&self) -> &Location {
        &self.loc
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.contents, Contents::Empty)
    }

    pub fn finalize(&mut self, ctx: &mut FinalizeCtx<'_>) -> Result<(), Error> {
        match &mut self.contents {
            Contents::Empty => Err(Error::EmptyBytecode),
            Contents::Data(_) | Contents::Reserve(_) => Ok(()),
            Contents::Ext(ext) => ext.finalize(&self.loc, ctx),
        }
    }

    /// Release the payload, the repeat count and the item itself.
    pub fn delete(self) {
        trace!("delete bytecode at {}", self.loc);
    }

    pub fn print(&self, p: &mut Printer<'_>) -> fmt::Result {
        match &self.contents {
            Contents::Empty => pline!(p, "_Empty_")?,
            Contents::Data(data) => {
                pline!(p, "_Data_")?;
                p.nest(|p| {
                    pline!(p, "Final Element Size={}", data.size)?;
                    pline!(p, "Elements:")?;
                    p.nest(|p| data.values.print(p))
                })?;
            }
            Contents::Reserve(reserve) => {
                pline!(p, "_Reserve_")?;
                pline!(p, "Num Items={}", reserve.numitems)?;
                pline!(p, "Item Size={}", reserve.itemsize)?;
            }
            Contents::Ext(ext) => ext.print(p)?,
        }
        match &self.multiple {
            Some(e) => pline!(p, "Multiple={}", e)?,
            None => pline!(p, "Multiple=nil (1)")?,
        }
        pline!(p, "Length={}", self.len)?;
        pline!(
            p,
            "Filename=\"{}\" Line Number={}",
            self.loc.file_name(),
            self.loc.line
        )?;
        pline!(p, "Offset={:x}", self.offset)
    }
}

// ----------------------------------------------------------------------------
// Bytecode list

/// Ordered bytecodes of one section. Never holds an empty bytecode.
///
/// Indices count every bytecode ever appended, so an index taken before
/// `delete_all` fails lookup afterwards instead of naming a newer item.
#[derive(Debug, Default)]
pub struct Bytecodes {
    items: Vec<Bytecode>,
    base: usize,
}

impl Bytecodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of the appended bytecode, or `None` if it was
    /// empty and got discarded.
    pub fn append(&mut self, bc: Bytecode) -> Option<usize> {
        if bc.is_empty() {
            trace!("discard empty bytecode at {}", bc.loc);
            return None;
        }
        self.items.push(bc);
        self.last_index()
    }

    pub fn get(&self, index: usize) -> Option<&Bytecode> {
        self.items.get(index.checked_sub(self.base)?)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Bytecode> {
        self.items.get_mut(index.checked_sub(self.base)?)
    }

    pub fn last_index(&self) -> Option<usize> {
        let len = self.items.len();
        (len > 0).then(|| self.base + len - 1)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytecode> {
        self.items.iter()
    }

    pub fn finalize_all(&mut self, ctx: &mut FinalizeCtx<'_>) -> Result<(), Error> {
        debug!("finalize {} bytecodes", self.items.len());
        for bc in &mut self.items {
            bc.finalize(ctx)?;
        }
        Ok(())
    }

    pub fn delete_all(&mut self) {
        self.base += self.items.len();
        for bc in self.items.drain(..) {
            bc.delete();
        }
    }

    pub fn print(&self, p: &mut Printer<'_>) -> fmt::Result {
        for bc in &self.items {
            pline!(p, "Next Bytecode:")?;
            p.nest(|p| bc.print(p))?;
        }
        Ok(())
    }
}
