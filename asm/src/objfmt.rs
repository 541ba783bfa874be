use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use tracing::debug;

use crate::pline;
use crate::print::Printer;
use crate::symrec::Visibility;

/// Object-format-specific payload attached to a declared symbol.
pub type ObjfmtData = Box<dyn Any>;

/// The object-format side of symbol declarations.
pub trait ObjectFormat {
    fn name(&self) -> &'static str;

    /// Take back a payload the symbol table will not keep.
    fn release_vis_data(&self, vis: Visibility, data: ObjfmtData);

    fn print_vis_data(
        &self,
        p: &mut Printer<'_>,
        vis: Visibility,
        data: Option<&ObjfmtData>,
    ) -> fmt::Result;
}

/// Debugging object format. Payloads are strings and every release is
/// recorded.
#[derive(Debug, Default)]
pub struct DbgObjfmt {
    released: RefCell<Vec<(Visibility, String)>>,
}

impl DbgObjfmt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(text: &str) -> ObjfmtData {
        Box::new(text.to_string())
    }

    /// Releases so far, in order.
    pub fn released(&self) -> Vec<(Visibility, String)> {
        self.released.borrow().clone()
    }

    fn text(data: &ObjfmtData) -> String {
        match data.downcast_ref::<String>() {
            Some(s) => s.clone(),
            None => "<foreign>".to_string(),
        }
    }
}

impl ObjectFormat for DbgObjfmt {
    fn name(&self) -> &'static str {
        "dbg"
    }

    fn release_vis_data(&self, vis: Visibility, data: ObjfmtData) {
        let text = Self::text(&data);
        debug!("dbg: release {} data `{}`", vis, text);
        self.released.borrow_mut().push((vis, text));
    }

    fn print_vis_data(
        &self,
        p: &mut Printer<'_>,
        vis: Visibility,
        data: Option<&ObjfmtData>,
    ) -> fmt::Result {
        match data {
            Some(data) => pline!(p, "{} data=\"{}\"", vis, Self::text(data)),
            None => pline!(p, "{} data=(nil)", vis),
        }
    }
}
