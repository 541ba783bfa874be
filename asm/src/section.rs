use bimap::BiMap;
use indexmap::IndexMap;
use std::fmt;
use tracing::debug;

use crate::bytecode::{Bytecode, Bytecodes};
use crate::pline;
use crate::print::Printer;

/// Section handle. Ids are never reused, so a handle into a removed section
/// stays dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(u32);

/// Position of a label: the bytecode right before it, or the start of the
/// section when `index` is `None`. Stale indices fail lookup; see
/// [`Bytecodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BytecodeRef {
    pub section: SectionId,
    pub index: Option<usize>,
}

#[derive(Debug)]
pub struct Section {
    name: String,
    pub bcs: Bytecodes,
}

impl Section {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offset of the bytecode at `index` (or of the section start).
    ///
    /// Offsets are unknown until a layout pass assigns them, and there is no
    /// such pass yet.
    pub fn get_offset(&self, _index: Option<usize>) -> Option<u64> {
        None
    }

    pub fn print(&self, p: &mut Printer<'_>, with_bcs: bool) -> fmt::Result {
        pline!(p, "name={}", self.name)?;
        if with_bcs {
            pline!(p, "Bytecodes:")?;
            p.nest(|p| self.bcs.print(p))?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Sections {
    names: BiMap<String, SectionId>,
    sects: IndexMap<SectionId, Section>,
    next: u32,
}

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert(&mut self, name: &str) -> SectionId {
        if let Some(id) = self.names.get_by_left(name) {
            return *id;
        }
        let id = SectionId(self.next);
        self.next += 1;
        self.names.insert(name.to_string(), id);
        self.sects.insert(
            id,
            Section {
                name: name.to_string(),
                bcs: Bytecodes::new(),
            },
        );
        id
    }

    pub fn lookup(&self, name: &str) -> Option<SectionId> {
        self.names.get_by_left(name).copied()
    }

    pub fn get(&self, id: SectionId) -> Option<&Section> {
        self.sects.get(&id)
    }

    pub fn get_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sects.get_mut(&id)
    }

    /// Tear down one section and every bytecode in it.
    pub fn remove(&mut self, id: SectionId) -> bool {
        match self.sects.shift_remove(&id) {
            Some(mut sect) => {
                debug!("remove section `{}`", sect.name);
                self.names.remove_by_right(&id);
                sect.bcs.delete_all();
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        let ids: Vec<SectionId> = self.sects.keys().copied().collect();
        for id in ids {
            self.remove(id);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectionId, &Section)> {
        self.sects.iter().map(|(id, sect)| (*id, sect))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SectionId, &mut Section)> {
        self.sects.iter_mut().map(|(id, sect)| (*id, sect))
    }

    /// The bytecode a label points after. `None` if the label is at the
    /// section start or the target is gone.
    pub fn resolve(&self, r: &BytecodeRef) -> Option<&Bytecode> {
        let index = r.index?;
        self.get(r.section)?.bcs.get(index)
    }

    pub fn get_offset(&self, r: &BytecodeRef) -> Option<u64> {
        self.get(r.section)?.get_offset(r.index)
    }

    pub fn print(&self, p: &mut Printer<'_>) -> fmt::Result {
        for sect in self.sects.values() {
            pline!(p, "Section:")?;
            p.nest(|p| sect.print(p, true))?;
        }
        Ok(())
    }
}
