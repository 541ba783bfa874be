use color_print::cprintln;

use crate::loc::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgKind {
    Error,
    Warn,
    Note,
}

#[derive(Debug, Clone)]
pub struct Msg {
    pub kind: MsgKind,
    pub msg: String,
    pub loc: Location,
}

impl Msg {
    fn print(&self, color: bool) {
        if color {
            match self.kind {
                MsgKind::Error => cprintln!("<red,bold>error</>: {}", self.msg),
                MsgKind::Warn => cprintln!("<yellow,bold>warn</>: {}", self.msg),
                MsgKind::Note => cprintln!("<green,bold>note</>: {}", self.msg),
            }
            cprintln!("     <blue>--></> <underline>{}</>", self.loc);
        } else {
            let head = match self.kind {
                MsgKind::Error => "error",
                MsgKind::Warn => "warn",
                MsgKind::Note => "note",
            };
            println!("{}: {}", head, self.msg);
            println!("     --> {}", self.loc);
        }
    }
}

/// Recoverable diagnostics collected over a whole assembly run.
#[derive(Debug, Default)]
pub struct Diags {
    msgs: Vec<Msg>,
    errors: usize,
    max_errors: Option<usize>,
    color: bool,
}

impl Diags {
    pub fn new() -> Self {
        Diags {
            color: true,
            ..Default::default()
        }
    }

    pub fn with_limit(max_errors: Option<usize>, color: bool) -> Self {
        Diags {
            max_errors,
            color,
            ..Default::default()
        }
    }

    /// Past the limit errors are only counted, and one note marks the cut.
    /// Warnings and notes are never limited.
    pub fn error(&mut self, loc: &Location, msg: impl Into<String>) {
        self.errors += 1;
        match self.max_errors {
            Some(max) if self.errors > max => {
                if self.errors == max + 1 {
                    self.push(MsgKind::Note, loc, "too many errors; further errors are not shown");
                }
            }
            _ => self.push(MsgKind::Error, loc, msg),
        }
    }

    pub fn warn(&mut self, loc: &Location, msg: impl Into<String>) {
        self.push(MsgKind::Warn, loc, msg);
    }

    pub fn note(&mut self, loc: &Location, msg: impl Into<String>) {
        self.push(MsgKind::Note, loc, msg);
    }

    fn push(&mut self, kind: MsgKind, loc: &Location, msg: impl Into<String>) {
        self.msgs.push(Msg {
            kind,
            msg: msg.into(),
            loc: loc.clone(),
        });
    }

    /// Counts every reported error, including the ones past the limit.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn has_error(&self) -> bool {
        self.errors > 0
    }

    pub fn count(&self, kind: MsgKind) -> usize {
        self.msgs.iter().filter(|msg| msg.kind == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Msg> {
        self.msgs.iter()
    }

    pub fn print(&self) {
        for msg in &self.msgs {
            msg.print(self.color);
        }
    }
}
